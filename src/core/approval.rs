use crate::core::access::Viewer;

/// Approved suggestions after which new suggestions skip moderation
pub const AUTO_APPROVE_THRESHOLD: u64 = 3;

/// Decide the approval flag for a new suggestion
///
/// Evaluated once at creation time; later changes to the count never touch
/// campsites that already exist.
#[inline]
pub fn should_auto_approve(viewer: &Viewer, approved_suggestions: u64, threshold: u64) -> bool {
    viewer.is_elevated() || approved_suggestions >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::access::{viewer, Role};

    #[test]
    fn test_three_approved_suggestions_auto_approve() {
        let user = viewer(1, Role::User);
        assert!(should_auto_approve(&user, 3, AUTO_APPROVE_THRESHOLD));
        assert!(should_auto_approve(&user, 10, AUTO_APPROVE_THRESHOLD));
    }

    #[test]
    fn test_two_approved_suggestions_stay_pending() {
        let user = viewer(1, Role::User);
        assert!(!should_auto_approve(&user, 2, AUTO_APPROVE_THRESHOLD));
        assert!(!should_auto_approve(&user, 0, AUTO_APPROVE_THRESHOLD));
    }

    #[test]
    fn test_elevated_always_approved() {
        assert!(should_auto_approve(&viewer(1, Role::PageAdmin), 0, AUTO_APPROVE_THRESHOLD));
    }
}
