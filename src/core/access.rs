use crate::models::{Campsite, UserId};
use serde::{Deserialize, Serialize};

/// Account role carried in the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    PageAdmin,
    #[default]
    User,
}

/// Authenticated identity, resolved once per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Who is making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Authenticated(Identity),
}

impl Viewer {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated(identity) => Some(identity),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.identity().map(|i| i.user_id)
    }

    /// Staff-equivalent: may see unapproved campsites and bypass ownership
    pub fn is_elevated(&self) -> bool {
        self.identity().is_some_and(|i| {
            i.is_staff || i.is_superuser || matches!(i.role, Role::SuperAdmin | Role::PageAdmin)
        })
    }

    /// May manage the product catalog
    pub fn is_super_admin(&self) -> bool {
        self.identity()
            .is_some_and(|i| i.is_superuser || i.role == Role::SuperAdmin)
    }

    pub fn can_edit(&self, campsite: &Campsite) -> bool {
        self.is_elevated() || self.user_id().is_some_and(|id| campsite.is_owned_by(id))
    }

    /// Unapproved campsites are hidden from everyone but staff and their owner
    pub fn can_view(&self, campsite: &Campsite) -> bool {
        campsite.is_approved || self.can_edit(campsite)
    }
}

#[cfg(test)]
pub(crate) fn viewer(user_id: UserId, role: Role) -> Viewer {
    Viewer::Authenticated(Identity {
        user_id,
        username: format!("user{}", user_id),
        role,
        is_staff: false,
        is_superuser: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::fixtures;

    #[test]
    fn test_anonymous_has_no_capabilities() {
        let v = Viewer::Anonymous;
        assert!(!v.is_elevated());
        assert!(!v.is_super_admin());
        assert_eq!(v.user_id(), None);
    }

    #[test]
    fn test_role_capabilities() {
        assert!(viewer(1, Role::SuperAdmin).is_elevated());
        assert!(viewer(1, Role::SuperAdmin).is_super_admin());
        assert!(viewer(1, Role::PageAdmin).is_elevated());
        assert!(!viewer(1, Role::PageAdmin).is_super_admin());
        assert!(!viewer(1, Role::User).is_elevated());
    }

    #[test]
    fn test_staff_flag_elevates_plain_user() {
        let v = Viewer::Authenticated(Identity {
            user_id: 5,
            username: "mod".into(),
            role: Role::User,
            is_staff: true,
            is_superuser: false,
        });
        assert!(v.is_elevated());
        assert!(!v.is_super_admin());
    }

    #[test]
    fn test_owner_can_edit_and_view_pending() {
        let mut site = fixtures::campsite(1, "Pending", "1,1");
        site.is_approved = false;
        site.suggested_by = Some(9);

        assert!(viewer(9, Role::User).can_edit(&site));
        assert!(viewer(9, Role::User).can_view(&site));
        assert!(!viewer(10, Role::User).can_view(&site));
        assert!(!Viewer::Anonymous.can_view(&site));
        assert!(viewer(10, Role::PageAdmin).can_view(&site));
    }

    #[test]
    fn test_role_serde_names() {
        let role: Role = serde_json::from_str("\"page_admin\"").unwrap();
        assert_eq!(role, Role::PageAdmin);
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"super_admin\"");
    }
}
