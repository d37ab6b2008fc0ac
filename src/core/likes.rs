use serde::{Deserialize, Serialize};

/// Like state of one campsite as seen by one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub is_liked: bool,
    pub like_count: i64,
}

/// What one atomic toggle did to the (user, campsite) like row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// An existing like was deleted
    Removed,
    /// No like existed and one was created
    Added,
    /// No like was visible to delete, but the insert hit the unique
    /// constraint: a concurrent toggle created it first
    AlreadyLiked,
}

impl ToggleOutcome {
    /// Resolve a toggle from its two storage steps
    ///
    /// A toggle first deletes the like if present; only when nothing was
    /// deleted does it insert, and a conflicting insert counts as liked.
    pub fn resolve(removed_existing: bool, inserted: bool) -> Self {
        if removed_existing {
            ToggleOutcome::Removed
        } else if inserted {
            ToggleOutcome::Added
        } else {
            ToggleOutcome::AlreadyLiked
        }
    }

    pub fn is_liked(self) -> bool {
        !matches!(self, ToggleOutcome::Removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Unique (user, campsite) rows, as the likes table enforces them
    #[derive(Default)]
    struct Rows(HashSet<(i64, i64)>);

    impl Rows {
        fn delete(&mut self, key: (i64, i64)) -> bool {
            self.0.remove(&key)
        }

        fn insert(&mut self, key: (i64, i64)) -> bool {
            self.0.insert(key)
        }

        fn toggle(&mut self, key: (i64, i64)) -> ToggleOutcome {
            let removed = self.delete(key);
            let inserted = !removed && self.insert(key);
            ToggleOutcome::resolve(removed, inserted)
        }
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut rows = Rows::default();
        rows.insert((2, 1));
        let before = rows.0.len();

        assert_eq!(rows.toggle((1, 1)), ToggleOutcome::Added);
        assert_eq!(rows.toggle((1, 1)), ToggleOutcome::Removed);
        assert_eq!(rows.0.len(), before);
    }

    #[test]
    fn test_overlapping_toggles_settle_on_one_like() {
        let mut rows = Rows::default();
        let key = (1, 1);

        // Both requests run their delete step before either inserts
        let first_removed = rows.delete(key);
        let second_removed = rows.delete(key);
        let first = ToggleOutcome::resolve(first_removed, rows.insert(key));
        let second = ToggleOutcome::resolve(second_removed, rows.insert(key));

        assert_eq!(first, ToggleOutcome::Added);
        assert_eq!(second, ToggleOutcome::AlreadyLiked);
        assert!(first.is_liked() && second.is_liked());
        assert_eq!(rows.0.len(), 1);
    }

    #[test]
    fn test_removed_is_not_liked() {
        assert!(!ToggleOutcome::resolve(true, false).is_liked());
    }
}
