// Core algorithm exports
pub mod access;
pub mod approval;
pub mod coords;
pub mod distance;
pub mod likes;
pub mod listing;
pub mod map;
pub mod radius;

pub use access::{Identity, Role, Viewer};
pub use approval::{should_auto_approve, AUTO_APPROVE_THRESHOLD};
pub use coords::{Coordinates, Locate};
pub use distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box, BoundingBox};
pub use likes::{LikeState, ToggleOutcome};
pub use listing::{listing_order, ListingQuery, PageWindow, DEFAULT_PAGE_SIZE};
pub use map::{MapMarker, DEFAULT_MAP_CENTER, DEFAULT_RADIUS_KM};
pub use radius::{within_radius, InRadius};
