//! Euro Camp - directory of European campsites
//!
//! Listing with per-viewer like annotations, radius search over "lat,lng"
//! locations, atomic like toggles and suggestion moderation with
//! auto-approval of trusted suggesters.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    distance::{calculate_bounding_box, haversine_distance},
    within_radius, Coordinates, ListingQuery, PageWindow, Viewer,
};
pub use models::{Campsite, ListedCampsite, Product};
pub use services::{CampsiteStore, MemoryStore, PostgresStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let center = Coordinates::new(40.7128, -74.0060).unwrap();
        let bbox = calculate_bounding_box(center, 10.0);
        assert!(bbox.min_lat < 40.7128);
    }
}
