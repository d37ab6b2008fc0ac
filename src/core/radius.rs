use crate::core::coords::{Coordinates, Locate};
use crate::core::distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box};

/// A candidate that passed the radius check
#[derive(Debug, Clone)]
pub struct InRadius<T> {
    pub item: T,
    pub coordinates: Coordinates,
    pub distance_km: f64,
}

/// Return the candidates within `radius_km` of `center`, nearest first
///
/// # Pipeline Stages
/// 1. Resolve the center (nothing is returned when it has no location)
/// 2. Bounding box pre-filter on each candidate's parsed coordinates
/// 3. Exact Haversine check against the radius
///
/// Candidates without a usable location are skipped silently.
pub fn within_radius<C, T, I>(center: &C, radius_km: f64, candidates: I) -> Vec<InRadius<T>>
where
    C: Locate + ?Sized,
    T: Locate,
    I: IntoIterator<Item = T>,
{
    let Some(origin) = center.coordinates() else {
        return Vec::new();
    };
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Vec::new();
    }

    let bbox = calculate_bounding_box(origin, radius_km);

    let mut found: Vec<InRadius<T>> = candidates
        .into_iter()
        .filter_map(|item| {
            let coordinates = item.coordinates()?;
            if !is_within_bounding_box(coordinates, &bbox) {
                return None;
            }
            let distance_km = haversine_distance(origin, coordinates);
            (distance_km <= radius_km).then_some(InRadius {
                item,
                coordinates,
                distance_km,
            })
        })
        .collect();

    // Stable sort keeps input order among equidistant candidates
    found.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    found
}
