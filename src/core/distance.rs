use crate::core::coords::Coordinates;
use serde::Serialize;

/// Earth's radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Lower bound for cos(latitude) so the longitude scale never divides by ~0
const MIN_COS_LATITUDE: f64 = 1e-6;

/// Slack added to each half-width so rounding never clips an edge point
const EDGE_EPSILON_DEG: f64 = 1e-9;

/// Calculate the Haversine distance between two points in kilometers
#[inline]
pub fn haversine_distance(from: Coordinates, to: Coordinates) -> f64 {
    let lat1_rad = from.lat().to_radians();
    let lat2_rad = to.lat().to_radians();
    let delta_lat = (to.lat() - from.lat()).to_radians();
    let delta_lon = (to.lng() - from.lng()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Geospatial bounding box in degrees
///
/// Longitude bounds may run past ±180 when the box crosses the antimeridian;
/// `contains` accounts for the wrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: Coordinates) -> bool {
        if point.lat() < self.min_lat || point.lat() > self.max_lat {
            return false;
        }
        let lng = point.lng();
        [lng, lng - 360.0, lng + 360.0]
            .iter()
            .any(|l| *l >= self.min_lon && *l <= self.max_lon)
    }

    pub fn spans_all_longitudes(&self) -> bool {
        self.min_lon <= -180.0 && self.max_lon >= 180.0
    }
}

/// Calculate a bounding box around a center point
///
/// Cheap pre-filter for radius checks. Half-widths are derived from the same
/// 6371 km sphere the Haversine distance uses (one degree of latitude is
/// ~111.19 km), so any point within `radius_km` of the center lies inside the
/// box. The longitude half-width is `asin(sin(d) / cos(lat))`, which is exact
/// for a spherical cap; once the cap reaches a pole every longitude is
/// admitted.
pub fn calculate_bounding_box(center: Coordinates, radius_km: f64) -> BoundingBox {
    let angular = (radius_km / EARTH_RADIUS_KM).max(0.0);
    let lat_delta = angular.to_degrees() + EDGE_EPSILON_DEG;

    let min_lat = center.lat() - lat_delta;
    let max_lat = center.lat() + lat_delta;

    let cos_lat = center.lat().to_radians().cos().abs().max(MIN_COS_LATITUDE);
    let ratio = angular.sin() / cos_lat;

    let (min_lon, max_lon) = if max_lat >= 90.0 || min_lat <= -90.0 || ratio >= 1.0 {
        (-180.0, 180.0)
    } else {
        let lon_delta = ratio.asin().to_degrees() + EDGE_EPSILON_DEG;
        (center.lng() - lon_delta, center.lng() + lon_delta)
    };

    BoundingBox {
        min_lat: min_lat.max(-90.0),
        max_lat: max_lat.min(90.0),
        min_lon,
        max_lon,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(point: Coordinates, bbox: &BoundingBox) -> bool {
    bbox.contains(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let distance = haversine_distance(at(51.5074, -0.1278), at(48.8566, 2.3522));
        assert!((distance - 344.0).abs() < 5.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_haversine_zero_and_symmetric() {
        let paris = at(48.8566, 2.3522);
        let rome = at(41.9028, 12.4964);
        assert_eq!(haversine_distance(paris, paris), 0.0);
        let ab = haversine_distance(paris, rome);
        let ba = haversine_distance(rome, paris);
        assert!((ab - ba).abs() <= 1e-9 * ab);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = calculate_bounding_box(at(40.7128, -74.0060), 10.0);

        assert!(bbox.min_lat < 40.7128);
        assert!(bbox.max_lat > 40.7128);
        assert!(bbox.min_lon < -74.0060);
        assert!(bbox.max_lon > -74.0060);

        // 20km / ~111.2km per degree = ~0.18 degrees
        let lat_span = bbox.max_lat - bbox.min_lat;
        assert!((lat_span - 0.18).abs() < 0.01, "Lat span should be ~0.18 degrees");
    }

    #[test]
    fn test_point_within_bbox() {
        let bbox = calculate_bounding_box(at(40.7128, -74.0060), 10.0);

        assert!(is_within_bounding_box(at(40.7128, -74.0060), &bbox));
        assert!(is_within_bounding_box(at(40.71, -74.0), &bbox));
        assert!(!is_within_bounding_box(at(50.0, -80.0), &bbox));
    }

    #[test]
    fn test_box_admits_point_due_north_at_radius() {
        let center = at(10.0, 10.0);
        let north = at(10.0 + (100.0 / EARTH_RADIUS_KM).to_degrees(), 10.0);
        let d = haversine_distance(center, north);
        assert!(is_within_bounding_box(north, &calculate_bounding_box(center, d)));
    }

    #[test]
    fn test_box_near_pole_spans_all_longitudes() {
        let bbox = calculate_bounding_box(at(89.9, 0.0), 50.0);
        assert!(bbox.spans_all_longitudes());
        assert!(is_within_bounding_box(at(89.9, 179.0), &bbox));
    }

    #[test]
    fn test_box_wraps_antimeridian() {
        let bbox = calculate_bounding_box(at(0.0, 179.9), 50.0);
        assert!(bbox.max_lon > 180.0);
        assert!(is_within_bounding_box(at(0.0, -179.9), &bbox));
        assert!(!is_within_bounding_box(at(0.0, -170.0), &bbox));
    }

    #[test]
    fn test_negative_radius_collapses_to_center() {
        let bbox = calculate_bounding_box(at(45.0, 5.0), -10.0);
        assert!(is_within_bounding_box(at(45.0, 5.0), &bbox));
        assert!(!is_within_bounding_box(at(45.1, 5.0), &bbox));
    }
}
