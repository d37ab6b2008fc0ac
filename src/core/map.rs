use crate::core::coords::{Coordinates, Locate};
use crate::core::radius::within_radius;
use crate::models::{CampsiteId, ListedCampsite};
use geo::{Centroid, MultiPoint, Point};
use serde::Serialize;

/// Map center used when there is nothing to center on (central Europe)
pub const DEFAULT_MAP_CENTER: Coordinates = Coordinates::new_unchecked(54.5260, 15.2551);

/// Radius of the "campsites near this one" map
pub const DEFAULT_RADIUS_KM: f64 = 100.0;

/// A campsite pin on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: CampsiteId,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub likes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl MapMarker {
    fn new(site: &ListedCampsite, at: Coordinates, distance_km: Option<f64>) -> Self {
        Self {
            id: site.campsite.id,
            name: site.campsite.name.clone(),
            country: site.campsite.country.clone(),
            lat: at.lat(),
            lng: at.lng(),
            likes: site.like_count,
            distance_km,
        }
    }
}

impl Locate for ListedCampsite {
    fn coordinates(&self) -> Option<Coordinates> {
        self.campsite.coordinates()
    }
}

/// Markers for every locatable campsite, in input order
pub fn markers<'a, I>(sites: I) -> Vec<MapMarker>
where
    I: IntoIterator<Item = &'a ListedCampsite>,
{
    sites
        .into_iter()
        .filter_map(|site| site.coordinates().map(|at| MapMarker::new(site, at, None)))
        .collect()
}

/// Markers within `radius_km` of `center`, nearest first
pub fn radius_markers<C>(center: &C, radius_km: f64, sites: &[ListedCampsite]) -> Vec<MapMarker>
where
    C: Locate + ?Sized,
{
    within_radius(center, radius_km, sites.iter())
        .into_iter()
        .map(|hit| MapMarker::new(hit.item, hit.coordinates, Some(hit.distance_km)))
        .collect()
}

/// Planar centroid of the markers, suitable as an initial map view
pub fn centroid(markers: &[MapMarker]) -> Option<Coordinates> {
    let points: MultiPoint<f64> = markers
        .iter()
        .map(|m| Point::new(m.lng, m.lat))
        .collect::<Vec<_>>()
        .into();
    let center = points.centroid()?;
    Coordinates::new(center.y(), center.x())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::fixtures;

    fn site(id: i64, location: &str, likes: i64) -> ListedCampsite {
        ListedCampsite {
            campsite: fixtures::campsite(id, &format!("Site {}", id), location),
            like_count: likes,
            user_has_liked: false,
        }
    }

    #[test]
    fn test_markers_skip_unlocatable_sites() {
        let sites = vec![site(1, "48.8566,2.3522", 2), site(2, "200,50", 0), site(3, "", 0)];
        let pins = markers(&sites);
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].id, 1);
        assert_eq!(pins[0].likes, 2);
        assert_eq!(pins[0].distance_km, None);
    }

    #[test]
    fn test_radius_markers_around_paris() {
        let paris = site(1, "48.8566,2.3522", 0);
        let sites = vec![
            site(2, "41.9028,12.4964", 0),
            site(3, "51.5074,-0.1278", 0),
            paris.clone(),
        ];
        let pins = radius_markers(&paris, 500.0, &sites);
        let ids: Vec<_> = pins.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(pins[0].distance_km, Some(0.0));
    }

    #[test]
    fn test_centroid_of_markers() {
        let sites = vec![site(1, "40,0", 0), site(2, "50,10", 0)];
        let c = centroid(&markers(&sites)).unwrap();
        assert!((c.lat() - 45.0).abs() < 1e-9);
        assert!((c.lng() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_of_nothing() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_default_center_is_valid() {
        let c = DEFAULT_MAP_CENTER;
        assert_eq!(Coordinates::new(c.lat(), c.lng()), Some(c));
    }
}
