use serde::Serialize;
use std::fmt;

/// A validated (latitude, longitude) pair in degrees
///
/// Only constructible through the validating constructors, so holding a
/// `Coordinates` means both components are finite and in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    /// Validate a numeric pair
    ///
    /// Returns `None` for NaN/infinite values, latitude outside [-90, 90]
    /// or longitude outside [-180, 180].
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }

    /// For compile-time constants already known to be in range
    pub(crate) const fn new_unchecked(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Parse a two-field textual pair
    pub fn from_parts(lat: &str, lng: &str) -> Option<Self> {
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        Self::new(lat, lng)
    }

    /// Parse a stored "lat,lng" location string
    pub fn parse(location: &str) -> Option<Self> {
        let (lat, lng) = location.split_once(',')?;
        // "1,2,3" is not a coordinate pair
        if lng.contains(',') {
            return None;
        }
        Self::from_parts(lat, lng)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl From<Coordinates> for geo::Point<f64> {
    fn from(c: Coordinates) -> Self {
        // geo uses x = longitude, y = latitude
        geo::Point::new(c.lng, c.lat)
    }
}

/// Anything that may resolve to a location
///
/// Un-locatable values yield `None` so callers skip them instead of failing.
pub trait Locate {
    fn coordinates(&self) -> Option<Coordinates>;
}

impl Locate for Coordinates {
    fn coordinates(&self) -> Option<Coordinates> {
        Some(*self)
    }
}

impl Locate for str {
    fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::parse(self)
    }
}

impl Locate for String {
    fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::parse(self)
    }
}

impl Locate for (f64, f64) {
    fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.0, self.1)
    }
}

impl Locate for [f64; 2] {
    fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self[0], self[1])
    }
}

impl Locate for (&str, &str) {
    fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.0, self.1)
    }
}

impl<T: Locate + ?Sized> Locate for &T {
    fn coordinates(&self) -> Option<Coordinates> {
        (**self).coordinates()
    }
}
