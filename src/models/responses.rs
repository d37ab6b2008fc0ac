use crate::core::listing::PageWindow;
use crate::core::map::MapMarker;
use crate::core::Coordinates;
use crate::models::domain::{Campsite, CampsiteId};
use crate::services::CacheStats;
use serde::Serialize;

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache: CacheStats,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    /// Offending fields of a failed validation
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

/// One page of a paginated listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// `link` turns a page number into its URL
    pub fn new(window: PageWindow, results: Vec<T>, link: impl Fn(u32) -> String) -> Self {
        Self {
            count: window.count,
            current_page: window.number,
            total_pages: window.total_pages,
            next: window.next().map(&link),
            previous: window.previous().map(&link),
            results,
        }
    }
}

/// Response to a campsite write; image problems land in `warnings`
#[derive(Debug, Clone, Serialize)]
pub struct CampsiteWriteResponse {
    pub campsite: Campsite,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MySuggestionsResponse {
    pub suggestions: Vec<Campsite>,
    pub approved_count: u64,
    /// Whether the viewer's next suggestion skips moderation
    pub auto_approve_next: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapMode {
    All,
    Country,
    Radius,
}

/// A selectable country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountryOption {
    pub code: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CenterCampsite {
    pub id: CampsiteId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapResponse {
    pub mode: MapMode,
    pub center: Coordinates,
    pub center_campsite: Option<CenterCampsite>,
    /// Set in country mode when the code is a known country
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<CountryOption>,
    pub radius_km: Option<f64>,
    pub campsites: Vec<MapMarker>,
}
