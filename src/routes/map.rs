use crate::core::map::{centroid, markers, radius_markers};
use crate::core::{ListingQuery, Locate, Viewer};
use crate::models::{
    country_name, normalize_country, CenterCampsite, CountryOption, MapMode, MapParams, MapResponse,
};
use crate::routes::error::ApiError;
use crate::routes::AppState;
use actix_web::{web, HttpResponse};

/// Campsite map
///
/// GET /api/v1/campsites/map?center=12&radius_km=50
/// GET /api/v1/campsites/map?country=HR
///
/// `center` wins over `country`. Campsites without a usable location are
/// left off the map.
pub(super) async fn map_view(
    state: web::Data<AppState>,
    viewer: Viewer,
    params: web::Query<MapParams>,
) -> Result<HttpResponse, ApiError> {
    let params = params.into_inner();
    let query = ListingQuery::for_viewer(&viewer);

    if let Some(center_id) = params.center {
        let center = state
            .store
            .get_listed(center_id, viewer.user_id())
            .await?
            .filter(|listed| viewer.can_view(&listed.campsite))
            .ok_or_else(|| ApiError::not_found(format!("campsite {}", center_id)))?;

        let origin = center.coordinates().ok_or_else(|| ApiError::BadRequest {
            error: "invalid_location",
            message: format!("Campsite {} has no valid location", center_id),
        })?;

        let radius_km = params
            .radius_km
            .unwrap_or(state.settings.map.default_radius_km);
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(ApiError::BadRequest {
                error: "invalid_radius",
                message: "radius_km must be a non-negative number".to_string(),
            });
        }

        let sites = state.store.fetch_listing(&query, None).await?;
        let campsites = radius_markers(&origin, radius_km, &sites);

        tracing::debug!(
            "Map around campsite {}: {} of {} campsites within {} km",
            center_id,
            campsites.len(),
            sites.len(),
            radius_km
        );

        return Ok(HttpResponse::Ok().json(MapResponse {
            mode: MapMode::Radius,
            center: origin,
            center_campsite: Some(CenterCampsite {
                id: center.campsite.id,
                name: center.campsite.name,
            }),
            country: None,
            radius_km: Some(radius_km),
            campsites,
        }));
    }

    let query = query.with_country(params.country.as_deref());
    let mode = if query.country.is_some() {
        MapMode::Country
    } else {
        MapMode::All
    };
    let country = query.country.as_deref().and_then(|code| {
        Some(CountryOption {
            code: normalize_country(code)?,
            name: country_name(code)?,
        })
    });

    let sites = state.store.fetch_listing(&query, None).await?;
    let campsites = markers(&sites);
    let center = centroid(&campsites).unwrap_or_else(|| state.settings.map.default_center());

    Ok(HttpResponse::Ok().json(MapResponse {
        mode,
        center,
        center_campsite: None,
        country,
        radius_km: None,
        campsites,
    }))
}
