use crate::core::Viewer;
use crate::models::CampsiteId;
use crate::routes::auth::require_user;
use crate::routes::campsites::visible_campsite;
use crate::routes::error::ApiError;
use crate::routes::AppState;
use actix_web::{web, HttpResponse};

/// Like or unlike a campsite
///
/// POST /api/v1/campsites/{id}/like
///
/// Response:
/// ```json
/// { "is_liked": true, "like_count": 12 }
/// ```
pub(super) async fn toggle_like(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<CampsiteId>,
) -> Result<HttpResponse, ApiError> {
    let user_id = require_user(&viewer)?.user_id;
    let id = path.into_inner();
    visible_campsite(&state, &viewer, id).await?;

    let like = state.store.toggle_like(user_id, id).await?;

    tracing::info!(
        "User {} {} campsite {} ({} likes)",
        user_id,
        if like.is_liked { "liked" } else { "unliked" },
        id,
        like.like_count
    );

    Ok(HttpResponse::Ok().json(like))
}

/// GET /api/v1/campsites/{id}/like-status
pub(super) async fn like_status(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<CampsiteId>,
) -> Result<HttpResponse, ApiError> {
    let user_id = require_user(&viewer)?.user_id;
    let id = path.into_inner();
    visible_campsite(&state, &viewer, id).await?;

    Ok(HttpResponse::Ok().json(state.store.like_state(user_id, id).await?))
}

/// GET /api/v1/campsites/liked
pub(super) async fn liked_campsites(
    state: web::Data<AppState>,
    viewer: Viewer,
) -> Result<HttpResponse, ApiError> {
    let user_id = require_user(&viewer)?.user_id;
    let campsites = state.store.liked_campsites(user_id).await?;

    tracing::debug!("User {} has {} liked campsites", user_id, campsites.len());

    Ok(HttpResponse::Ok().json(campsites))
}
