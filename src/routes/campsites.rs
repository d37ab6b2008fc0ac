use crate::core::{should_auto_approve, ListingQuery, PageWindow, Viewer};
use crate::models::{
    Campsite, CampsiteForm, CampsiteId, CampsiteWriteResponse, CountryOption, ImageUpload,
    ListCampsitesParams, MySuggestionsResponse, Page, EUROPEAN_COUNTRIES,
};
use crate::routes::auth::{require_elevated, require_user};
use crate::routes::error::ApiError;
use crate::routes::{likes, map, AppState};
use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

/// Configure all campsite routes
///
/// Fixed paths are registered before `/{id}` so they win the match.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/countries", web::get().to(list_countries));
    cfg.service(
        web::scope("/campsites")
            .route("", web::get().to(list_campsites))
            .route("", web::post().to(create_campsite))
            .route("/suggest", web::post().to(suggest_campsite))
            .route("/pending", web::get().to(pending_campsites))
            .route("/suggestions", web::get().to(all_suggestions))
            .route("/mine", web::get().to(my_suggestions))
            .route("/liked", web::get().to(likes::liked_campsites))
            .route("/map", web::get().to(map::map_view))
            .route("/{id}", web::get().to(get_campsite))
            .route("/{id}", web::put().to(update_campsite))
            .route("/{id}", web::delete().to(delete_campsite))
            .route("/{id}/toggle-approval", web::post().to(toggle_approval))
            .route("/{id}/like", web::post().to(likes::toggle_like))
            .route("/{id}/like-status", web::get().to(likes::like_status)),
    );
}

/// Load a campsite the viewer is allowed to see
///
/// Hidden campsites are reported as missing rather than forbidden.
pub(super) async fn visible_campsite(
    state: &AppState,
    viewer: &Viewer,
    id: CampsiteId,
) -> Result<Campsite, ApiError> {
    state
        .store
        .get_campsite(id)
        .await?
        .filter(|campsite| viewer.can_view(campsite))
        .ok_or_else(|| ApiError::not_found(format!("campsite {}", id)))
}

/// Upload an attached image; failures become warnings
async fn upload_image(
    state: &AppState,
    image: Option<ImageUpload>,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let image = image?;

    let Some(images) = &state.images else {
        tracing::warn!("Image {} dropped: image hosting not configured", image.file_name);
        warnings.push("Image hosting is not configured; saved without image".to_string());
        return None;
    };

    match images.upload_base64(&image.file_name, &image.data).await {
        Ok(url) => {
            tracing::info!("Uploaded image {} -> {}", image.file_name, url);
            Some(url)
        }
        Err(e) => {
            tracing::warn!("Image upload failed for {}: {}", image.file_name, e);
            warnings.push(format!("Image upload failed: {}", e));
            None
        }
    }
}

/// Countries a campsite can be listed under, by name
///
/// GET /api/v1/countries
async fn list_countries() -> HttpResponse {
    let mut countries: Vec<CountryOption> = EUROPEAN_COUNTRIES
        .iter()
        .map(|&(code, name)| CountryOption { code, name })
        .collect();
    countries.sort_by(|a, b| a.name.cmp(b.name));
    HttpResponse::Ok().json(countries)
}

/// Paginated campsite listing
///
/// GET /api/v1/campsites?country=FR&search=lake&page=2
async fn list_campsites(
    state: web::Data<AppState>,
    viewer: Viewer,
    params: web::Query<ListCampsitesParams>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let params = params.into_inner();
    let query = ListingQuery::for_viewer(&viewer)
        .with_country(params.country.as_deref())
        .with_search(params.search.as_deref());

    let count = state.store.count_listing(&query).await?;
    let window = PageWindow::resolve(count, state.settings.listing.page_size, params.page.as_deref());
    let results = state.store.fetch_listing(&query, Some(window)).await?;

    tracing::debug!(
        "Listing page {}/{} ({} campsites) for {:?}",
        window.number,
        window.total_pages,
        count,
        viewer.user_id()
    );

    let path = req.path().to_string();
    let page = Page::new(window, results, |n| format!("{}{}", path, query.page_query(n)));
    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/v1/campsites/{id}
async fn get_campsite(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<CampsiteId>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let listed = state
        .store
        .get_listed(id, viewer.user_id())
        .await?
        .filter(|listed| viewer.can_view(&listed.campsite))
        .ok_or_else(|| ApiError::not_found(format!("campsite {}", id)))?;

    Ok(HttpResponse::Ok().json(listed))
}

/// Staff create; always approved
///
/// POST /api/v1/campsites
async fn create_campsite(
    state: web::Data<AppState>,
    viewer: Viewer,
    form: web::Json<CampsiteForm>,
) -> Result<HttpResponse, ApiError> {
    let user_id = require_elevated(&viewer)?.user_id;
    let mut form = form.into_inner();
    form.validate()?;

    let mut warnings = Vec::new();
    let image_url = upload_image(&state, form.image.take(), &mut warnings).await;

    let campsite = state
        .store
        .create_campsite(form.into_new_campsite(image_url, true, Some(user_id), None))
        .await?;

    tracing::info!("Campsite {} created by staff user {}", campsite.id, user_id);

    Ok(HttpResponse::Created().json(CampsiteWriteResponse { campsite, warnings }))
}

/// User suggestion; auto-approved for trusted suggesters
///
/// POST /api/v1/campsites/suggest
async fn suggest_campsite(
    state: web::Data<AppState>,
    viewer: Viewer,
    form: web::Json<CampsiteForm>,
) -> Result<HttpResponse, ApiError> {
    let user_id = require_user(&viewer)?.user_id;
    let mut form = form.into_inner();
    form.validate()?;

    let approved_count = state.store.count_approved_suggestions(user_id).await?;
    let approved = should_auto_approve(&viewer, approved_count, state.settings.approval.threshold);

    let mut warnings = Vec::new();
    let image_url = upload_image(&state, form.image.take(), &mut warnings).await;

    // Non-staff suggesters never set the premium flag
    if !viewer.is_elevated() {
        form.is_premium = None;
    }

    let campsite = state
        .store
        .create_campsite(form.into_new_campsite(image_url, approved, Some(user_id), Some(user_id)))
        .await?;

    tracing::info!(
        "Campsite {} suggested by user {} (approved suggestions: {}, auto-approved: {})",
        campsite.id,
        user_id,
        approved_count,
        approved
    );

    Ok(HttpResponse::Created().json(CampsiteWriteResponse { campsite, warnings }))
}

/// PUT /api/v1/campsites/{id}
async fn update_campsite(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<CampsiteId>,
    form: web::Json<CampsiteForm>,
) -> Result<HttpResponse, ApiError> {
    require_user(&viewer)?;
    let id = path.into_inner();
    let existing = visible_campsite(&state, &viewer, id).await?;
    if !viewer.can_edit(&existing) {
        return Err(ApiError::Forbidden("Only the owner or staff may edit this campsite".into()));
    }

    let mut form = form.into_inner();
    form.validate()?;

    let mut warnings = Vec::new();
    let image_url = upload_image(&state, form.image.take(), &mut warnings).await;
    let changes = form.into_changes(image_url, viewer.is_elevated());

    let campsite = state
        .store
        .update_campsite(id, &changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("campsite {}", id)))?;

    tracing::info!("Campsite {} updated by user {:?}", id, viewer.user_id());

    Ok(HttpResponse::Ok().json(CampsiteWriteResponse { campsite, warnings }))
}

/// DELETE /api/v1/campsites/{id}
async fn delete_campsite(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<CampsiteId>,
) -> Result<HttpResponse, ApiError> {
    require_user(&viewer)?;
    let id = path.into_inner();
    let existing = visible_campsite(&state, &viewer, id).await?;
    if !viewer.can_edit(&existing) {
        return Err(ApiError::Forbidden("Only the owner or staff may delete this campsite".into()));
    }

    if !state.store.delete_campsite(id).await? {
        return Err(ApiError::not_found(format!("campsite {}", id)));
    }

    tracing::info!("Campsite {} deleted by user {:?}", id, viewer.user_id());

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/v1/campsites/{id}/toggle-approval
async fn toggle_approval(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<CampsiteId>,
) -> Result<HttpResponse, ApiError> {
    let staff_id = require_elevated(&viewer)?.user_id;
    let id = path.into_inner();
    let existing = state
        .store
        .get_campsite(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("campsite {}", id)))?;

    let campsite = state
        .store
        .set_approval(id, !existing.is_approved)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("campsite {}", id)))?;

    tracing::info!(
        "Campsite {} approval set to {} by staff user {}",
        id,
        campsite.is_approved,
        staff_id
    );

    Ok(HttpResponse::Ok().json(campsite))
}

/// GET /api/v1/campsites/pending
async fn pending_campsites(
    state: web::Data<AppState>,
    viewer: Viewer,
) -> Result<HttpResponse, ApiError> {
    require_elevated(&viewer)?;
    Ok(HttpResponse::Ok().json(state.store.pending_campsites().await?))
}

/// GET /api/v1/campsites/suggestions
async fn all_suggestions(
    state: web::Data<AppState>,
    viewer: Viewer,
) -> Result<HttpResponse, ApiError> {
    require_elevated(&viewer)?;
    Ok(HttpResponse::Ok().json(state.store.suggestions(None).await?))
}

/// GET /api/v1/campsites/mine
async fn my_suggestions(
    state: web::Data<AppState>,
    viewer: Viewer,
) -> Result<HttpResponse, ApiError> {
    let user_id = require_user(&viewer)?.user_id;
    let suggestions = state.store.suggestions(Some(user_id)).await?;
    let approved_count = state.store.count_approved_suggestions(user_id).await?;

    Ok(HttpResponse::Ok().json(MySuggestionsResponse {
        suggestions,
        approved_count,
        auto_approve_next: should_auto_approve(
            &viewer,
            approved_count,
            state.settings.approval.threshold,
        ),
    }))
}
