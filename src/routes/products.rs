use crate::core::Viewer;
use crate::models::{Product, ProductForm, ProductId};
use crate::routes::auth::require_super_admin;
use crate::routes::error::ApiError;
use crate::routes::AppState;
use crate::services::CacheKey;
use actix_web::{web, HttpResponse};
use validator::Validate;

/// Configure product catalog routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .route("", web::get().to(featured_products))
            .route("", web::post().to(create_product))
            .route("/{id}", web::get().to(get_product))
            .route("/{id}", web::put().to(update_product))
            .route("/{id}", web::delete().to(delete_product)),
    );
}

async fn invalidate_featured(state: &AppState) {
    state.cache.delete(&CacheKey::featured_products()).await;
}

/// Featured products, served from cache when warm
///
/// GET /api/v1/products
async fn featured_products(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let key = CacheKey::featured_products();

    match state.cache.get::<Vec<Product>>(&key).await {
        Ok(Some(products)) => return Ok(HttpResponse::Ok().json(products)),
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
    }

    let products = state.store.featured_products().await?;
    if let Err(e) = state.cache.set(&key, &products).await {
        tracing::warn!("Cache write failed for {}: {}", key, e);
    }

    Ok(HttpResponse::Ok().json(products))
}

/// GET /api/v1/products/{id}
async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<ProductId>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("product {}", id)))?;

    Ok(HttpResponse::Ok().json(product))
}

/// POST /api/v1/products
async fn create_product(
    state: web::Data<AppState>,
    viewer: Viewer,
    form: web::Json<ProductForm>,
) -> Result<HttpResponse, ApiError> {
    let user_id = require_super_admin(&viewer)?.user_id;
    let form = form.into_inner();
    form.validate()?;

    let product = state.store.create_product(form.into(), Some(user_id)).await?;
    invalidate_featured(&state).await;

    tracing::info!("Product {} created by user {}", product.id, user_id);

    Ok(HttpResponse::Created().json(product))
}

/// PUT /api/v1/products/{id}
async fn update_product(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<ProductId>,
    form: web::Json<ProductForm>,
) -> Result<HttpResponse, ApiError> {
    require_super_admin(&viewer)?;
    let id = path.into_inner();
    let form = form.into_inner();
    form.validate()?;

    let product = state
        .store
        .update_product(id, form.into())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("product {}", id)))?;
    invalidate_featured(&state).await;

    Ok(HttpResponse::Ok().json(product))
}

/// DELETE /api/v1/products/{id}
async fn delete_product(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<ProductId>,
) -> Result<HttpResponse, ApiError> {
    require_super_admin(&viewer)?;
    let id = path.into_inner();

    if !state.store.delete_product(id).await? {
        return Err(ApiError::not_found(format!("product {}", id)));
    }
    invalidate_featured(&state).await;

    tracing::info!("Product {} deleted", id);

    Ok(HttpResponse::NoContent().finish())
}
