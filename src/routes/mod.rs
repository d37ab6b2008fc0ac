// Route exports
pub mod auth;
pub mod campsites;
pub mod error;
pub mod health;
pub mod likes;
pub mod map;
pub mod products;

use crate::config::Settings;
use crate::services::{CacheManager, CampsiteStore, ImageKitClient};
use actix_web::web;
use auth::TokenKeys;
use std::sync::Arc;
use std::time::Duration;

pub use error::ApiError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CampsiteStore>,
    /// Absent when image hosting is not configured
    pub images: Option<Arc<ImageKitClient>>,
    pub cache: Arc<CacheManager>,
    pub tokens: Arc<TokenKeys>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        store: Arc<dyn CampsiteStore>,
        images: Option<Arc<ImageKitClient>>,
    ) -> Self {
        let cache = CacheManager::new(
            settings.cache.capacity,
            Duration::from_secs(settings.cache.ttl_secs),
        );
        let tokens = TokenKeys::new(settings.auth.jwt_secret.as_bytes(), settings.auth.leeway_secs);

        Self {
            store,
            images,
            cache: Arc::new(cache),
            tokens: Arc::new(tokens),
            settings: Arc::new(settings),
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(error::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(error::handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(error::handle_path_error))
            .configure(health::configure)
            .configure(campsites::configure)
            .configure(products::configure),
    );
}
