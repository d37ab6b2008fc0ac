use crate::core::likes::LikeState;
use crate::core::listing::{ListingQuery, PageWindow};
use crate::models::{
    Campsite, CampsiteChanges, CampsiteId, ListedCampsite, NewCampsite, Product, ProductDraft,
    ProductId, UserId,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when reading or writing the entity store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Integrity violation: {0}")]
    Integrity(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent entity store behind the HTTP handlers
///
/// Implemented by [`PostgresStore`](super::PostgresStore) for production and
/// [`MemoryStore`](super::MemoryStore) for development and tests. Lookups of
/// missing rows return `Ok(None)`/`Ok(false)`; `NotFound` is reserved for
/// operations that cannot proceed without their target.
#[async_trait]
pub trait CampsiteStore: Send + Sync {
    async fn health_check(&self) -> StoreResult<bool>;

    /// Number of campsites the listing query admits
    async fn count_listing(&self, query: &ListingQuery) -> StoreResult<u64>;

    /// Annotated campsites in listing order; the whole result when `window`
    /// is `None`
    async fn fetch_listing(
        &self,
        query: &ListingQuery,
        window: Option<PageWindow>,
    ) -> StoreResult<Vec<ListedCampsite>>;

    async fn get_campsite(&self, id: CampsiteId) -> StoreResult<Option<Campsite>>;

    /// One campsite annotated with its like count and the viewer's like
    async fn get_listed(
        &self,
        id: CampsiteId,
        viewer: Option<UserId>,
    ) -> StoreResult<Option<ListedCampsite>>;

    async fn create_campsite(&self, new: NewCampsite) -> StoreResult<Campsite>;

    async fn update_campsite(
        &self,
        id: CampsiteId,
        changes: &CampsiteChanges,
    ) -> StoreResult<Option<Campsite>>;

    /// Hard delete; the campsite's likes go with it
    async fn delete_campsite(&self, id: CampsiteId) -> StoreResult<bool>;

    async fn set_approval(&self, id: CampsiteId, approved: bool) -> StoreResult<Option<Campsite>>;

    /// Unapproved campsites, newest first
    async fn pending_campsites(&self) -> StoreResult<Vec<Campsite>>;

    /// Suggestions by one user, or by anyone when `suggested_by` is `None`,
    /// newest first
    async fn suggestions(&self, suggested_by: Option<UserId>) -> StoreResult<Vec<Campsite>>;

    async fn count_approved_suggestions(&self, user_id: UserId) -> StoreResult<u64>;

    /// Atomically like or unlike; `NotFound` when the campsite is missing
    async fn toggle_like(&self, user_id: UserId, campsite_id: CampsiteId) -> StoreResult<LikeState>;

    async fn like_state(&self, user_id: UserId, campsite_id: CampsiteId) -> StoreResult<LikeState>;

    /// Campsites the user liked, most recent like first
    async fn liked_campsites(&self, user_id: UserId) -> StoreResult<Vec<Campsite>>;

    /// Featured products ordered by name
    async fn featured_products(&self) -> StoreResult<Vec<Product>>;

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    async fn create_product(
        &self,
        draft: ProductDraft,
        created_by: Option<UserId>,
    ) -> StoreResult<Product>;

    async fn update_product(&self, id: ProductId, draft: ProductDraft)
        -> StoreResult<Option<Product>>;

    async fn delete_product(&self, id: ProductId) -> StoreResult<bool>;
}
