// Service exports
pub mod cache;
pub mod imagekit;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use imagekit::{transformed_url, ImageHostError, ImageKitClient};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::{CampsiteStore, StoreError, StoreResult};
