// Service exports
pub mod cache;
pub mod postgres;

pub use cache::{CacheManager, CacheKey, CacheError, CacheStats};
pub use postgres::{PostgresClient, PostgresError, SubmittedResponse};
