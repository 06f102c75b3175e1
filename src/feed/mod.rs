//! Activity feed ingestion: source schemas, the loader/cleaner, and the
//! session feed cache.

pub mod cache;
pub mod loader;
pub mod schema;

pub use cache::{CachedFeed, CacheMetrics, FeedCache, SourceKey};
pub use loader::{FeedLoader, LoadReport};
pub use schema::{DistanceUnit, DurationUnit, FeedSchema, PaceColumn, PaceEncoding};
