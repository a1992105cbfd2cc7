// Service exports
pub mod appwrite;
pub mod auth;
pub mod cache;
pub mod catalog;
pub mod memory;
pub mod postgres;
pub mod store;

pub use appwrite::{AppwriteClient, AppwriteCollections, AppwriteError};
pub use auth::{AccountResolver, AnonymousOnly, JwtAccountResolver, SessionClaims};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use catalog::ProfileCatalog;
pub use memory::{MemoryCatalog, MemoryStore};
pub use postgres::{PostgresError, PostgresStore};
pub use store::{GameStore, VoteCommit, VoteReceipt};
