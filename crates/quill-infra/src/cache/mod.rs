//! Cache implementations - Redis and in-memory fallback.

mod admin;
mod memory;

pub use admin::CachedAdminDirectory;
pub use memory::InMemoryCache;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisCache, RedisConfig};
