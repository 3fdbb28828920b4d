//! Change feed implementations.

mod memory;

pub use memory::InMemoryChangeFeed;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisChangeFeed;
