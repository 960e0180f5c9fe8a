//! Document store implementations.

pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use memory::MemoryDocumentStore;
#[cfg(feature = "redis-backend")]
pub use self::redis::RedisDocumentStore;
