pub mod error;
pub mod partition;
pub mod redis_cache;
pub mod session;

pub use error::{CacheError, Result};
pub use partition::SessionPartitioner;
pub use redis_cache::{session_cache_key, Cache, CacheConfig};
pub use session::{MemorySessionStore, RedisSessionStore, Session, SessionMap, SessionStore};
