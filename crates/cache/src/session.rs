//! Request-side session data and the stores that persist it.
//!
//! A `Session` is loaded once per request, mutated in memory and written
//! back with `SessionStore::save`. `reset` swaps the session id; the old id
//! is destroyed on the next save.

use crate::error::Result;
use crate::redis_cache::{session_cache_key, Cache};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type SessionMap = serde_json::Map<String, Value>;

fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    data: SessionMap,
    discarded: Vec<String>,
}

impl Session {
    /// Fresh, empty session with a new id
    pub fn new() -> Self {
        Self::load(new_session_id(), SessionMap::new())
    }

    pub fn load(id: impl Into<String>, data: SessionMap) -> Self {
        Self {
            id: id.into(),
            data,
            discarded: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &SessionMap {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut SessionMap {
        &mut self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Drop all data and move to a new session id
    pub fn reset(&mut self) {
        let old_id = std::mem::replace(&mut self.id, new_session_id());
        self.discarded.push(old_id);
        self.data.clear();
    }

    /// Ids invalidated by `reset` since the last save
    pub fn take_discarded(&mut self) -> Vec<String> {
        std::mem::take(&mut self.discarded)
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SessionMap>>;

    async fn store(&self, id: &str, data: &SessionMap) -> Result<()>;

    async fn destroy(&self, id: &str) -> Result<()>;

    /// Persist the session and destroy ids it was reset away from
    async fn save(&self, session: &mut Session) -> Result<()> {
        for id in session.take_discarded() {
            self.destroy(&id).await?;
        }
        self.store(session.id(), session.data()).await
    }

    /// Load `id`, or start a fresh session when unknown or absent
    async fn open(&self, id: Option<&str>) -> Result<Session> {
        if let Some(id) = id {
            if let Some(data) = self.load(id).await? {
                return Ok(Session::load(id, data));
            }
            tracing::debug!("Unknown session {}, starting a new one", id);
        }
        Ok(Session::new())
    }
}

/// Process-local session store
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionMap>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionMap>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn store(&self, id: &str, data: &SessionMap) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(id.to_string(), data.clone());
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

/// Session store backed by Redis, entries expire after `ttl` seconds
#[derive(Clone)]
pub struct RedisSessionStore {
    cache: Cache,
    ttl: u64,
}

impl RedisSessionStore {
    pub fn new(cache: Cache, ttl: u64) -> Self {
        Self { cache, ttl }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionMap>> {
        self.cache.get(&session_cache_key(id)).await
    }

    async fn store(&self, id: &str, data: &SessionMap) -> Result<()> {
        self.cache
            .set(&session_cache_key(id), data, Some(self.ttl))
            .await
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        self.cache.delete(&session_cache_key(id)).await
    }
}
