//! Per-tenant partitioning of a session.
//!
//! With a partition key, reads and writes address the sub-map stored under
//! that key in the session; without one they address the session itself.
//! Partitions of other tenants and global keys are never touched, including
//! across `reset`. A global key that collides with a partition key and
//! does not hold a map is left alone: writes through that partition fail
//! with [`CacheError::PartitionConflict`].

use crate::error::{CacheError, Result};
use crate::session::{Session, SessionMap};
use serde_json::Value;

pub struct SessionPartitioner<'a> {
    session: &'a mut Session,
    partition: Option<String>,
}

impl<'a> SessionPartitioner<'a> {
    pub fn new(session: &'a mut Session, partition: Option<String>) -> Self {
        Self { session, partition }
    }

    pub fn partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    /// Map addressed by reads and writes, created on first use
    pub fn data(&mut self) -> Result<&mut SessionMap> {
        let Some(key) = &self.partition else {
            return Ok(self.session.data_mut());
        };

        let slot = self
            .session
            .data_mut()
            .entry(key.clone())
            .or_insert_with(|| Value::Object(SessionMap::new()));

        match slot {
            Value::Object(map) => Ok(map),
            _ => {
                tracing::warn!("Session key {} holds a global value, not partitioning into it", key);
                Err(CacheError::PartitionConflict(key.clone()))
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match &self.partition {
            None => self.session.get(key),
            Some(partition) => self.session.get(partition)?.as_object()?.get(key),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
        Ok(self.data()?.insert(key.into(), value))
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        Ok(self.data()?.remove(key))
    }

    /// Regenerate the session, keeping every partition but our own.
    ///
    /// Without a partition this is a plain session reset.
    pub fn reset(&mut self) {
        let Some(own) = self.partition.clone() else {
            self.session.reset();
            return;
        };

        let preserved: Vec<(String, Value)> = self
            .session
            .data()
            .iter()
            .filter(|(key, value)| **key != own || !value.is_object())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        self.session.reset();
        for (key, value) in preserved {
            self.session.insert(key, value);
        }

        tracing::debug!("Reset session partition {}", own);
    }
}
