//! Identifier to tenant lookup.
//!
//! Lookups are exact-string matches on the configured key column: no case
//! folding, no prefix matching. An unknown identifier is `Ok(None)`; the
//! caller decides whether that is fatal.

use crate::config::TenantConfig;
use crate::error::Result;
use async_trait::async_trait;
use moka::future::Cache;
use subdomain_database::Database;
use subdomain_models::Tenant;

#[async_trait]
pub trait TenantResolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<Option<Tenant>>;

    /// Every known tenant, for batch work
    async fn all(&self) -> Result<Vec<Tenant>>;

    /// Forget anything remembered about `identifier`
    async fn invalidate(&self, _identifier: &str) {}
}

/// Looks tenants up in the tenant table, optionally caching hits
#[derive(Clone)]
pub struct DatabaseResolver {
    db: Database,
    by: String,
    cache: Option<Cache<String, Tenant>>,
}

impl DatabaseResolver {
    pub fn new(db: Database, by: impl Into<String>) -> Self {
        Self {
            db,
            by: by.into(),
            cache: None,
        }
    }

    pub fn from_config(db: Database, config: &TenantConfig) -> Self {
        let resolver = Self::new(db, config.by.clone());
        match config.cache_ttl() {
            Some(ttl) => {
                let cache = Cache::builder()
                    .max_capacity(config.cache_capacity)
                    .time_to_live(ttl)
                    .build();
                Self {
                    cache: Some(cache),
                    ..resolver
                }
            }
            None => resolver,
        }
    }

    pub fn key_column(&self) -> &str {
        &self.by
    }
}

#[async_trait]
impl TenantResolver for DatabaseResolver {
    async fn resolve(&self, identifier: &str) -> Result<Option<Tenant>> {
        if let Some(cache) = &self.cache {
            if let Some(tenant) = cache.get(identifier).await {
                return Ok(Some(tenant));
            }
        }

        let tenant = self.db.tenants().find_by(&self.by, identifier).await?;

        match (&tenant, &self.cache) {
            (Some(found), Some(cache)) => {
                cache.insert(identifier.to_string(), found.clone()).await;
            }
            (None, _) => tracing::debug!("No tenant with {} = {}", self.by, identifier),
            _ => {}
        }

        Ok(tenant)
    }

    async fn all(&self) -> Result<Vec<Tenant>> {
        Ok(self.db.tenants().list().await?)
    }

    /// Drop a cached lookup, e.g. after the tenant's key changed
    async fn invalidate(&self, identifier: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(identifier).await;
        }
    }
}

/// Fixed set of tenants, for tests and single-process tools
#[derive(Debug, Clone)]
pub struct StaticResolver {
    by: String,
    tenants: Vec<Tenant>,
}

impl StaticResolver {
    pub fn new(by: impl Into<String>, tenants: Vec<Tenant>) -> Self {
        Self {
            by: by.into(),
            tenants,
        }
    }
}

#[async_trait]
impl TenantResolver for StaticResolver {
    async fn resolve(&self, identifier: &str) -> Result<Option<Tenant>> {
        Ok(self
            .tenants
            .iter()
            .find(|tenant| tenant.attribute(&self.by).as_deref() == Some(identifier))
            .cloned())
    }

    async fn all(&self) -> Result<Vec<Tenant>> {
        Ok(self.tenants.clone())
    }
}
