use serde::Deserialize;
use std::time::Duration;

/// Tenant resolution settings.
///
/// Loaded from `TENANT_*` environment variables:
/// `TENANT_THROUGH`, `TENANT_KEY_COLUMN` (or `TENANT_BY`),
/// `TENANT_GLOBAL` (comma separated), `TENANT_CACHE_TTL_SECS`,
/// `TENANT_CACHE_CAPACITY`. The tenant table (`TENANT_TABLE`) belongs to
/// `DatabaseConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    /// Tenant association name; restricted records reference `<through>_id`
    pub through: String,
    /// Unique key column identifiers are matched against
    #[serde(alias = "key_column")]
    pub by: String,
    /// Identifiers served without a tenant
    pub global: Vec<String>,
    /// Cache positive lookups for this long; no caching when unset
    pub cache_ttl_secs: Option<u64>,
    pub cache_capacity: u64,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            through: "tenant".to_string(),
            by: "code".to_string(),
            global: Vec::new(),
            cache_ttl_secs: None,
            cache_capacity: 1_000,
        }
    }
}

impl TenantConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("TENANT")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("global"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn with_global<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global.extend(identifiers.into_iter().map(Into::into));
        self
    }

    pub fn with_key_column(mut self, by: impl Into<String>) -> Self {
        self.by = by.into();
        self
    }

    /// Exact membership in the global allow-list
    pub fn is_global(&self, identifier: &str) -> bool {
        self.global.iter().any(|g| g == identifier)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}
