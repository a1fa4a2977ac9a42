use subdomain_cache::CacheConfig;
use subdomain_database::DatabaseConfig;
use subdomain_tenant::TenantConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Redis,
}

impl SessionBackend {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "redis" => Self::Redis,
            _ => Self::Memory,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub tenant: TenantConfig,
    pub session_backend: SessionBackend,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            tenant: TenantConfig::from_env()?,
            session_backend: std::env::var("SESSION_BACKEND")
                .map(|v| SessionBackend::parse(&v))
                .unwrap_or(SessionBackend::Memory),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_backend_parse() {
        assert_eq!(SessionBackend::parse("redis"), SessionBackend::Redis);
        assert_eq!(SessionBackend::parse("Redis"), SessionBackend::Redis);
        assert_eq!(SessionBackend::parse("memory"), SessionBackend::Memory);
        assert_eq!(SessionBackend::parse("anything"), SessionBackend::Memory);
    }
}
