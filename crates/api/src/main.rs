// Subdomain API Server
// Serves tenant-scoped notes, members and sessions, one tenant per subdomain

mod config;
mod handlers;
mod routes;

use config::{Config, SessionBackend};
use dotenvy::dotenv;
use std::sync::Arc;
use subdomain_cache::{Cache, MemorySessionStore, RedisSessionStore, SessionStore};
use subdomain_database::{Database, Delegate, Record, Restriction, Restrictions};
use subdomain_models::{Member, Membership, Note};
use subdomain_tenant::{DatabaseResolver, TenantConfig, TenantResolver, TenantScope};
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub db: Database,
    pub resolver: Arc<dyn TenantResolver>,
    pub sessions: Arc<dyn SessionStore>,
    pub tenant_config: Arc<TenantConfig>,
}

impl AppState {
    pub fn scope(&self) -> TenantScope {
        TenantScope::new((*self.tenant_config).clone(), self.resolver.clone())
    }
}

/// Record types served per tenant, all owned through the `through` association
pub fn restrictions(through: &str) -> Restrictions {
    Restrictions::new()
        .with(Restriction::direct(Note::TABLE, through))
        .with(Restriction::direct(Membership::TABLE, through))
        .with(Restriction::delegated(
            Member::TABLE,
            through,
            Delegate::new(Membership::TABLE, "member_id"),
        ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,subdomain_api=debug,tower_http=debug".to_string()),
        )
        .init();

    tracing::info!("Starting Subdomain API Server");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::info!("Server: {}:{}", config.server_host, config.server_port);
    tracing::info!(
        "Tenants resolved by {}.{}, global identifiers: {:?}",
        config.database.tenant_table,
        config.tenant.by,
        config.tenant.global
    );

    // Initialize database
    tracing::info!("Connecting to database...");
    let db = Database::new(config.database.clone(), restrictions(&config.tenant.through)).await?;
    db.ping().await?;
    tracing::info!("Database connected");

    // Initialize session store
    let sessions: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Redis => {
            tracing::info!("Connecting to Redis...");
            let ttl = config.cache.session_ttl;
            let cache = Cache::new(config.cache.clone()).await?;
            cache.ping().await?;
            tracing::info!("Redis connected, sessions expire after {}s", ttl);
            Arc::new(RedisSessionStore::new(cache, ttl))
        }
        SessionBackend::Memory => {
            tracing::info!("Using in-memory session store");
            Arc::new(MemorySessionStore::new())
        }
    };

    let resolver = Arc::new(DatabaseResolver::from_config(db.clone(), &config.tenant));

    let state = Arc::new(AppState {
        db: db.clone(),
        resolver,
        sessions,
        tenant_config: Arc::new(config.tenant.clone()),
    });

    let app = routes::create_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server ready at http://{}", addr);

    axum::serve(listener, app).await?;

    db.close().await;
    Ok(())
}
