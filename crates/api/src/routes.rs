use crate::handlers;
use crate::AppState;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch},
    Router,
};
use std::sync::Arc;
use subdomain_tenant::{global_only, scope_tenant, tenant_required};

pub fn create_router(state: Arc<AppState>) -> Router {
    // Only reachable on a tenant subdomain
    let tenant_routes = Router::new()
        .route("/notes", get(handlers::notes::list_notes).post(handlers::notes::create_note))
        .route(
            "/notes/:id",
            get(handlers::notes::get_note).delete(handlers::notes::delete_note),
        )
        .route_layer(from_fn(tenant_required));

    // Only reachable on a global host
    let admin_routes = Router::new()
        .route(
            "/tenants",
            get(handlers::admin::list_tenants).post(handlers::admin::create_tenant),
        )
        .route("/tenants/:id", patch(handlers::admin::update_tenant))
        .route("/notes/summary", get(handlers::admin::notes_summary))
        .route_layer(from_fn(global_only));

    Router::new()
        .route(
            "/members",
            get(handlers::members::list_members).post(handlers::members::create_member),
        )
        .route("/session", delete(handlers::session::reset))
        .route(
            "/session/:key",
            get(handlers::session::get_value)
                .put(handlers::session::put_value)
                .delete(handlers::session::delete_value),
        )
        .merge(tenant_routes)
        .nest("/admin", admin_routes)
        .layer(from_fn_with_state(state.scope(), scope_tenant))
        // Health check, outside tenant resolution
        .route("/health", get(handlers::health::health_check))
        .with_state(state)
}
