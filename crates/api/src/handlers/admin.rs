//! Tenant administration, served only without an active tenant

use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use subdomain_models::{NewTenant, Note, Tenant, UpdateTenant};
use subdomain_tenant::{each_tenant, Result, TenantScopedExt};
use tokio::sync::Mutex;
use uuid::Uuid;

/// GET /admin/tenants
pub async fn list_tenants(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tenant>>> {
    Ok(Json(state.db.tenants().list().await?))
}

/// POST /admin/tenants
pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewTenant>,
) -> Result<(StatusCode, Json<Tenant>)> {
    let tenant = state.db.tenants().create(&request).await?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

/// PATCH /admin/tenants/:id
pub async fn update_tenant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTenant>,
) -> Result<Json<Tenant>> {
    let tenants = state.db.tenants();
    let before = tenants.find_by_id(id).await?;
    let after = tenants.update(id, &request).await?;

    let by = &state.tenant_config.by;
    if let Some(key) = before.attribute(by) {
        state.resolver.invalidate(&key).await;
    }

    Ok(Json(after))
}

#[derive(Debug, Serialize)]
pub struct TenantNoteCount {
    pub tenant: String,
    pub notes: usize,
}

/// GET /admin/notes/summary
///
/// Visits every tenant in turn with that tenant active.
pub async fn notes_summary(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TenantNoteCount>>> {
    let tenants = state.resolver.all().await?;
    let counts = Mutex::new(Vec::with_capacity(tenants.len()));

    each_tenant(tenants, |tenant| {
        let (db, counts) = (&state.db, &counts);
        async move {
            let notes = db.current_scope().all::<Note>().await?;
            counts.lock().await.push(TenantNoteCount {
                tenant: tenant.code.clone(),
                notes: notes.len(),
            });
            Ok::<_, subdomain_tenant::TenantError>(())
        }
    })
    .await?;

    Ok(Json(counts.into_inner()))
}
