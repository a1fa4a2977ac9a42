use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use subdomain_database::DatabaseError;
use subdomain_models::{Member, NewMember, NewMembership};
use subdomain_tenant::{require_tenant, Result, TenantScopedExt};

/// GET /members
///
/// Members of the active tenant; every member when served globally.
pub async fn list_members(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Member>>> {
    Ok(Json(state.db.current_scope().all::<Member>().await?))
}

/// POST /members
///
/// Creates the member and its membership in the active tenant, in one
/// transaction.
pub async fn create_member(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewMember>,
) -> Result<(StatusCode, Json<Member>)> {
    let tenant = require_tenant()?;
    let scope = state.db.current_scope();

    let mut tx = scope.begin().await?;
    let member = scope.create_in(&mut tx, request).await?;
    scope.create_in(&mut tx, NewMembership::new(member.id)).await?;
    tx.commit().await.map_err(|e| {
        tracing::error!("Transaction commit error: {}", e);
        DatabaseError::from(e)
    })?;

    tracing::info!("Added member {} to tenant {}", member.email, tenant.code);
    Ok((StatusCode::CREATED, Json(member)))
}
