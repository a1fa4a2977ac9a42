use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use subdomain_database::Order;
use subdomain_models::{NewNote, Note};
use subdomain_tenant::{Result, TenantScopedExt};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    50
}

/// GET /notes, newest first
pub async fn list_notes(State(state): State<Arc<AppState>>, Query(page): Query<Page>) -> Result<Json<Vec<Note>>> {
    let scope = state.db.current_scope();
    let select = scope
        .select::<Note>()
        .order_by("created_at", Order::Desc)
        .limit(page.limit.min(500))
        .offset(page.offset);

    Ok(Json(scope.fetch_all(select).await?))
}

/// POST /notes
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewNote>,
) -> Result<(StatusCode, Json<Note>)> {
    let note = state.db.current_scope().create(request).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /notes/:id
pub async fn get_note(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<Json<Note>> {
    Ok(Json(state.db.current_scope().find::<Note>(id).await?))
}

/// DELETE /notes/:id
pub async fn delete_note(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    state.db.current_scope().delete::<Note>(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
