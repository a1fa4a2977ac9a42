//! Session endpoints. Values are stored in the active tenant's partition
//! of the session, so the same cookie carries independent data per
//! subdomain.

use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap,
    },
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use subdomain_cache::Session;
use subdomain_tenant::{session::partitioned, Result};

pub const SESSION_COOKIE: &str = "subdomain_session";

#[derive(Debug, Serialize)]
pub struct SessionValue {
    pub partition: Option<String>,
    pub key: String,
    pub value: Option<Value>,
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    let prefix = format!("{}=", SESSION_COOKIE);
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .filter(|id| !id.is_empty())
}

fn session_cookie(session: &Session) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session.id())
}

async fn open(state: &AppState, headers: &HeaderMap) -> Result<Session> {
    Ok(state.sessions.open(session_id(headers)).await?)
}

/// GET /session/:key
pub async fn get_value(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SessionValue>> {
    let mut session = open(&state, &headers).await?;
    let view = partitioned(&mut session, &state.tenant_config.by);

    Ok(Json(SessionValue {
        partition: view.partition().map(str::to_string),
        value: view.get(&key).cloned(),
        key,
    }))
}

/// PUT /session/:key
pub async fn put_value(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(value): Json<Value>,
) -> Result<impl IntoResponse> {
    let mut session = open(&state, &headers).await?;
    let mut view = partitioned(&mut session, &state.tenant_config.by);
    let partition = view.partition().map(str::to_string);
    view.insert(key.clone(), value.clone())?;

    state.sessions.save(&mut session).await?;

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&session))]),
        Json(SessionValue {
            partition,
            key,
            value: Some(value),
        }),
    ))
}

/// DELETE /session/:key
pub async fn delete_value(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let mut session = open(&state, &headers).await?;
    let mut view = partitioned(&mut session, &state.tenant_config.by);
    let partition = view.partition().map(str::to_string);
    let value = view.remove(&key)?;

    state.sessions.save(&mut session).await?;

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&session))]),
        Json(SessionValue { partition, key, value }),
    ))
}

/// DELETE /session
///
/// Regenerates the session, dropping only the active tenant's data.
pub async fn reset(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<impl IntoResponse> {
    let mut session = open(&state, &headers).await?;
    partitioned(&mut session, &state.tenant_config.by).reset();

    state.sessions.save(&mut session).await?;

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&session))]),
        Json(serde_json::json!({ "session_reset": true })),
    ))
}
