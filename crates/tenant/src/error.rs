use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subdomain_cache::CacheError;
use subdomain_database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("No tenant for identifier: {0}")]
    NotFound(String),

    #[error("A tenant is required")]
    TenantRequired,

    #[error("Not available while tenant {0} is active")]
    TenantForbidden(String),

    #[error("No tenant scope on this task")]
    Unscoped,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Session error: {0}")]
    Session(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, TenantError>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

impl TenantError {
    pub fn status(&self) -> StatusCode {
        match self {
            TenantError::NotFound(_)
            | TenantError::TenantRequired
            | TenantError::TenantForbidden(_)
            | TenantError::Database(DatabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
            TenantError::Database(DatabaseError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            TenantError::Database(DatabaseError::DuplicateEntry(_)) => StatusCode::CONFLICT,
            TenantError::Session(CacheError::PartitionConflict(_)) => StatusCode::CONFLICT,
            TenantError::Unscoped
            | TenantError::Database(_)
            | TenantError::Session(_)
            | TenantError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            TenantError::NotFound(_) => "tenant_not_found",
            TenantError::Database(DatabaseError::NotFound(_)) => "not_found",
            // Requests outside their allowed context look like missing routes
            TenantError::TenantRequired | TenantError::TenantForbidden(_) => "not_found",
            TenantError::Unscoped => "tenant_scope_error",
            TenantError::Database(DatabaseError::Validation(_)) => "validation_error",
            TenantError::Database(DatabaseError::DuplicateEntry(_)) => "duplicate_entry",
            TenantError::Database(_) => "database_error",
            TenantError::Session(CacheError::PartitionConflict(_)) => "session_conflict",
            TenantError::Session(_) => "session_error",
            TenantError::Config(_) => "configuration_error",
        }
    }
}

impl IntoResponse for TenantError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse::new(self.code(), &self.to_string()))).into_response()
    }
}
