use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Note owned directly by a tenant through `tenant_id`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Note payload; the tenant column is stamped on create, never taken from input
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewNote {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    pub body: Option<String>,
}

impl NewNote {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
        }
    }
}
