use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Global member record. Tenant ownership is only established through
/// `memberships`, so members have no tenant column of their own.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewMember {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 255))]
    pub display_name: Option<String>,
}

/// Link between a member and a tenant
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub member_id: Uuid,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Membership payload; the tenant column is stamped on create
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewMembership {
    pub member_id: Uuid,
}

impl NewMembership {
    pub fn new(member_id: Uuid) -> Self {
        Self { member_id }
    }
}
