//! Record traits consumed by the scoped repository, and their
//! implementations for the application's tenant-owned models.

use sea_query::SimpleExpr;
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use subdomain_models::{Member, Membership, NewMember, NewMembership, NewNote, Note};
use validator::Validate;

/// A persisted record type backed by `TABLE`
pub trait Record: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
}

/// Insert payload for a record type
pub trait NewRecord: Validate + Send + Sync {
    type Record: Record;

    /// Column/value pairs to insert, without the tenant column: that one
    /// comes from the table's restriction
    fn values(&self) -> Vec<(&'static str, SimpleExpr)>;
}

impl Record for Note {
    const TABLE: &'static str = "notes";
}

impl NewRecord for NewNote {
    type Record = Note;

    fn values(&self) -> Vec<(&'static str, SimpleExpr)> {
        vec![
            ("title", self.title.clone().into()),
            ("body", self.body.clone().into()),
        ]
    }
}

impl Record for Member {
    const TABLE: &'static str = "members";
}

impl NewRecord for NewMember {
    type Record = Member;

    // Members reach their tenant through memberships only
    fn values(&self) -> Vec<(&'static str, SimpleExpr)> {
        vec![
            ("email", self.email.clone().into()),
            ("display_name", self.display_name.clone().into()),
        ]
    }
}

impl Record for Membership {
    const TABLE: &'static str = "memberships";
}

impl NewRecord for NewMembership {
    type Record = Membership;

    fn values(&self) -> Vec<(&'static str, SimpleExpr)> {
        vec![("member_id", self.member_id.into())]
    }
}
