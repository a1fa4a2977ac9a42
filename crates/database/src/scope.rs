//! Tenant-scoped SELECT construction.
//!
//! Every query against a restricted table starts from a base constraint:
//!
//! - direct:   `WHERE <table>.<fk> = <tenant>` while a tenant is active
//! - delegate: `SELECT DISTINCT <table>.* ... INNER JOIN <delegate>
//!   ON <delegate>.<reference_key> = <table>.id`, plus
//!   `WHERE <delegate>.<fk> = <tenant>` while a tenant is active
//!
//! With no active tenant the direct form adds nothing: restricted types are
//! fully visible in global context. Callers can only AND further predicates
//! onto the base constraint, never replace it.

use crate::restriction::Restriction;
use sea_query::{
    Alias, Asterisk, Expr, Order, PostgresQueryBuilder, Query, QueryStatementWriter, SelectStatement,
    SimpleExpr,
};
use sea_query_binder::{SqlxBinder, SqlxValues};
use uuid::Uuid;

/// Fully qualified column expression, `"table"."column"`
pub fn column(table: &str, column: &str) -> Expr {
    Expr::col((Alias::new(table), Alias::new(column)))
}

#[derive(Debug, Clone)]
pub struct ScopedSelect {
    table: String,
    statement: SelectStatement,
}

impl ScopedSelect {
    /// Plain select for a table that is not restricted
    pub fn unrestricted(table: &str) -> Self {
        let mut statement = Query::select();
        statement
            .column((Alias::new(table), Asterisk))
            .from(Alias::new(table));

        Self {
            table: table.to_string(),
            statement,
        }
    }

    /// Select carrying the restriction's base constraint for `tenant_id`
    pub fn restricted(restriction: &Restriction, tenant_id: Option<Uuid>) -> Self {
        let mut scoped = Self::unrestricted(&restriction.table);

        match &restriction.delegate {
            None => {
                if let Some(tenant_id) = tenant_id {
                    scoped.statement.and_where(
                        column(&restriction.table, &restriction.foreign_key).eq(tenant_id),
                    );
                }
            }
            Some(delegate) => {
                scoped
                    .statement
                    .distinct()
                    .inner_join(
                        Alias::new(&delegate.table),
                        column(&delegate.table, &delegate.reference_key)
                            .equals((Alias::new(&restriction.table), Alias::new("id"))),
                    );
                if let Some(tenant_id) = tenant_id {
                    scoped.statement.and_where(
                        column(&delegate.table, &restriction.foreign_key).eq(tenant_id),
                    );
                }
            }
        }

        scoped
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// AND a caller predicate onto the base constraint
    pub fn and_where(mut self, condition: SimpleExpr) -> Self {
        self.statement.and_where(condition);
        self
    }

    /// `<table>.<column> = value`
    pub fn filter_eq<V>(self, column_name: &str, value: V) -> Self
    where
        V: Into<SimpleExpr>,
    {
        let condition = column(&self.table, column_name).eq(value);
        self.and_where(condition)
    }

    pub fn order_by(mut self, column_name: &str, order: Order) -> Self {
        self.statement.order_by(
            (Alias::new(&self.table), Alias::new(column_name)),
            order,
        );
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.statement.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.statement.offset(offset);
        self
    }

    /// Same scope, selecting only `<table>.id` (for use as a subquery)
    pub fn ids(&self) -> SelectStatement {
        let mut statement = self.statement.clone();
        statement
            .clear_selects()
            .column((Alias::new(&self.table), Alias::new("id")));
        statement
    }

    /// Parameterized SQL and bind values for sqlx
    pub fn build(&self) -> (String, SqlxValues) {
        self.statement.build_sqlx(PostgresQueryBuilder)
    }

    /// SQL with inlined values, for logging and tests
    pub fn to_sql(&self) -> String {
        self.statement.to_string(PostgresQueryBuilder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restriction::Delegate;

    fn tenant() -> Uuid {
        Uuid::parse_str("6f1c8a52-3b7e-4d2a-9c41-0e5b7d9a1f20").unwrap()
    }

    #[test]
    fn test_direct_scope_filters_by_tenant() {
        let restriction = Restriction::direct("notes", "tenant");
        let sql = ScopedSelect::restricted(&restriction, Some(tenant())).to_sql();

        assert_eq!(
            sql,
            format!(
                r#"SELECT "notes".* FROM "notes" WHERE "notes"."tenant_id" = '{}'"#,
                tenant()
            )
        );
    }

    #[test]
    fn test_direct_scope_without_tenant_is_unfiltered() {
        let restriction = Restriction::direct("notes", "tenant");
        let sql = ScopedSelect::restricted(&restriction, None).to_sql();

        assert_eq!(sql, r#"SELECT "notes".* FROM "notes""#);
    }

    #[test]
    fn test_caller_predicates_compose_with_base_constraint() {
        let restriction = Restriction::direct("notes", "tenant");
        let sql = ScopedSelect::restricted(&restriction, Some(tenant()))
            .filter_eq("title", "hello")
            .order_by("created_at", Order::Desc)
            .limit(10)
            .to_sql();

        assert!(sql.contains(&format!(r#""notes"."tenant_id" = '{}'"#, tenant())));
        assert!(sql.contains(r#"AND "notes"."title" = 'hello'"#));
        assert!(sql.ends_with(r#"ORDER BY "notes"."created_at" DESC LIMIT 10"#));
    }

    #[test]
    fn test_delegate_scope_joins_and_filters_delegate() {
        let restriction = Restriction::delegated(
            "members",
            "tenant",
            Delegate::new("memberships", "member_id"),
        );
        let sql = ScopedSelect::restricted(&restriction, Some(tenant())).to_sql();

        assert_eq!(
            sql,
            format!(
                r#"SELECT DISTINCT "members".* FROM "members" INNER JOIN "memberships" ON "memberships"."member_id" = "members"."id" WHERE "memberships"."tenant_id" = '{}'"#,
                tenant()
            )
        );
    }

    #[test]
    fn test_delegate_scope_without_tenant_keeps_join() {
        let restriction = Restriction::delegated(
            "members",
            "tenant",
            Delegate::new("memberships", "member_id"),
        );
        let sql = ScopedSelect::restricted(&restriction, None).to_sql();

        assert!(sql.contains(r#"INNER JOIN "memberships""#));
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_ids_subquery_keeps_scope() {
        let restriction = Restriction::direct("notes", "tenant");
        let select = ScopedSelect::restricted(&restriction, Some(tenant()));
        let sql = select.ids().to_string(PostgresQueryBuilder);

        assert!(sql.starts_with(r#"SELECT "notes"."id" FROM "notes""#));
        assert!(sql.contains(r#""notes"."tenant_id""#));
    }

    #[test]
    fn test_build_binds_tenant_as_parameter() {
        let restriction = Restriction::direct("notes", "tenant");
        let (sql, _values) = ScopedSelect::restricted(&restriction, Some(tenant())).build();

        assert_eq!(sql, r#"SELECT "notes".* FROM "notes" WHERE "notes"."tenant_id" = $1"#);
    }
}
