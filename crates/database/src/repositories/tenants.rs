use crate::error::{DatabaseError, Result};
use sea_query::{Alias, Asterisk, Expr, Order, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr};
use sea_query_binder::SqlxBinder;
use sqlx::PgPool;
use subdomain_models::{NewTenant, Tenant, UpdateTenant};
use uuid::Uuid;
use validator::Validate;

pub struct TenantRepository {
    pool: PgPool,
    table: String,
}

impl TenantRepository {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    fn select(&self) -> SelectStatement {
        let mut select = Query::select();
        select.column(Asterisk).from(Alias::new(&self.table));
        select
    }

    /// Create a new tenant
    pub async fn create(&self, request: &NewTenant) -> Result<Tenant> {
        request.validate()?;

        let (sql, values) = Query::insert()
            .into_table(Alias::new(&self.table))
            .columns([Alias::new("code"), Alias::new("name")])
            .values([request.code.clone().into(), request.name.clone().into()])?
            .returning_all()
            .build_sqlx(PostgresQueryBuilder);

        let tenant = sqlx::query_as_with::<_, Tenant, _>(&sql, values)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_insert(e, "Tenant", "code"))?;

        tracing::info!("Created tenant: {} ({})", tenant.name, tenant.code);
        Ok(tenant)
    }

    /// Exact-match lookup on `column`; `None` when nothing matches
    pub async fn find_by(&self, column: &str, value: &str) -> Result<Option<Tenant>> {
        let Some(condition) = key_condition(column, value) else {
            return Ok(None);
        };
        let (sql, values) = self.select().and_where(condition).build_sqlx(PostgresQueryBuilder);

        let tenant = sqlx::query_as_with::<_, Tenant, _>(&sql, values)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tenant)
    }

    /// Find tenant by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Tenant> {
        let (sql, values) = self
            .select()
            .and_where(Expr::col(Alias::new("id")).eq(id))
            .build_sqlx(PostgresQueryBuilder);

        sqlx::query_as_with::<_, Tenant, _>(&sql, values)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Tenant", &id.to_string()))
    }

    /// Every known tenant, oldest first
    pub async fn list(&self) -> Result<Vec<Tenant>> {
        let (sql, values) = self
            .select()
            .order_by(Alias::new("created_at"), Order::Asc)
            .build_sqlx(PostgresQueryBuilder);

        Ok(sqlx::query_as_with::<_, Tenant, _>(&sql, values)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Update tenant code and/or name
    pub async fn update(&self, id: Uuid, request: &UpdateTenant) -> Result<Tenant> {
        request.validate()?;

        let mut update = Query::update();
        update
            .table(Alias::new(&self.table))
            .value(Alias::new("updated_at"), Expr::current_timestamp())
            .and_where(Expr::col(Alias::new("id")).eq(id))
            .returning_all();
        if let Some(code) = &request.code {
            update.value(Alias::new("code"), code.clone());
        }
        if let Some(name) = &request.name {
            update.value(Alias::new("name"), name.clone());
        }

        let (sql, values) = update.build_sqlx(PostgresQueryBuilder);
        sqlx::query_as_with::<_, Tenant, _>(&sql, values)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_insert(e, "Tenant", "code"))?
            .ok_or_else(|| DatabaseError::not_found("Tenant", &id.to_string()))
    }
}

/// `column = value` with `value` bound as the column's type: a uuid for
/// `id` (`None` if it does not parse), text otherwise
fn key_condition(column: &str, value: &str) -> Option<SimpleExpr> {
    let column_expr = Expr::col(Alias::new(column));
    if column == "id" {
        return Uuid::parse_str(value).ok().map(|id| column_expr.eq(id));
    }
    Some(column_expr.eq(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::QueryStatementWriter;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_lookup_uses_configured_table() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unused")
            .unwrap();
        let repo = TenantRepository::new(pool, "agencies");

        let sql = repo
            .select()
            .and_where(Expr::col(Alias::new("code")).eq("acme"))
            .to_string(PostgresQueryBuilder);
        assert_eq!(sql, r#"SELECT * FROM "agencies" WHERE "code" = 'acme'"#);
    }

    #[tokio::test]
    async fn test_lookup_by_id_binds_a_uuid() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unused")
            .unwrap();
        let repo = TenantRepository::new(pool, "tenants");
        let id = Uuid::new_v4();

        let condition = key_condition("id", &id.to_string()).unwrap();
        let (_, values) = repo.select().and_where(condition).build(PostgresQueryBuilder);
        assert_eq!(values.0, vec![sea_query::Value::Uuid(Some(Box::new(id)))]);

        let (_, values) = repo
            .select()
            .and_where(key_condition("code", "acme").unwrap())
            .build(PostgresQueryBuilder);
        assert_eq!(values.0, vec![sea_query::Value::String(Some(Box::new("acme".to_string())))]);

        // Never reaches the (unconnected) pool
        assert!(repo.find_by("id", "not-a-uuid").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_create_and_find_exact_match() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new().connect(&url).await.unwrap();
        let repo = TenantRepository::new(pool, "tenants");

        let code = format!("exact-{}", &Uuid::new_v4().to_string()[..8]);
        let created = repo
            .create(&NewTenant {
                code: code.clone(),
                name: "Exact".to_string(),
            })
            .await
            .unwrap();

        let found = repo.find_by("code", &code).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        let by_id = repo.find_by("id", &created.id.to_string()).await.unwrap().unwrap();
        assert_eq!(by_id.code, code);
        assert!(repo.find_by("code", &code.to_uppercase()).await.unwrap().is_none());
        assert!(repo.list().await.unwrap().iter().any(|t| t.id == created.id));
    }
}
