use crate::error::{DatabaseError, Result};
use crate::guard::{stamp_tenant, InsertColumns};
use crate::records::{NewRecord, Record};
use crate::restriction::{Restriction, Restrictions};
use crate::scope::{column, ScopedSelect};
use sea_query::{Alias, InsertStatement, PostgresQueryBuilder, Query};
use sea_query_binder::SqlxBinder;
use sqlx::{PgConnection, PgPool, Postgres};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub type Transaction = sqlx::Transaction<'static, Postgres>;

/// Data access for one execution context.
///
/// Every query on a restricted record type carries the base constraint
/// for `tenant_id`; unrestricted types pass through unchanged.
pub struct ScopedRepository {
    pool: PgPool,
    restrictions: Arc<Restrictions>,
    tenant_id: Option<Uuid>,
}

impl ScopedRepository {
    pub fn new(pool: PgPool, restrictions: Arc<Restrictions>, tenant_id: Option<Uuid>) -> Self {
        Self {
            pool,
            restrictions,
            tenant_id,
        }
    }

    pub fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    fn restriction<R: Record>(&self) -> Option<&Restriction> {
        self.restrictions.get(R::TABLE).map(|r| r.as_ref())
    }

    /// Starting point for every query on `R`
    pub fn select<R: Record>(&self) -> ScopedSelect {
        match self.restriction::<R>() {
            Some(restriction) => ScopedSelect::restricted(restriction, self.tenant_id),
            None => ScopedSelect::unrestricted(R::TABLE),
        }
    }

    pub async fn fetch_all<R: Record>(&self, select: ScopedSelect) -> Result<Vec<R>> {
        let (sql, values) = select.build();
        let records = sqlx::query_as_with::<_, R, _>(&sql, values)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    pub async fn fetch_optional<R: Record>(&self, select: ScopedSelect) -> Result<Option<R>> {
        let (sql, values) = select.build();
        let record = sqlx::query_as_with::<_, R, _>(&sql, values)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// All records of `R` visible in this scope
    pub async fn all<R: Record>(&self) -> Result<Vec<R>> {
        self.fetch_all(self.select::<R>()).await
    }

    /// Find by id; records owned by another tenant are reported as not found
    pub async fn find<R: Record>(&self, id: Uuid) -> Result<R> {
        let select = self.select::<R>().filter_eq("id", id);
        self.fetch_optional(select)
            .await?
            .ok_or_else(|| DatabaseError::not_found(R::TABLE, &id.to_string()))
    }

    /// Validated insert of `new_record`, with the tenant column stamped for
    /// a direct restriction
    fn insert_statement<N: NewRecord>(&self, new_record: &N) -> Result<InsertStatement> {
        new_record.validate()?;

        let mut columns: InsertColumns = new_record
            .values()
            .into_iter()
            .map(|(column, value)| (column.to_string(), value))
            .collect();
        if let Some(restriction) = self.restriction::<N::Record>() {
            stamp_tenant(&mut columns, restriction, self.tenant_id)?;
        }

        let (names, exprs): (Vec<_>, Vec<_>) = columns.into_iter().unzip();
        let mut statement = Query::insert();
        statement
            .into_table(Alias::new(<N::Record as Record>::TABLE))
            .columns(names.into_iter().map(Alias::new))
            .values(exprs)?
            .returning_all();
        Ok(statement)
    }

    /// Validate, stamp the tenant (direct restriction) and insert
    pub async fn create<N: NewRecord>(&self, new_record: N) -> Result<N::Record> {
        let (sql, values) = self.insert_statement(&new_record)?.build_sqlx(PostgresQueryBuilder);
        let record = sqlx::query_as_with::<_, N::Record, _>(&sql, values)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Created {} record in tenant {:?}", <N::Record as Record>::TABLE, self.tenant_id);
        Ok(record)
    }

    /// Start a transaction for several `create_in` calls
    pub async fn begin(&self) -> Result<Transaction> {
        Ok(self.pool.begin().await?)
    }

    /// [`create`](Self::create) on `conn`, typically an open transaction
    pub async fn create_in<N: NewRecord>(&self, conn: &mut PgConnection, new_record: N) -> Result<N::Record> {
        let (sql, values) = self.insert_statement(&new_record)?.build_sqlx(PostgresQueryBuilder);
        let record = sqlx::query_as_with::<_, N::Record, _>(&sql, values)
            .fetch_one(conn)
            .await?;

        tracing::debug!(
            "Created {} record in tenant {:?} (transaction)",
            <N::Record as Record>::TABLE,
            self.tenant_id
        );
        Ok(record)
    }

    /// Delete by id within this scope
    pub async fn delete<R: Record>(&self, id: Uuid) -> Result<()> {
        let scoped_ids = self.select::<R>().filter_eq("id", id).ids();
        let (sql, values) = Query::delete()
            .from_table(Alias::new(R::TABLE))
            .and_where(column(R::TABLE, "id").in_subquery(scoped_ids))
            .build_sqlx(PostgresQueryBuilder);

        let result = sqlx::query_with(&sql, values).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(R::TABLE, &id.to_string()));
        }

        Ok(())
    }
}
