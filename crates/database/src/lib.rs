pub mod connection;
pub mod error;
pub mod guard;
pub mod records;
pub mod repositories;
pub mod restriction;
pub mod scope;

pub use connection::{Database, DatabaseConfig};
pub use error::{DatabaseError, Result};
pub use guard::{stamp_tenant, InsertColumns};
pub use records::{NewRecord, Record};
pub use repositories::{
    scoped::{ScopedRepository, Transaction},
    tenants::TenantRepository,
};
pub use restriction::{Delegate, Restriction, Restrictions};
pub use scope::ScopedSelect;
pub use sea_query::Order;
