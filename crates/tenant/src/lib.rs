// Tenant resolution and per-request scoping.
//
// A request's host selects the tenant; the tenant stays active for the
// handler and is cleared afterwards. While active, restricted record types
// and the session are scoped to it.

pub mod config;
pub mod context;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod resolver;
pub mod session;

pub use config::TenantConfig;
pub use context::{
    current, current_id, current_key, each_tenant, each_tenant_blocking, require_no_tenant,
    require_tenant, with_tenant, TenantGuard, TenantScopedExt,
};
pub use error::{ErrorResponse, Result, TenantError};
pub use extractor::{IdentifierExtractor, SubdomainExtractor};
pub use middleware::{global_only, scope_tenant, tenant_required, CurrentTenant, TenantScope};
pub use resolver::{DatabaseResolver, StaticResolver, TenantResolver};
pub use session::partitioned;
