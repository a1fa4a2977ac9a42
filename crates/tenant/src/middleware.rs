//! Per-request tenant scoping.
//!
//! `scope_tenant` resolves the tenant from the request and runs the rest of
//! the stack with it active. The tenant is never visible to another
//! request, and is gone once the handler finishes, however it finishes.

use crate::config::TenantConfig;
use crate::context::{self, with_tenant};
use crate::error::{Result, TenantError};
use crate::extractor::{IdentifierExtractor, SubdomainExtractor};
use crate::resolver::TenantResolver;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;
use subdomain_models::Tenant;

#[derive(Clone)]
pub struct TenantScope {
    config: Arc<TenantConfig>,
    resolver: Arc<dyn TenantResolver>,
    extractor: Arc<dyn IdentifierExtractor>,
}

impl TenantScope {
    /// Scope with the subdomain extractor
    pub fn new(config: TenantConfig, resolver: Arc<dyn TenantResolver>) -> Self {
        Self {
            config: Arc::new(config),
            resolver,
            extractor: Arc::new(SubdomainExtractor::new()),
        }
    }

    pub fn with_extractor(mut self, extractor: impl IdentifierExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn config(&self) -> &TenantConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<dyn TenantResolver> {
        &self.resolver
    }

    /// Identifier carried by `request`, if any
    pub fn identifier(&self, request: &Request) -> Option<String> {
        self.extractor.extract(request)
    }

    /// Tenant served for `identifier`.
    ///
    /// `Ok(None)` for global identifiers; `NotFound` when the identifier is
    /// missing or matches no tenant.
    pub async fn establish(&self, identifier: Option<String>) -> Result<Option<Arc<Tenant>>> {
        let Some(identifier) = identifier else {
            return Err(TenantError::NotFound(String::new()));
        };

        if self.config.is_global(&identifier) {
            tracing::debug!("Global identifier {}, serving without tenant", identifier);
            return Ok(None);
        }

        match self.resolver.resolve(&identifier).await? {
            Some(tenant) => Ok(Some(Arc::new(tenant))),
            None => {
                tracing::warn!("Rejecting request for unknown tenant {}", identifier);
                Err(TenantError::NotFound(identifier))
            }
        }
    }
}

/// Run the request with its tenant active
pub async fn scope_tenant(
    State(scope): State<TenantScope>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let identifier = scope.identifier(&request);
    let tenant = scope.establish(identifier).await?;

    if let Some(tenant) = &tenant {
        tracing::debug!("Serving {} {} for tenant {}", request.method(), request.uri(), tenant.code);
    }
    request.extensions_mut().insert(CurrentTenant(tenant.clone()));

    Ok(with_tenant(tenant, next.run(request)).await)
}

/// Reject requests served without a tenant
pub async fn tenant_required(request: Request, next: Next) -> Result<Response> {
    context::require_tenant()?;
    Ok(next.run(request).await)
}

/// Reject requests served for a tenant
pub async fn global_only(request: Request, next: Next) -> Result<Response> {
    context::require_no_tenant()?;
    Ok(next.run(request).await)
}

/// Tenant the request is served for, if any
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Option<Arc<Tenant>>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentTenant>()
            .cloned()
            .unwrap_or_else(|| CurrentTenant(context::current())))
    }
}
