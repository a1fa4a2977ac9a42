//! The active tenant of the current execution context.
//!
//! Async work runs inside a task-local slot established by [`with_tenant`]
//! (one per request or batch step); the slot disappears when the scoped
//! future completes, fails or is dropped. Synchronous code running outside
//! any task scope (offline jobs, consoles) uses a thread-local slot,
//! normally through [`TenantGuard`].
//!
//! No active tenant means global context: restricted record types are not
//! filtered at all. Code running without a request must set a tenant
//! explicitly to be scoped.

use crate::error::TenantError;
use crate::resolver::TenantResolver;
use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use subdomain_database::{Database, ScopedRepository};
use subdomain_models::Tenant;
use uuid::Uuid;

tokio::task_local! {
    static TASK_TENANT: RefCell<Option<Arc<Tenant>>>;
}

thread_local! {
    static THREAD_TENANT: RefCell<Option<Arc<Tenant>>> = const { RefCell::new(None) };
}

/// Active tenant, if any
pub fn current() -> Option<Arc<Tenant>> {
    TASK_TENANT
        .try_with(|slot| slot.borrow().clone())
        .unwrap_or_else(|_| THREAD_TENANT.with(|slot| slot.borrow().clone()))
}

pub fn current_id() -> Option<Uuid> {
    current().map(|tenant| tenant.id)
}

/// Key of the active tenant: its value in the `by` column
pub fn current_key(by: &str) -> Option<String> {
    current().and_then(|tenant| tenant.attribute(by))
}

fn in_task_scope() -> bool {
    TASK_TENANT.try_with(|_| ()).is_ok()
}

/// Swap the innermost slot: the task scope if there is one, else the thread.
fn swap(tenant: Option<Arc<Tenant>>) -> Option<Arc<Tenant>> {
    let previous = match TASK_TENANT.try_with(|slot| slot.replace(tenant.clone())) {
        Ok(previous) => previous,
        Err(_) => THREAD_TENANT.with(|slot| slot.replace(tenant.clone())),
    };

    tracing::debug!(
        "Active tenant: {:?} -> {:?}",
        previous.as_ref().map(|t| t.code.as_str()),
        tenant.as_ref().map(|t| t.code.as_str())
    );
    previous
}

/// Replace the active tenant, returning the previous one.
///
/// Inside a [`with_tenant`] scope only that scope changes. On a runtime
/// thread outside any scope this fails with [`TenantError::Unscoped`] and
/// changes nothing, since a worker thread is shared by every task it polls.
/// Plain synchronous threads fall back to the thread-local slot.
pub fn set(tenant: Option<Arc<Tenant>>) -> Result<Option<Arc<Tenant>>, TenantError> {
    if !in_task_scope() && tokio::runtime::Handle::try_current().is_ok() {
        tracing::warn!("Refusing to change the active tenant outside a task scope");
        return Err(TenantError::Unscoped);
    }
    Ok(swap(tenant))
}

pub fn clear() -> Result<Option<Arc<Tenant>>, TenantError> {
    set(None)
}

/// Look `identifier` up and make the result active in the current task scope.
///
/// An unknown identifier leaves no tenant active and returns `None`.
/// Outside a [`with_tenant`] scope this fails with [`TenantError::Unscoped`]
/// before resolving anything.
pub async fn set_by_identifier(
    resolver: &dyn TenantResolver,
    identifier: &str,
) -> Result<Option<Arc<Tenant>>, TenantError> {
    if !in_task_scope() {
        tracing::warn!("Refusing to activate {} outside a task scope", identifier);
        return Err(TenantError::Unscoped);
    }

    let tenant = resolver.resolve(identifier).await?.map(Arc::new);
    set(tenant.clone())?;
    Ok(tenant)
}

/// Run `future` with `tenant` active in a fresh slot.
///
/// Whatever was active outside is untouched and visible again afterwards,
/// on every exit path.
pub async fn with_tenant<F>(tenant: Option<Arc<Tenant>>, future: F) -> F::Output
where
    F: Future,
{
    TASK_TENANT.scope(RefCell::new(tenant), future).await
}

/// Run `body` once per tenant with that tenant active.
///
/// Stops at the first error. The previously active tenant is restored in
/// all cases, including an empty `tenants`.
pub async fn each_tenant<I, F, Fut, E>(tenants: I, mut body: F) -> Result<(), E>
where
    I: IntoIterator<Item = Tenant>,
    F: FnMut(Arc<Tenant>) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    for tenant in tenants {
        let tenant = Arc::new(tenant);
        tracing::debug!("Running batch step for tenant {}", tenant.code);
        with_tenant(Some(tenant.clone()), async { body(tenant).await }).await?;
    }
    Ok(())
}

/// Blocking counterpart of [`each_tenant`] for synchronous jobs
pub fn each_tenant_blocking<I, F, E>(tenants: I, mut body: F) -> Result<(), E>
where
    I: IntoIterator<Item = Tenant>,
    F: FnMut(&Arc<Tenant>) -> Result<(), E>,
{
    for tenant in tenants {
        let tenant = Arc::new(tenant);
        let _guard = TenantGuard::enter(Some(tenant.clone()));
        body(&tenant)?;
    }
    Ok(())
}

/// Makes a tenant active until dropped, then restores the previous one.
/// Bound to the thread (or task slot) it was created on; meant for
/// synchronous code, async code uses [`with_tenant`].
#[must_use = "the tenant is only active while the guard is alive"]
pub struct TenantGuard {
    previous: Option<Arc<Tenant>>,
    _not_send: PhantomData<*const ()>,
}

impl TenantGuard {
    pub fn enter(tenant: Option<Arc<Tenant>>) -> Self {
        Self {
            previous: swap(tenant),
            _not_send: PhantomData,
        }
    }
}

impl Drop for TenantGuard {
    fn drop(&mut self) {
        swap(self.previous.take());
    }
}

/// Fails unless a tenant is active
pub fn require_tenant() -> Result<Arc<Tenant>, TenantError> {
    current().ok_or(TenantError::TenantRequired)
}

/// Fails if a tenant is active
pub fn require_no_tenant() -> Result<(), TenantError> {
    match current() {
        Some(tenant) => Err(TenantError::TenantForbidden(tenant.code.clone())),
        None => Ok(()),
    }
}

/// Data access scoped to the active tenant
pub trait TenantScopedExt {
    fn current_scope(&self) -> ScopedRepository;
}

impl TenantScopedExt for Database {
    fn current_scope(&self) -> ScopedRepository {
        self.scoped(current_id())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use futures::FutureExt;
    use std::panic::AssertUnwindSafe;

    pub(crate) fn tenant(code: &str) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_uppercase(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn active_code() -> Option<String> {
        current().map(|t| t.code.clone())
    }

    #[test]
    fn test_ungoverned_context_has_no_tenant() {
        assert!(current().is_none());
        assert!(require_no_tenant().is_ok());
        assert!(matches!(require_tenant(), Err(TenantError::TenantRequired)));
    }

    #[test]
    fn test_guard_restores_previous_tenant() {
        let outer = TenantGuard::enter(Some(Arc::new(tenant("outer"))));
        {
            let _inner = TenantGuard::enter(Some(Arc::new(tenant("inner"))));
            assert_eq!(active_code().as_deref(), Some("inner"));
            assert!(matches!(require_no_tenant(), Err(TenantError::TenantForbidden(_))));
        }
        assert_eq!(active_code().as_deref(), Some("outer"));
        drop(outer);
        assert!(current().is_none());
    }

    #[test]
    fn test_each_blocking_without_prior_tenant() {
        let mut seen = Vec::new();
        each_tenant_blocking([tenant("a"), tenant("b")], |t| {
            seen.push((t.code.clone(), active_code()));
            Ok::<_, ()>(())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                ("a".to_string(), Some("a".to_string())),
                ("b".to_string(), Some("b".to_string()))
            ]
        );
        assert!(current().is_none());
    }

    #[test]
    fn test_each_blocking_restores_prior_tenant_after_error() {
        let _c = TenantGuard::enter(Some(Arc::new(tenant("c"))));

        let result = each_tenant_blocking([tenant("a"), tenant("b")], |t| {
            if t.code == "b" {
                Err("boom")
            } else {
                Ok(())
            }
        });

        assert_eq!(result, Err("boom"));
        assert_eq!(active_code().as_deref(), Some("c"));
    }

    #[test]
    fn test_each_blocking_restores_prior_tenant_after_panic() {
        let _c = TenantGuard::enter(Some(Arc::new(tenant("c"))));

        let result = std::panic::catch_unwind(|| {
            let _ = each_tenant_blocking([tenant("a")], |_| -> Result<(), ()> { panic!("job failed") });
        });

        assert!(result.is_err());
        assert_eq!(active_code().as_deref(), Some("c"));
    }

    #[test]
    fn test_each_blocking_over_no_tenants() {
        let _c = TenantGuard::enter(Some(Arc::new(tenant("c"))));
        each_tenant_blocking(Vec::new(), |_| Ok::<_, ()>(())).unwrap();
        assert_eq!(active_code().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_each_tenant_runs_in_order_and_leaves_none_active() {
        let seen = with_tenant(None, async {
            let mut seen = Vec::new();
            each_tenant([tenant("a"), tenant("b")], |t| {
                seen.push(t.code.clone());
                let active = active_code();
                async move {
                    assert_eq!(active, Some(t.code.clone()));
                    assert_eq!(active_code(), Some(t.code.clone()));
                    Ok::<_, ()>(())
                }
            })
            .await
            .unwrap();
            assert!(current().is_none());
            seen
        })
        .await;

        assert_eq!(seen, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_each_tenant_restores_active_tenant() {
        let c = Arc::new(tenant("c"));
        with_tenant(Some(c), async {
            let result = each_tenant([tenant("a"), tenant("b")], |t| async move {
                if t.code == "a" {
                    Err("failed")
                } else {
                    Ok(())
                }
            })
            .await;

            assert_eq!(result, Err("failed"));
            assert_eq!(active_code().as_deref(), Some("c"));
        })
        .await;
    }

    #[tokio::test]
    async fn test_set_inside_scope_does_not_leak() {
        with_tenant(None, async {
            set(Some(Arc::new(tenant("inside")))).unwrap();
            assert_eq!(active_code().as_deref(), Some("inside"));
        })
        .await;

        assert!(current().is_none());
    }

    #[tokio::test]
    async fn test_set_by_identifier() {
        let resolver = crate::resolver::StaticResolver::new("code", vec![tenant("acme")]);

        with_tenant(None, async {
            let found = set_by_identifier(&resolver, "acme").await.unwrap();
            assert_eq!(found.map(|t| t.code.clone()).as_deref(), Some("acme"));
            assert_eq!(current_key("code").as_deref(), Some("acme"));

            let missing = set_by_identifier(&resolver, "nope").await.unwrap();
            assert!(missing.is_none());
            assert!(current().is_none());
        })
        .await;
    }

    #[test]
    fn test_set_on_runtime_thread_without_scope_is_refused() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let resolver = Arc::new(crate::resolver::StaticResolver::new("code", vec![tenant("acme")]));

        runtime.block_on(async {
            let r = resolver.clone();
            let refused = tokio::spawn(async move {
                matches!(
                    set_by_identifier(r.as_ref(), "acme").await,
                    Err(TenantError::Unscoped)
                )
            })
            .await
            .unwrap();
            assert!(refused);

            // Next task on the same worker thread
            let seen = tokio::spawn(async { active_code() }).await.unwrap();
            assert!(seen.is_none());

            assert!(matches!(set(Some(Arc::new(tenant("acme")))), Err(TenantError::Unscoped)));
            assert!(matches!(clear(), Err(TenantError::Unscoped)));
            assert!(current().is_none());
        });
    }

    #[test]
    fn test_set_on_plain_thread_uses_thread_slot() {
        let previous = set(Some(Arc::new(tenant("job")))).unwrap();
        assert!(previous.is_none());
        assert_eq!(active_code().as_deref(), Some("job"));

        let previous = clear().unwrap();
        assert_eq!(previous.map(|t| t.code.clone()).as_deref(), Some("job"));
        assert!(current().is_none());
    }

    #[tokio::test]
    async fn test_each_tenant_restores_active_tenant_after_panic() {
        let c = Arc::new(tenant("c"));
        with_tenant(Some(c), async {
            let result = AssertUnwindSafe(each_tenant([tenant("a"), tenant("b")], |t| async move {
                if t.code == "b" {
                    panic!("step failed");
                }
                Ok::<_, ()>(())
            }))
            .catch_unwind()
            .await;

            assert!(result.is_err());
            assert_eq!(active_code().as_deref(), Some("c"));
        })
        .await;

        assert!(current().is_none());
    }
}
