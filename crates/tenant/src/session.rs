use crate::context;
use subdomain_cache::{Session, SessionPartitioner};

/// View of `session` partitioned for the active tenant, keyed by its `by`
/// column. Without an active tenant the whole session is addressed.
pub fn partitioned<'a>(session: &'a mut Session, by: &str) -> SessionPartitioner<'a> {
    SessionPartitioner::new(session, context::current_key(by))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{tests::tenant, TenantGuard};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_partition_follows_active_tenant() {
        let mut session = Session::new();
        session.insert("locale", json!("en"));

        {
            let _acme = TenantGuard::enter(Some(Arc::new(tenant("acme"))));
            let mut view = partitioned(&mut session, "code");
            assert_eq!(view.partition(), Some("acme"));
            view.insert("cart", json!([1])).unwrap();
            assert_eq!(view.get("locale"), None);
        }

        {
            let _globex = TenantGuard::enter(Some(Arc::new(tenant("globex"))));
            assert_eq!(partitioned(&mut session, "code").get("cart"), None);
        }

        let global = partitioned(&mut session, "code");
        assert_eq!(global.partition(), None);
        assert_eq!(global.get("locale"), Some(&json!("en")));
        assert_eq!(session.get("acme"), Some(&json!({ "cart": [1] })));
    }
}
