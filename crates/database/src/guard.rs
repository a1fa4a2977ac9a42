use crate::restriction::Restriction;
use sea_query::SimpleExpr;
use std::borrow::Cow;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

/// Insert columns of a new record, by name
pub type InsertColumns = Vec<(String, SimpleExpr)>;

/// Stamp the active tenant onto the insert columns of a new, directly
/// restricted record.
///
/// The restriction's foreign key is set to `tenant_id`, replacing any value
/// the payload carried for it. Fails with `<through>: is missing` when no
/// tenant is active; the record must not be persisted in that case.
/// Delegate-restricted records are left untouched.
pub fn stamp_tenant(
    columns: &mut InsertColumns,
    restriction: &Restriction,
    tenant_id: Option<Uuid>,
) -> Result<(), ValidationErrors> {
    if !restriction.is_direct() {
        return Ok(());
    }

    match tenant_id {
        Some(tenant_id) => {
            columns.retain(|(column, _)| *column != restriction.foreign_key);
            columns.push((restriction.foreign_key.clone(), tenant_id.into()));
            Ok(())
        }
        None => {
            let mut error = ValidationError::new("missing");
            error.message = Some(Cow::Borrowed("is missing"));

            let mut errors = ValidationErrors::new();
            errors.add(field_name(&restriction.through), error);
            Err(errors)
        }
    }
}

/// `'static` name for a configured association, as validation errors need.
/// Each distinct name is allocated once.
fn field_name(through: &str) -> &'static str {
    static NAMES: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    let mut names = NAMES.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(name) = names.iter().copied().find(|name| *name == through) {
        return name;
    }

    let name: &'static str = Box::leak(through.to_owned().into_boxed_str());
    names.push(name);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restriction::Delegate;

    fn payload() -> InsertColumns {
        vec![("title".to_string(), "hello".into())]
    }

    fn column_names(columns: &InsertColumns) -> Vec<&str> {
        columns.iter().map(|(column, _)| column.as_str()).collect()
    }

    #[test]
    fn test_stamps_active_tenant() {
        let tenant_id = Uuid::new_v4();
        let mut columns = payload();

        stamp_tenant(&mut columns, &Restriction::direct("notes", "tenant"), Some(tenant_id)).unwrap();

        assert_eq!(column_names(&columns), vec!["title", "tenant_id"]);
        assert_eq!(columns[1].1, SimpleExpr::from(tenant_id));
    }

    #[test]
    fn test_stamps_configured_foreign_key() {
        let tenant_id = Uuid::new_v4();
        let mut columns = payload();
        columns.push(("agency_id".to_string(), Uuid::new_v4().into()));

        stamp_tenant(&mut columns, &Restriction::direct("notes", "agency"), Some(tenant_id)).unwrap();

        assert_eq!(column_names(&columns), vec!["title", "agency_id"]);
        assert_eq!(columns[1].1, SimpleExpr::from(tenant_id));
    }

    #[test]
    fn test_missing_tenant_is_a_field_error() {
        let mut columns = payload();

        let errors = stamp_tenant(&mut columns, &Restriction::direct("notes", "tenant"), None)
            .unwrap_err();
        let field_errors = errors.field_errors();
        let tenant_errors = field_errors.get("tenant").expect("tenant field error");

        assert_eq!(tenant_errors[0].code, "missing");
        assert_eq!(tenant_errors[0].message.as_deref(), Some("is missing"));
        assert_eq!(column_names(&columns), vec!["title"]);
    }

    #[test]
    fn test_missing_tenant_is_reported_under_configured_association() {
        let restriction = Restriction::direct("notes", "agency");

        let errors = stamp_tenant(&mut payload(), &restriction, None).unwrap_err();
        assert!(errors.field_errors().contains_key("agency"));
        assert!(!errors.field_errors().contains_key("tenant"));

        // Same interned name on repeat
        assert!(std::ptr::eq(field_name("agency"), field_name("agency")));
    }

    #[test]
    fn test_delegate_records_are_not_stamped() {
        let restriction = Restriction::delegated(
            "members",
            "tenant",
            Delegate::new("memberships", "member_id"),
        );
        let mut columns = payload();

        assert!(stamp_tenant(&mut columns, &restriction, None).is_ok());
        assert_eq!(column_names(&columns), vec!["title"]);
    }
}
