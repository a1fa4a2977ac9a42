use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Tenant (site/organization) addressed by its subdomain code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Value of a column as a string, used to derive the tenant key
    /// for whatever column tenants are looked up by.
    ///
    /// Returns `None` for unknown columns and null values.
    pub fn attribute(&self, column: &str) -> Option<String> {
        match column {
            "id" => Some(self.id.to_string()),
            "code" => Some(self.code.clone()),
            "name" => Some(self.name.clone()),
            other => match serde_json::to_value(self).ok()?.get(other)? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            },
        }
    }
}

/// Create new tenant request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewTenant {
    // Must be usable as a DNS label
    #[validate(length(min = 1, max = 63), regex(path = *CODE_REGEX))]
    pub code: String,

    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Update tenant request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTenant {
    #[validate(length(min = 1, max = 63), regex(path = *CODE_REGEX))]
    pub code: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

// Subdomain label validation regex
lazy_static::lazy_static! {
    static ref CODE_REGEX: regex::Regex = regex::Regex::new(r"^[a-z0-9][a-z0-9-]*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            code: "acme".to_string(),
            name: "Acme Corp".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_attribute_by_column() {
        let tenant = acme();
        assert_eq!(tenant.attribute("code").as_deref(), Some("acme"));
        assert_eq!(tenant.attribute("name").as_deref(), Some("Acme Corp"));
        assert_eq!(tenant.attribute("id"), Some(tenant.id.to_string()));
        assert!(tenant.attribute("created_at").is_some());
        assert_eq!(tenant.attribute("missing"), None);
    }

    #[test]
    fn test_new_tenant_validation() {
        let ok = NewTenant {
            code: "acme-2".to_string(),
            name: "Acme".to_string(),
        };
        assert!(ok.validate().is_ok());

        let upper = NewTenant {
            code: "Acme".to_string(),
            name: "Acme".to_string(),
        };
        assert!(upper.validate().is_err());

        let dotted = NewTenant {
            code: "acme.example".to_string(),
            name: "Acme".to_string(),
        };
        assert!(dotted.validate().is_err());

        let empty = NewTenant {
            code: String::new(),
            name: "Acme".to_string(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_update_tenant_allows_partial() {
        let update = UpdateTenant {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }
}
