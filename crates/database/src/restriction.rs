//! Per record type tenant restriction settings.
//!
//! A record type is either owned directly by a tenant (it carries a
//! `<through>_id` column) or transitively through a delegate association
//! whose table carries that column instead.

use std::collections::HashMap;
use std::sync::Arc;

/// Indirect path from a record to its tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegate {
    /// Association name, e.g. `memberships`
    pub association: String,
    /// Table backing the association (defaults to the association name)
    pub table: String,
    /// Column on the delegate table referencing the restricted record's `id`
    pub reference_key: String,
}

impl Delegate {
    pub fn new(association: impl Into<String>, reference_key: impl Into<String>) -> Self {
        let association = association.into();
        Self {
            table: association.clone(),
            association,
            reference_key: reference_key.into(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    /// Table of the restricted record type
    pub table: String,
    /// Name of the tenant association
    pub through: String,
    /// Tenant foreign key, on `table` (direct) or on the delegate table
    pub foreign_key: String,
    pub delegate: Option<Delegate>,
}

impl Restriction {
    /// Record type with its own `<through>_id` column
    pub fn direct(table: impl Into<String>, through: impl Into<String>) -> Self {
        let through = through.into();
        Self {
            table: table.into(),
            foreign_key: format!("{}_id", through),
            through,
            delegate: None,
        }
    }

    /// Record type owned through `delegate`
    pub fn delegated(table: impl Into<String>, through: impl Into<String>, delegate: Delegate) -> Self {
        Self {
            delegate: Some(delegate),
            ..Self::direct(table, through)
        }
    }

    pub fn with_foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = foreign_key.into();
        self
    }

    pub fn is_direct(&self) -> bool {
        self.delegate.is_none()
    }
}

/// Registry of restricted record types, keyed by table.
///
/// A table is configured once; later attempts keep the first configuration.
#[derive(Debug, Clone, Default)]
pub struct Restrictions {
    by_table: HashMap<String, Arc<Restriction>>,
}

impl Restrictions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt a record type into tenant restriction
    pub fn restrict(&mut self, restriction: Restriction) -> Arc<Restriction> {
        if let Some(existing) = self.by_table.get(&restriction.table) {
            tracing::debug!(
                "Table {} is already restricted through {}, ignoring reconfiguration",
                existing.table,
                existing.through
            );
            return existing.clone();
        }

        tracing::debug!(
            "Restricting {} through {} ({})",
            restriction.table,
            restriction.through,
            if restriction.is_direct() { "direct" } else { "delegate" }
        );
        let restriction = Arc::new(restriction);
        self.by_table
            .insert(restriction.table.clone(), restriction.clone());
        restriction
    }

    /// Builder-style `restrict`
    pub fn with(mut self, restriction: Restriction) -> Self {
        self.restrict(restriction);
        self
    }

    pub fn get(&self, table: &str) -> Option<&Arc<Restriction>> {
        self.by_table.get(table)
    }

    pub fn is_restricted(&self, table: &str) -> bool {
        self.by_table.contains_key(table)
    }

    pub fn len(&self) -> usize {
        self.by_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_table.is_empty()
    }
}
