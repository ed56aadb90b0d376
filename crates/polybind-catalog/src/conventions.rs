//! Per-action failure conventions, resolved once per run.

use std::collections::HashMap;

use polybind_types::ErrorConvention;

use crate::Catalog;

/// Action name → resolved [`ErrorConvention`].
///
/// Emitters and the reference runtime read from this table instead of
/// resolving conventions themselves.
#[derive(Debug, Clone)]
pub struct ConventionTable {
    by_action: HashMap<String, ErrorConvention>,
}

impl ConventionTable {
    pub fn resolve(catalog: &Catalog) -> Self {
        let by_action = catalog
            .actions()
            .iter()
            .map(|a| (a.name.clone(), ErrorConvention::resolve(&a.ret)))
            .collect();
        Self { by_action }
    }

    pub fn get(&self, action: &str) -> Option<ErrorConvention> {
        self.by_action.get(action).copied()
    }

    pub fn len(&self) -> usize {
        self.by_action.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_action.is_empty()
    }
}
