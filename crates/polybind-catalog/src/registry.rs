//! Struct usage classification.
//!
//! A struct's usage is derived from a full scan of the final action set, not
//! authored: emitters only generate the conversions a struct actually needs.

use std::collections::BTreeMap;

use polybind_types::{StructDef, StructShape};
use tracing::debug;

use crate::Catalog;

/// How the catalog returns a struct type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructUsage {
    SingletonOnly,
    ListOnly,
    Both,
}

impl StructUsage {
    /// Some action returns exactly one of these.
    pub fn has_singleton(self) -> bool {
        matches!(self, StructUsage::SingletonOnly | StructUsage::Both)
    }

    /// Some action returns a list of these.
    pub fn has_list(self) -> bool {
        matches!(self, StructUsage::ListOnly | StructUsage::Both)
    }

    fn from_shape(shape: StructShape) -> Self {
        match shape {
            StructShape::Single => StructUsage::SingletonOnly,
            StructShape::List => StructUsage::ListOnly,
        }
    }

    fn merge(self, shape: StructShape) -> Self {
        match (self, shape) {
            (StructUsage::Both, _) => StructUsage::Both,
            (StructUsage::SingletonOnly, StructShape::Single) => StructUsage::SingletonOnly,
            (StructUsage::ListOnly, StructShape::List) => StructUsage::ListOnly,
            (StructUsage::SingletonOnly, StructShape::List)
            | (StructUsage::ListOnly, StructShape::Single) => StructUsage::Both,
        }
    }
}

/// Every struct returned by at least one action, with its usage.
///
/// Structs no action returns are absent. Iteration is by struct name.
#[derive(Debug, Clone)]
pub struct StructRegistry {
    entries: Vec<(StructDef, StructUsage)>,
}

impl StructRegistry {
    /// Scan every action (whatever its visibility) and classify structs.
    pub fn build(catalog: &Catalog) -> Self {
        let mut usage: BTreeMap<&str, StructUsage> = BTreeMap::new();
        for action in catalog.actions() {
            if let Some((name, shape)) = action.ret.struct_ref() {
                usage
                    .entry(name)
                    .and_modify(|u| *u = u.merge(shape))
                    .or_insert_with(|| StructUsage::from_shape(shape));
            }
        }

        // Catalog construction guarantees every referenced struct exists.
        let entries: Vec<(StructDef, StructUsage)> = usage
            .into_iter()
            .filter_map(|(name, u)| catalog.find_struct(name).map(|d| (d.clone(), u)))
            .collect();
        debug!(structs = entries.len(), "struct registry built");
        Self { entries }
    }

    pub fn usage(&self, name: &str) -> Option<StructUsage> {
        self.entries
            .iter()
            .find(|(d, _)| d.name == name)
            .map(|(_, u)| *u)
    }

    pub fn get(&self, name: &str) -> Option<&StructDef> {
        self.entries
            .iter()
            .find(|(d, _)| d.name == name)
            .map(|(d, _)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StructDef, StructUsage)> {
        self.entries.iter().map(|(d, u)| (d, *u))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
