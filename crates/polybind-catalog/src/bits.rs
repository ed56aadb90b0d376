//! Optional-argument bit snapshots.
//!
//! Bit positions are wire-visible: a binding compiled against an older
//! release sets the same bits. A snapshot taken from one catalog revision is
//! checked against the next so that no bit silently moves.

use std::collections::BTreeMap;

use polybind_types::CatalogError;
use serde::{Deserialize, Serialize};

use crate::Catalog;

/// action → optional argument → bit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptargBits {
    actions: BTreeMap<String, BTreeMap<String, u8>>,
}

impl OptargBits {
    /// Record the bit of every optional argument in the catalog.
    pub fn capture(catalog: &Catalog) -> Self {
        let mut actions = BTreeMap::new();
        for action in catalog.actions() {
            if action.optargs.is_empty() {
                continue;
            }
            let bits: BTreeMap<String, u8> = action
                .optargs
                .iter()
                .map(|o| (o.name.clone(), o.bit))
                .collect();
            actions.insert(action.name.clone(), bits);
        }
        Self { actions }
    }

    pub fn bit(&self, action: &str, optarg: &str) -> Option<u8> {
        self.actions.get(action)?.get(optarg).copied()
    }

    /// Fail if any assignment recorded in `prior` changed in `self`.
    ///
    /// Removing an optional argument (or a whole action) is allowed. Moving an
    /// argument to another bit, or handing a previously used bit to a
    /// different name, is not.
    pub fn check_against(&self, prior: &OptargBits) -> polybind_types::Result<()> {
        for (action, before) in &prior.actions {
            let Some(now) = self.actions.get(action) else {
                continue;
            };
            for (optarg, &old_bit) in before {
                if let Some(&new_bit) = now.get(optarg) {
                    if new_bit != old_bit {
                        return Err(CatalogError::BitReassigned {
                            action: action.clone(),
                            optarg: optarg.clone(),
                            before: old_bit,
                            after: new_bit,
                        });
                    }
                }
            }
            for (optarg, &bit) in now {
                let previous_owner = before.iter().find(|(_, &b)| b == bit).map(|(n, _)| n);
                if let Some(owner) = previous_owner {
                    if owner != optarg {
                        return Err(CatalogError::BitReused {
                            action: action.clone(),
                            bit,
                            before: owner.clone(),
                            after: optarg.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polybind_types::{Action, OptArgKind, Return, Version};

    fn catalog(optargs: &[(&str, u8)]) -> Catalog {
        let mut a = Action::new("add_drive", Return::Err, Version::new(1, 0, 0));
        for (name, bit) in optargs {
            a = a.optarg(name, OptArgKind::String, *bit);
        }
        Catalog::new(vec![vec![a]], vec![]).unwrap()
    }

    #[test]
    fn identical_revisions_pass() {
        let prior = OptargBits::capture(&catalog(&[("readonly", 0), ("format", 1)]));
        let now = OptargBits::capture(&catalog(&[("readonly", 0), ("format", 1)]));
        assert!(now.check_against(&prior).is_ok());
    }

    #[test]
    fn appending_and_removing_pass() {
        let prior = OptargBits::capture(&catalog(&[("readonly", 0), ("name", 3)]));
        let now = OptargBits::capture(&catalog(&[("readonly", 0), ("label", 4)]));
        assert!(now.check_against(&prior).is_ok());
    }

    #[test]
    fn moved_bit_fails() {
        let prior = OptargBits::capture(&catalog(&[("readonly", 0), ("format", 1)]));
        let now = OptargBits::capture(&catalog(&[("readonly", 0), ("format", 2)]));
        assert_eq!(
            now.check_against(&prior).unwrap_err(),
            CatalogError::BitReassigned {
                action: "add_drive".into(),
                optarg: "format".into(),
                before: 1,
                after: 2,
            }
        );
    }

    #[test]
    fn reused_bit_fails() {
        let prior = OptargBits::capture(&catalog(&[("readonly", 0), ("name", 3)]));
        let now = OptargBits::capture(&catalog(&[("readonly", 0), ("label", 3)]));
        assert!(matches!(
            now.check_against(&prior).unwrap_err(),
            CatalogError::BitReused { bit: 3, .. }
        ));
    }

    #[test]
    fn json_snapshot() {
        let bits = OptargBits::capture(&catalog(&[("readonly", 0), ("format", 1)]));
        let json = bits.to_json().unwrap();
        assert!(json.contains("\"add_drive\""));
        let back = OptargBits::from_json(&json).unwrap();
        assert_eq!(back, bits);
        assert_eq!(back.bit("add_drive", "format"), Some(1));
    }
}
