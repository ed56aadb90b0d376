//! The validated, read-only action catalog and its derived views.

use std::collections::{HashMap, HashSet};

use polybind_types::{
    is_identifier, Action, CatalogError, Deprecation, StructDef, Visibility, MAX_OPTARG_BITS,
};
use tracing::debug;

/// An ordered collection of actions plus the struct types they return.
///
/// Construction validates every cross-action invariant; once built the
/// catalog is never mutated.
#[derive(Debug, Clone)]
pub struct Catalog {
    actions: Vec<Action>,
    structs: Vec<StructDef>,
}

impl Catalog {
    /// Assemble a catalog from several contributing action lists.
    ///
    /// Names must be unique across *all* lists, not just within one.
    pub fn new(lists: Vec<Vec<Action>>, structs: Vec<StructDef>) -> polybind_types::Result<Self> {
        validate_structs(&structs)?;
        let struct_names: HashSet<&str> = structs.iter().map(|s| s.name.as_str()).collect();

        let actions: Vec<Action> = lists.into_iter().flatten().collect();
        let mut seen = HashSet::new();
        for action in &actions {
            if !is_identifier(&action.name) {
                return Err(CatalogError::InvalidName {
                    what: "action",
                    name: action.name.clone(),
                });
            }
            if !seen.insert(action.name.as_str()) {
                return Err(CatalogError::DuplicateAction {
                    name: action.name.clone(),
                });
            }
            validate_action(action, &struct_names)?;
        }

        for action in &actions {
            if let Deprecation::ReplacedBy(replacement) = &action.deprecated {
                if !seen.contains(replacement.as_str()) {
                    return Err(CatalogError::UnknownReplacement {
                        action: action.name.clone(),
                        replacement: replacement.clone(),
                    });
                }
            }
        }

        debug!(
            actions = actions.len(),
            structs = structs.len(),
            "catalog assembled"
        );
        Ok(Self { actions, structs })
    }

    /// All actions in contribution order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn structs(&self) -> &[StructDef] {
        &self.structs
    }

    pub fn find(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn find_struct(&self, name: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.name == name)
    }

    // ── Derived views ────────────────────────────────────────────────────

    /// Every action, sorted by name.
    pub fn sorted_actions(&self) -> Vec<&Action> {
        let mut v: Vec<&Action> = self.actions.iter().collect();
        v.sort_by(|a, b| a.name.cmp(&b.name));
        v
    }

    /// Actions that get bindings, sorted by name.
    pub fn external_actions(&self) -> Vec<&Action> {
        self.sorted_filter(|a| a.visibility.is_external())
    }

    /// Externally visible actions that take optional arguments.
    pub fn actions_with_optargs(&self) -> Vec<&Action> {
        self.sorted_filter(|a| a.visibility.is_external() && a.has_optargs())
    }

    pub fn deprecated_actions(&self) -> Vec<&Action> {
        self.sorted_filter(|a| a.deprecated.is_deprecated())
    }

    pub fn self_test_actions(&self) -> Vec<&Action> {
        self.sorted_filter(|a| a.visibility == Visibility::BindingSelfTest)
    }

    fn sorted_filter(&self, keep: impl Fn(&Action) -> bool) -> Vec<&Action> {
        self.sorted_actions().into_iter().filter(|a| keep(a)).collect()
    }
}

fn validate_structs(structs: &[StructDef]) -> polybind_types::Result<()> {
    let mut names = HashSet::new();
    for def in structs {
        if !is_identifier(&def.name) {
            return Err(CatalogError::InvalidName {
                what: "struct",
                name: def.name.clone(),
            });
        }
        if !names.insert(def.name.as_str()) {
            return Err(CatalogError::DuplicateStruct {
                name: def.name.clone(),
            });
        }
        if def.fields.is_empty() {
            return Err(CatalogError::EmptyStruct {
                name: def.name.clone(),
            });
        }
        let mut fields = HashSet::new();
        for field in &def.fields {
            if !is_identifier(&field.name) {
                return Err(CatalogError::InvalidName {
                    what: "field",
                    name: field.name.clone(),
                });
            }
            if !fields.insert(field.name.as_str()) {
                return Err(CatalogError::DuplicateField {
                    name: def.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_action(action: &Action, structs: &HashSet<&str>) -> polybind_types::Result<()> {
    let mut args = HashSet::new();
    for arg in &action.args {
        if !is_identifier(&arg.name) {
            return Err(CatalogError::InvalidName {
                what: "argument",
                name: arg.name.clone(),
            });
        }
        if !args.insert(arg.name.as_str()) {
            return Err(CatalogError::DuplicateArg {
                action: action.name.clone(),
                arg: arg.name.clone(),
            });
        }
    }

    let mut optargs = HashSet::new();
    let mut bits: HashMap<u8, &str> = HashMap::new();
    for optarg in &action.optargs {
        if !is_identifier(&optarg.name) {
            return Err(CatalogError::InvalidName {
                what: "optional argument",
                name: optarg.name.clone(),
            });
        }
        if !optargs.insert(optarg.name.as_str()) {
            return Err(CatalogError::DuplicateOptarg {
                action: action.name.clone(),
                optarg: optarg.name.clone(),
            });
        }
        if optarg.bit >= MAX_OPTARG_BITS {
            return Err(CatalogError::BitOutOfRange {
                action: action.name.clone(),
                optarg: optarg.name.clone(),
                bit: optarg.bit,
            });
        }
        if let Some(first) = bits.insert(optarg.bit, &optarg.name) {
            return Err(CatalogError::DuplicateBit {
                action: action.name.clone(),
                bit: optarg.bit,
                first: first.to_string(),
                second: optarg.name.clone(),
            });
        }
    }

    if let Some((name, _)) = action.ret.struct_ref() {
        if !structs.contains(name) {
            return Err(CatalogError::UnknownStruct {
                action: action.name.clone(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polybind_types::{ArgKind, FieldKind, OptArgKind, Return, StringKind, Version};

    const V: Version = Version::new(1, 0, 0);

    fn act(name: &str) -> Action {
        Action::new(name, Return::Err, V).doc("test", "")
    }

    #[test]
    fn duplicate_across_lists() {
        let err = Catalog::new(vec![vec![act("mount")], vec![act("ls"), act("mount")]], vec![])
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateAction {
                name: "mount".into()
            }
        );
    }

    #[test]
    fn duplicate_bit() {
        let a = act("mkfs")
            .optarg("blocksize", OptArgKind::Int, 0)
            .optarg("label", OptArgKind::String, 0);
        let err = Catalog::new(vec![vec![a]], vec![]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateBit { bit: 0, .. }));
    }

    #[test]
    fn bit_out_of_range() {
        let a = act("mkfs").optarg("blocksize", OptArgKind::Int, 64);
        let err = Catalog::new(vec![vec![a]], vec![]).unwrap_err();
        assert!(matches!(err, CatalogError::BitOutOfRange { bit: 64, .. }));
    }

    #[test]
    fn unknown_struct() {
        let a = Action::new(
            "statns",
            Return::Struct {
                name: "statbuf".into(),
                of: "statns".into(),
            },
            V,
        );
        let err = Catalog::new(vec![vec![a]], vec![]).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownStruct { .. }));
    }

    #[test]
    fn struct_checks() {
        let empty = StructDef::new("empty", &[]);
        assert!(matches!(
            Catalog::new(vec![], vec![empty]).unwrap_err(),
            CatalogError::EmptyStruct { .. }
        ));
        let dup = StructDef::new("dirent", &[("ino", FieldKind::Int64), ("ino", FieldKind::Char)]);
        assert!(matches!(
            Catalog::new(vec![], vec![dup]).unwrap_err(),
            CatalogError::DuplicateField { .. }
        ));
    }

    #[test]
    fn unknown_replacement() {
        let a = act("dd").deprecated(Deprecation::ReplacedBy("copy_device".into()));
        assert!(matches!(
            Catalog::new(vec![vec![a]], vec![]).unwrap_err(),
            CatalogError::UnknownReplacement { .. }
        ));
    }

    #[test]
    fn duplicate_arg() {
        let a = act("cp")
            .arg("src", ArgKind::String(StringKind::Path))
            .arg("src", ArgKind::String(StringKind::Path));
        assert!(matches!(
            Catalog::new(vec![vec![a]], vec![]).unwrap_err(),
            CatalogError::DuplicateArg { .. }
        ));
    }

    #[test]
    fn views_are_sorted_and_filtered() {
        let cat = Catalog::new(
            vec![
                vec![act("zero"), act("internal_x").visibility(Visibility::Internal)],
                vec![
                    act("add_drive").optarg("readonly", OptArgKind::Bool, 0),
                    act("internal_test").visibility(Visibility::BindingSelfTest),
                ],
            ],
            vec![],
        )
        .unwrap();
        let names = |v: Vec<&Action>| v.iter().map(|a| a.name.clone()).collect::<Vec<_>>();
        assert_eq!(
            names(cat.sorted_actions()),
            vec!["add_drive", "internal_test", "internal_x", "zero"]
        );
        assert_eq!(
            names(cat.external_actions()),
            vec!["add_drive", "internal_test", "zero"]
        );
        assert_eq!(names(cat.actions_with_optargs()), vec!["add_drive"]);
        assert_eq!(names(cat.self_test_actions()), vec!["internal_test"]);
        // contribution order is kept by `actions()`
        assert_eq!(cat.actions()[0].name, "zero");
    }
}
