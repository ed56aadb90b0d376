//! Argument marshaling and optional-argument packing.

use polybind_codegen::bitmask_for;
use polybind_codegen::marshal::{native_repr, optarg_repr, NativeRepr};
use polybind_types::Action;
use tracing::debug;

use crate::error::{EvalError, EvalResult};
use crate::native::{ArrayId, Heap, NativeArg};
use crate::value::{Options, Value};

/// Convert one caller value to its native form. Arrays are allocated in
/// `heap` and recorded in `temps`; the caller frees them.
///
/// On a type mismatch, returns the name of the expected type.
pub(crate) fn marshal_value(
    repr: &NativeRepr,
    value: &Value,
    heap: &mut Heap,
    temps: &mut Vec<ArrayId>,
) -> Result<NativeArg, &'static str> {
    Ok(match (repr, value) {
        (NativeRepr::Text, Value::Str(s)) => NativeArg::Text(s.clone()),
        (NativeRepr::OptText, Value::OptStr(s)) => NativeArg::OptText(s.clone()),
        (NativeRepr::OptText, Value::Str(s)) => NativeArg::OptText(Some(s.clone())),
        (NativeRepr::TextArray, Value::StrList(items)) => {
            let id = heap.alloc_strings(items);
            temps.push(id);
            NativeArg::TextArray(Some(id))
        }
        (NativeRepr::Bool, Value::Bool(b)) => NativeArg::Int32(i32::from(*b)),
        (NativeRepr::Int32, Value::Int(n)) => {
            NativeArg::Int32(i32::try_from(*n).map_err(|_| "a 32-bit integer")?)
        }
        (NativeRepr::Int64, Value::Int(n)) => NativeArg::Int64(*n),
        (NativeRepr::Buffer, Value::Bytes(b)) => NativeArg::Buffer(b.clone()),
        (NativeRepr::Pointer(_), Value::Pointer(p)) => NativeArg::Pointer(*p),
        (repr, _) => return Err(expected(repr)),
    })
}

fn expected(repr: &NativeRepr) -> &'static str {
    match repr {
        NativeRepr::Text => "a string",
        NativeRepr::OptText => "an optional string",
        NativeRepr::TextArray => "a string list",
        NativeRepr::Bool => "a boolean",
        NativeRepr::Int32 => "a 32-bit integer",
        NativeRepr::Int64 => "an integer",
        NativeRepr::Buffer => "bytes",
        NativeRepr::Pointer(_) => "a pointer",
    }
}

/// Marshal every positional argument, in order.
pub(crate) fn marshal_args(
    action: &Action,
    args: &[Value],
    heap: &mut Heap,
    temps: &mut Vec<ArrayId>,
) -> EvalResult<Vec<NativeArg>> {
    action
        .args
        .iter()
        .zip(args)
        .map(|(arg, value)| {
            marshal_value(&native_repr(&arg.kind), value, heap, temps).map_err(|expected| {
                EvalError::ArgType {
                    action: action.name.clone(),
                    arg: arg.name.clone(),
                    expected,
                }
            })
        })
        .collect()
}

/// One field of the packed structure.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedField {
    pub name: String,
    pub bit: u8,
    pub value: NativeArg,
}

/// The packed optional-argument structure: a mask and one field per
/// optional argument, in bit order.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedOptargs {
    pub bitmask: u64,
    pub fields: Vec<PackedField>,
}

impl PackedOptargs {
    /// Pack the supplied options of `action`.
    ///
    /// A supplied name sets its bit and fills its field; an absent one
    /// leaves both zero. Names the action does not declare are ignored.
    pub fn pack(
        action: &Action,
        options: &Options,
        heap: &mut Heap,
        temps: &mut Vec<ArrayId>,
    ) -> EvalResult<Self> {
        for unknown in options.keys().filter(|k| action.find_optarg(k).is_none()) {
            debug!(action = %action.name, key = %unknown, "ignoring unknown optional argument");
        }
        let bitmask = bitmask_for(action, options.keys().map(String::as_str));
        let mut fields = Vec::with_capacity(action.optargs.len());
        for optarg in action.optargs_by_bit() {
            let repr = optarg_repr(optarg.kind);
            let value = match options.get(&optarg.name) {
                Some(v) => marshal_value(&repr, v, heap, temps).map_err(|expected| {
                    EvalError::ArgType {
                        action: action.name.clone(),
                        arg: optarg.name.clone(),
                        expected,
                    }
                })?,
                None => NativeArg::zero(&repr),
            };
            fields.push(PackedField {
                name: optarg.name.clone(),
                bit: optarg.bit,
                value,
            });
        }
        Ok(Self { bitmask, fields })
    }

    pub fn is_set(&self, bit: u8) -> bool {
        self.bitmask & (1u64 << bit) != 0
    }

    pub fn field(&self, name: &str) -> Option<&NativeArg> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polybind_types::{OptArgKind, Return, Version};

    fn action() -> Action {
        Action::new("act", Return::Err, Version::new(1, 0, 0))
            .optarg("a", OptArgKind::Int, 0)
            .optarg("b", OptArgKind::String, 1)
    }

    fn pack(options: &[(&str, Value)]) -> (PackedOptargs, Heap, Vec<ArrayId>) {
        let options: Options = options
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let mut heap = Heap::new();
        let mut temps = Vec::new();
        let packed = PackedOptargs::pack(&action(), &options, &mut heap, &mut temps).unwrap();
        (packed, heap, temps)
    }

    #[test]
    fn only_the_supplied_bit_is_set() {
        let (p, _, _) = pack(&[("b", Value::str("x"))]);
        assert_eq!(p.bitmask, 1 << 1);
        assert!(p.is_set(1));
        assert!(!p.is_set(0));
        assert_eq!(p.field("a"), Some(&NativeArg::Int32(0)));
        assert_eq!(p.field("b"), Some(&NativeArg::Text("x".into())));
    }

    #[test]
    fn nothing_supplied_packs_zero() {
        let (p, _, _) = pack(&[]);
        assert_eq!(p.bitmask, 0);
        assert!(p.fields.iter().all(|f| f.value.is_zero()));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let (p, _, _) = pack(&[("zzz", Value::Int(1)), ("a", Value::Int(7))]);
        assert_eq!(p.bitmask, 1);
        assert_eq!(p.field("a"), Some(&NativeArg::Int32(7)));
        assert_eq!(p.field("zzz"), None);
    }

    #[test]
    fn wrong_type_is_reported() {
        let options: Options = [("a".to_string(), Value::str("seven"))].into_iter().collect();
        let err = PackedOptargs::pack(&action(), &options, &mut Heap::new(), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, EvalError::ArgType { ref arg, .. } if arg == "a"));
    }

    #[test]
    fn int32_range_is_checked() {
        let mut heap = Heap::new();
        let r = marshal_value(&NativeRepr::Int32, &Value::Int(1 << 40), &mut heap, &mut Vec::new());
        assert_eq!(r, Err("a 32-bit integer"));
    }
}
