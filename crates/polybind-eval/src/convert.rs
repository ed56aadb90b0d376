//! Result conversion (step 8).

use polybind_catalog::Catalog;
use polybind_types::{Field, FieldKind, Return, StructDef};

use crate::error::{EvalError, EvalResult};
use crate::native::{NativeField, NativeRecord, NativeReturn};
use crate::value::{FieldValue, StructValue, Value};

/// Convert a successful native result according to the return style.
pub fn result(catalog: &Catalog, ret: &Return, native: NativeReturn) -> EvalResult<Value> {
    Ok(match (ret, native) {
        (Return::Err, NativeReturn::Int(_)) => Value::Unit,
        (Return::Int(_) | Return::Int64(_), NativeReturn::Int(n)) => Value::Int(n),
        (Return::Bool(_), NativeReturn::Int(n)) => Value::Bool(n != 0),
        (Return::ConstString(_) | Return::String(_), NativeReturn::Text(Some(s))) => Value::Str(s),
        (Return::ConstOptString(_), NativeReturn::Text(s)) => Value::OptStr(s),
        (Return::StringList(_), NativeReturn::TextArray(Some(v))) => Value::StrList(v),
        (Return::Hashtable(_), NativeReturn::TextArray(Some(v))) => Value::Pairs(pairs(&v)),
        (Return::Struct { of, .. }, NativeReturn::Record(Some(r))) => {
            Value::Struct(record(lookup(catalog, of)?, &r)?)
        }
        (Return::StructList { of, .. }, NativeReturn::Records(Some(rs))) => {
            Value::StructList(records(lookup(catalog, of)?, &rs)?)
        }
        (Return::BufferOut(_), NativeReturn::Buffer(Some(b))) => Value::Bytes(b),
        (ret, native) => {
            return Err(EvalError::Conversion(format!(
                "{ret:?} cannot be built from {}",
                native.describe()
            )))
        }
    })
}

fn lookup<'c>(catalog: &'c Catalog, of: &str) -> EvalResult<&'c StructDef> {
    catalog
        .find_struct(of)
        .ok_or_else(|| EvalError::Conversion(format!("unknown struct {of}")))
}

/// Reinterpret a flat key/value array as ordered pairs. A dangling final
/// key has no value and is dropped.
pub fn pairs(flat: &[String]) -> Vec<(String, String)> {
    flat.chunks_exact(2)
        .map(|kv| (kv[0].clone(), kv[1].clone()))
        .collect()
}

/// Convert one raw record field by field.
pub fn record(def: &StructDef, raw: &NativeRecord) -> EvalResult<StructValue> {
    if raw.fields.len() != def.fields.len() {
        return Err(EvalError::Conversion(format!(
            "{}: expected {} fields, got {}",
            def.name,
            def.fields.len(),
            raw.fields.len()
        )));
    }
    let fields = def
        .fields
        .iter()
        .zip(&raw.fields)
        .map(|(f, v)| Ok((f.name.clone(), field(def, f, v)?)))
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(StructValue {
        name: def.name.clone(),
        fields,
    })
}

/// Repeated element conversion, preserving native order.
pub fn records(def: &StructDef, raws: &[NativeRecord]) -> EvalResult<Vec<StructValue>> {
    raws.iter().map(|r| record(def, r)).collect()
}

fn field(def: &StructDef, f: &Field, raw: &NativeField) -> EvalResult<FieldValue> {
    Ok(match (f.kind, raw) {
        (FieldKind::Char, NativeField::Char(c)) => FieldValue::Char(*c),
        (FieldKind::String, NativeField::Text(s)) => FieldValue::Text(s.clone()),
        (FieldKind::Buffer, NativeField::Buffer { len, data }) => {
            let bytes = data.get(..*len as usize).ok_or_else(|| {
                EvalError::Conversion(format!(
                    "{}.{}: length {len} exceeds {} bytes",
                    def.name,
                    f.name,
                    data.len()
                ))
            })?;
            FieldValue::Buffer(bytes.to_vec())
        }
        (FieldKind::Uuid, NativeField::Uuid(u)) => FieldValue::Uuid(*u),
        (FieldKind::UInt32, NativeField::UInt32(v)) => FieldValue::UInt32(*v),
        (FieldKind::Int32, NativeField::Int32(v)) => FieldValue::Int32(*v),
        (FieldKind::UInt64 | FieldKind::Bytes, NativeField::UInt64(v)) => FieldValue::UInt64(*v),
        (FieldKind::Int64, NativeField::Int64(v)) => FieldValue::Int64(*v),
        (FieldKind::OptPercent, NativeField::Float(v)) => FieldValue::Percent(*v),
        (kind, _) => {
            return Err(EvalError::Conversion(format!(
                "{}.{}: not a {kind:?} field",
                def.name, f.name
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn pairs_keep_order() {
        let flat = vec![s("k2"), s("v2"), s("k1"), s("v1")];
        assert_eq!(pairs(&flat), vec![(s("k2"), s("v2")), (s("k1"), s("v1"))]);
        assert!(pairs(&[]).is_empty());
        assert_eq!(pairs(&[s("k"), s("v"), s("dangling")]).len(), 1);
    }

    #[test]
    fn buffers_use_the_length() {
        let def = StructDef::new("x", &[("attrval", FieldKind::Buffer)]);
        let raw = NativeRecord::new(vec![NativeField::Buffer {
            len: 3,
            data: vec![b'a', 0, b'b', b'c', 0],
        }]);
        let v = record(&def, &raw).unwrap();
        assert_eq!(v.get("attrval"), Some(&FieldValue::Buffer(vec![b'a', 0, b'b'])));

        let short = NativeRecord::new(vec![NativeField::Buffer {
            len: 9,
            data: vec![1],
        }]);
        assert!(record(&def, &short).is_err());
    }

    #[test]
    fn percent_is_not_clamped() {
        let def = StructDef::new("lv", &[("snap_percent", FieldKind::OptPercent)]);
        for p in [-1.0f32, 0.0, 42.5, 150.0] {
            let v = record(&def, &NativeRecord::new(vec![NativeField::Float(p)])).unwrap();
            assert_eq!(v.get("snap_percent"), Some(&FieldValue::Percent(p)));
        }
    }

    #[test]
    fn field_kind_mismatch() {
        let def = StructDef::new("x", &[("n", FieldKind::Int32)]);
        let raw = NativeRecord::new(vec![NativeField::Int64(1)]);
        assert!(matches!(record(&def, &raw), Err(EvalError::Conversion(_))));
    }
}
