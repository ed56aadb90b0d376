//! Caller-side values: what a binding accepts and returns.

use serde::Serialize;
use std::collections::BTreeMap;

use polybind_types::UUID_LEN;

/// A value on the caller's side of a binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Result of an error-only action.
    Unit,
    Bool(bool),
    Int(i64),
    Str(String),
    OptStr(Option<String>),
    StrList(Vec<String>),
    Bytes(Vec<u8>),
    /// Order-preserving key/value mapping.
    Pairs(Vec<(String, String)>),
    Struct(StructValue),
    StructList(Vec<StructValue>),
    /// Opaque pointer passed through untouched.
    Pointer(usize),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(s.to_string())
    }

    pub fn str_list(items: &[&str]) -> Self {
        Value::StrList(items.iter().map(|s| s.to_string()).collect())
    }
}

/// A converted struct: fields in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructValue {
    pub name: String,
    pub fields: Vec<(String, FieldValue)>,
}

impl StructValue {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, v)| v)
    }
}

/// One converted struct field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Char(u8),
    Text(String),
    /// Exactly the bytes the length covered.
    Buffer(Vec<u8>),
    /// Raw identifier bytes.
    Uuid([u8; UUID_LEN]),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    /// Passed through; `-1.0` means unavailable.
    Percent(f32),
}

/// Sparse named options for one call.
pub type Options = BTreeMap<String, Value>;
