//! Struct types returned by actions.
//!
//! Field order is the native record layout. Fields may be appended to a
//! struct, never reordered or removed.

use serde::{Deserialize, Serialize};

/// Width of the fixed identifier field, in bytes.
pub const UUID_LEN: usize = 16;

/// Physical representation of one struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A single character.
    Char,
    /// Null-terminated text.
    String,
    /// Length-prefixed bytes (`<name>_len` then `<name>`).
    Buffer,
    /// [`UUID_LEN`] raw bytes, not null-terminated.
    Uuid,
    UInt32,
    Int32,
    UInt64,
    Int64,
    /// A 64-bit byte count.
    Bytes,
    /// A percentage, or -1 when unavailable.
    OptPercent,
}

/// One named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

/// A fixed, ordered-field native record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<Field>,
}

impl StructDef {
    pub fn new(name: &str, fields: &[(&str, FieldKind)]) -> Self {
        Self {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(n, k)| Field {
                    name: (*n).to_string(),
                    kind: *k,
                })
                .collect(),
        }
    }
}

/// Whether an action returns one struct or a list of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructShape {
    Single,
    List,
}
