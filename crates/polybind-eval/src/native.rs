//! The native side of the boundary.
//!
//! [`NativeArg`] is what an entry point receives after marshaling,
//! [`NativeReturn`] what it hands back. Temporary string arrays live in a
//! [`Heap`] that counts allocations, so a leaked temporary is observable.

use std::collections::BTreeMap;

use polybind_codegen::marshal::NativeRepr;
use polybind_types::UUID_LEN;

use crate::pack::PackedOptargs;

/// Handle of one array in a [`Heap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrayId(usize);

/// Tracking allocator for sentinel-terminated string arrays.
#[derive(Debug, Default)]
pub struct Heap {
    next: usize,
    allocations: usize,
    live: BTreeMap<ArrayId, Vec<Option<String>>>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `items` into a new array terminated by a null entry.
    pub fn alloc_strings(&mut self, items: &[String]) -> ArrayId {
        let id = ArrayId(self.next);
        self.next += 1;
        self.allocations += 1;
        let mut array: Vec<Option<String>> = items.iter().cloned().map(Some).collect();
        array.push(None);
        self.live.insert(id, array);
        id
    }

    /// Elements up to the terminator, or `None` if `id` is not live.
    pub fn strings(&self, id: ArrayId) -> Option<Vec<&str>> {
        self.live
            .get(&id)
            .map(|a| a.iter().map_while(|s| s.as_deref()).collect())
    }

    /// Release an array. Returns `false` if it was not live.
    pub fn free(&mut self, id: ArrayId) -> bool {
        self.live.remove(&id).is_some()
    }

    /// Arrays allocated and not yet freed.
    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// Arrays ever allocated.
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}

/// A marshaled argument or optargs field.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeArg {
    Text(String),
    /// Null when `None`.
    OptText(Option<String>),
    /// Null when `None`; only an unset options field is null.
    TextArray(Option<ArrayId>),
    /// Booleans travel as 0 or 1.
    Int32(i32),
    Int64(i64),
    Buffer(Vec<u8>),
    Pointer(usize),
}

impl NativeArg {
    /// The zero value of a field of this representation.
    pub fn zero(repr: &NativeRepr) -> Self {
        match repr {
            NativeRepr::Text | NativeRepr::OptText => NativeArg::OptText(None),
            NativeRepr::TextArray => NativeArg::TextArray(None),
            NativeRepr::Bool | NativeRepr::Int32 => NativeArg::Int32(0),
            NativeRepr::Int64 => NativeArg::Int64(0),
            NativeRepr::Buffer => NativeArg::Buffer(Vec::new()),
            NativeRepr::Pointer(_) => NativeArg::Pointer(0),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            NativeArg::Text(_) => false,
            NativeArg::OptText(s) => s.is_none(),
            NativeArg::TextArray(a) => a.is_none(),
            NativeArg::Int32(n) => *n == 0,
            NativeArg::Int64(n) => *n == 0,
            NativeArg::Buffer(b) => b.is_empty(),
            NativeArg::Pointer(p) => *p == 0,
        }
    }
}

/// One raw struct field as the native library lays it out.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeField {
    Char(u8),
    Text(String),
    /// `data` may extend past `len`; only `len` bytes are meaningful.
    Buffer { len: u32, data: Vec<u8> },
    Uuid([u8; UUID_LEN]),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float(f32),
}

/// A raw struct record, fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeRecord {
    pub fields: Vec<NativeField>,
}

impl NativeRecord {
    pub fn new(fields: Vec<NativeField>) -> Self {
        Self { fields }
    }
}

/// What an entry point returns. `None` stands for a null pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeReturn {
    Int(i64),
    Text(Option<String>),
    /// Elements before the terminating null.
    TextArray(Option<Vec<String>>),
    Record(Option<NativeRecord>),
    Records(Option<Vec<NativeRecord>>),
    Buffer(Option<Vec<u8>>),
}

impl NativeReturn {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            NativeReturn::Text(None)
                | NativeReturn::TextArray(None)
                | NativeReturn::Record(None)
                | NativeReturn::Records(None)
                | NativeReturn::Buffer(None)
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            NativeReturn::Int(_) => "an integer",
            NativeReturn::Text(_) => "a string",
            NativeReturn::TextArray(_) => "a string array",
            NativeReturn::Record(_) => "a struct",
            NativeReturn::Records(_) => "a struct list",
            NativeReturn::Buffer(_) => "a buffer",
        }
    }
}

/// The wrapped library, as a binding sees it.
pub trait NativeLibrary {
    /// Call `entry` with marshaled arguments. Temporary arrays are readable
    /// through `heap` for the duration of the call.
    fn call(
        &mut self,
        entry: &str,
        args: &[NativeArg],
        optargs: Option<&PackedOptargs>,
        heap: &Heap,
    ) -> NativeReturn;

    /// Text describing the most recent failure on the handle.
    fn last_error(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_are_terminated_and_tracked() {
        let mut heap = Heap::new();
        let id = heap.alloc_strings(&["a".into(), "b".into()]);
        assert_eq!(heap.strings(id), Some(vec!["a", "b"]));
        assert_eq!(heap.live(), 1);
        assert!(heap.free(id));
        assert!(!heap.free(id));
        assert_eq!(heap.live(), 0);
        assert_eq!(heap.allocations(), 1);
        assert_eq!(heap.strings(id), None);
    }

    #[test]
    fn zero_fields() {
        for repr in [
            NativeRepr::Text,
            NativeRepr::TextArray,
            NativeRepr::Bool,
            NativeRepr::Int64,
            NativeRepr::Pointer("void *".into()),
        ] {
            assert!(NativeArg::zero(&repr).is_zero(), "{repr:?}");
        }
    }
}
