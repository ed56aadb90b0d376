//! Action records and the tagged argument / return model.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::structs::StructShape;

/// Optional-argument bits live in a 64-bit mask.
pub const MAX_OPTARG_BITS: u8 = 64;

// ══════════════════════════════════════════════════════════════════════════════
// Positional arguments
// ══════════════════════════════════════════════════════════════════════════════

/// Semantic flavour of a text argument.
///
/// All flavours share one native representation; the flavour only changes
/// documentation and how callers are expected to fill the value in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringKind {
    Plain,
    Path,
    Device,
    FileIn,
    FileOut,
    Key,
}

/// Positional argument kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    /// Non-null text of the given flavour.
    String(StringKind),
    /// Text that may be absent (native null).
    OptString,
    StringList,
    DeviceList,
    /// Opaque bytes, passed as pointer + length.
    BufferIn,
    Bool,
    Int,
    Int64,
    /// Raw pointer passthrough; carries the native type spelling.
    Pointer(String),
}

impl ArgKind {
    /// True for the kinds that marshal into a wrapper-allocated array.
    pub fn is_list(&self) -> bool {
        matches!(self, ArgKind::StringList | ArgKind::DeviceList)
    }
}

/// A required, order-significant argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
    pub name: String,
    pub kind: ArgKind,
}

impl Arg {
    pub fn new(name: impl Into<String>, kind: ArgKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Optional arguments
// ══════════════════════════════════════════════════════════════════════════════

/// Optional argument kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptArgKind {
    Bool,
    Int,
    Int64,
    String,
    StringList,
}

/// A named optional argument with its frozen bit position.
///
/// Bit positions are part of the native ABI: once published they are never
/// reassigned to a different argument of the same action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptArg {
    pub name: String,
    pub kind: OptArgKind,
    pub bit: u8,
}

impl OptArg {
    pub fn new(name: impl Into<String>, kind: OptArgKind, bit: u8) -> Self {
        Self {
            name: name.into(),
            kind,
            bit,
        }
    }

    /// The mask value with only this argument's bit set.
    pub fn mask(&self) -> u64 {
        1u64 << self.bit
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Return styles
// ══════════════════════════════════════════════════════════════════════════════

/// Return styles. Every non-`Err` style carries the result identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Return {
    /// No value; only success or failure.
    Err,
    Int(String),
    Int64(String),
    Bool(String),
    /// Text owned by the handle; the caller must not free it.
    ConstString(String),
    /// Like `ConstString` but may legitimately be null.
    ConstOptString(String),
    /// Text owned by the caller.
    String(String),
    StringList(String),
    /// Flat list of alternating keys and values.
    Hashtable(String),
    /// One struct of the named type.
    Struct { name: String, of: String },
    /// A counted array of the named struct type.
    StructList { name: String, of: String },
    /// Bytes with an explicit length returned through an out parameter.
    BufferOut(String),
}

impl Return {
    /// The result identifier, `None` for [`Return::Err`].
    pub fn result_name(&self) -> Option<&str> {
        match self {
            Return::Err => None,
            Return::Int(n)
            | Return::Int64(n)
            | Return::Bool(n)
            | Return::ConstString(n)
            | Return::ConstOptString(n)
            | Return::String(n)
            | Return::StringList(n)
            | Return::Hashtable(n)
            | Return::BufferOut(n) => Some(n),
            Return::Struct { name, .. } | Return::StructList { name, .. } => Some(name),
        }
    }

    /// The struct type this return references, with its shape.
    pub fn struct_ref(&self) -> Option<(&str, StructShape)> {
        match self {
            Return::Struct { of, .. } => Some((of, StructShape::Single)),
            Return::StructList { of, .. } => Some((of, StructShape::List)),
            _ => None,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Metadata
// ══════════════════════════════════════════════════════════════════════════════

/// Release in which an action first appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub release: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, release: u32) -> Self {
        Self {
            major,
            minor,
            release,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.release)
    }
}

/// Who gets to see an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    External,
    /// Only callable from inside the native library.
    Internal,
    /// Debugging entry points; bound but undocumented.
    Debug,
    /// Exists to exercise the bindings themselves.
    BindingSelfTest,
}

impl Visibility {
    /// Everything except [`Visibility::Internal`] is bound.
    pub fn is_external(self) -> bool {
        !matches!(self, Visibility::Internal)
    }
}

/// Deprecation status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deprecation {
    #[default]
    None,
    ReplacedBy(String),
    NoReplacement,
}

impl Deprecation {
    pub fn is_deprecated(&self) -> bool {
        !matches!(self, Deprecation::None)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Action
// ══════════════════════════════════════════════════════════════════════════════

/// One API entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub added: Version,
    pub ret: Return,
    #[serde(default)]
    pub args: Vec<Arg>,
    #[serde(default)]
    pub optargs: Vec<OptArg>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub deprecated: Deprecation,
    pub shortdesc: String,
    #[serde(default)]
    pub longdesc: String,
}

impl Action {
    /// Start an external, non-deprecated action with no arguments.
    pub fn new(name: impl Into<String>, ret: Return, added: Version) -> Self {
        Self {
            name: name.into(),
            added,
            ret,
            args: Vec::new(),
            optargs: Vec::new(),
            visibility: Visibility::External,
            deprecated: Deprecation::None,
            shortdesc: String::new(),
            longdesc: String::new(),
        }
    }

    pub fn arg(mut self, name: &str, kind: ArgKind) -> Self {
        self.args.push(Arg::new(name, kind));
        self
    }

    pub fn optarg(mut self, name: &str, kind: OptArgKind, bit: u8) -> Self {
        self.optargs.push(OptArg::new(name, kind, bit));
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn deprecated(mut self, deprecated: Deprecation) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn doc(mut self, shortdesc: &str, longdesc: &str) -> Self {
        self.shortdesc = shortdesc.to_string();
        self.longdesc = longdesc.to_string();
        self
    }

    pub fn has_optargs(&self) -> bool {
        !self.optargs.is_empty()
    }

    /// Optional arguments ordered by bit position (the native field order).
    pub fn optargs_by_bit(&self) -> Vec<&OptArg> {
        let mut v: Vec<&OptArg> = self.optargs.iter().collect();
        v.sort_by_key(|o| o.bit);
        v
    }

    pub fn find_optarg(&self, name: &str) -> Option<&OptArg> {
        self.optargs.iter().find(|o| o.name == name)
    }

    /// True if any positional or optional argument needs a temporary array.
    pub fn needs_temporaries(&self) -> bool {
        self.args.iter().any(|a| a.kind.is_list())
            || self
                .optargs
                .iter()
                .any(|o| o.kind == OptArgKind::StringList)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Action {
        Action::new("add_drive", Return::Err, Version::new(1, 5, 23))
            .arg("filename", ArgKind::String(StringKind::Path))
            .optarg("label", OptArgKind::String, 3)
            .optarg("readonly", OptArgKind::Bool, 0)
            .optarg("format", OptArgKind::String, 1)
            .doc("add an image", "Adds an image.")
    }

    #[test]
    fn optargs_sorted_by_bit() {
        let a = sample();
        let names: Vec<&str> = a.optargs_by_bit().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["readonly", "format", "label"]);
    }

    #[test]
    fn optarg_mask() {
        let a = sample();
        assert_eq!(a.find_optarg("label").map(OptArg::mask), Some(8));
        assert!(a.find_optarg("iface").is_none());
    }

    #[test]
    fn result_names() {
        assert_eq!(Return::Err.result_name(), None);
        assert_eq!(Return::Bool("isdir".into()).result_name(), Some("isdir"));
        let r = Return::StructList {
            name: "pvs".into(),
            of: "lvm_pv".into(),
        };
        assert_eq!(r.result_name(), Some("pvs"));
        assert_eq!(r.struct_ref(), Some(("lvm_pv", StructShape::List)));
    }

    #[test]
    fn temporaries() {
        assert!(!sample().needs_temporaries());
        let a = sample().arg("names", ArgKind::StringList);
        assert!(a.needs_temporaries());
        let b = Action::new("x", Return::Err, Version::new(1, 0, 0)).optarg(
            "features",
            OptArgKind::StringList,
            0,
        );
        assert!(b.needs_temporaries());
    }

    #[test]
    fn visibility_and_deprecation() {
        assert!(Visibility::Debug.is_external());
        assert!(Visibility::BindingSelfTest.is_external());
        assert!(!Visibility::Internal.is_external());
        assert!(Deprecation::NoReplacement.is_deprecated());
        assert!(!Deprecation::None.is_deprecated());
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["ret"], "err");
        assert_eq!(json["args"][0]["kind"]["string"], "path");
        assert_eq!(json["visibility"], "external");
        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn version_display() {
        assert_eq!(Version::new(1, 19, 60).to_string(), "1.19.60");
    }
}
