//! The argument-marshaling table and the native (C) spelling of the ABI.
//!
//! Every positional and optional argument kind maps to exactly one
//! [`NativeRepr`]. Targets translate a `NativeRepr` into their own types;
//! none of them inspects [`ArgKind`] directly, so a new kind is added here
//! and nowhere else.

use std::borrow::Cow;

use polybind_catalog::StructUsage;
use polybind_types::{Action, ArgKind, Field, FieldKind, OptArgKind, Return, StructDef, UUID_LEN};

/// Native representation of an argument for the duration of one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeRepr {
    /// Immutable text pointer, owned by the caller for the call duration.
    Text,
    /// Like `Text`, or null when absent.
    OptText,
    /// Null-terminated array of text pointers the wrapper allocates before
    /// the call and frees after it.
    TextArray,
    /// `int`, zero or one.
    Bool,
    Int32,
    Int64,
    /// Pointer plus length.
    Buffer,
    /// Passed through untouched; carries the native type spelling.
    Pointer(String),
}

/// Marshaling of a positional argument.
pub fn native_repr(kind: &ArgKind) -> NativeRepr {
    match kind {
        ArgKind::String(_) => NativeRepr::Text,
        ArgKind::OptString => NativeRepr::OptText,
        ArgKind::StringList | ArgKind::DeviceList => NativeRepr::TextArray,
        ArgKind::BufferIn => NativeRepr::Buffer,
        ArgKind::Bool => NativeRepr::Bool,
        ArgKind::Int => NativeRepr::Int32,
        ArgKind::Int64 => NativeRepr::Int64,
        ArgKind::Pointer(t) => NativeRepr::Pointer(t.clone()),
    }
}

/// Marshaling of an optional argument's structure field.
pub fn optarg_repr(kind: OptArgKind) -> NativeRepr {
    match kind {
        OptArgKind::Bool => NativeRepr::Bool,
        OptArgKind::Int => NativeRepr::Int32,
        OptArgKind::Int64 => NativeRepr::Int64,
        OptArgKind::String => NativeRepr::Text,
        OptArgKind::StringList => NativeRepr::TextArray,
    }
}

impl NativeRepr {
    /// Whether the wrapper owns a heap allocation for this argument.
    pub fn needs_temporary(&self) -> bool {
        matches!(self, NativeRepr::TextArray)
    }

    /// C parameter declarations (a buffer takes two).
    pub fn c_params(&self, name: &str) -> Vec<String> {
        let name = c_ident(name);
        match self {
            NativeRepr::Text | NativeRepr::OptText => vec![format!("const char *{name}")],
            NativeRepr::TextArray => vec![format!("char *const *{name}")],
            NativeRepr::Bool | NativeRepr::Int32 => vec![format!("int {name}")],
            NativeRepr::Int64 => vec![format!("int64_t {name}")],
            NativeRepr::Buffer => vec![
                format!("const char *{name}"),
                format!("size_t {name}_size"),
            ],
            NativeRepr::Pointer(t) => vec![pointer_decl(t, &name)],
        }
    }
}

fn pointer_decl(ty: &str, name: &str) -> String {
    if ty.ends_with('*') {
        format!("{ty}{name}")
    } else {
        format!("{ty} {name}")
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Native names
// ══════════════════════════════════════════════════════════════════════════════

pub fn handle_type(prefix: &str) -> String {
    format!("{prefix}_h")
}

/// The entry point a binding calls: the `_argv` variant when the action
/// takes optional arguments.
pub fn entry_point(prefix: &str, action: &Action) -> String {
    if action.has_optargs() {
        format!("{prefix}_{}_argv", action.name)
    } else {
        format!("{prefix}_{}", action.name)
    }
}

/// Tag of the packed optional-argument structure.
pub fn optargs_struct(prefix: &str, action: &Action) -> String {
    format!("{prefix}_{}_argv", action.name)
}

pub fn struct_tag(prefix: &str, of: &str) -> String {
    format!("{prefix}_{of}")
}

pub fn list_tag(prefix: &str, of: &str) -> String {
    format!("{prefix}_{of}_list")
}

pub fn free_fn(prefix: &str, of: &str) -> String {
    format!("{prefix}_free_{of}")
}

pub fn free_list_fn(prefix: &str, of: &str) -> String {
    format!("{prefix}_free_{of}_list")
}

const C_KEYWORDS: &[&str] = &[
    "auto", "bool", "break", "case", "char", "const", "continue", "default", "do", "double",
    "else", "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while",
];

/// `name` made safe as a C identifier.
pub fn c_ident(name: &str) -> Cow<'_, str> {
    if C_KEYWORDS.contains(&name) {
        Cow::Owned(format!("{name}_"))
    } else {
        Cow::Borrowed(name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// C declarations
// ══════════════════════════════════════════════════════════════════════════════

/// C return type of an action's entry point.
pub fn c_return_type(prefix: &str, ret: &Return) -> String {
    match ret {
        Return::Err | Return::Int(_) | Return::Bool(_) => "int".into(),
        Return::Int64(_) => "int64_t".into(),
        Return::ConstString(_) | Return::ConstOptString(_) => "const char *".into(),
        Return::String(_) | Return::BufferOut(_) => "char *".into(),
        Return::StringList(_) | Return::Hashtable(_) => "char **".into(),
        Return::Struct { of, .. } => format!("struct {} *", struct_tag(prefix, of)),
        Return::StructList { of, .. } => format!("struct {} *", list_tag(prefix, of)),
    }
}

/// Parameters of the native entry point: handle, positional arguments,
/// the size out-parameter of a buffer return, then the optargs pointer.
pub fn c_params(prefix: &str, action: &Action) -> Vec<String> {
    let mut params = vec![format!("{} *g", handle_type(prefix))];
    for arg in &action.args {
        params.extend(native_repr(&arg.kind).c_params(&arg.name));
    }
    if matches!(action.ret, Return::BufferOut(_)) {
        params.push("size_t *size_r".into());
    }
    if action.has_optargs() {
        params.push(format!(
            "const struct {} *optargs",
            optargs_struct(prefix, action)
        ));
    }
    params
}

/// A complete `extern` prototype.
pub fn c_prototype(prefix: &str, action: &Action) -> String {
    let ret = c_return_type(prefix, &action.ret);
    let sep = if ret.ends_with('*') { "" } else { " " };
    format!(
        "extern {ret}{sep}{} ({});",
        entry_point(prefix, action),
        c_params(prefix, action).join(", ")
    )
}

/// Field declarations for one struct field (a buffer takes two).
pub fn c_field_decls(field: &Field) -> Vec<String> {
    let name = c_ident(&field.name);
    match field.kind {
        FieldKind::Char => vec![format!("char {name};")],
        FieldKind::String => vec![format!("char *{name};")],
        FieldKind::Buffer => vec![
            format!("uint32_t {name}_len;"),
            format!("char *{name};"),
        ],
        FieldKind::Uuid => vec![format!("char {name}[{UUID_LEN}];")],
        FieldKind::UInt32 => vec![format!("uint32_t {name};")],
        FieldKind::Int32 => vec![format!("int32_t {name};")],
        FieldKind::UInt64 | FieldKind::Bytes => vec![format!("uint64_t {name};")],
        FieldKind::Int64 => vec![format!("int64_t {name};")],
        FieldKind::OptPercent => vec![format!("float {name};")],
    }
}

/// The record struct, the counted list struct when the usage needs one,
/// and the matching free prototypes.
pub fn c_struct_decls(prefix: &str, def: &StructDef, usage: StructUsage) -> Vec<String> {
    let tag = struct_tag(prefix, &def.name);
    let mut out = vec![format!("struct {tag} {{")];
    for field in &def.fields {
        out.extend(c_field_decls(field).into_iter().map(|l| format!("  {l}")));
    }
    out.push("};".into());
    out.push(format!(
        "extern void {} (struct {tag} *);",
        free_fn(prefix, &def.name)
    ));
    if usage.has_list() {
        let list = list_tag(prefix, &def.name);
        out.push(format!("struct {list} {{"));
        out.push("  uint32_t len;".into());
        out.push(format!("  struct {tag} *val;"));
        out.push("};".into());
        out.push(format!(
            "extern void {} (struct {list} *);",
            free_list_fn(prefix, &def.name)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use polybind_types::{StringKind, Version};

    fn v() -> Version {
        Version::new(1, 0, 0)
    }

    #[test]
    fn every_text_flavour_shares_one_repr() {
        for k in [
            StringKind::Plain,
            StringKind::Path,
            StringKind::Device,
            StringKind::FileIn,
            StringKind::FileOut,
            StringKind::Key,
        ] {
            assert_eq!(native_repr(&ArgKind::String(k)), NativeRepr::Text);
        }
        assert_eq!(native_repr(&ArgKind::DeviceList), NativeRepr::TextArray);
        assert!(native_repr(&ArgKind::StringList).needs_temporary());
        assert!(!native_repr(&ArgKind::BufferIn).needs_temporary());
    }

    #[test]
    fn prototypes() {
        let mount = Action::new("mount", Return::Err, v())
            .arg("mountable", ArgKind::String(StringKind::Device))
            .arg("mountpoint", ArgKind::String(StringKind::Path));
        assert_eq!(
            c_prototype("guestfs", &mount),
            "extern int guestfs_mount (guestfs_h *g, const char *mountable, const char *mountpoint);"
        );

        let read = Action::new("read_file", Return::BufferOut("content".into()), v())
            .arg("path", ArgKind::String(StringKind::Path));
        assert_eq!(
            c_prototype("guestfs", &read),
            "extern char *guestfs_read_file (guestfs_h *g, const char *path, size_t *size_r);"
        );

        let write = Action::new("write", Return::Err, v())
            .arg("content", ArgKind::BufferIn)
            .optarg("sync", OptArgKind::Bool, 0);
        assert_eq!(
            c_prototype("guestfs", &write),
            "extern int guestfs_write_argv (guestfs_h *g, const char *content, size_t content_size, \
             const struct guestfs_write_argv *optargs);"
        );
    }

    #[test]
    fn pointer_spelling() {
        let r = NativeRepr::Pointer("void *".into());
        assert_eq!(r.c_params("data"), vec!["void *data".to_string()]);
        let r = NativeRepr::Pointer("intptr_t".into());
        assert_eq!(r.c_params("data"), vec!["intptr_t data".to_string()]);
    }

    #[test]
    fn keywords_are_escaped() {
        assert_eq!(c_ident("default"), "default_");
        assert_eq!(c_ident("device"), "device");
    }

    #[test]
    fn list_struct_only_when_used_as_list() {
        let def = StructDef::new(
            "xattr",
            &[("attrname", FieldKind::String), ("attrval", FieldKind::Buffer)],
        );
        let single = c_struct_decls("guestfs", &def, StructUsage::SingletonOnly);
        assert!(single.iter().all(|l| !l.contains("_list")));
        let both = c_struct_decls("guestfs", &def, StructUsage::Both);
        assert!(both.contains(&"  uint32_t attrval_len;".to_string()));
        assert!(both.contains(&"struct guestfs_xattr_list {".to_string()));
        assert!(both
            .contains(&"extern void guestfs_free_xattr_list (struct guestfs_xattr_list *);".to_string()));
    }
}
