//! Rust bindings (`rust/src/bindings.rs`).
//!
//! The generated module expects the hand-written part of the binding crate
//! to provide `crate::base::{<prefix>_h, Handle}` (with a raw `g` field and
//! `get_error_from_handle(&self, &'static str) -> Error`) and
//! `crate::error::Error` implementing `From<NulError>` and
//! `From<Utf8Error>`. Everything else, including the string helpers, is
//! emitted into the file itself.

use std::borrow::Cow;

use polybind_catalog::StructUsage;
use polybind_types::{Deprecation, ErrorConvention, FieldKind, OptArgKind, Return, StructDef};

use crate::buffer::{SourceBuf, GENERATED_MARKER};
use crate::marshal::{entry_point, free_fn, free_list_fn, handle_type, native_repr, NativeRepr};
use crate::optargs::OptargsLayout;
use crate::target::{camel_case, ActionCtx, GenContext, Sections, Target};

/// Emits safe Rust wrappers over `extern "C"` declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustTarget;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use",
    "virtual", "where", "while", "yield",
];

fn ident(name: &str) -> Cow<'_, str> {
    match name {
        "self" | "Self" | "super" | "crate" => Cow::Owned(format!("{name}_")),
        n if KEYWORDS.contains(&n) => Cow::Owned(format!("r#{n}")),
        n => Cow::Borrowed(n),
    }
}

fn raw_struct(of: &str) -> String {
    format!("Raw{}", camel_case(of))
}

fn raw_list(of: &str) -> String {
    format!("Raw{}List", camel_case(of))
}

fn list_from_raw(of: &str) -> String {
    format!("{of}_list_from_raw")
}

fn optargs_raw(a: &ActionCtx<'_>) -> String {
    format!("Raw{}Argv", camel_case(a.name()))
}

fn optargs_public(a: &ActionCtx<'_>) -> String {
    format!("{}OptArgs", camel_case(a.name()))
}

/// Whether the options type borrows caller data.
fn optargs_borrow(layout: &OptargsLayout<'_>) -> bool {
    layout
        .slots
        .iter()
        .any(|s| matches!(s.optarg.kind, OptArgKind::String | OptArgKind::StringList))
}

// ── Type tables ─────────────────────────────────────────────────────────────

fn ffi_param(repr: &NativeRepr, name: &str) -> Vec<String> {
    match repr {
        NativeRepr::Text | NativeRepr::OptText => vec![format!("{name}: *const c_char")],
        NativeRepr::TextArray => vec![format!("{name}: *const *const c_char")],
        NativeRepr::Bool | NativeRepr::Int32 => vec![format!("{name}: c_int")],
        NativeRepr::Int64 => vec![format!("{name}: i64")],
        NativeRepr::Buffer => vec![
            format!("{name}: *const c_char"),
            format!("{name}_size: usize"),
        ],
        NativeRepr::Pointer(_) => vec![format!("{name}: *mut c_void")],
    }
}

fn ffi_field(repr: &NativeRepr) -> &'static str {
    match repr {
        NativeRepr::Text | NativeRepr::OptText => "*const c_char",
        NativeRepr::TextArray => "*const *const c_char",
        NativeRepr::Bool | NativeRepr::Int32 => "c_int",
        NativeRepr::Int64 => "i64",
        NativeRepr::Buffer | NativeRepr::Pointer(_) => "*mut c_void",
    }
}

fn ffi_zero(repr: &NativeRepr) -> &'static str {
    match repr {
        NativeRepr::Text | NativeRepr::OptText | NativeRepr::TextArray => "ptr::null()",
        NativeRepr::Buffer | NativeRepr::Pointer(_) => "ptr::null_mut()",
        NativeRepr::Bool | NativeRepr::Int32 | NativeRepr::Int64 => "0",
    }
}

fn param_type(repr: &NativeRepr) -> &'static str {
    match repr {
        NativeRepr::Text => "&str",
        NativeRepr::OptText => "Option<&str>",
        NativeRepr::TextArray => "&[&str]",
        NativeRepr::Bool => "bool",
        NativeRepr::Int32 => "i32",
        NativeRepr::Int64 => "i64",
        NativeRepr::Buffer => "&[u8]",
        NativeRepr::Pointer(_) => "*mut c_void",
    }
}

fn optarg_type(kind: OptArgKind) -> &'static str {
    match kind {
        OptArgKind::Bool => "bool",
        OptArgKind::Int => "i32",
        OptArgKind::Int64 => "i64",
        OptArgKind::String => "&'a str",
        OptArgKind::StringList => "&'a [&'a str]",
    }
}

fn ffi_return(ret: &Return) -> String {
    match ret {
        Return::Err | Return::Int(_) | Return::Bool(_) => "c_int".into(),
        Return::Int64(_) => "i64".into(),
        Return::ConstString(_) | Return::ConstOptString(_) => "*const c_char".into(),
        Return::String(_) | Return::BufferOut(_) => "*mut c_char".into(),
        Return::StringList(_) | Return::Hashtable(_) => "*mut *mut c_char".into(),
        Return::Struct { of, .. } => format!("*mut {}", raw_struct(of)),
        Return::StructList { of, .. } => format!("*mut {}", raw_list(of)),
    }
}

fn result_type(ret: &Return) -> String {
    match ret {
        Return::Err => "()".into(),
        Return::Int(_) => "i32".into(),
        Return::Int64(_) => "i64".into(),
        Return::Bool(_) => "bool".into(),
        Return::ConstString(_) | Return::String(_) => "String".into(),
        Return::ConstOptString(_) => "Option<String>".into(),
        Return::StringList(_) => "Vec<String>".into(),
        Return::Hashtable(_) => "Vec<(String, String)>".into(),
        Return::Struct { of, .. } => camel_case(of),
        Return::StructList { of, .. } => format!("Vec<{}>", camel_case(of)),
        Return::BufferOut(_) => "Vec<u8>".into(),
    }
}

fn raw_field_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Char => "c_char",
        FieldKind::String => "*const c_char",
        FieldKind::Buffer => "*const c_char",
        FieldKind::Uuid => "[u8; 16]",
        FieldKind::UInt32 => "u32",
        FieldKind::Int32 => "i32",
        FieldKind::UInt64 | FieldKind::Bytes => "u64",
        FieldKind::Int64 => "i64",
        FieldKind::OptPercent => "f32",
    }
}

fn owned_field_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Char => "char",
        FieldKind::String => "String",
        FieldKind::Buffer => "Vec<u8>",
        FieldKind::Uuid => "[u8; 16]",
        FieldKind::UInt32 => "u32",
        FieldKind::Int32 => "i32",
        FieldKind::UInt64 | FieldKind::Bytes => "u64",
        FieldKind::Int64 => "i64",
        FieldKind::OptPercent => "f32",
    }
}

fn field_conversion(kind: FieldKind, name: &str, len: &str) -> String {
    match kind {
        FieldKind::Char => format!("raw.{name} as u8 as char"),
        FieldKind::String => format!("unsafe {{ text(raw.{name}) }}?"),
        FieldKind::Buffer => format!(
            "unsafe {{ slice::from_raw_parts(raw.{name} as *const u8, raw.{len}_len as usize) }}.to_vec()"
        ),
        FieldKind::Uuid
        | FieldKind::UInt32
        | FieldKind::Int32
        | FieldKind::UInt64
        | FieldKind::Bytes
        | FieldKind::Int64
        | FieldKind::OptPercent => format!("raw.{name}"),
    }
}

// ── Runtime helpers emitted once per file ───────────────────────────────────

const RUNTIME: &str = r#"extern "C" {
    fn free(p: *mut c_void);
}

unsafe fn text(p: *const c_char) -> Result<String, Error> {
    Ok(ffi::CStr::from_ptr(p).to_str()?.to_string())
}

fn c_strings(v: &[&str]) -> Result<Vec<ffi::CString>, Error> {
    v.iter()
        .map(|s| ffi::CString::new(*s).map_err(Error::from))
        .collect()
}

fn null_terminated(v: &[ffi::CString]) -> Vec<*const c_char> {
    v.iter()
        .map(|s| s.as_ptr())
        .chain(std::iter::once(ptr::null()))
        .collect()
}

unsafe fn take_string(p: *mut c_char) -> Result<String, Error> {
    let s = text(p);
    free(p as *mut c_void);
    s
}

unsafe fn take_string_list(l: *mut *mut c_char) -> Result<Vec<String>, Error> {
    let mut out = Vec::new();
    let mut first_error = None;
    let mut i = 0;
    loop {
        let p = *l.add(i);
        if p.is_null() {
            break;
        }
        match text(p) {
            Ok(s) => out.push(s),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
        free(p as *mut c_void);
        i += 1;
    }
    free(l as *mut c_void);
    match first_error {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

unsafe fn take_pairs(l: *mut *mut c_char) -> Result<Vec<(String, String)>, Error> {
    let mut flat = take_string_list(l)?.into_iter();
    let mut out = Vec::new();
    while let (Some(k), Some(v)) = (flat.next(), flat.next()) {
        out.push((k, v));
    }
    Ok(out)
}"#;

impl Target for RustTarget {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn file_name(&self) -> &'static str {
        "rust/src/bindings.rs"
    }

    fn struct_routines(
        &self,
        ctx: &GenContext<'_>,
        def: &StructDef,
        usage: StructUsage,
        out: &mut Sections,
    ) {
        let raw = raw_struct(&def.name);
        let owned = camel_case(&def.name);
        let t = &mut out.types;

        t.line("#[repr(C)]");
        t.line(format!("pub(crate) struct {raw} {{"));
        t.indent();
        for f in &def.fields {
            let name = ident(&f.name);
            if f.kind == FieldKind::Buffer {
                t.line(format!("{}_len: u32,", f.name));
            }
            t.line(format!("{name}: {},", raw_field_type(f.kind)));
        }
        t.dedent();
        t.line("}");
        t.blank();

        t.line("#[derive(Debug, Clone, PartialEq)]");
        t.line(format!("pub struct {owned} {{"));
        t.indent();
        for f in &def.fields {
            t.line(format!("pub {}: {},", ident(&f.name), owned_field_type(f.kind)));
        }
        t.dedent();
        t.line("}");
        t.blank();

        t.line(format!("impl TryFrom<*const {raw}> for {owned} {{"));
        t.indent();
        t.line("type Error = Error;");
        t.blank();
        t.line(format!("fn try_from(raw: *const {raw}) -> Result<Self, Self::Error> {{"));
        t.indent();
        t.line("let raw = unsafe { &*raw };");
        t.line(format!("Ok({owned} {{"));
        t.indent();
        for f in &def.fields {
            let name = ident(&f.name);
            t.line(format!("{name}: {},", field_conversion(f.kind, &name, &f.name)));
        }
        t.dedent();
        t.line("})");
        t.dedent();
        t.line("}");
        t.dedent();
        t.line("}");
        t.blank();

        let d = &mut out.decls;
        d.indent();
        if usage.has_singleton() {
            d.line(format!(
                "fn {}(v: *mut {raw});",
                free_fn(ctx.prefix, &def.name)
            ));
        }

        if usage.has_list() {
            let list = raw_list(&def.name);
            d.line(format!(
                "fn {}(v: *mut {list});",
                free_list_fn(ctx.prefix, &def.name)
            ));

            t.line("#[repr(C)]");
            t.line(format!("pub(crate) struct {list} {{"));
            t.indent();
            t.line("len: u32,");
            t.line(format!("val: *const {raw},"));
            t.dedent();
            t.line("}");
            t.blank();

            t.line(format!(
                "fn {}(raw: *const {list}) -> Result<Vec<{owned}>, Error> {{",
                list_from_raw(&def.name)
            ));
            t.indent();
            t.line("let list = unsafe { &*raw };");
            t.line("let mut v = Vec::with_capacity(list.len as usize);");
            t.line("for i in 0..list.len as usize {");
            t.indent();
            t.line(format!("v.push({owned}::try_from(unsafe {{ list.val.add(i) }})?);"));
            t.dedent();
            t.line("}");
            t.line("Ok(v)");
            t.dedent();
            t.line("}");
            t.blank();
        }
        d.dedent();
    }

    fn optargs_decl(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut Sections) {
        let Some(layout) = &a.layout else { return };
        let t = &mut out.types;

        t.line("#[repr(C)]");
        t.line(format!("struct {} {{", optargs_raw(a)));
        t.indent();
        t.line("bitmask: u64,");
        for slot in &layout.slots {
            t.line(format!("{}: {},", ident(slot.name()), ffi_field(&slot.repr)));
        }
        t.dedent();
        t.line("}");
        t.blank();

        let lifetime = if optargs_borrow(layout) { "<'a>" } else { "" };
        t.line(format!("/// Optional arguments of [`Handle::{}`].", ident(a.name())));
        t.line("#[derive(Debug, Clone, Default)]");
        t.line(format!("pub struct {}{lifetime} {{", optargs_public(a)));
        t.indent();
        for slot in &layout.slots {
            t.line(format!(
                "pub {}: Option<{}>,",
                ident(slot.name()),
                optarg_type(slot.optarg.kind)
            ));
        }
        t.dedent();
        t.line("}");
        t.blank();
    }

    fn foreign_decl(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        let mut params = vec![format!("g: *mut {}", handle_type(ctx.prefix))];
        for arg in &a.action.args {
            params.extend(ffi_param(&native_repr(&arg.kind), &ident(&arg.name)));
        }
        if matches!(a.action.ret, Return::BufferOut(_)) {
            params.push("size_r: *mut usize".into());
        }
        if a.layout.is_some() {
            params.push(format!("optargs: *const {}", optargs_raw(a)));
        }
        out.indent();
        out.line(format!(
            "fn {}({}) -> {};",
            entry_point(ctx.prefix, a.action),
            params.join(", "),
            ffi_return(&a.action.ret)
        ));
        out.dedent();
    }

    fn wrapper_begin(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        out.indent();
        out.line(format!("/// {}", a.action.shortdesc));
        if !a.doc.is_empty() {
            out.line("///");
            for l in &a.doc {
                out.line(if l.is_empty() { "///".to_string() } else { format!("/// {l}") });
            }
        }
        match &a.action.deprecated {
            Deprecation::None => {}
            Deprecation::ReplacedBy(other) => {
                out.line(format!("#[deprecated(note = \"use {other} instead\")]"))
            }
            Deprecation::NoReplacement => out.line("#[deprecated]"),
        }

        let mut params = vec!["&self".to_string()];
        for arg in &a.action.args {
            params.push(format!(
                "{}: {}",
                ident(&arg.name),
                param_type(&native_repr(&arg.kind))
            ));
        }
        if let Some(layout) = &a.layout {
            let lifetime = if optargs_borrow(layout) { "<'_>" } else { "" };
            params.push(format!("optargs: {}{lifetime}", optargs_public(a)));
        }
        out.line(format!(
            "pub fn {}({}) -> Result<{}, Error> {{",
            ident(a.name()),
            params.join(", "),
            result_type(&a.action.ret)
        ));
        out.indent();
    }

    fn marshal_inputs(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        for arg in &a.action.args {
            let name = ident(&arg.name);
            match native_repr(&arg.kind) {
                NativeRepr::Text => {
                    out.line(format!("let c_{} = ffi::CString::new({name})?;", arg.name))
                }
                NativeRepr::OptText => out.line(format!(
                    "let c_{} = {name}.map(ffi::CString::new).transpose()?;",
                    arg.name
                )),
                NativeRepr::TextArray => {
                    out.line(format!("let c_{} = c_strings({name})?;", arg.name));
                    out.line(format!(
                        "let c_{0}_ptrs = null_terminated(&c_{0});",
                        arg.name
                    ));
                }
                NativeRepr::Bool
                | NativeRepr::Int32
                | NativeRepr::Int64
                | NativeRepr::Buffer
                | NativeRepr::Pointer(_) => {}
            }
        }

        let Some(layout) = &a.layout else { return };
        for slot in &layout.slots {
            let name = slot.name();
            let field = ident(name);
            match slot.optarg.kind {
                OptArgKind::String => out.line(format!(
                    "let c_opt_{name} = optargs.{field}.map(ffi::CString::new).transpose()?;"
                )),
                OptArgKind::StringList => {
                    out.line(format!(
                        "let c_opt_{name} = optargs.{field}.map(c_strings).transpose()?;"
                    ));
                    out.line(format!(
                        "let c_opt_{name}_ptrs = c_opt_{name}.as_deref().map(null_terminated);"
                    ));
                }
                OptArgKind::Bool | OptArgKind::Int | OptArgKind::Int64 => {}
            }
        }
        out.line(format!("let mut c_optargs = {} {{", optargs_raw(a)));
        out.indent();
        out.line("bitmask: 0,");
        for slot in &layout.slots {
            out.line(format!("{}: {},", ident(slot.name()), ffi_zero(&slot.repr)));
        }
        out.dedent();
        out.line("};");
        for slot in &layout.slots {
            let name = slot.name();
            let field = ident(name);
            let (source, value) = match slot.optarg.kind {
                OptArgKind::Bool => (format!("optargs.{field}"), "v as c_int".to_string()),
                OptArgKind::Int | OptArgKind::Int64 => (format!("optargs.{field}"), "v".into()),
                OptArgKind::String => (format!("&c_opt_{name}"), "v.as_ptr()".into()),
                OptArgKind::StringList => (format!("&c_opt_{name}_ptrs"), "v.as_ptr()".into()),
            };
            out.line(format!("if let Some(v) = {source} {{"));
            out.indent();
            out.line(format!("c_optargs.bitmask |= {};", slot.mask_expr()));
            out.line(format!("c_optargs.{field} = {value};"));
            out.dedent();
            out.line("}");
        }
    }

    fn native_call(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        let mut args = vec!["self.g".to_string()];
        for arg in &a.action.args {
            let name = ident(&arg.name);
            match native_repr(&arg.kind) {
                NativeRepr::Text => args.push(format!("c_{}.as_ptr()", arg.name)),
                NativeRepr::OptText => args.push(format!(
                    "c_{}.as_ref().map_or(ptr::null(), |s| s.as_ptr())",
                    arg.name
                )),
                NativeRepr::TextArray => args.push(format!("c_{}_ptrs.as_ptr()", arg.name)),
                NativeRepr::Bool => args.push(format!("{name} as c_int")),
                NativeRepr::Int32 | NativeRepr::Int64 | NativeRepr::Pointer(_) => {
                    args.push(name.into_owned())
                }
                NativeRepr::Buffer => {
                    args.push(format!("{name}.as_ptr() as *const c_char"));
                    args.push(format!("{name}.len()"));
                }
            }
        }
        if matches!(a.action.ret, Return::BufferOut(_)) {
            out.line("let mut size: usize = 0;");
            args.push("&mut size".into());
        }
        if a.layout.is_some() {
            args.push("&c_optargs".into());
        }
        out.line(format!(
            "let r = unsafe {{ {}({}) }};",
            entry_point(ctx.prefix, a.action),
            args.join(", ")
        ));
    }

    fn free_temporaries(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        let mut temps = Vec::new();
        for arg in &a.action.args {
            if native_repr(&arg.kind).needs_temporary() {
                temps.push(format!("c_{}_ptrs", arg.name));
                temps.push(format!("c_{}", arg.name));
            }
        }
        if let Some(layout) = &a.layout {
            for slot in layout.temporaries() {
                temps.push(format!("c_opt_{}_ptrs", slot.name()));
                temps.push(format!("c_opt_{}", slot.name()));
            }
        }
        for t in temps {
            out.line(format!("drop({t});"));
        }
    }

    fn failure_check(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        let cond = match a.convention {
            ErrorConvention::NoSignal => {
                out.line("// NULL is a valid result: there is no failure signal.");
                return;
            }
            ErrorConvention::IntegerSentinel => "r == -1",
            ErrorConvention::PointerSentinel => "r.is_null()",
        };
        out.line(format!("if {cond} {{"));
        out.indent();
        out.line(format!(
            "return Err(self.get_error_from_handle(\"{}\"));",
            a.name()
        ));
        out.dedent();
        out.line("}");
    }

    fn convert_result(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        match &a.action.ret {
            Return::Err => out.line("Ok(())"),
            Return::Int(_) | Return::Int64(_) => out.line("Ok(r)"),
            Return::Bool(_) => out.line("Ok(r != 0)"),
            Return::ConstString(_) => out.line("unsafe { text(r) }"),
            Return::ConstOptString(_) => {
                out.line("if r.is_null() {");
                out.line("    Ok(None)");
                out.line("} else {");
                out.line("    unsafe { text(r) }.map(Some)");
                out.line("}");
            }
            Return::String(_) => out.line("unsafe { take_string(r) }"),
            Return::StringList(_) => out.line("unsafe { take_string_list(r) }"),
            Return::Hashtable(_) => out.line("unsafe { take_pairs(r) }"),
            Return::Struct { of, .. } => {
                out.line(format!(
                    "let v = {}::try_from(r as *const {});",
                    camel_case(of),
                    raw_struct(of)
                ));
                out.line(format!("unsafe {{ {}(r) }};", free_fn(ctx.prefix, of)));
                out.line("v");
            }
            Return::StructList { of, .. } => {
                out.line(format!("let v = {}(r);", list_from_raw(of)));
                out.line(format!("unsafe {{ {}(r) }};", free_list_fn(ctx.prefix, of)));
                out.line("v");
            }
            Return::BufferOut(_) => {
                out.line("let v = unsafe { slice::from_raw_parts(r as *const u8, size) }.to_vec();");
                out.line("unsafe { free(r as *mut c_void) };");
                out.line("Ok(v)");
            }
        }
    }

    fn wrapper_end(&self, _ctx: &GenContext<'_>, _a: &ActionCtx<'_>, out: &mut SourceBuf) {
        out.dedent();
        out.line("}");
        out.blank();
        out.dedent();
    }

    fn finish(&self, ctx: &GenContext<'_>, s: Sections) -> String {
        let mut b = SourceBuf::default();
        b.line(format!("// {GENERATED_MARKER}"));
        b.blank();
        b.line("#![allow(non_camel_case_types, clippy::all)]");
        b.blank();
        b.line("use std::ffi;");
        b.line("use std::os::raw::{c_char, c_int, c_void};");
        b.line("use std::ptr;");
        b.line("use std::slice;");
        b.blank();
        b.line(format!("use crate::base::{{{}, Handle}};", handle_type(ctx.prefix)));
        b.line("use crate::error::Error;");
        b.blank();
        for l in RUNTIME.lines() {
            b.line(l);
        }
        b.blank();
        b.append(&s.types);
        b.line(format!("#[link(name = \"{}\")]", ctx.prefix));
        b.line("extern \"C\" {");
        b.append(&s.decls);
        b.line("}");
        b.blank();
        b.line("impl Handle {");
        b.append(&s.wrappers);
        b.line("}");
        b.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_become_raw_identifiers() {
        assert_eq!(ident("type"), "r#type");
        assert_eq!(ident("self"), "self_");
        assert_eq!(ident("device"), "device");
    }

    #[test]
    fn names() {
        assert_eq!(raw_struct("lvm_pv"), "RawLvmPv");
        assert_eq!(raw_list("lvm_pv"), "RawLvmPvList");
        assert_eq!(list_from_raw("lvm_pv"), "lvm_pv_list_from_raw");
    }
}
