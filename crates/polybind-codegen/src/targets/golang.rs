//! Go bindings (`golang/guestfs.go`).
//!
//! A single cgo file: the C declarations live in the preamble comment, the
//! runtime helpers (error type, string-list marshaling, ordered pairs) are
//! emitted alongside the wrappers, so the package needs no hand-written
//! support code beyond linking against the native library.

use std::borrow::Cow;

use polybind_catalog::StructUsage;
use polybind_types::{Deprecation, ErrorConvention, FieldKind, OptArgKind, Return, StructDef, UUID_LEN};

use crate::buffer::{SourceBuf, GENERATED_MARKER};
use crate::marshal::{
    c_ident, c_prototype, c_struct_decls, entry_point, free_fn, free_list_fn, handle_type,
    list_tag, native_repr, struct_tag, NativeRepr,
};
use crate::target::{camel_case, capitalize, ActionCtx, GenContext, Sections, Target};

/// Emits a cgo package.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoTarget;

const KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

/// A Go parameter name.
fn ident(name: &str) -> Cow<'_, str> {
    if KEYWORDS.contains(&name) {
        Cow::Owned(format!("{name}_"))
    } else {
        Cow::Borrowed(name)
    }
}

/// How cgo exposes the C field `name`.
fn cgo_field(name: &str) -> String {
    let c = c_ident(name);
    if KEYWORDS.contains(&c.as_ref()) {
        format!("_{c}")
    } else {
        c.into_owned()
    }
}

fn struct_type(of: &str) -> String {
    camel_case(of)
}

fn element_fn(of: &str) -> String {
    format!("return_{}", struct_type(of))
}

fn list_fn(of: &str) -> String {
    format!("return_{}_list", struct_type(of))
}

fn optargs_type(a: &ActionCtx<'_>) -> String {
    format!("Optargs{}", capitalize(a.name()))
}

fn param_type(repr: &NativeRepr) -> &'static str {
    match repr {
        NativeRepr::Text => "string",
        NativeRepr::OptText => "*string",
        NativeRepr::TextArray => "[]string",
        NativeRepr::Bool => "bool",
        NativeRepr::Int32 => "int",
        NativeRepr::Int64 => "int64",
        NativeRepr::Buffer => "[]byte",
        NativeRepr::Pointer(_) => "unsafe.Pointer",
    }
}

fn optarg_type(kind: OptArgKind) -> &'static str {
    match kind {
        OptArgKind::Bool => "bool",
        OptArgKind::Int => "int",
        OptArgKind::Int64 => "int64",
        OptArgKind::String => "string",
        OptArgKind::StringList => "[]string",
    }
}

/// Result type and the zero value returned alongside an error.
fn result_type(ret: &Return) -> Option<(String, &'static str)> {
    Some(match ret {
        Return::Err => return None,
        Return::Int(_) => ("int".into(), "0"),
        Return::Int64(_) => ("int64".into(), "0"),
        Return::Bool(_) => ("bool".into(), "false"),
        Return::ConstString(_) | Return::String(_) => ("string".into(), "\"\""),
        Return::ConstOptString(_) => ("*string".into(), "nil"),
        Return::StringList(_) => ("[]string".into(), "nil"),
        Return::Hashtable(_) => ("[]Pair".into(), "nil"),
        Return::Struct { of, .. } => (format!("*{}", struct_type(of)), "nil"),
        Return::StructList { of, .. } => (format!("[]{}", struct_type(of)), "nil"),
        Return::BufferOut(_) => ("[]byte".into(), "nil"),
    })
}

fn field_type(kind: FieldKind) -> String {
    match kind {
        FieldKind::Char => "byte".into(),
        FieldKind::String => "string".into(),
        FieldKind::Buffer => "[]byte".into(),
        FieldKind::Uuid => format!("[{UUID_LEN}]byte"),
        FieldKind::UInt32 => "uint32".into(),
        FieldKind::Int32 => "int32".into(),
        FieldKind::UInt64 | FieldKind::Bytes => "uint64".into(),
        FieldKind::Int64 => "int64".into(),
        FieldKind::OptPercent => "float32".into(),
    }
}

fn field_conversion(kind: FieldKind, go: &str, c: &str) -> String {
    match kind {
        FieldKind::Char => format!("r.{go} = byte(c.{c})"),
        FieldKind::String => format!("r.{go} = C.GoString(c.{c})"),
        FieldKind::Buffer => format!(
            "r.{go} = C.GoBytes(unsafe.Pointer(c.{c}), C.int(c.{c}_len))"
        ),
        FieldKind::Uuid => format!(
            "copy(r.{go}[:], C.GoBytes(unsafe.Pointer(&c.{c}[0]), {UUID_LEN}))"
        ),
        FieldKind::UInt32 => format!("r.{go} = uint32(c.{c})"),
        FieldKind::Int32 => format!("r.{go} = int32(c.{c})"),
        FieldKind::UInt64 | FieldKind::Bytes => format!("r.{go} = uint64(c.{c})"),
        FieldKind::Int64 => format!("r.{go} = int64(c.{c})"),
        FieldKind::OptPercent => format!("r.{go} = float32(c.{c})"),
    }
}

fn return_zero(a: &ActionCtx<'_>) -> String {
    match result_type(&a.action.ret) {
        Some((_, zero)) => format!("{zero}, "),
        None => String::new(),
    }
}

const RUNTIME: &str = r#"type Guestfs struct {
	g *C.guestfs_h
}

type GuestfsError struct {
	Op     string
	Errmsg string
}

func (e *GuestfsError) String() string {
	return e.Op + ": " + e.Errmsg
}

func (e *GuestfsError) Error() string {
	return e.String()
}

func get_error_from_handle(g *Guestfs, op string) *GuestfsError {
	c_errmsg := C.guestfs_last_error(g.g)
	return &GuestfsError{Op: op, Errmsg: C.GoString(c_errmsg)}
}

func closed_handle_error(op string) *GuestfsError {
	return &GuestfsError{Op: op, Errmsg: "handle is closed"}
}

func Create() (*Guestfs, error) {
	c_g := C.guestfs_create()
	if c_g == nil {
		return nil, errors.New("failed to create handle")
	}
	return &Guestfs{g: c_g}, nil
}

func (g *Guestfs) Close() *GuestfsError {
	if g.g == nil {
		return closed_handle_error("close")
	}
	C.guestfs_close(g.g)
	g.g = nil
	return nil
}

func arg_string_list(xs []string) **C.char {
	n := len(xs) + 1
	r := (**C.char)(C.malloc(C.size_t(n) * C.size_t(unsafe.Sizeof((*C.char)(nil)))))
	elems := unsafe.Slice(r, n)
	for i, x := range xs {
		elems[i] = C.CString(x)
	}
	elems[len(xs)] = nil
	return r
}

func next_string(p **C.char) **C.char {
	return (**C.char)(unsafe.Add(unsafe.Pointer(p), unsafe.Sizeof(*p)))
}

func free_string_list(argv **C.char) {
	for p := argv; *p != nil; p = next_string(p) {
		C.free(unsafe.Pointer(*p))
	}
	C.free(unsafe.Pointer(argv))
}

func return_string_list(argv **C.char) []string {
	r := []string{}
	for p := argv; *p != nil; p = next_string(p) {
		r = append(r, C.GoString(*p))
	}
	return r
}

// Pair is one entry of an ordered key/value result.
type Pair struct {
	Key   string
	Value string
}

func return_hashtable(argv **C.char) []Pair {
	flat := return_string_list(argv)
	r := make([]Pair, 0, len(flat)/2)
	for i := 0; i+1 < len(flat); i += 2 {
		r = append(r, Pair{Key: flat[i], Value: flat[i+1]})
	}
	return r
}"#;

impl Target for GoTarget {
    fn name(&self) -> &'static str {
        "go"
    }

    fn file_name(&self) -> &'static str {
        "golang/guestfs.go"
    }

    fn indent_unit(&self) -> &'static str {
        "\t"
    }

    fn struct_routines(
        &self,
        ctx: &GenContext<'_>,
        def: &StructDef,
        usage: StructUsage,
        out: &mut Sections,
    ) {
        out.decls.lines(c_struct_decls(ctx.prefix, def, usage));
        out.decls.blank();

        let go = struct_type(&def.name);
        let t = &mut out.types;
        t.line(format!("type {go} struct {{"));
        t.indent();
        for f in &def.fields {
            t.line(format!("{} {}", capitalize(&f.name), field_type(f.kind)));
        }
        t.dedent();
        t.line("}");
        t.blank();

        t.line(format!(
            "func {}(c *C.struct_{}) *{go} {{",
            element_fn(&def.name),
            struct_tag(ctx.prefix, &def.name)
        ));
        t.indent();
        t.line(format!("r := {go}{{}}"));
        for f in &def.fields {
            t.line(field_conversion(f.kind, &capitalize(&f.name), &cgo_field(&f.name)));
        }
        t.line("return &r");
        t.dedent();
        t.line("}");
        t.blank();

        if usage.has_list() {
            t.line(format!(
                "func {}(c *C.struct_{}) []{go} {{",
                list_fn(&def.name),
                list_tag(ctx.prefix, &def.name)
            ));
            t.indent();
            t.line("nrelems := int(c.len)");
            t.line("elems := unsafe.Slice(c.val, nrelems)");
            t.line(format!("r := make([]{go}, nrelems)"));
            t.line("for i := 0; i < nrelems; i++ {");
            t.indent();
            t.line(format!("r[i] = *{}(&elems[i])", element_fn(&def.name)));
            t.dedent();
            t.line("}");
            t.line("return r");
            t.dedent();
            t.line("}");
            t.blank();
        }
    }

    fn optargs_decl(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut Sections) {
        let Some(layout) = &a.layout else { return };
        out.decls.lines(layout.c_decl());
        out.decls.blank();

        let t = &mut out.types;
        t.line(format!(
            "// {} carries the optional arguments of {}.",
            optargs_type(a),
            capitalize(a.name())
        ));
        t.line(format!("type {} struct {{", optargs_type(a)));
        t.indent();
        for slot in &layout.slots {
            let field = capitalize(slot.name());
            t.line(format!("// {field} is ignored unless {field}_is_set is true."));
            t.line(format!("{field}_is_set bool"));
            t.line(format!("{field} {}", optarg_type(slot.optarg.kind)));
        }
        t.dedent();
        t.line("}");
        t.blank();
    }

    fn foreign_decl(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        out.line(c_prototype(ctx.prefix, a.action));
    }

    fn wrapper_begin(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        out.line(format!("// {} : {}", a.name(), a.action.shortdesc));
        if !a.doc.is_empty() {
            out.line("//");
            for l in &a.doc {
                out.line(if l.is_empty() { "//".to_string() } else { format!("// {l}") });
            }
        }
        match &a.action.deprecated {
            Deprecation::None => {}
            Deprecation::ReplacedBy(other) => {
                out.line("//");
                out.line(format!("// Deprecated: use {} instead.", capitalize(other)));
            }
            Deprecation::NoReplacement => {
                out.line("//");
                out.line("// Deprecated: there is no replacement.");
            }
        }

        let mut params: Vec<String> = a
            .action
            .args
            .iter()
            .map(|arg| format!("{} {}", ident(&arg.name), param_type(&native_repr(&arg.kind))))
            .collect();
        if a.layout.is_some() {
            params.push(format!("optargs *{}", optargs_type(a)));
        }
        let ret = match result_type(&a.action.ret) {
            Some((ty, _)) => format!("({ty}, *GuestfsError)"),
            None => "*GuestfsError".into(),
        };
        out.line(format!(
            "func (g *Guestfs) {}({}) {ret} {{",
            capitalize(a.name()),
            params.join(", ")
        ));
        out.indent();
        out.line("if g.g == nil {");
        out.indent();
        out.line(format!(
            "return {}closed_handle_error(\"{}\")",
            return_zero(a),
            a.name()
        ));
        out.dedent();
        out.line("}");
        out.blank();
    }

    fn marshal_inputs(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        for arg in &a.action.args {
            let name = ident(&arg.name);
            let c = format!("c_{}", arg.name);
            match native_repr(&arg.kind) {
                NativeRepr::Text => {
                    out.line(format!("{c} := C.CString({name})"));
                    out.line(format!("defer C.free(unsafe.Pointer({c}))"));
                }
                NativeRepr::OptText => {
                    out.line(format!("var {c} *C.char = nil"));
                    out.line(format!("if {name} != nil {{"));
                    out.indent();
                    out.line(format!("{c} = C.CString(*{name})"));
                    out.line(format!("defer C.free(unsafe.Pointer({c}))"));
                    out.dedent();
                    out.line("}");
                }
                NativeRepr::TextArray => out.line(format!("{c} := arg_string_list({name})")),
                NativeRepr::Bool => {
                    out.line(format!("var {c} C.int"));
                    out.line(format!("if {name} {{"));
                    out.line(format!("\t{c} = 1"));
                    out.line("}");
                }
                NativeRepr::Buffer => {
                    out.line(format!("{c} := C.CBytes({name})"));
                    out.line(format!("defer C.free({c})"));
                }
                NativeRepr::Int32 | NativeRepr::Int64 | NativeRepr::Pointer(_) => {}
            }
        }

        let Some(layout) = &a.layout else { return };
        out.line(format!("c_optargs := C.struct_{}{{}}", layout.tag));
        out.line("if optargs != nil {");
        out.indent();
        for slot in &layout.slots {
            let go = capitalize(slot.name());
            let c = cgo_field(slot.name());
            out.line(format!("if optargs.{go}_is_set {{"));
            out.indent();
            out.line(format!("c_optargs.bitmask |= {}", slot.mask_expr()));
            match slot.optarg.kind {
                OptArgKind::Bool => {
                    out.line(format!("if optargs.{go} {{"));
                    out.line(format!("\tc_optargs.{c} = 1"));
                    out.line("}");
                }
                OptArgKind::Int => out.line(format!("c_optargs.{c} = C.int(optargs.{go})")),
                OptArgKind::Int64 => {
                    out.line(format!("c_optargs.{c} = C.int64_t(optargs.{go})"))
                }
                OptArgKind::String => {
                    out.line(format!("c_optargs.{c} = C.CString(optargs.{go})"));
                    out.line(format!("defer C.free(unsafe.Pointer(c_optargs.{c}))"));
                }
                OptArgKind::StringList => {
                    out.line(format!("c_optargs.{c} = arg_string_list(optargs.{go})"))
                }
            }
            out.dedent();
            out.line("}");
        }
        out.dedent();
        out.line("}");
    }

    fn native_call(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        let mut args = vec!["g.g".to_string()];
        for arg in &a.action.args {
            let name = ident(&arg.name);
            let c = format!("c_{}", arg.name);
            match native_repr(&arg.kind) {
                NativeRepr::Text | NativeRepr::OptText | NativeRepr::TextArray | NativeRepr::Bool => {
                    args.push(c)
                }
                NativeRepr::Int32 => args.push(format!("C.int({name})")),
                NativeRepr::Int64 => args.push(format!("C.int64_t({name})")),
                NativeRepr::Buffer => {
                    args.push(format!("(*C.char)({c})"));
                    args.push(format!("C.size_t(len({name}))"));
                }
                NativeRepr::Pointer(_) => args.push(name.into_owned()),
            }
        }
        if matches!(a.action.ret, Return::BufferOut(_)) {
            out.line("var size C.size_t");
            args.push("&size".into());
        }
        if a.layout.is_some() {
            args.push("&c_optargs".into());
        }
        out.blank();
        out.line(format!(
            "r := C.{}({})",
            entry_point(ctx.prefix, a.action),
            args.join(", ")
        ));
    }

    fn free_temporaries(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        for arg in &a.action.args {
            if native_repr(&arg.kind).needs_temporary() {
                out.line(format!("free_string_list(c_{})", arg.name));
            }
        }
        if let Some(layout) = &a.layout {
            for slot in layout.temporaries() {
                let c = cgo_field(slot.name());
                out.line(format!("if c_optargs.{c} != nil {{"));
                out.line(format!("\tfree_string_list(c_optargs.{c})"));
                out.line("}");
            }
        }
    }

    fn failure_check(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        let cond = match a.convention {
            ErrorConvention::NoSignal => return,
            ErrorConvention::IntegerSentinel => "r == -1",
            ErrorConvention::PointerSentinel => "r == nil",
        };
        out.blank();
        out.line(format!("if {cond} {{"));
        out.indent();
        out.line(format!(
            "return {}get_error_from_handle(g, \"{}\")",
            return_zero(a),
            a.name()
        ));
        out.dedent();
        out.line("}");
    }

    fn convert_result(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        match &a.action.ret {
            Return::Err => out.line("return nil"),
            Return::Int(_) => out.line("return int(r), nil"),
            Return::Int64(_) => out.line("return int64(r), nil"),
            Return::Bool(_) => out.line("return r != 0, nil"),
            Return::ConstString(_) => out.line("return C.GoString(r), nil"),
            Return::ConstOptString(_) => {
                out.blank();
                out.line("if r == nil {");
                out.line("\treturn nil, nil");
                out.line("}");
                out.line("s := C.GoString(r)");
                out.line("return &s, nil");
            }
            Return::String(_) => {
                out.line("defer C.free(unsafe.Pointer(r))");
                out.line("return C.GoString(r), nil");
            }
            Return::StringList(_) => {
                out.line("defer free_string_list(r)");
                out.line("return return_string_list(r), nil");
            }
            Return::Hashtable(_) => {
                out.line("defer free_string_list(r)");
                out.line("return return_hashtable(r), nil");
            }
            Return::Struct { of, .. } => {
                out.line(format!("defer C.{}(r)", free_fn(ctx.prefix, of)));
                out.line(format!("return {}(r), nil", element_fn(of)));
            }
            Return::StructList { of, .. } => {
                out.line(format!("defer C.{}(r)", free_list_fn(ctx.prefix, of)));
                out.line(format!("return {}(r), nil", list_fn(of)));
            }
            Return::BufferOut(_) => {
                out.line("defer C.free(unsafe.Pointer(r))");
                out.line("return C.GoBytes(unsafe.Pointer(r), C.int(size)), nil");
            }
        }
    }

    fn wrapper_end(&self, _ctx: &GenContext<'_>, _a: &ActionCtx<'_>, out: &mut SourceBuf) {
        out.dedent();
        out.line("}");
        out.blank();
    }

    fn finish(&self, ctx: &GenContext<'_>, s: Sections) -> String {
        let h = handle_type(ctx.prefix);
        let mut b = SourceBuf::new("\t");
        b.line(format!("// {GENERATED_MARKER}"));
        b.blank();
        b.line(format!("package {}", ctx.prefix));
        b.blank();
        b.line("/*");
        b.line(format!("#cgo LDFLAGS: -l{}", ctx.prefix));
        b.line("#include <stdio.h>");
        b.line("#include <stdlib.h>");
        b.line("#include <stdint.h>");
        b.blank();
        b.line(format!("typedef struct {h} {h};"));
        b.line(format!("extern {h} *{}_create (void);", ctx.prefix));
        b.line(format!("extern void {}_close ({h} *g);", ctx.prefix));
        b.line(format!("extern const char *{}_last_error ({h} *g);", ctx.prefix));
        b.blank();
        b.append(&s.decls);
        b.line("*/");
        b.line("import \"C\"");
        b.blank();
        b.line("import (");
        b.line("\t\"errors\"");
        b.line("\t\"unsafe\"");
        b.line(")");
        b.blank();
        let runtime = RUNTIME
            .replace("guestfs_h", &h)
            .replace("guestfs_create", &format!("{}_create", ctx.prefix))
            .replace("guestfs_close", &format!("{}_close", ctx.prefix))
            .replace("guestfs_last_error", &format!("{}_last_error", ctx.prefix));
        for l in runtime.lines() {
            b.line(l);
        }
        b.blank();
        b.append(&s.types);
        b.append(&s.wrappers);
        b.into_string()
    }
}
