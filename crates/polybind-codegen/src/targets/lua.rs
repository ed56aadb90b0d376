//! Lua bindings (`lua/lua-guestfs.c`).
//!
//! A C module. `luaL_error` never returns, so every wrapper reads and
//! validates all of its inputs first and only then allocates; nothing is
//! ever live on the heap when a Lua error can be raised.

use polybind_catalog::StructUsage;
use polybind_types::{Deprecation, ErrorConvention, FieldKind, OptArgKind, Return, StructDef, UUID_LEN};

use crate::buffer::{SourceBuf, GENERATED_MARKER};
use crate::marshal::{
    c_ident, c_prototype, c_return_type, c_struct_decls, entry_point, free_fn, free_list_fn,
    handle_type, list_tag, native_repr, struct_tag, NativeRepr,
};
use crate::target::{ActionCtx, GenContext, Sections, Target};

/// Emits a Lua C module.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaTarget;

fn wrapper_fn(name: &str) -> String {
    format!("guestfs_int_lua_{name}")
}

fn element_fn(of: &str) -> String {
    format!("push_{of}")
}

fn list_fn(of: &str) -> String {
    format!("push_{of}_list")
}

/// Local holding the array built for a list option.
fn optarg_temp(name: &str) -> String {
    format!("optargs_{name}")
}

fn c_mask(bit: u8) -> String {
    format!("UINT64_C(1) << {bit}")
}

/// `ty name` with the pointer star kept against the name.
fn c_decl(ty: &str, name: &str) -> String {
    if ty.ends_with('*') {
        format!("{ty}{name}")
    } else {
        format!("{ty} {name}")
    }
}

/// Stack index of the options table: after the handle and positionals.
fn optargs_index(a: &ActionCtx<'_>) -> usize {
    a.action.args.len() + 2
}

fn push_field(kind: FieldKind, name: &str) -> String {
    match kind {
        FieldKind::Char => format!("lua_pushlstring (L, &v->{name}, 1);"),
        FieldKind::String => format!("lua_pushstring (L, v->{name});"),
        FieldKind::Buffer => format!("lua_pushlstring (L, v->{name}, v->{name}_len);"),
        FieldKind::Uuid => format!("lua_pushlstring (L, v->{name}, {UUID_LEN});"),
        FieldKind::UInt32 | FieldKind::Int32 => format!("lua_pushinteger (L, v->{name});"),
        FieldKind::UInt64 | FieldKind::Bytes => format!("push_uint64 (L, v->{name});"),
        FieldKind::Int64 => format!("push_int64 (L, v->{name});"),
        FieldKind::OptPercent => format!(
            "if (v->{name} >= 0) lua_pushnumber (L, v->{name}); else lua_pushnil (L);"
        ),
    }
}

const RUNTIME: &str = r#"#define LUA_GUESTFS_HANDLE "@P@ handle"

struct userdata {
  @P@_h *g;
};

static @P@_h *
get_handle (lua_State *L, int index)
{
  struct userdata *u = luaL_checkudata (L, index, LUA_GUESTFS_HANDLE);

  if (u->g == NULL)
    luaL_error (L, "@P@: handle is closed");
  return u->g;
}

static int
last_error (lua_State *L, @P@_h *g, const char *op)
{
  return luaL_error (L, "@P@: %s: %s", op, @P@_last_error (g));
}

static void
check_string_list (lua_State *L, int index)
{
  size_t i, len;

  luaL_checktype (L, index, LUA_TTABLE);
  len = lua_rawlen (L, index);
  for (i = 1; i <= len; ++i) {
    lua_rawgeti (L, index, i);
    if (lua_type (L, -1) != LUA_TSTRING) {
      lua_pop (L, 1);
      luaL_error (L, "@P@: expecting a table of strings");
    }
    lua_pop (L, 1);
  }
}

static void
free_strings (char **argv)
{
  size_t i;

  if (argv == NULL)
    return;
  for (i = 0; argv[i] != NULL; ++i)
    free (argv[i]);
  free (argv);
}

/* The table must already have passed check_string_list.  Returns NULL
 * when out of memory.
 */
static char **
get_string_list (lua_State *L, int index)
{
  size_t i, len = lua_rawlen (L, index);
  char **strs = malloc ((len + 1) * sizeof (char *));

  if (strs == NULL)
    return NULL;
  for (i = 0; i < len; ++i) {
    lua_rawgeti (L, index, i + 1);
    strs[i] = strdup (lua_tostring (L, -1));
    lua_pop (L, 1);
    if (strs[i] == NULL) {
      free_strings (strs);
      return NULL;
    }
  }
  strs[len] = NULL;
  return strs;
}

static void
push_string_list (lua_State *L, char **strs)
{
  size_t i;

  lua_newtable (L);
  for (i = 0; strs[i] != NULL; ++i) {
    lua_pushstring (L, strs[i]);
    lua_rawseti (L, -2, i + 1);
  }
}

/* Ordered { {key, value}, ... } so the native order survives. */
static void
push_table (lua_State *L, char **strs)
{
  size_t i;

  lua_newtable (L);
  for (i = 0; strs[i] != NULL && strs[i + 1] != NULL; i += 2) {
    lua_newtable (L);
    lua_pushstring (L, strs[i]);
    lua_rawseti (L, -2, 1);
    lua_pushstring (L, strs[i + 1]);
    lua_rawseti (L, -2, 2);
    lua_rawseti (L, -2, i / 2 + 1);
  }
}

/* Accepts a number or a decimal string. */
static int64_t
get_int64 (lua_State *L, int index)
{
  int64_t r;
  int n;
  const char *s;

  switch (lua_type (L, index)) {
  case LUA_TSTRING:
    s = lua_tostring (L, index);
    if (sscanf (s, "%" SCNd64 "%n", &r, &n) != 1 || s[n] != '\0')
      luaL_error (L, "@P@: int64 parameter expected");
    return r;
  case LUA_TNUMBER:
    return (int64_t) lua_tonumber (L, index);
  default:
    luaL_error (L, "@P@: int64 parameter expected");
  }
  return 0;
}

static void
push_int64 (lua_State *L, int64_t v)
{
  char s[64];

  snprintf (s, sizeof s, "%" PRIi64, v);
  lua_pushstring (L, s);
}

static void
push_uint64 (lua_State *L, uint64_t v)
{
  char s[64];

  snprintf (s, sizeof s, "%" PRIu64, v);
  lua_pushstring (L, s);
}

static int
guestfs_int_lua_create (lua_State *L)
{
  struct userdata *u;
  @P@_h *g = @P@_create ();

  if (g == NULL)
    return luaL_error (L, "@P@.create: failed to create handle");
  u = lua_newuserdata (L, sizeof *u);
  u->g = g;
  luaL_setmetatable (L, LUA_GUESTFS_HANDLE);
  return 1;
}

static int
guestfs_int_lua_close (lua_State *L)
{
  struct userdata *u = luaL_checkudata (L, 1, LUA_GUESTFS_HANDLE);

  if (u->g) {
    @P@_close (u->g);
    u->g = NULL;
  }
  return 0;
}"#;

impl Target for LuaTarget {
    fn name(&self) -> &'static str {
        "lua"
    }

    fn file_name(&self) -> &'static str {
        "lua/lua-guestfs.c"
    }

    fn indent_unit(&self) -> &'static str {
        "  "
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

        let t = &mut out.types;
        t.line("static void");
        t.line(format!(
            "{} (lua_State *L, struct {} *v)",
            element_fn(&def.name),
            struct_tag(ctx.prefix, &def.name)
        ));
        t.line("{");
        t.indent();
        t.line("lua_newtable (L);");
        for f in &def.fields {
            let c = c_ident(&f.name);
            t.line(push_field(f.kind, &c));
            t.line(format!("lua_setfield (L, -2, \"{}\");", f.name));
        }
        t.dedent();
        t.line("}");
        t.blank();

        if usage.has_list() {
            t.line("static void");
            t.line(format!(
                "{} (lua_State *L, struct {} *v)",
                list_fn(&def.name),
                list_tag(ctx.prefix, &def.name)
            ));
            t.line("{");
            t.indent();
            t.line("size_t i;");
            t.blank();
            t.line("lua_newtable (L);");
            t.line("for (i = 0; i < v->len; ++i) {");
            t.indent();
            t.line(format!("{} (L, &v->val[i]);", element_fn(&def.name)));
            t.line("lua_rawseti (L, -2, i + 1);");
            t.dedent();
            t.line("}");
            t.dedent();
            t.line("}");
            t.blank();
        }
    }

    fn optargs_decl(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut Sections) {
        if let Some(layout) = &a.layout {
            out.decls.lines(layout.c_decl());
            out.decls.blank();
        }
    }

    fn foreign_decl(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        out.line(c_prototype(ctx.prefix, a.action));
    }

    fn wrapper_begin(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        out.line(format!("/* {}: {}", a.name(), a.action.shortdesc.replace("*/", "* /")));
        if !a.doc.is_empty() {
            out.line(" *");
            for l in &a.doc {
                let l = l.replace("*/", "* /");
                out.line(if l.is_empty() { " *".to_string() } else { format!(" * {l}") });
            }
        }
        match &a.action.deprecated {
            Deprecation::None => {}
            Deprecation::ReplacedBy(other) => {
                out.line(" *");
                out.line(format!(" * Deprecated: use {other} instead."));
            }
            Deprecation::NoReplacement => {
                out.line(" *");
                out.line(" * Deprecated: there is no replacement.");
            }
        }
        out.line(" */");
        out.line("static int");
        out.line(format!("{} (lua_State *L)", wrapper_fn(a.name())));
        out.line("{");
        out.indent();
        out.line(format!("{};", c_decl(&c_return_type(ctx.prefix, &a.action.ret), "r")));
        if matches!(a.action.ret, Return::BufferOut(_)) {
            out.line("size_t size;");
        }
        if let Some(layout) = &a.layout {
            out.line(format!("struct {} optargs_s = {{ .bitmask = 0 }};", layout.tag));
            for slot in layout.temporaries() {
                out.line(format!("char **{} = NULL;", optarg_temp(slot.name())));
            }
        }
        for arg in &a.action.args {
            if native_repr(&arg.kind).needs_temporary() {
                out.line(format!("char **{} = NULL;", c_ident(&arg.name)));
            }
        }
        out.line("@P@_h *g = get_handle (L, 1);".replace("@P@", ctx.prefix));
    }

    fn marshal_inputs(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        // Read and validate everything that can raise.
        for (i, arg) in a.action.args.iter().enumerate() {
            let idx = i + 2;
            let name = c_ident(&arg.name);
            let repr = native_repr(&arg.kind);
            match &repr {
                NativeRepr::Text => {
                    out.line(format!("const char *{name} = luaL_checkstring (L, {idx});"))
                }
                NativeRepr::OptText => {
                    out.line(format!("const char *{name} = luaL_optstring (L, {idx}, NULL);"))
                }
                NativeRepr::TextArray => out.line(format!("check_string_list (L, {idx});")),
                NativeRepr::Bool => out.line(format!("int {name} = lua_toboolean (L, {idx});")),
                NativeRepr::Int32 => {
                    out.line(format!("int {name} = (int) luaL_checkinteger (L, {idx});"))
                }
                NativeRepr::Int64 => {
                    out.line(format!("int64_t {name} = get_int64 (L, {idx});"))
                }
                NativeRepr::Buffer => {
                    out.line(format!("size_t {name}_size;"));
                    out.line(format!(
                        "const char *{name} = luaL_checklstring (L, {idx}, &{name}_size);"
                    ));
                }
                NativeRepr::Pointer(_) => out.line(format!(
                    "{} = lua_touserdata (L, {idx});",
                    repr.c_params(&arg.name).join("")
                )),
            }
        }

        let layout = a.layout.as_ref();
        if let Some(layout) = layout {
            let table = optargs_index(a);
            out.blank();
            out.line(format!("if (lua_type (L, {table}) == LUA_TTABLE) {{"));
            out.indent();
            for slot in &layout.slots {
                let field = c_ident(slot.name());
                out.line(format!("lua_getfield (L, {table}, \"{}\");", slot.name()));
                out.line("if (!lua_isnil (L, -1)) {");
                out.indent();
                out.line(format!("optargs_s.bitmask |= {};", c_mask(slot.bit())));
                match slot.optarg.kind {
                    OptArgKind::Bool => {
                        out.line(format!("optargs_s.{field} = lua_toboolean (L, -1);"))
                    }
                    OptArgKind::Int => out.line(format!(
                        "optargs_s.{field} = (int) luaL_checkinteger (L, -1);"
                    )),
                    OptArgKind::Int64 => {
                        out.line(format!("optargs_s.{field} = get_int64 (L, -1);"))
                    }
                    OptArgKind::String => {
                        out.line(format!("optargs_s.{field} = luaL_checkstring (L, -1);"))
                    }
                    OptArgKind::StringList => out.line("check_string_list (L, -1);"),
                }
                out.dedent();
                out.line("}");
                out.line("lua_pop (L, 1);");
            }
            out.dedent();
            out.line("}");
        }

        // Then allocate.
        let mut oom = Vec::new();
        for (i, arg) in a.action.args.iter().enumerate() {
            if native_repr(&arg.kind).needs_temporary() {
                let name = c_ident(&arg.name);
                out.line(format!("{name} = get_string_list (L, {});", i + 2));
                oom.push(format!("{name} == NULL"));
            }
        }
        if let Some(layout) = layout {
            let table = optargs_index(a);
            for slot in layout.temporaries() {
                let mask = c_mask(slot.bit());
                let temp = optarg_temp(slot.name());
                out.line(format!("if (optargs_s.bitmask & ({mask})) {{"));
                out.indent();
                out.line(format!("lua_getfield (L, {table}, \"{}\");", slot.name()));
                out.line(format!("{temp} = get_string_list (L, -1);"));
                out.line("lua_pop (L, 1);");
                out.line(format!("optargs_s.{} = {temp};", c_ident(slot.name())));
                out.dedent();
                out.line("}");
                oom.push(format!("((optargs_s.bitmask & ({mask})) && {temp} == NULL)"));
            }
        }
        if !oom.is_empty() {
            out.line(format!("if ({}) {{", oom.join(" || ")));
            out.indent();
            self.free_temporaries(ctx, a, out);
            out.line(format!(
                "return luaL_error (L, \"%s: out of memory\", \"{}\");",
                a.name()
            ));
            out.dedent();
            out.line("}");
        }
    }

    fn native_call(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        let mut args = vec!["g".to_string()];
        for arg in &a.action.args {
            let name = c_ident(&arg.name);
            match native_repr(&arg.kind) {
                NativeRepr::Buffer => {
                    args.push(name.to_string());
                    args.push(format!("{name}_size"));
                }
                _ => args.push(name.into_owned()),
            }
        }
        if matches!(a.action.ret, Return::BufferOut(_)) {
            args.push("&size".into());
        }
        if a.layout.is_some() {
            args.push("&optargs_s".into());
        }
        out.blank();
        out.line(format!("r = {} ({});", entry_point(ctx.prefix, a.action), args.join(", ")));
    }

    fn free_temporaries(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        for arg in &a.action.args {
            if native_repr(&arg.kind).needs_temporary() {
                out.line(format!("free_strings ({});", c_ident(&arg.name)));
            }
        }
        if let Some(layout) = &a.layout {
            for slot in layout.temporaries() {
                out.line(format!("free_strings ({});", optarg_temp(slot.name())));
            }
        }
    }

    fn failure_check(&self, _ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        let cond = match a.convention {
            ErrorConvention::NoSignal => return,
            ErrorConvention::IntegerSentinel => "r == -1",
            ErrorConvention::PointerSentinel => "r == NULL",
        };
        out.blank();
        out.line(format!("if ({cond})"));
        out.line(format!("  return last_error (L, g, \"{}\");", a.name()));
        out.blank();
    }

    fn convert_result(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf) {
        match &a.action.ret {
            Return::Err => {
                out.line("return 0;");
                return;
            }
            Return::Int(_) => out.line("lua_pushinteger (L, r);"),
            Return::Int64(_) => out.line("push_int64 (L, r);"),
            Return::Bool(_) => out.line("lua_pushboolean (L, r);"),
            Return::ConstString(_) => out.line("lua_pushstring (L, r);"),
            Return::ConstOptString(_) => {
                out.blank();
                out.line("if (r)");
                out.line("  lua_pushstring (L, r);");
                out.line("else");
                out.line("  lua_pushnil (L);");
            }
            Return::String(_) => {
                out.line("lua_pushstring (L, r);");
                out.line("free (r);");
            }
            Return::StringList(_) => {
                out.line("push_string_list (L, r);");
                out.line("free_strings (r);");
            }
            Return::Hashtable(_) => {
                out.line("push_table (L, r);");
                out.line("free_strings (r);");
            }
            Return::Struct { of, .. } => {
                out.line(format!("{} (L, r);", element_fn(of)));
                out.line(format!("{} (r);", free_fn(ctx.prefix, of)));
            }
            Return::StructList { of, .. } => {
                out.line(format!("{} (L, r);", list_fn(of)));
                out.line(format!("{} (r);", free_list_fn(ctx.prefix, of)));
            }
            Return::BufferOut(_) => {
                out.line("lua_pushlstring (L, r, size);");
                out.line("free (r);");
            }
        }
        out.line("return 1;");
    }

    fn wrapper_end(&self, _ctx: &GenContext<'_>, _a: &ActionCtx<'_>, out: &mut SourceBuf) {
        out.dedent();
        out.line("}");
        out.blank();
    }

    fn finish(&self, ctx: &GenContext<'_>, s: Sections) -> String {
        let p = ctx.prefix;
        let h = handle_type(p);
        let mut b = SourceBuf::new("  ");
        b.line(format!("/* {GENERATED_MARKER} */"));
        b.blank();
        for inc in ["stdio.h", "stdlib.h", "stdint.h", "inttypes.h", "string.h"] {
            b.line(format!("#include <{inc}>"));
        }
        b.blank();
        b.line("#include <lua.h>");
        b.line("#include <lauxlib.h>");
        b.blank();
        b.line(format!("typedef struct {h} {h};"));
        b.line(format!("extern {h} *{p}_create (void);"));
        b.line(format!("extern void {p}_close ({h} *g);"));
        b.line(format!("extern const char *{p}_last_error ({h} *g);"));
        b.blank();
        b.append(&s.decls);
        b.blank();
        for l in RUNTIME.replace("@P@", p).lines() {
            b.line(l);
        }
        b.blank();
        b.append(&s.types);
        b.append(&s.wrappers);

        b.line("static luaL_Reg handle_methods[] = {");
        b.line("  { \"close\", guestfs_int_lua_close },");
        for action in ctx.catalog.external_actions() {
            b.line(format!("  {{ \"{}\", {} }},", action.name, wrapper_fn(&action.name)));
        }
        b.line("  { NULL, NULL }");
        b.line("};");
        b.blank();
        b.line("static luaL_Reg module_functions[] = {");
        b.line("  { \"create\", guestfs_int_lua_create },");
        b.line("  { NULL, NULL }");
        b.line("};");
        b.blank();
        b.line("int");
        b.line(format!("luaopen_{p} (lua_State *L)"));
        b.line("{");
        b.indent();
        b.line("luaL_newmetatable (L, LUA_GUESTFS_HANDLE);");
        b.line("lua_pushcfunction (L, guestfs_int_lua_close);");
        b.line("lua_setfield (L, -2, \"__gc\");");
        b.line("lua_newtable (L);");
        b.line("luaL_setfuncs (L, handle_methods, 0);");
        b.line("lua_setfield (L, -2, \"__index\");");
        b.line("lua_pop (L, 1);");
        b.blank();
        b.line("luaL_newlib (L, module_functions);");
        b.line("return 1;");
        b.dedent();
        b.line("}");
        b.into_string()
    }
}
