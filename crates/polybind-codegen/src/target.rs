//! The shared per-target walk.
//!
//! Every target produces one file with the same shape: struct conversions
//! for the registry, then for each externally visible action (sorted by
//! name) its foreign declaration and its wrapper. The walk lives here once;
//! a target only supplies the pieces through [`Target`].
//!
//! ```text
//! for struct in registry:            struct_routines
//! for action in external (sorted):   optargs_decl? · foreign_decl
//!                                    wrapper_begin      (1)(2)(3)
//!                                    marshal_inputs     (4)
//!                                    native_call        (5)
//!                                    free_temporaries   (6)
//!                                    failure_check      (7)
//!                                    convert_result     (8)
//!                                    wrapper_end
//! finish(sections) → file text
//! ```

use polybind_catalog::{Catalog, ConventionTable, StructRegistry, StructUsage};
use polybind_types::{Action, ErrorConvention, StructDef};
use tracing::debug;

use crate::buffer::{Artifact, SourceBuf};
use crate::docs::{DocFlattener, DocRequest};
use crate::error::{CodegenError, CodegenResult};
use crate::optargs::OptargsLayout;

/// Read-only inputs shared by every target in one run.
#[derive(Debug, Clone, Copy)]
pub struct GenContext<'a> {
    pub catalog: &'a Catalog,
    pub structs: &'a StructRegistry,
    pub conventions: &'a ConventionTable,
    /// Native symbol prefix (`guestfs` → `guestfs_mount`, `guestfs_h`).
    pub prefix: &'a str,
}

impl<'a> GenContext<'a> {
    pub fn new(
        catalog: &'a Catalog,
        structs: &'a StructRegistry,
        conventions: &'a ConventionTable,
        prefix: &'a str,
    ) -> Self {
        Self {
            catalog,
            structs,
            conventions,
            prefix,
        }
    }
}

/// Everything a target needs to emit one action.
#[derive(Debug, Clone)]
pub struct ActionCtx<'a> {
    pub action: &'a Action,
    pub layout: Option<OptargsLayout<'a>>,
    /// Resolved once by the catalog; targets never derive their own.
    pub convention: ErrorConvention,
    /// Flattened long description.
    pub doc: Vec<String>,
}

impl ActionCtx<'_> {
    pub fn name(&self) -> &str {
        &self.action.name
    }
}

/// The regions of a generated file. [`Target::finish`] decides their order.
#[derive(Debug, Clone)]
pub struct Sections {
    /// Foreign declarations: native structs, prototypes, `extern` blocks.
    pub decls: SourceBuf,
    /// Target-side types and struct conversion routines.
    pub types: SourceBuf,
    /// Public wrappers.
    pub wrappers: SourceBuf,
}

impl Sections {
    pub fn new(unit: &'static str) -> Self {
        Self {
            decls: SourceBuf::new(unit),
            types: SourceBuf::new(unit),
            wrappers: SourceBuf::new(unit),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Target
// ══════════════════════════════════════════════════════════════════════════════

/// One output surface.
pub trait Target {
    /// Short name used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Output path relative to the output root.
    fn file_name(&self) -> &'static str;

    /// Indentation unit of the emitted language.
    fn indent_unit(&self) -> &'static str {
        "    "
    }

    /// Wrap width for flattened documentation.
    fn doc_width(&self) -> usize {
        72
    }

    /// Native record type, element conversion, and (when the usage
    /// includes lists) list conversion built on the element conversion.
    fn struct_routines(
        &self,
        ctx: &GenContext<'_>,
        def: &StructDef,
        usage: StructUsage,
        out: &mut Sections,
    );

    /// Packed optional-argument structure plus the caller-facing options type.
    fn optargs_decl(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut Sections);

    /// (1) Native entry point declaration.
    fn foreign_decl(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf);

    /// (2) description comment and (3) wrapper signature.
    fn wrapper_begin(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf);

    /// (4) Convert caller values, including options, to native ones.
    fn marshal_inputs(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf);

    /// (5)
    fn native_call(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf);

    /// (6) Release every temporary from (4), whatever the call returned.
    fn free_temporaries(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf);

    /// (7) Raise with the handle's last error when the convention says so.
    fn failure_check(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf);

    /// (8)
    fn convert_result(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf);

    fn wrapper_end(&self, ctx: &GenContext<'_>, a: &ActionCtx<'_>, out: &mut SourceBuf);

    /// Assemble the complete file.
    fn finish(&self, ctx: &GenContext<'_>, sections: Sections) -> String;
}

// ══════════════════════════════════════════════════════════════════════════════
// Walk
// ══════════════════════════════════════════════════════════════════════════════

/// Run the shared walk for one target.
pub fn emit_target(
    target: &dyn Target,
    ctx: &GenContext<'_>,
    docs: &mut dyn DocFlattener,
) -> CodegenResult<Artifact> {
    let mut sections = Sections::new(target.indent_unit());

    for (def, usage) in ctx.structs.iter() {
        target.struct_routines(ctx, def, usage, &mut sections);
    }

    let actions = ctx.catalog.external_actions();
    for action in actions.iter().copied() {
        let convention = ctx.conventions.get(&action.name).ok_or_else(|| {
            CodegenError::Internal(format!("no error convention for {}", action.name))
        })?;
        let doc = docs.flatten(&DocRequest {
            width: target.doc_width(),
            trim: true,
            discard_first_line: false,
            name: &action.name,
            text: &action.longdesc,
        })?;
        let a = ActionCtx {
            action,
            layout: OptargsLayout::for_action(ctx.prefix, action),
            convention,
            doc,
        };

        if a.layout.is_some() {
            target.optargs_decl(ctx, &a, &mut sections);
        }
        target.foreign_decl(ctx, &a, &mut sections.decls);

        let w = &mut sections.wrappers;
        target.wrapper_begin(ctx, &a, w);
        target.marshal_inputs(ctx, &a, w);
        target.native_call(ctx, &a, w);
        target.free_temporaries(ctx, &a, w);
        target.failure_check(ctx, &a, w);
        target.convert_result(ctx, &a, w);
        target.wrapper_end(ctx, &a, w);
    }

    let contents = target.finish(ctx, sections);
    debug!(
        target = target.name(),
        actions = actions.len(),
        structs = ctx.structs.len(),
        "target emitted"
    );
    Ok(Artifact::new(target.file_name(), contents))
}

/// Split a snake-case name into its words, capitalised and joined.
pub fn camel_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(c) => c.to_ascii_uppercase().to_string() + cs.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Capitalise only the first letter (`add_drive` → `Add_drive`).
pub fn capitalize(name: &str) -> String {
    let mut cs = name.chars();
    match cs.next() {
        Some(c) => c.to_ascii_uppercase().to_string() + cs.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming() {
        assert_eq!(camel_case("lvm_pv"), "LvmPv");
        assert_eq!(camel_case("statns"), "Statns");
        assert_eq!(camel_case("inotify_event"), "InotifyEvent");
        assert_eq!(capitalize("add_drive"), "Add_drive");
        assert_eq!(capitalize(""), "");
    }
}
