//! Optional-argument packing layout.
//!
//! Optional arguments travel in a structure whose first field is a 64-bit
//! mask. Each remaining field belongs to one optional argument, in bit
//! order. A field is meaningful only when its bit is set; an unset argument
//! leaves both its bit and its field zero.
//!
//! ```text
//! struct guestfs_add_drive_argv {
//!   uint64_t bitmask;         bit 0 → readonly, bit 1 → format, ...
//!   int readonly;
//!   const char *format;
//!   ...
//! };
//! ```

use polybind_types::{Action, OptArg};

use crate::marshal::{c_ident, optarg_repr, optargs_struct, NativeRepr};

/// One field of the packed structure.
#[derive(Debug, Clone)]
pub struct OptargSlot<'a> {
    pub optarg: &'a OptArg,
    pub repr: NativeRepr,
}

impl OptargSlot<'_> {
    pub fn name(&self) -> &str {
        &self.optarg.name
    }

    pub fn bit(&self) -> u8 {
        self.optarg.bit
    }

    /// The mask written as a shift, the way every target spells it.
    pub fn mask_expr(&self) -> String {
        format!("1 << {}", self.optarg.bit)
    }

    fn c_field(&self) -> String {
        let name = c_ident(&self.optarg.name);
        match &self.repr {
            NativeRepr::Text | NativeRepr::OptText => format!("const char *{name};"),
            NativeRepr::TextArray => format!("char *const *{name};"),
            NativeRepr::Bool | NativeRepr::Int32 => format!("int {name};"),
            NativeRepr::Int64 => format!("int64_t {name};"),
            NativeRepr::Buffer | NativeRepr::Pointer(_) => format!("void *{name};"),
        }
    }
}

/// The packed structure of one action.
#[derive(Debug, Clone)]
pub struct OptargsLayout<'a> {
    /// Native structure tag.
    pub tag: String,
    /// Fields in bit order.
    pub slots: Vec<OptargSlot<'a>>,
}

impl<'a> OptargsLayout<'a> {
    /// `None` for an action without optional arguments.
    pub fn for_action(prefix: &str, action: &'a Action) -> Option<Self> {
        if !action.has_optargs() {
            return None;
        }
        let slots = action
            .optargs_by_bit()
            .into_iter()
            .map(|optarg| OptargSlot {
                optarg,
                repr: optarg_repr(optarg.kind),
            })
            .collect();
        Some(Self {
            tag: optargs_struct(prefix, action),
            slots,
        })
    }

    /// Slots that own a temporary array.
    pub fn temporaries(&self) -> impl Iterator<Item = &OptargSlot<'a>> {
        self.slots.iter().filter(|s| s.repr.needs_temporary())
    }

    /// The C structure definition.
    pub fn c_decl(&self) -> Vec<String> {
        let mut out = vec![format!("struct {} {{", self.tag), "  uint64_t bitmask;".into()];
        for slot in &self.slots {
            out.push(format!("  {}", slot.c_field()));
        }
        out.push("};".into());
        out
    }
}

/// Compute the mask for the given set of supplied optional argument names.
///
/// Unknown names contribute nothing.
pub fn bitmask_for<'n>(action: &Action, supplied: impl IntoIterator<Item = &'n str>) -> u64 {
    supplied
        .into_iter()
        .filter_map(|name| action.find_optarg(name))
        .fold(0, |mask, o| mask | o.mask())
}
