//! Shared model for the polybind generator.
//!
//! This crate defines the closed set of argument kinds, optional-argument
//! kinds, return styles and struct-field representations that every other
//! stage consumes, together with the failure-detection convention resolver
//! and the model-level error type.

mod action;
mod convention;
mod error;
mod structs;

pub use action::{
    Action, Arg, ArgKind, Deprecation, OptArg, OptArgKind, Return, StringKind, Version,
    Visibility, MAX_OPTARG_BITS,
};
pub use convention::{ErrorConvention, INTEGER_SENTINEL};
pub use error::CatalogError;
pub use structs::{Field, FieldKind, StructDef, StructShape, UUID_LEN};

/// Result type used by catalog construction and validation.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Check that `name` is a lower-snake identifier usable in every target.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("add_drive"));
        assert!(is_identifier("st_dev"));
        assert!(is_identifier("blockdev_getss2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("_private"));
        assert!(!is_identifier("AddDrive"));
        assert!(!is_identifier("add-drive"));
        assert!(!is_identifier("9lives"));
    }
}
