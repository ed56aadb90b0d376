//! Catalog validation errors.

use thiserror::Error;

/// Errors raised while assembling or checking a catalog. All are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("action `{name}` is defined more than once")]
    DuplicateAction { name: String },

    #[error("{what} name `{name}` is not a lower-case identifier")]
    InvalidName { what: &'static str, name: String },

    #[error("action `{action}`: argument `{arg}` appears more than once")]
    DuplicateArg { action: String, arg: String },

    #[error("action `{action}`: optional argument `{optarg}` appears more than once")]
    DuplicateOptarg { action: String, optarg: String },

    #[error("action `{action}`: bit {bit} is assigned to both `{first}` and `{second}`")]
    DuplicateBit {
        action: String,
        bit: u8,
        first: String,
        second: String,
    },

    #[error("action `{action}`: optional argument `{optarg}` uses bit {bit}, limit is 63")]
    BitOutOfRange {
        action: String,
        optarg: String,
        bit: u8,
    },

    #[error("action `{action}` returns unknown struct `{name}`")]
    UnknownStruct { action: String, name: String },

    #[error("struct `{name}` is defined more than once")]
    DuplicateStruct { name: String },

    #[error("struct `{name}` has no fields")]
    EmptyStruct { name: String },

    #[error("struct `{name}`: field `{field}` appears more than once")]
    DuplicateField { name: String, field: String },

    #[error("action `{action}` is deprecated in favour of unknown action `{replacement}`")]
    UnknownReplacement { action: String, replacement: String },

    #[error("action `{action}`: optional argument `{optarg}` moved from bit {before} to bit {after}")]
    BitReassigned {
        action: String,
        optarg: String,
        before: u8,
        after: u8,
    },

    #[error("action `{action}`: bit {bit} belonged to `{before}` and is now used by `{after}`")]
    BitReused {
        action: String,
        bit: u8,
        before: String,
        after: String,
    },
}
