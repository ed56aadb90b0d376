//! Codegen error types.

use thiserror::Error;

/// Errors that can occur while generating artifacts.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The errno symbol table is not in ascending order.
    #[error("errno symbols out of order: {before} must sort after {after}")]
    ErrnoUnsorted { before: String, after: String },

    /// The errno symbol table lists a symbol twice.
    #[error("duplicate errno symbol: {0}")]
    ErrnoDuplicate(String),

    /// An errno symbol violates the naming rules.
    #[error("invalid errno symbol {name:?}: {reason}")]
    ErrnoInvalid { name: String, reason: &'static str },

    /// No collision-free seed assignment was found.
    #[error("could not build a perfect hash over {keys} keys")]
    PerfectHash { keys: usize },

    /// The documentation flattening tool failed.
    #[error("documentation tool failed on {action}: {reason}")]
    DocTool { action: String, reason: String },

    /// An internal consistency check failed.
    #[error("internal codegen error: {0}")]
    Internal(String),
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
