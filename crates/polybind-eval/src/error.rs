//! Runtime error types for the reference binding runtime.

use std::fmt;

/// What a binding raises to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// No action of that name in the catalog.
    UnknownAction(String),
    /// The action exists but no binding is generated for it.
    NotBound(String),
    /// Wrong number of positional arguments.
    ArgCount {
        action: String,
        expected: usize,
        got: usize,
    },
    /// A positional or optional argument of the wrong type.
    ArgType {
        action: String,
        arg: String,
        expected: &'static str,
    },
    /// The native call failed; carries the handle's last-error text.
    Native { action: String, message: String },
    /// A native result that does not fit the action's return style.
    Conversion(String),
    /// The errno symbol table was rejected.
    Codec(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAction(name) => write!(f, "unknown action: {name}"),
            Self::NotBound(name) => write!(f, "action {name} has no binding"),
            Self::ArgCount {
                action,
                expected,
                got,
            } => write!(f, "{action}: expected {expected} arguments, got {got}"),
            Self::ArgType {
                action,
                arg,
                expected,
            } => write!(f, "{action}: argument {arg}: expected {expected}"),
            Self::Native { action, message } => write!(f, "{action}: {message}"),
            Self::Conversion(msg) => write!(f, "conversion error: {msg}"),
            Self::Codec(msg) => write!(f, "errno codec: {msg}"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Result alias for runtime operations.
pub type EvalResult<T> = Result<T, EvalError>;
