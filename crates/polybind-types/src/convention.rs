//! Failure-detection conventions.
//!
//! Each return style maps to exactly one rule for telling a failed native
//! call apart from a successful one. The mapping lives here and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::action::Return;

/// The integer every integer-returning entry point uses to signal failure.
pub const INTEGER_SENTINEL: i64 = -1;

/// How a binding detects that a native call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorConvention {
    /// The empty value is a legal result; failure cannot be seen in the
    /// return value and callers consult the last-error accessor.
    NoSignal,
    /// Failed iff the returned integer equals [`INTEGER_SENTINEL`].
    IntegerSentinel,
    /// Failed iff the returned pointer is null.
    PointerSentinel,
}

impl ErrorConvention {
    /// Resolve the convention for a return style.
    pub fn resolve(ret: &Return) -> Self {
        match ret {
            Return::ConstOptString(_) => ErrorConvention::NoSignal,
            Return::Err | Return::Int(_) | Return::Int64(_) | Return::Bool(_) => {
                ErrorConvention::IntegerSentinel
            }
            Return::ConstString(_)
            | Return::String(_)
            | Return::StringList(_)
            | Return::Hashtable(_)
            | Return::Struct { .. }
            | Return::StructList { .. }
            | Return::BufferOut(_) => ErrorConvention::PointerSentinel,
        }
    }
}

impl fmt::Display for ErrorConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSignal => write!(f, "no-signal"),
            Self::IntegerSentinel => write!(f, "integer-sentinel"),
            Self::PointerSentinel => write!(f, "pointer-sentinel"),
        }
    }
}
