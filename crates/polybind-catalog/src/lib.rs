//! polybind action catalog.
//!
//! ```text
//! action lists + structs → Catalog (validated) → StructRegistry
//!                                              → ConventionTable
//!                                              → OptargBits snapshot
//! ```
//!
//! Everything here is built once at the start of a generation run and only
//! read afterwards.

pub mod bits;
pub mod builtin;
mod catalog;
mod conventions;
mod load;
mod registry;

pub use bits::OptargBits;
pub use catalog::Catalog;
pub use conventions::ConventionTable;
pub use load::{load_json, CatalogFile, LoadError};
pub use registry::{StructRegistry, StructUsage};
