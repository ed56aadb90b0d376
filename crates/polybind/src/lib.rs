//! polybind driver.
//!
//! ```text
//! GeneratorConfig → pipeline::run → polybind-catalog → polybind-codegen
//!                                 → OutputWriter (atomic, marker-aware)
//! ```
//!
//! The driver owns everything that touches the outside world: reading the
//! configuration and catalog files, running the documentation tool and
//! caching its output, and writing the generated tree.

pub mod config;
pub mod docs;
pub mod error;
pub mod pipeline;
pub mod writer;

pub use config::{DocTool, GeneratorConfig, Overrides};
pub use docs::{DocCache, Pod2Text};
pub use error::{DriverError, DriverResult};
pub use pipeline::{generate, run, Flattener, RunSummary};
pub use writer::{OutputWriter, WriteOutcome};
