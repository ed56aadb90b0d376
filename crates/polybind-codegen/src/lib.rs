//! polybind emitters.
//!
//! # Architecture
//!
//! Each binding target is a [`Target`]: a small set of hooks that spell the
//! pieces of one output file in the target's language. [`emit_target`] runs
//! the walk every target shares (struct routines, then each externally
//! visible action in name order), so ordering and the per-action step
//! sequence are identical across targets.
//!
//! Marshaling decisions are made once, in [`marshal`], and the packed
//! optional-argument layout once, in [`optargs`]. Targets never inspect
//! argument kinds themselves.
//!
//! The errno codec generator ([`errnostring`]) is independent of the
//! catalog: it turns the platform's errno symbol list into a forward table
//! and a perfect-hash reverse lookup ([`perfect_hash`]).

pub mod buffer;
pub mod docs;
pub mod errnostring;
pub mod error;
pub mod marshal;
pub mod optargs;
pub mod perfect_hash;
pub mod target;
pub mod targets;

pub use buffer::{Artifact, SourceBuf, GENERATED_MARKER};
pub use docs::{DocFlattener, DocRequest, PlainText};
pub use error::{CodegenError, CodegenResult};
pub use optargs::{bitmask_for, OptargsLayout};
pub use perfect_hash::PerfectHash;
pub use target::{emit_target, GenContext, Target};
