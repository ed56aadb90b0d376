//! polybind reference runtime.
//!
//! Executes the binding contract directly, without generating code: any
//! catalog action can be invoked against a [`NativeLibrary`] and goes
//! through the same marshaling table, options packing, failure conventions
//! and result conversion the emitted wrappers use. It is the golden
//! reference the generated bindings are checked against, and the place the
//! runtime properties of the contract are tested.

pub mod convert;
pub mod errno;
pub mod error;
pub mod mock;
pub mod native;
pub mod pack;
pub mod runtime;
pub mod value;

pub use errno::ErrnoCodec;
pub use error::{EvalError, EvalResult};
pub use mock::{Call, MockLibrary};
pub use native::{ArrayId, Heap, NativeArg, NativeField, NativeLibrary, NativeRecord, NativeReturn};
pub use pack::{PackedField, PackedOptargs};
pub use runtime::Runtime;
pub use value::{FieldValue, Options, StructValue, Value};
