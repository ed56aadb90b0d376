//! One binding call, end to end.
//!
//! [`Runtime::call`] performs, for any bound action, what every emitted
//! wrapper does:
//!
//! ```text
//! (4) marshal positionals and pack options   temporaries → heap
//! (5) call the entry point
//! (6) free every temporary                    whatever (4) or (5) did
//! (7) check failure with the resolved convention
//! (8) convert the result
//! ```

use polybind_catalog::{Catalog, ConventionTable};
use polybind_codegen::marshal::entry_point;
use polybind_types::{ErrorConvention, INTEGER_SENTINEL};
use tracing::{debug, trace};

use crate::convert;
use crate::error::{EvalError, EvalResult};
use crate::native::{Heap, NativeLibrary, NativeReturn};
use crate::pack::{marshal_args, PackedOptargs};
use crate::value::{Options, Value};

/// Binds a catalog to a native library.
pub struct Runtime<'c, L> {
    catalog: &'c Catalog,
    conventions: ConventionTable,
    prefix: String,
    library: L,
    heap: Heap,
}

impl<'c, L: NativeLibrary> Runtime<'c, L> {
    pub fn new(catalog: &'c Catalog, library: L) -> Self {
        Self {
            catalog,
            conventions: ConventionTable::resolve(catalog),
            prefix: "guestfs".to_string(),
            library,
            heap: Heap::new(),
        }
    }

    /// Native symbol prefix used to name entry points.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut L {
        &mut self.library
    }

    /// Invoke `name` with positional `args` and sparse `options`.
    pub fn call(&mut self, name: &str, args: &[Value], options: &Options) -> EvalResult<Value> {
        let catalog = self.catalog;
        let action = catalog
            .find(name)
            .ok_or_else(|| EvalError::UnknownAction(name.to_string()))?;
        if !action.visibility.is_external() {
            return Err(EvalError::NotBound(name.to_string()));
        }
        if args.len() != action.args.len() {
            return Err(EvalError::ArgCount {
                action: name.to_string(),
                expected: action.args.len(),
                got: args.len(),
            });
        }
        let convention = self
            .conventions
            .get(name)
            .ok_or_else(|| EvalError::NotBound(name.to_string()))?;
        let entry = entry_point(&self.prefix, action);

        let mut temps = Vec::new();
        let heap = &mut self.heap;
        let marshaled = marshal_args(action, args, heap, &mut temps).and_then(|native| {
            let packed = if action.has_optargs() {
                Some(PackedOptargs::pack(action, options, heap, &mut temps)?)
            } else {
                None
            };
            Ok((native, packed))
        });
        let outcome = marshaled.map(|(native, packed)| {
            trace!(entry = %entry, args = native.len(), "native call");
            self.library.call(&entry, &native, packed.as_ref(), &self.heap)
        });
        for id in temps {
            self.heap.free(id);
        }
        let ret = outcome?;

        if failed(convention, &ret) {
            let message = self.library.last_error();
            debug!(action = name, %message, "native call failed");
            return Err(EvalError::Native {
                action: name.to_string(),
                message,
            });
        }
        convert::result(catalog, &action.ret, ret)
    }
}

/// Whether `ret` signals failure under `convention`.
pub fn failed(convention: ErrorConvention, ret: &NativeReturn) -> bool {
    match convention {
        ErrorConvention::NoSignal => false,
        ErrorConvention::IntegerSentinel => {
            matches!(ret, NativeReturn::Int(n) if *n == INTEGER_SENTINEL)
        }
        ErrorConvention::PointerSentinel => ret.is_null(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels() {
        use ErrorConvention::*;
        assert!(failed(IntegerSentinel, &NativeReturn::Int(-1)));
        assert!(!failed(IntegerSentinel, &NativeReturn::Int(0)));
        assert!(failed(PointerSentinel, &NativeReturn::Text(None)));
        assert!(!failed(PointerSentinel, &NativeReturn::TextArray(Some(vec![]))));
        assert!(!failed(NoSignal, &NativeReturn::Text(None)));
    }
}
