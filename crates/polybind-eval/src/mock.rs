//! A scripted native library.

use std::collections::HashMap;

use crate::native::{Heap, NativeArg, NativeLibrary, NativeReturn};
use crate::pack::PackedOptargs;

/// One recorded call.
#[derive(Debug, Clone)]
pub struct Call {
    pub entry: String,
    pub args: Vec<NativeArg>,
    pub optargs: Option<PackedOptargs>,
    /// Contents of every array argument, read through the heap during the
    /// call: positionals first, then options in bit order.
    pub arrays: Vec<Vec<String>>,
    /// Heap arrays live while the call ran.
    pub live_arrays: usize,
}

/// Returns scripted results and records what it was called with.
///
/// Entry points without a script return `0`.
#[derive(Debug, Default)]
pub struct MockLibrary {
    responses: HashMap<String, NativeReturn>,
    errors: HashMap<String, String>,
    last_error: String,
    calls: Vec<Call>,
}

impl MockLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the result of `entry`.
    pub fn respond(mut self, entry: &str, ret: NativeReturn) -> Self {
        self.responses.insert(entry.to_string(), ret);
        self
    }

    /// Script a failing result of `entry` and the error text it leaves.
    pub fn fail(mut self, entry: &str, ret: NativeReturn, message: &str) -> Self {
        self.responses.insert(entry.to_string(), ret);
        self.errors.insert(entry.to_string(), message.to_string());
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn last_call(&self) -> Option<&Call> {
        self.calls.last()
    }
}

fn read_array(heap: &Heap, arg: &NativeArg) -> Option<Vec<String>> {
    match arg {
        NativeArg::TextArray(Some(id)) => heap
            .strings(*id)
            .map(|v| v.into_iter().map(str::to_string).collect()),
        _ => None,
    }
}

impl NativeLibrary for MockLibrary {
    fn call(
        &mut self,
        entry: &str,
        args: &[NativeArg],
        optargs: Option<&PackedOptargs>,
        heap: &Heap,
    ) -> NativeReturn {
        let mut arrays: Vec<Vec<String>> = args.iter().filter_map(|a| read_array(heap, a)).collect();
        if let Some(p) = optargs {
            arrays.extend(p.fields.iter().filter_map(|f| read_array(heap, &f.value)));
        }
        self.calls.push(Call {
            entry: entry.to_string(),
            args: args.to_vec(),
            optargs: optargs.cloned(),
            arrays,
            live_arrays: heap.live(),
        });
        if let Some(message) = self.errors.get(entry) {
            self.last_error = message.clone();
        }
        self.responses
            .get(entry)
            .cloned()
            .unwrap_or(NativeReturn::Int(0))
    }

    fn last_error(&self) -> String {
        self.last_error.clone()
    }
}
