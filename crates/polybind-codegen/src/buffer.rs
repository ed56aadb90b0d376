//! Indented text accumulation and the artifacts handed to the writer.

use std::path::PathBuf;

/// Text every generated file carries near its top.
///
/// The output writer relies on it to tell generated files apart from
/// hand-written ones when deleting stale output.
pub const GENERATED_MARKER: &str = "This file is generated by polybind. Do not edit.";

// ══════════════════════════════════════════════════════════════════════════════
// SourceBuf
// ══════════════════════════════════════════════════════════════════════════════

/// An append-only text buffer with an indentation level.
#[derive(Debug, Clone)]
pub struct SourceBuf {
    text: String,
    depth: usize,
    unit: &'static str,
}

impl Default for SourceBuf {
    fn default() -> Self {
        Self::new("    ")
    }
}

impl SourceBuf {
    /// A buffer indenting by `unit` per level.
    pub fn new(unit: &'static str) -> Self {
        Self {
            text: String::new(),
            depth: 0,
            unit,
        }
    }

    /// Write one line at the current indentation. Empty lines carry no
    /// trailing whitespace.
    pub fn line(&mut self, s: impl AsRef<str>) {
        let s = s.as_ref();
        if !s.is_empty() {
            for _ in 0..self.depth {
                self.text.push_str(self.unit);
            }
            self.text.push_str(s);
        }
        self.text.push('\n');
    }

    pub fn blank(&mut self) {
        self.text.push('\n');
    }

    /// Write each line of `block` at the current indentation.
    pub fn lines<I, S>(&mut self, block: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for l in block {
            self.line(l);
        }
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Append another buffer's text verbatim.
    pub fn append(&mut self, other: &SourceBuf) {
        self.text.push_str(&other.text);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Artifact
// ══════════════════════════════════════════════════════════════════════════════

/// One complete generated file, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.contents.lines().count()
    }
}
