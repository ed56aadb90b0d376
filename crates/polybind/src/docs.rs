//! External documentation flattening and its on-disk memo cache.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use polybind_codegen::docs::finish;
use polybind_codegen::{CodegenError, CodegenResult, DocFlattener, DocRequest};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{DriverError, DriverResult};

// ══════════════════════════════════════════════════════════════════════════════
// Pod2Text
// ══════════════════════════════════════════════════════════════════════════════

/// Runs `pod2text -w <width>` with the text on stdin.
#[derive(Debug, Clone)]
pub struct Pod2Text {
    program: PathBuf,
}

impl Default for Pod2Text {
    fn default() -> Self {
        Self::new("pod2text")
    }
}

impl Pod2Text {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, req: &DocRequest<'_>) -> Result<String, String> {
        let mut child = Command::new(&self.program)
            .arg("-w")
            .arg(req.width.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("cannot run {}: {e}", self.program.display()))?;

        let input = format!("=pod\n\n{}\n\n=cut\n", req.text);
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "stdin not captured".to_string())?;
        let (output, written) = std::thread::scope(|s| {
            let writer = s.spawn(move || stdin.write_all(input.as_bytes()));
            let output = child.wait_with_output();
            (output, writer.join())
        });
        let output = output.map_err(|e| format!("waiting: {e}"))?;

        // A tool that dies early also breaks the pipe; report the exit first.
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(match output.status.code() {
                Some(code) => format!("exited with status {code}: {}", stderr.trim()),
                None => "killed by a signal".to_string(),
            });
        }
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(format!("writing stdin: {e}")),
            Err(_) => return Err("stdin writer panicked".to_string()),
        }
        String::from_utf8(output.stdout).map_err(|_| "output is not UTF-8".to_string())
    }
}

impl DocFlattener for Pod2Text {
    fn flatten(&mut self, req: &DocRequest<'_>) -> CodegenResult<Vec<String>> {
        let text = self.run(req).map_err(|reason| CodegenError::DocTool {
            action: req.name.to_string(),
            reason,
        })?;
        // Body paragraphs come back indented by four columns.
        let lines = text
            .lines()
            .map(|l| l.strip_prefix("    ").unwrap_or(l).to_string())
            .collect();
        Ok(finish(lines, req))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// DocCache
// ══════════════════════════════════════════════════════════════════════════════

/// Memoizes another flattener in a JSON file.
///
/// Keys are a SHA-256 digest over every field of the request. New entries
/// are flushed every `flush_every` misses; [`DocCache::close`] always
/// flushes.
#[derive(Debug)]
pub struct DocCache<F> {
    inner: F,
    path: Option<PathBuf>,
    entries: BTreeMap<String, Vec<String>>,
    flush_every: usize,
    pending: usize,
    hits: usize,
    misses: usize,
}

impl<F: DocFlattener> DocCache<F> {
    /// Cache kept only in memory.
    pub fn in_memory(inner: F) -> Self {
        Self {
            inner,
            path: None,
            entries: BTreeMap::new(),
            flush_every: usize::MAX,
            pending: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Load the cache file at `path`; a missing file is an empty cache.
    pub fn open(inner: F, path: &Path, flush_every: usize) -> DriverResult<Self> {
        let entries = match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).map_err(DriverError::json(path))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(DriverError::io(path)(e)),
        };
        debug!(path = %path.display(), entries = entries.len(), "doc cache opened");
        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
            flush_every: flush_every.max(1),
            ..Self::in_memory(inner)
        })
    }

    pub fn key(req: &DocRequest<'_>) -> String {
        let mut h = Sha256::new();
        h.update((req.width as u64).to_le_bytes());
        h.update([u8::from(req.trim), u8::from(req.discard_first_line)]);
        h.update((req.name.len() as u64).to_le_bytes());
        h.update(req.name.as_bytes());
        h.update(req.text.as_bytes());
        h.finalize().iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Write new entries to the cache file, replacing it atomically.
    pub fn flush(&mut self) -> DriverResult<()> {
        if self.pending == 0 {
            return Ok(());
        }
        self.save()
    }

    fn save(&mut self) -> DriverResult<()> {
        let Some(path) = &self.path else {
            self.pending = 0;
            return Ok(());
        };
        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(DriverError::io(&dir))?;
        let data = serde_json::to_string(&self.entries).map_err(DriverError::json(path))?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(DriverError::io(&dir))?;
        tmp.write_all(data.as_bytes())
            .map_err(DriverError::io(tmp.path()))?;
        tmp.persist(path).map_err(|e| DriverError::io(path)(e.error))?;
        debug!(path = %path.display(), entries = self.entries.len(), "doc cache flushed");
        self.pending = 0;
        Ok(())
    }

    /// Flush unconditionally and give back the wrapped flattener.
    pub fn close(mut self) -> DriverResult<F> {
        self.save()?;
        info!(hits = self.hits, misses = self.misses, "doc cache closed");
        Ok(self.inner)
    }
}

impl<F: DocFlattener> DocFlattener for DocCache<F> {
    fn flatten(&mut self, req: &DocRequest<'_>) -> CodegenResult<Vec<String>> {
        let key = Self::key(req);
        if let Some(lines) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(lines.clone());
        }
        self.misses += 1;
        let lines = self.inner.flatten(req)?;
        self.entries.insert(key, lines.clone());
        self.pending += 1;
        if self.pending >= self.flush_every {
            // Retried on the next miss; close() reports a persistent failure.
            if let Err(e) = self.flush() {
                warn!(error = %e, "doc cache flush failed");
            }
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts calls and echoes the text upper-cased.
    #[derive(Default)]
    struct Counting(usize);

    impl DocFlattener for Counting {
        fn flatten(&mut self, req: &DocRequest<'_>) -> CodegenResult<Vec<String>> {
            self.0 += 1;
            Ok(vec![req.text.to_uppercase()])
        }
    }

    fn req<'a>(width: usize, text: &'a str) -> DocRequest<'a> {
        DocRequest {
            width,
            trim: true,
            discard_first_line: false,
            name: "mount",
            text,
        }
    }

    #[test]
    fn keys_cover_every_field() {
        let base = req(72, "x");
        let k = DocCache::<Counting>::key(&base);
        assert_eq!(k.len(), 64);
        assert_ne!(k, DocCache::<Counting>::key(&req(60, "x")));
        assert_ne!(k, DocCache::<Counting>::key(&req(72, "y")));
        assert_ne!(
            k,
            DocCache::<Counting>::key(&DocRequest {
                trim: false,
                ..base
            })
        );
        assert_ne!(
            k,
            DocCache::<Counting>::key(&DocRequest {
                discard_first_line: true,
                ..base
            })
        );
    }

    #[test]
    fn hits_skip_the_inner_flattener() {
        let mut cache = DocCache::in_memory(Counting::default());
        assert_eq!(cache.flatten(&req(72, "a")).unwrap(), vec!["A"]);
        assert_eq!(cache.flatten(&req(72, "a")).unwrap(), vec!["A"]);
        cache.flatten(&req(72, "b")).unwrap();
        assert_eq!((cache.hits(), cache.misses()), (1, 2));
        assert_eq!(cache.close().unwrap().0, 2);
    }

    #[test]
    fn persists_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");

        let mut first = DocCache::open(Counting::default(), &path, 100).unwrap();
        first.flatten(&req(72, "a")).unwrap();
        assert!(!path.exists());
        first.close().unwrap();
        assert!(path.exists());

        let mut second = DocCache::open(Counting::default(), &path, 100).unwrap();
        assert_eq!(second.len(), 1);
        second.flatten(&req(72, "a")).unwrap();
        assert_eq!(second.close().unwrap().0, 0);
    }

    #[test]
    fn flushes_every_n_new_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        let mut cache = DocCache::open(Counting::default(), &path, 2).unwrap();
        cache.flatten(&req(72, "a")).unwrap();
        assert!(!path.exists());
        cache.flatten(&req(72, "b")).unwrap();
        let saved: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[test]
    fn corrupt_cache_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            DocCache::open(Counting::default(), &path, 10),
            Err(DriverError::Json { .. })
        ));
    }

    #[test]
    fn missing_tool_is_a_doc_tool_error() {
        let mut tool = Pod2Text::new("/nonexistent/pod2text");
        let err = tool.flatten(&req(72, "text")).unwrap_err();
        assert!(matches!(err, CodegenError::DocTool { ref action, .. } if action == "mount"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_reports_exit_status() {
        let mut tool = Pod2Text::new("false");
        let err = tool.flatten(&req(72, "text")).unwrap_err();
        assert!(err.to_string().contains("exited with status 1"), "{err}");
    }
}
