//! Writing artifacts under the output root.
//!
//! Each file is written to a temporary file in its destination directory
//! and then renamed over the target, so readers never see a half-written
//! file. A file whose contents would not change is left alone, which keeps
//! its mtime and downstream build steps quiet.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use polybind_codegen::{Artifact, GENERATED_MARKER};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{DriverError, DriverResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug)]
pub struct OutputWriter {
    root: PathBuf,
    /// Paths relative to `root`, written or confirmed this run.
    files: BTreeSet<PathBuf>,
    lines: usize,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: BTreeSet::new(),
            lines: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write(&mut self, artifact: &Artifact) -> DriverResult<WriteOutcome> {
        let dest = self.root.join(&artifact.path);
        let dir = dest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir).map_err(DriverError::io(&dir))?;

        let outcome = match fs::read(&dest) {
            Ok(old) if old == artifact.contents.as_bytes() => WriteOutcome::Unchanged,
            Ok(_) => {
                self.replace(&dir, &dest, artifact)?;
                WriteOutcome::Updated
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.replace(&dir, &dest, artifact)?;
                WriteOutcome::Created
            }
            Err(e) => return Err(DriverError::io(&dest)(e)),
        };

        self.files.insert(artifact.path.clone());
        self.lines += artifact.line_count();
        debug!(path = %artifact.path.display(), ?outcome, "artifact");
        Ok(outcome)
    }

    fn replace(&self, dir: &Path, dest: &Path, artifact: &Artifact) -> DriverResult<()> {
        let mut tmp = NamedTempFile::new_in(dir).map_err(DriverError::io(dir))?;
        tmp.write_all(artifact.contents.as_bytes())
            .map_err(DriverError::io(tmp.path()))?;
        let perms = match fs::metadata(dest) {
            Ok(meta) => meta.permissions(),
            Err(_) => default_permissions(tmp.path())?,
        };
        fs::set_permissions(tmp.path(), perms).map_err(DriverError::io(tmp.path()))?;
        tmp.persist(dest).map_err(|e| DriverError::io(dest)(e.error))?;
        Ok(())
    }

    /// Every relative path written or confirmed this run, sorted.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Remove generated files under the root that this run did not produce.
    ///
    /// A file counts as generated when its first line carries the marker;
    /// anything else is never touched.
    pub fn delete_stale(&self) -> DriverResult<Vec<PathBuf>> {
        let mut stale = Vec::new();
        if self.root.is_dir() {
            self.collect_stale(&self.root, &mut stale)?;
        }
        for path in &stale {
            let full = self.root.join(path);
            fs::remove_file(&full).map_err(DriverError::io(&full))?;
            info!(path = %path.display(), "deleted stale generated file");
        }
        Ok(stale)
    }

    fn collect_stale(&self, dir: &Path, out: &mut Vec<PathBuf>) -> DriverResult<()> {
        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(DriverError::io(dir))?
            .collect::<Result<_, _>>()
            .map_err(DriverError::io(dir))?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                self.collect_stale(&path, out)?;
                continue;
            }
            let Ok(rel) = path.strip_prefix(&self.root) else {
                continue;
            };
            if self.files.contains(rel) {
                continue;
            }
            if is_generated(&path) {
                out.push(rel.to_path_buf());
            }
        }
        Ok(())
    }
}

fn is_generated(path: &Path) -> bool {
    fs::read_to_string(path)
        .ok()
        .and_then(|text| text.lines().next().map(|l| l.contains(GENERATED_MARKER)))
        .unwrap_or(false)
}

#[cfg(unix)]
fn default_permissions(_tmp: &Path) -> DriverResult<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions(tmp: &Path) -> DriverResult<fs::Permissions> {
    Ok(fs::metadata(tmp).map_err(DriverError::io(tmp))?.permissions())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(path: &str, body: &str) -> Artifact {
        Artifact::new(path, format!("// {GENERATED_MARKER}\n{body}\n"))
    }

    #[test]
    fn created_updated_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = OutputWriter::new(dir.path());
        let a = generated("go/x.go", "package x");
        assert_eq!(w.write(&a).unwrap(), WriteOutcome::Created);
        assert_eq!(w.write(&a).unwrap(), WriteOutcome::Unchanged);
        let b = generated("go/x.go", "package y");
        assert_eq!(w.write(&b).unwrap(), WriteOutcome::Updated);
        assert_eq!(
            fs::read_to_string(dir.path().join("go/x.go")).unwrap(),
            b.contents
        );
        assert_eq!(w.files().count(), 1);
        assert_eq!(w.lines(), 6);
    }

    #[test]
    fn no_temporaries_are_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = OutputWriter::new(dir.path());
        w.write(&generated("a.c", "int a;")).unwrap();
        w.write(&generated("a.c", "int b;")).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.c")]);
    }

    #[test]
    fn stale_generated_files_are_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let lua = dir.path().join("lua");
        fs::create_dir_all(&lua).unwrap();
        fs::write(lua.join("old.c"), format!("/* {GENERATED_MARKER} */\n")).unwrap();
        fs::write(lua.join("handwritten.c"), "int main(void);\n").unwrap();

        let mut w = OutputWriter::new(dir.path());
        w.write(&generated("lua/new.c", "int x;")).unwrap();
        let deleted = w.delete_stale().unwrap();

        assert_eq!(deleted, vec![PathBuf::from("lua/old.c")]);
        assert!(!lua.join("old.c").exists());
        assert!(lua.join("handwritten.c").exists());
        assert!(lua.join("new.c").exists());
    }

    #[test]
    fn missing_root_has_nothing_stale() {
        let dir = tempfile::tempdir().unwrap();
        let w = OutputWriter::new(dir.path().join("absent"));
        assert!(w.delete_stale().unwrap().is_empty());
    }
}
