//! Generator configuration.
//!
//! Loaded from an optional JSON file, then overridden by command-line
//! flags. Every field has a default, so an empty object is a valid file.

use std::path::{Path, PathBuf};

use polybind_codegen::targets;
use serde::{Deserialize, Serialize};

use crate::error::{DriverError, DriverResult};

/// Which flattener turns long descriptions into comment text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocTool {
    /// External `pod2text`.
    Pod2text,
    /// In-process markup stripper.
    #[default]
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub output_dir: PathBuf,
    /// Subset of `rust`, `go`, `lua`.
    pub targets: Vec<String>,
    pub native_prefix: String,
    /// JSON catalog; the built-in demo catalog when absent.
    pub catalog: Option<PathBuf>,
    /// Optional-argument bit snapshot, checked and then rewritten.
    pub optarg_bits: Option<PathBuf>,
    pub doc_tool: DocTool,
    pub doc_cache: Option<PathBuf>,
    pub doc_cache_flush_every: usize,
    pub errno_codec: bool,
    pub delete_stale: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated"),
            targets: targets::ALL.iter().map(|t| t.to_string()).collect(),
            native_prefix: "guestfs".to_string(),
            catalog: None,
            optarg_bits: None,
            doc_tool: DocTool::default(),
            doc_cache: None,
            doc_cache_flush_every: 100,
            errno_codec: true,
            delete_stale: true,
        }
    }
}

/// Values given on the command line. `None` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub targets: Option<Vec<String>>,
    pub native_prefix: Option<String>,
    pub catalog: Option<PathBuf>,
    pub optarg_bits: Option<PathBuf>,
    pub doc_tool: Option<DocTool>,
    pub doc_cache: Option<PathBuf>,
    pub no_errno_codec: bool,
    pub keep_stale: bool,
}

impl GeneratorConfig {
    /// Read a configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> DriverResult<Self> {
        let data = std::fs::read_to_string(path).map_err(DriverError::io(path))?;
        serde_json::from_str(&data).map_err(DriverError::json(path))
    }

    pub fn apply_overrides(&mut self, cli: &Overrides) {
        if let Some(value) = &cli.output_dir {
            self.output_dir = value.clone();
        }
        if let Some(value) = &cli.targets {
            self.targets = value.clone();
        }
        if let Some(value) = &cli.native_prefix {
            self.native_prefix = value.clone();
        }
        if let Some(value) = &cli.catalog {
            self.catalog = Some(value.clone());
        }
        if let Some(value) = &cli.optarg_bits {
            self.optarg_bits = Some(value.clone());
        }
        if let Some(value) = cli.doc_tool {
            self.doc_tool = value;
        }
        if let Some(value) = &cli.doc_cache {
            self.doc_cache = Some(value.clone());
        }
        if cli.no_errno_codec {
            self.errno_codec = false;
        }
        if cli.keep_stale {
            self.delete_stale = false;
        }
    }

    pub fn validate(&self) -> DriverResult<()> {
        if self.targets.is_empty() {
            return Err(DriverError::Config("no targets selected".to_string()));
        }
        for t in &self.targets {
            if !targets::ALL.contains(&t.as_str()) {
                return Err(DriverError::Config(format!(
                    "unknown target `{t}` (expected one of: {})",
                    targets::ALL.join(", ")
                )));
            }
        }
        let prefix_ok = !self.native_prefix.is_empty()
            && self
                .native_prefix
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if !prefix_ok {
            return Err(DriverError::Config(format!(
                "native prefix {:?} must be non-empty and use only [a-z0-9_]",
                self.native_prefix
            )));
        }
        if self.doc_cache_flush_every == 0 {
            return Err(DriverError::Config(
                "doc_cache_flush_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let cfg: GeneratorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, GeneratorConfig::default());
        assert_eq!(cfg.targets, vec!["rust", "go", "lua"]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file() {
        let cfg: GeneratorConfig =
            serde_json::from_str(r#"{"targets": ["go"], "doc_tool": "pod2text"}"#).unwrap();
        assert_eq!(cfg.targets, vec!["go"]);
        assert_eq!(cfg.doc_tool, DocTool::Pod2text);
        assert_eq!(cfg.native_prefix, "guestfs");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<GeneratorConfig>(r#"{"target": ["go"]}"#).is_err());
    }

    #[test]
    fn overrides_win() {
        let mut cfg = GeneratorConfig::default();
        cfg.apply_overrides(&Overrides {
            native_prefix: Some("nbd".into()),
            targets: Some(vec!["lua".into()]),
            keep_stale: true,
            ..Overrides::default()
        });
        assert_eq!(cfg.native_prefix, "nbd");
        assert_eq!(cfg.targets, vec!["lua"]);
        assert!(!cfg.delete_stale);
        assert!(cfg.errno_codec);
    }

    #[test]
    fn validation() {
        let mut cfg = GeneratorConfig {
            targets: vec![],
            ..GeneratorConfig::default()
        };
        assert!(cfg.validate().is_err());
        cfg.targets = vec!["python".into()];
        assert!(cfg.validate().is_err());
        cfg.targets = vec!["rust".into()];
        cfg.native_prefix = "Guest-FS".into();
        assert!(cfg.validate().is_err());
        cfg.native_prefix = "guestfs2".into();
        assert!(cfg.validate().is_ok());
    }
}
