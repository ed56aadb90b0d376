//! One generation run.
//!
//! ```text
//! config → validate → errno symbols ✓ → catalog ✓ → optarg bits ✓
//!        → emit every artifact (in memory)
//!        → write · delete stale · save bit snapshot · close doc cache
//! ```
//!
//! All validation and all emission finish before the first file is
//! written, so a failing run leaves the output tree as it was.

use std::path::{Path, PathBuf};

use polybind_catalog::{builtin, load_json, Catalog, ConventionTable, OptargBits, StructRegistry};
use polybind_codegen::errnostring::{self, ERRNOS};
use polybind_codegen::{
    emit_target, targets, Artifact, CodegenError, CodegenResult, DocFlattener, DocRequest,
    GenContext, PlainText,
};
use tracing::{debug, info};

use crate::config::{DocTool, GeneratorConfig};
use crate::docs::{DocCache, Pod2Text};
use crate::error::{DriverError, DriverResult};
use crate::writer::{OutputWriter, WriteOutcome};

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub created: Vec<PathBuf>,
    pub updated: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    pub lines: usize,
}

/// The configured flattener.
#[derive(Debug)]
pub enum Flattener {
    Pod2Text(Pod2Text),
    Plain(PlainText),
}

impl Flattener {
    pub fn for_tool(tool: DocTool) -> Self {
        match tool {
            DocTool::Pod2text => Flattener::Pod2Text(Pod2Text::default()),
            DocTool::Plain => Flattener::Plain(PlainText),
        }
    }
}

impl DocFlattener for Flattener {
    fn flatten(&mut self, req: &DocRequest<'_>) -> CodegenResult<Vec<String>> {
        match self {
            Flattener::Pod2Text(f) => f.flatten(req),
            Flattener::Plain(f) => f.flatten(req),
        }
    }
}

/// Load the configured catalog, or the built-in one.
pub fn load_catalog(config: &GeneratorConfig) -> DriverResult<Catalog> {
    let catalog = match &config.catalog {
        Some(path) => load_json(path)?,
        None => builtin::catalog()?,
    };
    info!(
        actions = catalog.actions().len(),
        structs = catalog.structs().len(),
        "catalog assembled"
    );
    Ok(catalog)
}

/// Compare the catalog's bits against the snapshot file, if there is one.
pub fn check_optarg_bits(catalog: &Catalog, snapshot: &Path) -> DriverResult<OptargBits> {
    let current = OptargBits::capture(catalog);
    match std::fs::read_to_string(snapshot) {
        Ok(data) => {
            let prior = OptargBits::from_json(&data).map_err(DriverError::json(snapshot))?;
            current.check_against(&prior)?;
            debug!(path = %snapshot.display(), "optional-argument bits unchanged");
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %snapshot.display(), "no prior optional-argument snapshot");
        }
        Err(e) => return Err(DriverError::io(snapshot)(e)),
    }
    Ok(current)
}

/// Produce every artifact the configuration asks for, without writing.
pub fn generate(
    catalog: &Catalog,
    config: &GeneratorConfig,
    docs: &mut dyn DocFlattener,
) -> DriverResult<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    if config.errno_codec {
        artifacts.extend(errnostring::generate(&config.native_prefix, ERRNOS)?);
    }

    let structs = StructRegistry::build(catalog);
    let conventions = ConventionTable::resolve(catalog);
    debug!(structs = structs.len(), "struct registry built");
    let ctx = GenContext::new(catalog, &structs, &conventions, &config.native_prefix);

    for name in &config.targets {
        let target = targets::by_name(name)
            .ok_or_else(|| CodegenError::Internal(format!("unknown target {name}")))?;
        artifacts.push(emit_target(target.as_ref(), &ctx, docs)?);
    }
    Ok(artifacts)
}

/// Run the whole pipeline for `config`.
pub fn run(config: &GeneratorConfig) -> DriverResult<RunSummary> {
    config.validate()?;
    if config.errno_codec {
        errnostring::validate(ERRNOS)?;
    }
    let catalog = load_catalog(config)?;
    let bits = match &config.optarg_bits {
        Some(path) => Some((path, check_optarg_bits(&catalog, path)?)),
        None => None,
    };

    let flattener = Flattener::for_tool(config.doc_tool);
    let mut docs = match &config.doc_cache {
        Some(path) => DocCache::open(flattener, path, config.doc_cache_flush_every)?,
        None => DocCache::in_memory(flattener),
    };
    let artifacts = generate(&catalog, config, &mut docs)?;

    let mut writer = OutputWriter::new(&config.output_dir);
    let mut summary = RunSummary::default();
    for artifact in &artifacts {
        let bucket = match writer.write(artifact)? {
            WriteOutcome::Created => &mut summary.created,
            WriteOutcome::Updated => &mut summary.updated,
            WriteOutcome::Unchanged => &mut summary.unchanged,
        };
        bucket.push(artifact.path.clone());
    }
    if config.delete_stale {
        summary.deleted = writer.delete_stale()?;
    }
    summary.lines = writer.lines();

    if let Some((path, bits)) = bits {
        let data = bits.to_json().map_err(DriverError::json(path))?;
        std::fs::write(path, data + "\n").map_err(DriverError::io(path))?;
    }
    docs.close()?;

    info!(
        root = %writer.root().display(),
        created = summary.created.len(),
        updated = summary.updated.len(),
        unchanged = summary.unchanged.len(),
        deleted = summary.deleted.len(),
        lines = summary.lines,
        "generation finished"
    );
    Ok(summary)
}
