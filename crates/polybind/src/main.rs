use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use polybind::{DocTool, DriverResult, GeneratorConfig, Overrides};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DocToolArg {
    Pod2text,
    Plain,
}

impl From<DocToolArg> for DocTool {
    fn from(arg: DocToolArg) -> Self {
        match arg {
            DocToolArg::Pod2text => DocTool::Pod2text,
            DocToolArg::Plain => DocTool::Plain,
        }
    }
}

/// Generate Rust, Go and Lua bindings from an action catalog.
#[derive(Debug, Parser)]
#[command(name = "polybind", version, about)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output root.
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Targets to emit (repeatable): rust, go, lua.
    #[arg(short, long = "target", value_name = "NAME")]
    targets: Vec<String>,

    /// Native symbol prefix.
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<String>,

    /// JSON catalog instead of the built-in one.
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Optional-argument bit snapshot to check and update.
    #[arg(long, value_name = "FILE")]
    optarg_bits: Option<PathBuf>,

    #[arg(long, value_enum)]
    doc_tool: Option<DocToolArg>,

    /// Flattened documentation cache.
    #[arg(long, value_name = "FILE")]
    doc_cache: Option<PathBuf>,

    /// Skip the errno codec.
    #[arg(long)]
    no_errno_codec: bool,

    /// Leave stale generated files in place.
    #[arg(long)]
    keep_stale: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            output_dir: self.output.clone(),
            targets: (!self.targets.is_empty()).then(|| self.targets.clone()),
            native_prefix: self.prefix.clone(),
            catalog: self.catalog.clone(),
            optarg_bits: self.optarg_bits.clone(),
            doc_tool: self.doc_tool.map(DocTool::from),
            doc_cache: self.doc_cache.clone(),
            no_errno_codec: self.no_errno_codec,
            keep_stale: self.keep_stale,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "polybind=info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> DriverResult<()> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    config.apply_overrides(&cli.overrides());
    polybind::run(&config)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("polybind: {e}");
            ExitCode::FAILURE
        }
    }
}
