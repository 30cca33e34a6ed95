// Command-line entry point for Call Trees.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use calltrees::application::{DrawUsecase, IngestUsecase};
use calltrees::config::Config;
use calltrees::domain::error::RenderError;
use calltrees::domain::reconstruct::ResolutionPolicy;
use calltrees::domain::store::DiskGraphStore;
use calltrees::infrastructure::{CflowExtractor, LizardAnalyzer, LogDirs, SourceList};
use calltrees::ports::tree_exporter::{JsonTreeExporter, TextTreeExporter, TreeExporter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    #[value(name = "none")]
    Off,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Critical | LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Off => "off",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "calltrees", author, version, about, long_about = None)]
struct Cli {
    /// Graph store location (created if missing)
    store: PathBuf,

    /// Configuration file (defaults to ./calltrees.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// File containing the list of source files to scan, one per line
    #[arg(long = "file-list")]
    file_list: Option<PathBuf>,

    /// Root the listed source files are relative to
    #[arg(long = "source-path")]
    source_path: Option<PathBuf>,

    /// Index files
    #[arg(long)]
    index_files: bool,

    /// Index function definitions
    #[arg(long)]
    index_functions: bool,

    /// Index edges (function calls)
    #[arg(long)]
    index_edges: bool,

    /// Attach complexity metrics to indexed functions
    #[arg(long)]
    complexity: bool,

    /// Index functions and complexity from header files below this directory
    #[arg(long)]
    index_headers: Option<PathBuf>,

    /// Unresolved name that should never produce an edge (repeatable)
    #[arg(long = "skip-unresolved")]
    skip_unresolved: Vec<String>,

    /// Draw the call tree of this function
    #[arg(long = "draw-function")]
    draw_function: Option<String>,

    /// Depth bound of the call tree
    #[arg(long = "draw-depth", default_value_t = 1)]
    draw_depth: usize,

    /// Call tree output format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Log directory (overrides the config file)
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// Logging level (falls back to RUST_LOG, then info)
    #[arg(long = "log-level", value_enum)]
    log_level: Option<LogLevel>,
}

fn init_logging(level: Option<LogLevel>, log_file: &Path) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::new(level.directive()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Cannot open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("Failed to install logger")?;
    Ok(())
}

fn run(cli: Cli, mut config: Config) -> Result<ExitCode> {
    if let Some(dir) = cli.log_dir {
        config.output.log_dir = dir;
    }
    config
        .reconstruct
        .skip_unresolved
        .extend(cli.skip_unresolved);

    let log_dirs = LogDirs::create(&config.output.log_dir, config.output.dump_collaborator_output)?;
    let store = DiskGraphStore::new(&cli.store.to_string_lossy())
        .with_context(|| format!("Failed to open store {}", cli.store.display()))?;

    let scratch_dir = std::env::current_dir().context("Cannot determine working directory")?;
    let extractor = CflowExtractor::new(&config.extractor, &scratch_dir);
    let analyzer = LizardAnalyzer::new(&config.complexity, &scratch_dir);
    let policy = ResolutionPolicy::new(config.reconstruct.skip_unresolved.iter().cloned());
    let ingest = IngestUsecase {
        store: &store,
        extractor: &extractor,
        analyzer: &analyzer,
        policy: &policy,
        log_dirs: &log_dirs,
    };

    let wants_batch = cli.index_files || cli.index_functions || cli.index_edges || cli.complexity;
    if wants_batch {
        match (&cli.file_list, &cli.source_path) {
            (Some(list), Some(root)) => {
                let entries = SourceList::load(list, root)?;
                if cli.index_files {
                    ingest.index_files(&entries)?;
                }
                if cli.index_functions {
                    ingest.index_functions(&entries)?;
                }
                if cli.index_edges {
                    ingest.index_edges(&entries)?;
                }
                if cli.complexity {
                    ingest.index_complexity(&entries)?;
                }
            }
            _ => anyhow::bail!("indexing needs both --file-list and --source-path"),
        }
    }

    if let Some(dir) = &cli.index_headers {
        let headers = SourceList::headers(dir, &config.headers)?;
        ingest.index_headers(&headers)?;
    }

    store.flush()?;

    if let Some(function) = &cli.draw_function {
        let exporter: &dyn TreeExporter = match cli.format {
            Format::Text => &TextTreeExporter,
            Format::Json => &JsonTreeExporter,
        };
        let artifact = log_dirs.tree_artifact(function, cli.draw_depth, exporter.extension());
        let draw = DrawUsecase {
            store: &store,
            exporter,
        };

        let stdout = std::io::stdout();
        let mut console = stdout.lock();
        if let Err(err) = draw.run(function, cli.draw_depth, &artifact, &mut console) {
            if let Some(RenderError::OriginNotFound { .. }) = err.downcast_ref::<RenderError>() {
                error!(function = %function, "{}", err);
                eprintln!("function not found in database");
                return Ok(ExitCode::FAILURE);
            }
            return Err(err);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_ref())?;
    init_logging(cli.log_level, &config.output.log_file)?;

    info!("Call Trees v{} started", env!("CARGO_PKG_VERSION"));
    run(cli, config)
}
