use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Call hierarchy extractor (cflow)
    pub extractor: ExtractorConfig,

    /// Complexity analyzer (lizard)
    pub complexity: ComplexityConfig,

    /// Reconstruction policy
    pub reconstruct: ReconstructConfig,

    /// Header discovery for `--index-headers`
    pub headers: HeaderConfig,

    /// Log directory and artifacts
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub program: String,

    /// Arguments for the indented call tree listing
    pub tree_args: Vec<String>,

    /// Arguments for the cross-reference listing
    pub xref_args: Vec<String>,

    /// Kill the extractor after this many seconds; unset waits forever
    pub timeout_secs: Option<u64>,

    /// Line written ahead of the source in the scratch copy
    pub prelude: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Unresolved names that produce no edges at all (e.g. compiler built-ins)
    pub skip_unresolved: Vec<String>,
}

/// A header is skipped when one of its directories is in `skip_dirs` and
/// none is in `keep_dirs`. The defaults keep only x86 under `arch/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub skip_dirs: Vec<String>,
    pub keep_dirs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub log_dir: PathBuf,

    /// Log file shared by all runs, appended to
    pub log_file: PathBuf,

    /// Keep raw collaborator output under the log directory
    pub dump_collaborator_output: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: "cflow".to_string(),
            tree_args: vec![],
            xref_args: vec!["-x".to_string(), "-i".to_string(), "_st".to_string()],
            timeout_secs: None,
            prelude: None,
        }
    }
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            program: "lizard".to_string(),
            args: vec!["--csv".to_string()],
            timeout_secs: None,
        }
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            skip_dirs: vec!["arch".to_string()],
            keep_dirs: vec!["x86".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("calltreelog"),
            log_file: PathBuf::from("calltrees.log"),
            dump_collaborator_output: false,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Load an explicit config file, or `calltrees.toml` if present, or defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let candidates = ["calltrees.toml", ".calltrees.toml"];
                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }
                Ok(Self::default())
            }
        }
    }
}
