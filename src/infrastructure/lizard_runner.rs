use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ComplexityConfig;
use crate::domain::error::CollaboratorError;
use crate::infrastructure::process;
use crate::ports::ComplexityAnalyzer;

/// Complexity analyzer backed by `lizard --csv`.
pub struct LizardAnalyzer {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    scratch_dir: PathBuf,
}

impl LizardAnalyzer {
    pub fn new(config: &ComplexityConfig, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
            scratch_dir: scratch_dir.into(),
        }
    }
}

impl ComplexityAnalyzer for LizardAnalyzer {
    fn probe(&self) -> Result<String, CollaboratorError> {
        process::probe(&self.program)
    }

    fn report(&self, source: &Path) -> Result<String, CollaboratorError> {
        let scratch = process::scratch_copy(source, &self.scratch_dir, None)?;
        process::run_captured(&self.program, &self.args, scratch.path(), self.timeout)
    }
}
