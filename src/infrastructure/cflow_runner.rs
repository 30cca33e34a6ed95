/// cflow Runner.
///
/// Produces the two listings the ingestion passes consume:
/// - call tree mode: `cflow <file>`, nesting by 4-space indentation
/// - cross-reference mode: `cflow -x -i _st <file>`, one definition/reference per line
///
/// Every run works on a scratch copy of the source that is deleted afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ExtractorConfig;
use crate::domain::error::CollaboratorError;
use crate::infrastructure::process;
use crate::ports::CallHierarchyExtractor;

// ═══════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════

/// Which listing to ask cflow for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    CallTree,
    CrossReference,
}

pub struct CflowExtractor {
    program: String,
    tree_args: Vec<String>,
    xref_args: Vec<String>,
    timeout: Option<Duration>,
    prelude: Option<String>,
    scratch_dir: PathBuf,
}

impl CflowExtractor {
    pub fn new(config: &ExtractorConfig, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: config.program.clone(),
            tree_args: config.tree_args.clone(),
            xref_args: config.xref_args.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
            prelude: config.prelude.clone(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Describe the command that would be run, without running it.
    pub fn command_spec(&self, mode: ListingMode) -> CommandSpec {
        let args = match mode {
            ListingMode::CallTree => &self.tree_args,
            ListingMode::CrossReference => &self.xref_args,
        };
        CommandSpec {
            program: self.program.clone(),
            args: args.clone(),
        }
    }

    fn run(&self, mode: ListingMode, source: &Path) -> Result<String, CollaboratorError> {
        let scratch = process::scratch_copy(source, &self.scratch_dir, self.prelude.as_deref())?;
        let spec = self.command_spec(mode);
        process::run_captured(&spec.program, &spec.args, scratch.path(), self.timeout)
    }
}

impl CallHierarchyExtractor for CflowExtractor {
    fn probe(&self) -> Result<String, CollaboratorError> {
        process::probe(&self.program)
    }

    fn call_tree(&self, source: &Path) -> Result<String, CollaboratorError> {
        self.run(ListingMode::CallTree, source)
    }

    fn cross_reference(&self, source: &Path) -> Result<String, CollaboratorError> {
        self.run(ListingMode::CrossReference, source)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Testable Command Builder (for unit tests)
// ═══════════════════════════════════════════════════════════════════════════

/// Program and arguments for one invocation; the scratch file path is appended last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}
