/// Working Directory Layout
///
/// Everything a run writes besides the store lives under one log directory:
/// - `edges/`, `functions/`, `complexity/` - raw collaborator output per source file
/// - `<function>-<depth>[.ext]` - rendered call trees

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

/// Raw output categories, one subdirectory each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpKind {
    Edges,
    Functions,
    Complexity,
}

impl DumpKind {
    pub const ALL: [DumpKind; 3] = [DumpKind::Edges, DumpKind::Functions, DumpKind::Complexity];

    pub fn dir_name(&self) -> &'static str {
        match self {
            DumpKind::Edges => "edges",
            DumpKind::Functions => "functions",
            DumpKind::Complexity => "complexity",
        }
    }
}

pub struct LogDirs {
    root: PathBuf,
    dump_output: bool,
}

impl LogDirs {
    /// Create the log directory tree if it is missing.
    pub fn create(root: &Path, dump_output: bool) -> Result<Self> {
        for kind in DumpKind::ALL {
            let dir = root.join(kind.dir_name());
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
            dump_output,
        })
    }

    /// Where raw output for `short_path` goes: `mm/slab.c` -> `edges/mm-slab.c.log`.
    pub fn dump_path(&self, kind: DumpKind, short_path: &str) -> PathBuf {
        self.root
            .join(kind.dir_name())
            .join(format!("{}.log", short_path.replace('/', "-")))
    }

    /// Keep raw collaborator output when dumping is enabled. Failures only warn.
    pub fn dump(&self, kind: DumpKind, short_path: &str, text: &str) {
        if !self.dump_output {
            return;
        }
        let path = self.dump_path(kind, short_path);
        if let Err(e) = fs::write(&path, text) {
            warn!(path = %path.display(), error = %e, "failed to write raw output");
        }
    }

    /// Artifact path for a rendered tree.
    pub fn tree_artifact(&self, function: &str, depth: usize, extension: Option<&str>) -> PathBuf {
        let stem = format!("{}-{}", function, depth);
        match extension {
            Some(ext) => self.root.join(format!("{}.{}", stem, ext)),
            None => self.root.join(stem),
        }
    }
}
