//! Error taxonomy for ingestion, storage and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// A collaborator output line that cannot be tokenized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("line {line_no}: no function token")]
    Empty { line_no: usize },

    #[error("line {line_no}: indentation must be spaces only")]
    BadIndent { line_no: usize },

    #[error("line {line_no}: indentation of {indent} spaces is not a multiple of {unit}")]
    Misaligned {
        line_no: usize,
        indent: usize,
        unit: usize,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("function or file '{key}' is already registered")]
    Conflict { key: String },

    #[error("function '{name}' is not registered")]
    NotFound { name: String },

    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("record encoding error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Why reconstruction of a single file was abandoned.
#[derive(Error, Debug)]
pub enum ReconstructError {
    #[error("malformed line: {0}")]
    MalformedLine(#[from] LineError),

    #[error("line {line_no}: '{name}' has no caller on the stack")]
    Orphan { line_no: usize, name: String },

    #[error("line {line_no}: returning {pops} levels but only {depth} are open")]
    StackUnderflow {
        line_no: usize,
        pops: usize,
        depth: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure of an external collaborator program.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("{program} could not be started: {source}")]
    Missing {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed on {path} with exit code {code:?}: {stderr}")]
    Failed {
        program: String,
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {timeout_secs}s on {path}")]
    TimedOut {
        program: String,
        path: PathBuf,
        timeout_secs: u64,
    },

    #[error("scratch file i/o for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-file ingestion failure. Recovered by the batch loop with a log entry.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("source file not found: {0}")]
    InputUnavailable(String),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("function not found in database: {name}")]
    OriginNotFound { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
