// Infrastructure implementations for Call Trees: external tools and the filesystem.

pub mod cflow_runner;
pub mod lizard_runner;
pub mod process;
pub mod source_list;
pub mod workdir;

pub use cflow_runner::CflowExtractor;
pub use lizard_runner::LizardAnalyzer;
pub use source_list::{SourceEntry, SourceList};
pub use workdir::{DumpKind, LogDirs};
