use std::path::Path;

use crate::domain::error::CollaboratorError;

pub mod tree_exporter;

/// External tool that renders a source file's call hierarchy as text.
pub trait CallHierarchyExtractor {
    /// Check the tool can be run at all; returns its version banner.
    fn probe(&self) -> Result<String, CollaboratorError>;
    /// Indentation-coded call tree listing for one source file.
    fn call_tree(&self, source: &Path) -> Result<String, CollaboratorError>;
    /// Cross-reference listing with one definition or reference per line.
    fn cross_reference(&self, source: &Path) -> Result<String, CollaboratorError>;
}

/// External tool that scores functions in a source file.
pub trait ComplexityAnalyzer {
    fn probe(&self) -> Result<String, CollaboratorError>;
    /// Per-function report in the tool's CSV form.
    fn report(&self, source: &Path) -> Result<String, CollaboratorError>;
}
