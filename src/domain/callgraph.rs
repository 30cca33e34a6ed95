// Call graph structures for Call Trees.
// Represents function identities, their metadata and caller -> callee relationships.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Path recorded for a callee whose name is not in the function registry.
pub const UNKNOWN_PATH: &str = "unknown";

/// A node in the call graph, identified by (file path, function name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallNode {
    pub path: String,
    pub name: String,
}

impl CallNode {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Placeholder node for a name the registry does not know.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::new(UNKNOWN_PATH, name)
    }
}

impl fmt::Display for CallNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path)
    }
}

/// Complexity metrics attached to a function after the analyzer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Complexity {
    /// McCabe cyclomatic score
    pub cyclomatic: u32,
    /// Non-comment statement/line count
    pub statements: u32,
}

/// A registered function definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub full_path: String,
    pub short_path: String,
    pub name: String,
    pub line: u32,
    pub signature: String,
    pub complexity: Option<Complexity>,
}

impl FunctionRecord {
    /// The graph identity of this function. Edges use the short path.
    pub fn node(&self) -> CallNode {
        CallNode::new(self.short_path.clone(), self.name.clone())
    }
}

/// A source file listed for ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub full_path: String,
    pub short_path: String,
    pub line_count: u64,
    pub name: String,
}
