//! Bounded-depth call tree traversal.
//!
//! The depth bound gates expansion, not printing: a node at depth `d` is
//! always emitted, and its callees are fetched only when `d <= bound`. Output
//! therefore reaches depth `bound + 1`. There is no cycle detection; the bound
//! is what stops recursive chains.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::domain::callgraph::CallNode;
use crate::domain::error::{RenderError, StoreError};
use crate::domain::store::GraphStore;

/// One visited node of a rendered call tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeLine {
    pub depth: usize,
    pub name: String,
    pub path: String,
}

impl TreeLine {
    fn new(node: &CallNode, depth: usize) -> Self {
        Self {
            depth,
            name: node.name.clone(),
            path: node.path.clone(),
        }
    }
}

impl fmt::Display for TreeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            f.write_str("\t")?;
        }
        write!(f, "{} ({})", self.name, self.path)
    }
}

/// Root of a rendering request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub node: CallNode,
    pub depth_bound: usize,
}

impl Origin {
    /// Resolve a user-supplied function name against the registry.
    pub fn resolve(
        store: &dyn GraphStore,
        name: &str,
        depth_bound: usize,
    ) -> Result<Self, RenderError> {
        let record = store
            .lookup_by_name(name)?
            .ok_or_else(|| RenderError::OriginNotFound {
                name: name.to_string(),
            })?;
        Ok(Self {
            node: record.node(),
            depth_bound,
        })
    }
}

/// Pre-order walk from `origin`, callees in store order.
pub fn walk(store: &dyn GraphStore, origin: &Origin) -> Result<Vec<TreeLine>, StoreError> {
    let mut lines = Vec::new();
    let mut frontier: VecDeque<(CallNode, usize)> = VecDeque::new();
    frontier.push_back((origin.node.clone(), 0));

    while let Some((node, depth)) = frontier.pop_front() {
        lines.push(TreeLine::new(&node, depth));

        if depth <= origin.depth_bound {
            // push in reverse so the first callee is visited next
            for child in store.children_of(&node)?.into_iter().rev() {
                frontier.push_front((child, depth + 1));
            }
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::callgraph::FunctionRecord;
    use crate::domain::store::MemoryGraphStore;

    fn node(name: &str) -> CallNode {
        CallNode::new("app.c", name)
    }

    fn sample_store() -> MemoryGraphStore {
        let store = MemoryGraphStore::default();
        store.record_edge(&node("main"), &node("foo")).unwrap();
        store.record_edge(&node("foo"), &node("bar")).unwrap();
        store.record_edge(&node("main"), &node("baz")).unwrap();
        store
    }

    fn render(store: &dyn GraphStore, depth_bound: usize) -> Vec<String> {
        let origin = Origin {
            node: node("main"),
            depth_bound,
        };
        walk(store, &origin)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_depth_zero_expands_origin_only() {
        assert_eq!(
            render(&sample_store(), 0),
            vec!["main (app.c)", "\tfoo (app.c)", "\tbaz (app.c)"]
        );
    }

    #[test]
    fn test_depth_one_reaches_grandchildren_in_preorder() {
        assert_eq!(
            render(&sample_store(), 1),
            vec![
                "main (app.c)",
                "\tfoo (app.c)",
                "\t\tbar (app.c)",
                "\tbaz (app.c)"
            ]
        );
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let store = sample_store();
        assert_eq!(render(&store, 3), render(&store, 3));
    }

    #[test]
    fn test_unresolved_callee_renders_sentinel_path() {
        let store = MemoryGraphStore::default();
        store
            .record_edge(&node("main"), &CallNode::unresolved("printk"))
            .unwrap();
        assert_eq!(render(&store, 0), vec!["main (app.c)", "\tprintk (unknown)"]);
    }

    #[test]
    fn test_self_recursion_terminates_at_bound() {
        let store = MemoryGraphStore::default();
        let a = CallNode::new("rec.c", "a");
        for _ in 0..10 {
            store.record_edge(&a, &a).unwrap();
        }
        for bound in [0, 1, 4] {
            let origin = Origin {
                node: a.clone(),
                depth_bound: bound,
            };
            let lines = walk(&store, &origin).unwrap();
            assert_eq!(lines.len(), bound + 2);
            assert_eq!(lines.last().unwrap().depth, bound + 1);
        }
    }

    #[test]
    fn test_origin_resolution() {
        let store = MemoryGraphStore::default();
        store
            .register_function(FunctionRecord {
                full_path: "/src/app.c".to_string(),
                short_path: "app.c".to_string(),
                name: "main".to_string(),
                line: 20,
                signature: "int main (void)".to_string(),
                complexity: None,
            })
            .unwrap();

        let origin = Origin::resolve(&store, "main", 2).unwrap();
        assert_eq!(origin.node, node("main"));
        assert_eq!(origin.depth_bound, 2);

        assert!(matches!(
            Origin::resolve(&store, "missing", 2),
            Err(RenderError::OriginNotFound { .. })
        ));
    }
}
