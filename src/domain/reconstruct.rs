//! Indentation-to-graph reconstruction.
//!
//! Walks a call listing for one source file, keeps the chain of open callers
//! on an explicit stack and records a caller -> callee edge for every line
//! that is nested under another. Root entries (indent 0) get no caller edge.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::domain::callgraph::CallNode;
use crate::domain::error::ReconstructError;
use crate::domain::listing::{parse_line, split_records, ListingLine, INDENT_UNIT};
use crate::domain::store::GraphStore;

/// How to treat names that are not in the function registry.
#[derive(Debug, Clone, Default)]
pub struct ResolutionPolicy {
    /// Unresolved names that never produce edges (compiler built-ins and the like).
    /// Every other unresolved name becomes a node with the `unknown` path.
    pub skip_unresolved: HashSet<String>,
}

impl ResolutionPolicy {
    pub fn new<I, S>(skip: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skip_unresolved: skip.into_iter().map(Into::into).collect(),
        }
    }
}

/// Counters for one reconstructed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub lines: usize,
    pub edges: usize,
    pub unresolved: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
struct Frame {
    node: CallNode,
    /// Filtered by policy: kept on the stack for shape, never an edge endpoint.
    skipped: bool,
}

pub struct Reconstructor<'a> {
    store: &'a dyn GraphStore,
    policy: &'a ResolutionPolicy,
    stack: Vec<Frame>,
    current_indent: usize,
}

impl<'a> Reconstructor<'a> {
    pub fn new(store: &'a dyn GraphStore, policy: &'a ResolutionPolicy) -> Self {
        Self {
            store,
            policy,
            stack: Vec::new(),
            current_indent: 0,
        }
    }

    /// Rebuild the edges implied by one file's listing.
    ///
    /// State is reset first, so nothing carries over between files. On error
    /// the remaining lines are abandoned; edges already recorded stay.
    pub fn reconstruct(&mut self, listing: &str) -> Result<FileSummary, ReconstructError> {
        self.reset();
        let mut summary = FileSummary::default();

        for (idx, raw) in split_records(listing).into_iter().enumerate() {
            let line = parse_line(idx + 1, raw)?;
            self.process_line(&line, &mut summary)?;
            summary.lines += 1;
        }

        Ok(summary)
    }

    /// Number of open frames, root included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.current_indent = 0;
    }

    fn resolve(&self, name: &str, summary: &mut FileSummary) -> Result<Frame, ReconstructError> {
        if let Some(record) = self.store.lookup_by_name(name)? {
            return Ok(Frame {
                node: record.node(),
                skipped: false,
            });
        }

        let skipped = self.policy.skip_unresolved.contains(name);
        if skipped {
            summary.skipped += 1;
        } else {
            summary.unresolved += 1;
        }
        Ok(Frame {
            node: CallNode::unresolved(name),
            skipped,
        })
    }

    fn process_line(
        &mut self,
        line: &ListingLine<'_>,
        summary: &mut FileSummary,
    ) -> Result<(), ReconstructError> {
        let frame = self.resolve(line.name, summary)?;

        match line.indent.cmp(&self.current_indent) {
            Ordering::Greater => {
                self.link_to_top(line, &frame, summary)?;
                self.current_indent = line.indent;
            }
            Ordering::Equal => {
                if self.current_indent > 0 {
                    self.stack.pop();
                    self.link_to_top(line, &frame, summary)?;
                } else {
                    // a new root replaces the previous root's chain
                    self.stack.clear();
                }
            }
            Ordering::Less => {
                let pops = (self.current_indent - line.indent) / INDENT_UNIT + 1;
                if pops > self.stack.len() {
                    return Err(ReconstructError::StackUnderflow {
                        line_no: line.line_no,
                        pops,
                        depth: self.stack.len(),
                    });
                }
                self.stack.truncate(self.stack.len() - pops);
                if line.indent > 0 {
                    self.link_to_top(line, &frame, summary)?;
                }
                self.current_indent = line.indent;
            }
        }

        self.stack.push(frame);
        Ok(())
    }

    fn link_to_top(
        &self,
        line: &ListingLine<'_>,
        callee: &Frame,
        summary: &mut FileSummary,
    ) -> Result<(), ReconstructError> {
        let caller = self.stack.last().ok_or_else(|| ReconstructError::Orphan {
            line_no: line.line_no,
            name: line.name.to_string(),
        })?;

        if caller.skipped || callee.skipped {
            return Ok(());
        }

        debug!(caller = %caller.node, callee = %callee.node, "edge");
        self.store.record_edge(&caller.node, &callee.node)?;
        summary.edges += 1;
        Ok(())
    }
}
