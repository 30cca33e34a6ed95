// Domain layer: call graph types, listing reconstruction, storage and traversal.

pub mod callgraph;
pub mod complexity;
pub mod error;
pub mod listing;
pub mod reconstruct;
pub mod store;
pub mod traversal;
pub mod xref;
