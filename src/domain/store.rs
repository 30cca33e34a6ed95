use crate::domain::callgraph::{CallNode, Complexity, FileRecord, FunctionRecord};
use crate::domain::error::StoreError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sled::Db;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for call graph storage backends.
/// Implementations must be thread-safe (Send + Sync).
///
/// Edges are an append-only multiset: the same (caller, callee) pair may be
/// recorded any number of times. `children_of` reports each callee once, in
/// the order it was first recorded for that caller.
pub trait GraphStore: Send + Sync {
    fn register_file(&self, file: FileRecord) -> Result<(), StoreError>;
    /// First registration of a name wins; later ones return `StoreError::Conflict`.
    fn register_function(&self, record: FunctionRecord) -> Result<(), StoreError>;
    fn record_edge(&self, caller: &CallNode, callee: &CallNode) -> Result<(), StoreError>;
    fn lookup_by_name(&self, name: &str) -> Result<Option<FunctionRecord>, StoreError>;
    fn children_of(&self, node: &CallNode) -> Result<Vec<CallNode>, StoreError>;
    fn update_complexity(&self, name: &str, complexity: Complexity) -> Result<(), StoreError>;
    /// Total recorded edges, duplicates included.
    fn edge_count(&self) -> Result<usize, StoreError>;
}

fn distinct_in_order(callees: impl IntoIterator<Item = CallNode>) -> Vec<CallNode> {
    let mut seen = HashSet::new();
    callees
        .into_iter()
        .filter(|callee| seen.insert(callee.clone()))
        .collect()
}

// ============================================================================
// MemoryGraphStore - Fast in-memory storage using DashMap
// ============================================================================

#[derive(Default)]
pub struct MemoryGraphStore {
    pub files: DashMap<String, FileRecord>,
    pub functions: DashMap<String, FunctionRecord>,
    pub edges: DashMap<CallNode, Vec<CallNode>>, // caller -> callees in insertion order
    edge_total: AtomicUsize,
}

impl GraphStore for MemoryGraphStore {
    fn register_file(&self, file: FileRecord) -> Result<(), StoreError> {
        match self.files.entry(file.full_path.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict {
                key: file.full_path,
            }),
            Entry::Vacant(slot) => {
                slot.insert(file);
                Ok(())
            }
        }
    }

    fn register_function(&self, record: FunctionRecord) -> Result<(), StoreError> {
        match self.functions.entry(record.name.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict { key: record.name }),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn record_edge(&self, caller: &CallNode, callee: &CallNode) -> Result<(), StoreError> {
        self.edges
            .entry(caller.clone())
            .or_default()
            .push(callee.clone());
        self.edge_total.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn lookup_by_name(&self, name: &str) -> Result<Option<FunctionRecord>, StoreError> {
        Ok(self.functions.get(name).map(|r| r.clone()))
    }

    fn children_of(&self, node: &CallNode) -> Result<Vec<CallNode>, StoreError> {
        Ok(self
            .edges
            .get(node)
            .map(|callees| distinct_in_order(callees.iter().cloned()))
            .unwrap_or_default())
    }

    fn update_complexity(&self, name: &str, complexity: Complexity) -> Result<(), StoreError> {
        match self.functions.get_mut(name) {
            Some(mut record) => {
                record.complexity = Some(complexity);
                Ok(())
            }
            None => Err(StoreError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    fn edge_count(&self) -> Result<usize, StoreError> {
        Ok(self.edge_total.load(Ordering::Relaxed))
    }
}

// ============================================================================
// DiskGraphStore - Persistent storage using sled
// ============================================================================

/// Layout: `files` keyed by full path, `functions` keyed by name, `edges`
/// keyed by the encoded caller followed by a big-endian sequence id so that a
/// prefix scan returns a caller's callees in insertion order.
pub struct DiskGraphStore {
    db: Db,
    files_tree: sled::Tree,
    functions_tree: sled::Tree,
    edges_tree: sled::Tree,
}

impl DiskGraphStore {
    pub fn new(path: &str) -> anyhow::Result<Self> {
        let db = sled::open(path)?;
        let files_tree = db.open_tree("files")?;
        let functions_tree = db.open_tree("functions")?;
        let edges_tree = db.open_tree("edges")?;

        Ok(Self {
            db,
            files_tree,
            functions_tree,
            edges_tree,
        })
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    fn caller_prefix(caller: &CallNode) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(caller)?)
    }

    fn insert_new(tree: &sled::Tree, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        match tree.compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(bytes))? {
            Ok(()) => Ok(()),
            Err(_) => Err(StoreError::Conflict {
                key: key.to_string(),
            }),
        }
    }
}

impl GraphStore for DiskGraphStore {
    fn register_file(&self, file: FileRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(&file)?;
        Self::insert_new(&self.files_tree, &file.full_path, bytes)
    }

    fn register_function(&self, record: FunctionRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(&record)?;
        Self::insert_new(&self.functions_tree, &record.name, bytes)
    }

    fn record_edge(&self, caller: &CallNode, callee: &CallNode) -> Result<(), StoreError> {
        let mut key = Self::caller_prefix(caller)?;
        key.extend_from_slice(&self.db.generate_id()?.to_be_bytes());
        self.edges_tree.insert(key, bincode::serialize(callee)?)?;
        Ok(())
    }

    fn lookup_by_name(&self, name: &str) -> Result<Option<FunctionRecord>, StoreError> {
        match self.functions_tree.get(name.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn children_of(&self, node: &CallNode) -> Result<Vec<CallNode>, StoreError> {
        let prefix = Self::caller_prefix(node)?;
        let callees = self
            .edges_tree
            .scan_prefix(prefix)
            .map(|entry| -> Result<CallNode, StoreError> {
                let (_, bytes) = entry?;
                Ok(bincode::deserialize::<CallNode>(&bytes)?)
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(distinct_in_order(callees))
    }

    fn update_complexity(&self, name: &str, complexity: Complexity) -> Result<(), StoreError> {
        let mut record = self
            .lookup_by_name(name)?
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })?;
        record.complexity = Some(complexity);
        self.functions_tree
            .insert(name.as_bytes(), bincode::serialize(&record)?)?;
        Ok(())
    }

    fn edge_count(&self) -> Result<usize, StoreError> {
        Ok(self.edges_tree.len())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
