//! Batch use cases: ingest a source list into the graph store and draw call trees.
//!
//! Every pass works file by file. Per-file problems are logged and counted;
//! only a collaborator that cannot be started at all aborts a pass.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::domain::callgraph::{FileRecord, FunctionRecord};
use crate::domain::complexity::parse_report;
use crate::domain::error::{CollaboratorError, IngestError, StoreError};
use crate::domain::reconstruct::{ResolutionPolicy, Reconstructor};
use crate::domain::store::GraphStore;
use crate::domain::traversal::{walk, Origin, TreeLine};
use crate::domain::xref::parse_definitions;
use crate::infrastructure::{DumpKind, LogDirs, SourceEntry};
use crate::ports::tree_exporter::TreeExporter;
use crate::ports::{CallHierarchyExtractor, ComplexityAnalyzer};

/// Outcome of one pass over a source list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    /// Listed but not on disk
    pub skipped: usize,
    pub failed: usize,
}

pub struct IngestUsecase<'a> {
    pub store: &'a dyn GraphStore,
    pub extractor: &'a dyn CallHierarchyExtractor,
    pub analyzer: &'a dyn ComplexityAnalyzer,
    pub policy: &'a ResolutionPolicy,
    pub log_dirs: &'a LogDirs,
}

impl<'a> IngestUsecase<'a> {
    /// Register every listed file with its line count.
    pub fn index_files(&self, entries: &[SourceEntry]) -> Result<BatchReport, IngestError> {
        info!(files = entries.len(), "indexing files");
        run_pass("files", entries, |entry| self.file_record(entry))
    }

    /// Register function definitions from cross-reference listings.
    pub fn index_functions(&self, entries: &[SourceEntry]) -> Result<BatchReport, IngestError> {
        let version = self.extractor.probe()?;
        info!(files = entries.len(), extractor = %version, "indexing functions");
        run_pass("functions", entries, |entry| self.functions_in(entry))
    }

    /// Rebuild call edges from call tree listings.
    pub fn index_edges(&self, entries: &[SourceEntry]) -> Result<BatchReport, IngestError> {
        let version = self.extractor.probe()?;
        info!(files = entries.len(), extractor = %version, "indexing edges");
        let mut reconstructor = Reconstructor::new(self.store, self.policy);
        run_pass("edges", entries, |entry| {
            self.edges_in(&mut reconstructor, entry)
        })
    }

    /// Attach complexity metrics to registered functions.
    pub fn index_complexity(&self, entries: &[SourceEntry]) -> Result<BatchReport, IngestError> {
        let version = self.analyzer.probe()?;
        info!(files = entries.len(), analyzer = %version, "processing complexity");
        run_pass("complexity", entries, |entry| self.complexity_in(entry))
    }

    /// Function and complexity passes over header files.
    pub fn index_headers(
        &self,
        headers: &[SourceEntry],
    ) -> Result<(BatchReport, BatchReport), IngestError> {
        info!(headers = headers.len(), "header processor starting");
        let functions = self.index_functions(headers)?;
        let complexity = self.index_complexity(headers)?;
        Ok((functions, complexity))
    }

    fn file_record(&self, entry: &SourceEntry) -> Result<(), IngestError> {
        let line_count = entry.line_count().map_err(|source| IngestError::Io {
            path: entry.full_path.clone(),
            source,
        })?;
        let record = FileRecord {
            full_path: entry.full_path.to_string_lossy().into_owned(),
            short_path: entry.short_path.clone(),
            line_count,
            name: entry.name().to_string(),
        };
        match self.store.register_file(record) {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict { .. }) => {
                warn!(file = %entry.short_path, "file already in store");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn functions_in(&self, entry: &SourceEntry) -> Result<(), IngestError> {
        let listing = self.extractor.cross_reference(&entry.full_path)?;
        self.log_dirs
            .dump(DumpKind::Functions, &entry.short_path, &listing);

        let full_path = entry.full_path.to_string_lossy();
        let mut registered = 0;
        for def in parse_definitions(&listing) {
            let record = FunctionRecord {
                full_path: full_path.to_string(),
                short_path: entry.short_path.clone(),
                name: def.name,
                line: def.line,
                signature: def.signature,
                complexity: None,
            };
            match self.store.register_function(record) {
                Ok(()) => registered += 1,
                Err(StoreError::Conflict { key }) => {
                    warn!(function = %key, file = %entry.short_path, "function already exists in store");
                }
                Err(e) => return Err(e.into()),
            }
        }
        debug!(file = %entry.short_path, registered, "functions indexed");
        Ok(())
    }

    fn edges_in(
        &self,
        reconstructor: &mut Reconstructor<'_>,
        entry: &SourceEntry,
    ) -> Result<(), IngestError> {
        let listing = self.extractor.call_tree(&entry.full_path)?;
        self.log_dirs
            .dump(DumpKind::Edges, &entry.short_path, &listing);

        let summary = reconstructor.reconstruct(&listing)?;
        debug!(
            file = %entry.short_path,
            lines = summary.lines,
            edges = summary.edges,
            unresolved = summary.unresolved,
            skipped = summary.skipped,
            "edges indexed"
        );
        Ok(())
    }

    fn complexity_in(&self, entry: &SourceEntry) -> Result<(), IngestError> {
        let report = self.analyzer.report(&entry.full_path)?;
        self.log_dirs
            .dump(DumpKind::Complexity, &entry.short_path, &report);

        for row in parse_report(&report) {
            match self.store.update_complexity(&row.name, row.metrics) {
                Ok(()) => {}
                Err(StoreError::NotFound { name }) => {
                    warn!(function = %name, file = %entry.short_path, "no record for complexity data");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Apply `per_file` to every entry that exists, logging and counting failures.
fn run_pass<F>(pass: &str, entries: &[SourceEntry], mut per_file: F) -> Result<BatchReport, IngestError>
where
    F: FnMut(&SourceEntry) -> Result<(), IngestError>,
{
    let mut report = BatchReport::default();
    for entry in entries {
        if !entry.exists() {
            warn!(pass, file = %entry.short_path, "{}", IngestError::InputUnavailable(entry.short_path.clone()));
            report.skipped += 1;
            continue;
        }

        info!(pass, file = %entry.short_path, "processing");
        match per_file(entry) {
            Ok(()) => report.processed += 1,
            Err(IngestError::Collaborator(err @ CollaboratorError::Missing { .. })) => {
                return Err(err.into());
            }
            Err(e) => {
                error!(pass, file = %entry.short_path, error = %e, "file abandoned");
                report.failed += 1;
            }
        }
    }
    info!(
        pass,
        processed = report.processed,
        skipped = report.skipped,
        failed = report.failed,
        "pass complete"
    );
    Ok(report)
}

pub struct DrawUsecase<'a> {
    pub store: &'a dyn GraphStore,
    pub exporter: &'a dyn TreeExporter,
}

impl<'a> DrawUsecase<'a> {
    /// Render the call tree rooted at `function`, write it to `artifact` and echo it to `console`.
    pub fn run(
        &self,
        function: &str,
        depth_bound: usize,
        artifact: &Path,
        console: &mut dyn Write,
    ) -> anyhow::Result<Vec<TreeLine>> {
        let origin = Origin::resolve(self.store, function, depth_bound)?;
        let lines = walk(self.store, &origin)?;

        let mut file = File::create(artifact)
            .with_context(|| format!("Failed to create {}", artifact.display()))?;
        self.exporter.export(&lines, &mut file)?;
        self.exporter.export(&lines, console)?;

        info!(origin = %origin.node, depth_bound, nodes = lines.len(), artifact = %artifact.display(), "call tree drawn");
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::RenderError;
    use crate::domain::store::MemoryGraphStore;
    use crate::ports::tree_exporter::TextTreeExporter;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// Canned listings keyed by file name.
    #[derive(Default)]
    struct FakeExtractor {
        trees: HashMap<String, String>,
        xrefs: HashMap<String, String>,
        missing: bool,
    }

    fn key(source: &Path) -> String {
        source.file_name().unwrap().to_string_lossy().into_owned()
    }

    fn canned(map: &HashMap<String, String>, source: &Path) -> Result<String, CollaboratorError> {
        map.get(&key(source))
            .cloned()
            .ok_or_else(|| CollaboratorError::Failed {
                program: "fake".to_string(),
                path: source.to_path_buf(),
                code: Some(1),
                stderr: "no listing".to_string(),
            })
    }

    impl CallHierarchyExtractor for FakeExtractor {
        fn probe(&self) -> Result<String, CollaboratorError> {
            if self.missing {
                return Err(CollaboratorError::Missing {
                    program: "fake".to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok("fake 1.0".to_string())
        }

        fn call_tree(&self, source: &Path) -> Result<String, CollaboratorError> {
            canned(&self.trees, source)
        }

        fn cross_reference(&self, source: &Path) -> Result<String, CollaboratorError> {
            canned(&self.xrefs, source)
        }
    }

    /// Serves the same CSV report for every file.
    struct FakeAnalyzer(String);

    impl ComplexityAnalyzer for FakeAnalyzer {
        fn probe(&self) -> Result<String, CollaboratorError> {
            Ok("fake".to_string())
        }

        fn report(&self, _source: &Path) -> Result<String, CollaboratorError> {
            Ok(self.0.clone())
        }
    }

    struct Tree {
        _dir: tempfile::TempDir,
        root: PathBuf,
        log_dirs: LogDirs,
    }

    fn source_tree(files: &[&str]) -> Tree {
        let dir = tempdir().unwrap();
        let root = dir.path().join("src");
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "int f(void);\n").unwrap();
        }
        fs::create_dir_all(&root).unwrap();
        let log_dirs = LogDirs::create(&dir.path().join("log"), false).unwrap();
        Tree {
            root,
            log_dirs,
            _dir: dir,
        }
    }

    #[test]
    fn test_edges_pass_continues_after_bad_file() {
        let tree = source_tree(&["a.c", "b.c", "c.c"]);
        let mut extractor = FakeExtractor::default();
        extractor.trees.insert("a.c".into(), "main()\n    foo()\n".into());
        extractor.trees.insert("b.c".into(), "bar()\n  bad()\n".into());
        extractor.trees.insert("c.c".into(), "baz()\n    qux()\n".into());

        let store = MemoryGraphStore::default();
        let policy = ResolutionPolicy::default();
        let analyzer = FakeAnalyzer(String::new());
        let usecase = IngestUsecase {
            store: &store,
            extractor: &extractor,
            analyzer: &analyzer,
            policy: &policy,
            log_dirs: &tree.log_dirs,
        };

        let entries: Vec<SourceEntry> = ["a.c", "b.c", "gone.c", "c.c"]
            .iter()
            .map(|f| SourceEntry::new(&tree.root, f))
            .collect();
        let report = usecase.index_edges(&entries).unwrap();

        assert_eq!(
            report,
            BatchReport {
                processed: 2,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(store.edge_count().unwrap(), 2);
    }

    #[test]
    fn test_missing_extractor_is_fatal() {
        let tree = source_tree(&["a.c"]);
        let extractor = FakeExtractor {
            missing: true,
            ..FakeExtractor::default()
        };
        let store = MemoryGraphStore::default();
        let policy = ResolutionPolicy::default();
        let analyzer = FakeAnalyzer(String::new());
        let usecase = IngestUsecase {
            store: &store,
            extractor: &extractor,
            analyzer: &analyzer,
            policy: &policy,
            log_dirs: &tree.log_dirs,
        };

        let entries = vec![SourceEntry::new(&tree.root, "a.c")];
        assert!(matches!(
            usecase.index_edges(&entries),
            Err(IngestError::Collaborator(CollaboratorError::Missing { .. }))
        ));
    }

    #[test]
    fn test_functions_then_complexity() {
        let tree = source_tree(&["mm/slab.c", "mm/util.c"]);
        let mut extractor = FakeExtractor::default();
        extractor.xrefs.insert(
            "slab.c".into(),
            "kmalloc * x.c:10 void *kmalloc (size_t size)\nmemset   x.c:12\n".into(),
        );
        extractor
            .xrefs
            .insert("util.c".into(), "kmalloc * y.c:3 void *kmalloc (int)\n".into());

        let store = MemoryGraphStore::default();
        let policy = ResolutionPolicy::default();
        let analyzer = FakeAnalyzer(
            "NLOC,CCN,token,PARAM,length,location,file,function,long_name,start,end\n\
             9,3,50,1,12,\"kmalloc@10-21@x.c\",\"x.c\",\"kmalloc\",\"kmalloc( size_t size)\",10,21\n\
             1,1,5,0,1,\"unknown_fn@30-30@x.c\",\"x.c\",\"unknown_fn\",\"unknown_fn( )\",30,30\n"
                .to_string(),
        );
        let usecase = IngestUsecase {
            store: &store,
            extractor: &extractor,
            analyzer: &analyzer,
            policy: &policy,
            log_dirs: &tree.log_dirs,
        };
        let entries: Vec<SourceEntry> = ["mm/slab.c", "mm/util.c"]
            .iter()
            .map(|f| SourceEntry::new(&tree.root, f))
            .collect();

        let report = usecase.index_functions(&entries).unwrap();
        assert_eq!(report.processed, 2);
        let record = store.lookup_by_name("kmalloc").unwrap().unwrap();
        assert_eq!(record.short_path, "mm/slab.c");
        assert_eq!(record.line, 10);

        let report = usecase.index_complexity(&entries).unwrap();
        assert_eq!(report.failed, 0);
        let record = store.lookup_by_name("kmalloc").unwrap().unwrap();
        assert_eq!(record.complexity.unwrap().cyclomatic, 3);
    }

    #[test]
    fn test_complexity_report_is_dumped() {
        let tree = source_tree(&["mm/slab.c"]);
        let dump_dirs = LogDirs::create(&tree.root.join("../dump"), true).unwrap();
        let extractor = FakeExtractor::default();
        let store = MemoryGraphStore::default();
        let policy = ResolutionPolicy::default();
        let csv = "4,2,20,0,6,\"f@1-6@slab.c\",\"slab.c\",\"f\",\"f( )\",1,6\n";
        let analyzer = FakeAnalyzer(csv.to_string());
        let usecase = IngestUsecase {
            store: &store,
            extractor: &extractor,
            analyzer: &analyzer,
            policy: &policy,
            log_dirs: &dump_dirs,
        };

        let entries = vec![SourceEntry::new(&tree.root, "mm/slab.c")];
        let report = usecase.index_complexity(&entries).unwrap();
        assert_eq!(report.processed, 1);

        let dumped = dump_dirs.dump_path(DumpKind::Complexity, "mm/slab.c");
        assert!(dumped.ends_with("complexity/mm-slab.c.log"));
        assert_eq!(fs::read_to_string(dumped).unwrap(), csv);
    }

    #[test]
    fn test_index_files_counts_lines() {
        let tree = source_tree(&["kernel/fork.c"]);
        let extractor = FakeExtractor::default();
        let store = MemoryGraphStore::default();
        let policy = ResolutionPolicy::default();
        let analyzer = FakeAnalyzer(String::new());
        let usecase = IngestUsecase {
            store: &store,
            extractor: &extractor,
            analyzer: &analyzer,
            policy: &policy,
            log_dirs: &tree.log_dirs,
        };
        let entries = vec![SourceEntry::new(&tree.root, "kernel/fork.c")];
        usecase.index_files(&entries).unwrap();
        usecase.index_files(&entries).unwrap();

        assert_eq!(store.files.len(), 1);
        let file = store.files.iter().next().unwrap().value().clone();
        assert_eq!(file.name, "fork.c");
        assert_eq!(file.line_count, 1);
    }

    #[test]
    fn test_draw_writes_artifact_and_console() {
        let dir = tempdir().unwrap();
        let store = MemoryGraphStore::default();
        store
            .register_function(FunctionRecord {
                full_path: "/src/app.c".to_string(),
                short_path: "app.c".to_string(),
                name: "main".to_string(),
                line: 1,
                signature: String::new(),
                complexity: None,
            })
            .unwrap();
        let main = crate::domain::callgraph::CallNode::new("app.c", "main");
        store
            .record_edge(&main, &crate::domain::callgraph::CallNode::unresolved("puts"))
            .unwrap();

        let usecase = DrawUsecase {
            store: &store,
            exporter: &TextTreeExporter,
        };
        let artifact = dir.path().join("main-1");
        let mut console = Vec::new();
        let lines = usecase.run("main", 1, &artifact, &mut console).unwrap();

        assert_eq!(lines.len(), 2);
        let expected = "main (app.c)\n\tputs (unknown)\n";
        assert_eq!(String::from_utf8(console).unwrap(), expected);
        assert_eq!(fs::read_to_string(&artifact).unwrap(), expected);

        let err = usecase
            .run("nope", 1, &dir.path().join("nope-1"), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RenderError>(),
            Some(RenderError::OriginNotFound { .. })
        ));
        assert!(!dir.path().join("nope-1").exists());
    }
}
