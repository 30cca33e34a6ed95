use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;
use walkdir::WalkDir;

use crate::config::HeaderConfig;

/// One source file to ingest: the path as listed and its location on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub short_path: String,
    pub full_path: PathBuf,
}

impl SourceEntry {
    pub fn new(root: &Path, short_path: &str) -> Self {
        Self {
            short_path: short_path.to_string(),
            full_path: root.join(short_path),
        }
    }

    pub fn exists(&self) -> bool {
        self.full_path.is_file()
    }

    /// Final path component.
    pub fn name(&self) -> &str {
        self.short_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.short_path)
    }

    pub fn line_count(&self) -> std::io::Result<u64> {
        let reader = BufReader::new(fs::File::open(&self.full_path)?);
        let mut count = 0;
        for line in reader.split(b'\n') {
            line?;
            count += 1;
        }
        Ok(count)
    }
}

pub struct SourceList;

impl SourceList {
    /// Load a list document: one path per line, relative to `root`.
    ///
    /// An unreadable list or a missing root is an error for the whole run;
    /// entries that do not exist are returned and left to each pass to skip.
    pub fn load(list_path: &Path, root: &Path) -> Result<Vec<SourceEntry>> {
        if !root.is_dir() {
            bail!("source path {} is not a directory", root.display());
        }
        let content = fs::read_to_string(list_path)
            .with_context(|| format!("Failed to read file list {}", list_path.display()))?;

        Ok(content
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(|line| SourceEntry::new(root, line))
            .collect())
    }

    /// All `*.h` files below `root`, with short paths relative to it, minus
    /// those `filter` excludes.
    pub fn headers(root: &Path, filter: &HeaderConfig) -> Result<Vec<SourceEntry>> {
        if !root.is_dir() {
            bail!("header path {} is not a directory", root.display());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "h") {
                continue;
            }
            let short_path = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            if is_excluded(&short_path, filter) {
                info!(header = %short_path, "skipping excluded header");
                continue;
            }
            entries.push(SourceEntry {
                short_path,
                full_path: path.to_path_buf(),
            });
        }
        Ok(entries)
    }
}

fn is_excluded(short_path: &str, filter: &HeaderConfig) -> bool {
    let mut parts = short_path.split('/');
    parts.next_back();
    let dirs: Vec<&str> = parts.collect();
    let listed = |wanted: &[String]| dirs.iter().any(|dir| wanted.iter().any(|w| w == dir));
    listed(&filter.skip_dirs) && !listed(&filter.keep_dirs)
}
