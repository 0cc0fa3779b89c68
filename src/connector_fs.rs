//! Document discovery and best-effort reading from the local filesystem.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::DocumentsConfig;
use crate::error::{RagError, Result};

/// List every file under `config.root` that matches the include globs and
/// none of the configured exclude globs, sorted by path. Nothing is
/// excluded unless the config says so.
///
/// Unreadable directory entries are logged and skipped.
pub fn scan_documents(config: &DocumentsConfig) -> Result<Vec<PathBuf>> {
    let root = &config.root;
    let include_set = build_globset(config.include_globs.iter().map(String::as_str))?;
    let exclude_set = build_globset(config.exclude_globs.iter().map(String::as_str))?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);

        if exclude_set.is_match(relative) || !include_set.is_match(relative) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Read a file as text, replacing invalid UTF-8 sequences.
pub fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Name recorded for a file's fragments.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_globset<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()
            .map_err(|e| RagError::Internal(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder.build().map_err(RagError::internal)
}
