//! Retrieval manager: filesystem → chunker → index, and index search.
//!
//! A reindex is always a full rebuild. Files are collected and chunked on a
//! blocking worker, then the whole fragment list is handed to
//! [`FragmentStore::rebuild`] in one call. A file that cannot be read is
//! logged and contributes nothing; the run carries on with the rest.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::chunk::chunk_text;
use crate::config::{ChunkingConfig, Config, DocumentsConfig};
use crate::connector_fs::{document_name, read_lossy, scan_documents};
use crate::error::{RagError, Result};
use crate::models::{Fragment, ReindexOutcome, ReindexStatus};
use crate::store::FragmentStore;

pub struct Retriever {
    store: Arc<dyn FragmentStore>,
    documents: DocumentsConfig,
    chunking: ChunkingConfig,
    reindex_lock: Mutex<()>,
}

/// Fragments gathered from the document root, plus per-file bookkeeping.
#[derive(Debug, Default)]
struct Collected {
    fragments: Vec<Fragment>,
    files_indexed: usize,
    files_failed: Vec<PathBuf>,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn FragmentStore>,
        documents: DocumentsConfig,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            store,
            documents,
            chunking,
            reindex_lock: Mutex::new(()),
        }
    }

    pub fn from_config(store: Arc<dyn FragmentStore>, config: &Config) -> Self {
        Self::new(store, config.documents.clone(), config.chunking.clone())
    }

    /// Rebuild the index from the current contents of the document root.
    ///
    /// A missing root is not an error: the index is left untouched and a
    /// [`ReindexStatus::Skipped`] outcome is returned.
    pub async fn reindex(&self) -> Result<ReindexOutcome> {
        let _guard = self.reindex_lock.lock().await;
        let root = self.documents.root.clone();
        tracing::info!(root = %root.display(), "starting reindex");

        if !root.exists() {
            let message = format!(
                "Document directory {} does not exist; indexing skipped.",
                root.display()
            );
            tracing::warn!("{}", message);
            return Ok(ReindexOutcome {
                status: ReindexStatus::Skipped,
                message,
                chunks: 0,
            });
        }

        let documents = self.documents.clone();
        let chunking = self.chunking.clone();
        let collected = tokio::task::spawn_blocking(move || collect(&documents, &chunking))
            .await
            .map_err(RagError::internal)??;

        self.store.rebuild(&collected.fragments).await?;

        let chunks = collected.fragments.len();
        let message = format!(
            "Indexing finished. Files: {}, skipped: {}, fragments: {}",
            collected.files_indexed,
            collected.files_failed.len(),
            chunks
        );
        tracing::info!(
            files = collected.files_indexed,
            skipped = collected.files_failed.len(),
            fragments = chunks,
            "reindex complete"
        );

        Ok(ReindexOutcome {
            status: ReindexStatus::Success,
            message,
            chunks,
        })
    }

    pub async fn search(&self, query: &str, k: i64) -> Result<Vec<Fragment>> {
        self.store.search(query, k).await
    }

    /// True when the index should be built at startup: the database file
    /// was missing or zero-length before opening, or it holds no fragments.
    pub async fn needs_initial_index(&self, db_file_was_missing: bool) -> Result<bool> {
        if db_file_was_missing {
            return Ok(true);
        }
        Ok(self.store.count().await? == 0)
    }
}

fn collect(documents: &DocumentsConfig, chunking: &ChunkingConfig) -> Result<Collected> {
    let files = scan_documents(documents)?;

    let collected = files.into_iter().fold(Collected::default(), |mut acc, path| {
        match read_lossy(&path) {
            Ok(text) => {
                let name = document_name(&path);
                acc.fragments.extend(
                    chunk_text(&text, chunking.chunk_size, chunking.chunk_overlap)
                        .into_iter()
                        .map(|piece| Fragment::new(name.clone(), piece)),
                );
                acc.files_indexed += 1;
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read document");
                acc.files_failed.push(path);
            }
        }
        acc
    });

    Ok(collected)
}
