//! Core data types that flow through indexing and answering.

use serde::{Deserialize, Serialize};

/// One indexed slice of a source document.
///
/// Fragments carry no id or offset; the name of the file they came from is
/// the only link back to the source. Serialized as `{path, content}`, which
/// is also the shape of the `sources` list returned by `/query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub path: String,
    pub content: String,
}

impl Fragment {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged message sent to the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReindexStatus {
    Success,
    Skipped,
}

impl ReindexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReindexStatus::Success => "success",
            ReindexStatus::Skipped => "skipped",
        }
    }
}

/// Summary of one reindex run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexOutcome {
    pub status: ReindexStatus,
    pub message: String,
    /// Number of fragments written to the index (0 when skipped).
    pub chunks: usize,
}

/// A generated answer together with the fragments it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<Fragment>,
}
