//! # localrag
//!
//! Chat with a folder of plain-text documents using a locally hosted
//! language model.
//!
//! Documents are sliced into overlapping fixed-size fragments and stored in
//! an SQLite FTS5 index. A question is translated into the index's working
//! language, matched against the index as a literal phrase, and the best
//! fragments are handed to the model together with the original question.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────┐   ┌─────────────┐
//! │ documents/ │──▶│ Chunker │──▶│ SQLite FTS5 │
//! └────────────┘   └─────────┘   └──────┬──────┘
//!                                       │ search
//!   question ──▶ translate ──▶ search ──┘──▶ prompt ──▶ complete ──▶ answer
//!                    (LLM)                               (LLM)
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`chunk`] | Fixed-size overlapping chunker |
//! | [`connector_fs`] | Document discovery and lossy reading |
//! | [`store`] | Fragment store trait |
//! | [`sqlite_store`] | SQLite FTS5 store |
//! | [`ingest`] | Reindex and search (retrieval manager) |
//! | [`llm`] | Language model gateway |
//! | [`query`] | Question answering pipeline |
//! | [`server`] | HTTP API |

pub mod chunk;
pub mod config;
pub mod connector_fs;
pub mod db;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod query;
pub mod server;
pub mod sqlite_store;
pub mod store;
