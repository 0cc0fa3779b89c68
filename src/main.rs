//! # localrag CLI
//!
//! ```bash
//! localrag --config ./config/localrag.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `localrag init` | Create the index database and schema |
//! | `localrag reindex` | Rebuild the index from the document directory |
//! | `localrag search "<query>"` | Keyword search over indexed fragments |
//! | `localrag ask "<question>"` | Answer a question with the local model |
//! | `localrag serve` | Start the HTTP API |

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use localrag::config;
use localrag::ingest::Retriever;
use localrag::llm::{LanguageModel, LlamaServerModel};
use localrag::logging;
use localrag::query::{QueryEngine, QuerySettings};
use localrag::server;
use localrag::sqlite_store::SqliteStore;
use localrag::store::FragmentStore;

/// Chat with your local documents.
///
/// The config file is optional; missing fields fall back to defaults and
/// `MODEL_PATH`, `DOCS_DIR`, `RAG_DB_PATH`, `LLM_ENDPOINT` override them.
#[derive(Parser)]
#[command(name = "localrag", version, about = "Chat with your local documents")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/localrag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index database and full-text schema. Idempotent.
    Init,

    /// Rebuild the index from every document under the document root.
    Reindex,

    /// Search indexed fragments. The query is matched as a literal phrase.
    Search {
        query: String,

        /// Maximum number of fragments to return.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Answer a question using retrieved fragments and the local model.
    Ask {
        question: String,

        /// Number of fragments to retrieve.
        #[arg(long)]
        top_k: Option<i64>,
    },

    /// Start the HTTP API, indexing first if the index is missing or empty.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = SqliteStore::open(&cfg.db.path).await?;
            let count = store.count().await?;
            store.close().await;
            println!("Index initialized at {} ({} fragments).", cfg.db.path.display(), count);
        }
        Commands::Reindex => {
            let store = Arc::new(SqliteStore::open(&cfg.db.path).await?);
            let retriever = Retriever::from_config(store.clone(), &cfg);
            let outcome = retriever.reindex().await.context("reindex failed")?;
            store.close().await;
            println!("status: {}", outcome.status.as_str());
            println!("message: {}", outcome.message);
            println!("chunks processed: {}", outcome.chunks);
        }
        Commands::Search { query, limit } => {
            let store = SqliteStore::open(&cfg.db.path).await?;
            let limit = limit.unwrap_or(cfg.retrieval.default_top_k);
            let hits = store.search(&query, limit).await?;
            store.close().await;

            if hits.is_empty() {
                println!("No results.");
            }
            for (i, hit) in hits.iter().enumerate() {
                println!("{}. {}", i + 1, hit.path);
                println!("    {}", hit.content.replace('\n', " ").trim());
                println!();
            }
        }
        Commands::Ask { question, top_k } => {
            let store = Arc::new(SqliteStore::open(&cfg.db.path).await?);
            let retriever = Arc::new(Retriever::from_config(store.clone(), &cfg));
            let model: Arc<dyn LanguageModel> = Arc::new(LlamaServerModel::new(&cfg.model)?);
            let engine = QueryEngine::new(model, retriever, QuerySettings::from_config(&cfg));

            let answer = engine
                .answer(&question, top_k.unwrap_or(cfg.retrieval.default_top_k))
                .await?;
            store.close().await;

            println!("{}", answer.answer);
            if !answer.sources.is_empty() {
                println!();
                println!("Sources:");
                for source in &answer.sources {
                    println!("  - {}", source.path);
                }
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
