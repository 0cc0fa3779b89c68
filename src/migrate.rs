//! Index schema.
//!
//! A single FTS5 table `docs(path, content)` holds every fragment. FTS5
//! has no `IF NOT EXISTS` for virtual tables on older SQLite builds, so the
//! table is looked up in `sqlite_master` first.

use sqlx::SqlitePool;

use crate::error::Result;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='docs'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        tracing::info!("creating full-text index table");
        sqlx::query("CREATE VIRTUAL TABLE docs USING fts5(path, content)")
            .execute(pool)
            .await?;
    }

    Ok(())
}
