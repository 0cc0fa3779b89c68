//! SQLite FTS5 implementation of [`FragmentStore`].

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::db;
use crate::error::{RagError, Result};
use crate::migrate;
use crate::models::Fragment;
use crate::store::FragmentStore;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the index at `db_path` and ensure the
    /// schema exists.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = db::connect(db_path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Wrap `query` as a single FTS5 string so operators, column filters and
/// prefix stars are matched literally. Embedded quotes are doubled and
/// control characters (NUL ends the string early) become spaces.
pub fn literal_phrase(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    format!("\"{}\"", cleaned.replace('"', "\"\""))
}

fn map_search_error(err: sqlx::Error) -> RagError {
    if let sqlx::Error::Database(db_err) = &err {
        let msg = db_err.message();
        if msg.contains("fts5")
            || msg.contains("syntax error")
            || msg.contains("no such column")
            || msg.contains("unterminated string")
        {
            return RagError::QuerySyntax(msg.to_string());
        }
    }
    RagError::Database(err)
}

#[async_trait]
impl FragmentStore for SqliteStore {
    async fn rebuild(&self, fragments: &[Fragment]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM docs").execute(&mut *tx).await?;

        for fragment in fragments {
            sqlx::query("INSERT INTO docs(path, content) VALUES (?, ?)")
                .bind(&fragment.path)
                .bind(&fragment.content)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Fragment>> {
        // The tokenizer only indexes alphanumerics; anything else can't match.
        if !query.chars().any(char::is_alphanumeric) || limit < 1 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT path, content
            FROM docs
            WHERE docs MATCH ?
            ORDER BY rank, rowid
            LIMIT ?
            "#,
        )
        .bind(literal_phrase(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_search_error)?;

        Ok(rows
            .iter()
            .map(|row| Fragment {
                path: row.get("path"),
                content: row.get("content"),
            })
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM docs")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store(tmp: &TempDir) -> SqliteStore {
        SqliteStore::open(&tmp.path().join("index/rag.db"))
            .await
            .unwrap()
    }

    fn sample() -> Vec<Fragment> {
        vec![
            Fragment::new("a.txt", "The quick brown fox jumps."),
            Fragment::new("b.md", "Deployment notes for the staging cluster."),
            Fragment::new("c.log", "ERROR: connection refused on port 5432"),
        ]
    }

    #[test]
    fn test_literal_phrase_escapes_quotes() {
        assert_eq!(literal_phrase("hello"), "\"hello\"");
        assert_eq!(literal_phrase(r#"hello "world""#), r#""hello ""world""""#);
        assert_eq!(literal_phrase("hello\0world\n"), "\"hello world \"");
    }

    #[tokio::test]
    async fn test_search_finds_phrase() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store.rebuild(&sample()).await.unwrap();

        let hits = store.search("quick brown", 4).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "a.txt");
        assert!(hits[0].content.contains("quick brown"));
    }

    #[tokio::test]
    async fn test_search_no_match_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store.rebuild(&sample()).await.unwrap();

        let hits = store.search("nonexistent-token-xyz", 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_reserved_characters_do_not_error() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store.rebuild(&sample()).await.unwrap();

        for q in [
            r#"hello "world""#,
            "prefix*",
            "path:content",
            "a AND OR NOT b",
            "(unbalanced",
            "\"",
            "ERROR: connection",
            "hello\0world",
            "\0",
            "tab\there\u{7f}",
        ] {
            let result = store.search(q, 5).await;
            assert!(result.is_ok(), "query {:?} failed: {:?}", q, result.err());
        }

        let hits = store.search("ERROR: connection", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "c.log");

        let hits = store.search("quick\0brown", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "a.txt");
    }

    #[tokio::test]
    async fn test_raw_match_errors_map_to_query_syntax() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store.rebuild(&sample()).await.unwrap();

        for raw in ["(unbalanced", "\"open", "a AND", "nosuchcol: fox"] {
            let err = sqlx::query("SELECT path FROM docs WHERE docs MATCH ?")
                .bind(raw)
                .fetch_all(&store.pool)
                .await
                .map(|_| ())
                .map_err(map_search_error)
                .unwrap_err();
            assert!(
                matches!(err, RagError::QuerySyntax(_)),
                "{:?} mapped to {:?}",
                raw,
                err
            );
            assert_eq!(err.code(), "query_syntax");
        }
    }

    #[test]
    fn test_other_errors_stay_database() {
        let err = map_search_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, RagError::Database(_)));
    }

    #[tokio::test]
    async fn test_blank_query_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store.rebuild(&sample()).await.unwrap();
        assert!(store.search("   ", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_limit_respected() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        let fragments: Vec<Fragment> = (0..10)
            .map(|i| Fragment::new(format!("f{}.txt", i), format!("shared term number {}", i)))
            .collect();
        store.rebuild(&fragments).await.unwrap();

        assert_eq!(store.search("shared term", 3).await.unwrap().len(), 3);
        assert_eq!(store.search("shared term", 50).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_everything() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store.rebuild(&sample()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);

        store
            .rebuild(&[Fragment::new("new.txt", "only this remains")])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.search("quick brown", 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        store.rebuild(&sample()).await.unwrap();
        let first = store.search("the", 10).await.unwrap();
        store.rebuild(&sample()).await.unwrap();
        let second = store.search("the", 10).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let tmp = TempDir::new().unwrap();
        {
            let store = open_store(&tmp).await;
            store.rebuild(&sample()).await.unwrap();
            store.close().await;
        }
        let store = open_store(&tmp).await;
        assert_eq!(store.count().await.unwrap(), 3);
    }
}
