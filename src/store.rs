//! SQLite FTS5 index store.
//!
//! One virtual table, `memories(id, title, keywords, content, summary)`,
//! with the engine's own `porter unicode61` tokenizer for relevance
//! scoring. That internal tokenizer is separate from the bilingual
//! [`crate::tokenizer`] — the store only uses it for BM25 term statistics.
//!
//! Scoring: `bm25(memories)` — lower (more negative) is more relevant.
//! Results are returned ascending by score and the sign is never inverted;
//! ties fall back to FTS5 storage order, which is deterministic.
//!
//! Every public operation opens its own single-connection pool and closes
//! it on every exit path. Operations are independently atomic; no
//! multi-call transaction is exposed. Malformed query syntax and engine
//! failures degrade to empty results or `false` flags — a bad token never
//! breaks end-user retrieval.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use tracing::warn;

use crate::db;
use crate::models::{Document, SearchResult};

pub struct IndexStore {
    db_path: PathBuf,
}

impl IndexStore {
    /// A store rooted at an explicit database path. No process-wide state.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Whether the underlying database has been created.
    pub fn exists(&self) -> bool {
        self.db_path.exists()
    }

    /// Idempotent schema creation.
    pub async fn init(&self) -> Result<()> {
        let pool = db::connect(&self.db_path).await?;
        let result = create_schema(&pool).await;
        pool.close().await;
        result
    }

    /// Execute a MATCH expression over all indexed fields, at most `limit`
    /// results ascending by score. Missing store, connection failure, and
    /// malformed query syntax all yield an empty sequence.
    pub async fn search(&self, query: &str, limit: i64) -> Vec<SearchResult> {
        if !self.exists() {
            return Vec::new();
        }

        let pool = match db::connect(&self.db_path).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("search: cannot open store: {e}");
                return Vec::new();
            }
        };

        let rows = sqlx::query(
            r#"
            SELECT id, title, summary, bm25(memories) AS score
            FROM memories
            WHERE memories MATCH ?
            ORDER BY score
            LIMIT ?
            "#,
        )
        .bind(query)
        .bind(limit)
        .fetch_all(&pool)
        .await;

        let results = match rows {
            Ok(rows) => rows
                .iter()
                .map(|row| SearchResult {
                    id: row.get("id"),
                    title: row.get("title"),
                    summary: row.get("summary"),
                    score: row.get("score"),
                })
                .collect(),
            Err(e) => {
                // Query syntax errors land here; treated as "no results".
                tracing::debug!("search degraded to no results: {e}");
                Vec::new()
            }
        };

        pool.close().await;
        results
    }

    /// Replace-semantics upsert: delete any entry with the same id, then
    /// insert, in one transaction. Returns false on any failure, leaving
    /// prior state intact.
    pub async fn index_document(&self, doc: &Document) -> bool {
        let pool = match db::connect(&self.db_path).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("index_document: cannot open store: {e}");
                return false;
            }
        };

        let result = insert_replacing(&pool, doc).await;
        pool.close().await;

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("index_document failed for '{}': {e}", doc.id);
                false
            }
        }
    }

    /// Delete a single entry. False when the store does not exist.
    pub async fn delete_document(&self, id: &str) -> bool {
        if !self.exists() {
            return false;
        }

        let pool = match db::connect(&self.db_path).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("delete_document: cannot open store: {e}");
                return false;
            }
        };

        let result = sqlx::query("DELETE FROM memories WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await;
        pool.close().await;

        match result {
            Ok(_) => true,
            Err(e) => {
                warn!("delete_document failed for '{}': {e}", id);
                false
            }
        }
    }

    /// Remove every entry. Vacuously true when the store does not exist.
    pub async fn clear_all(&self) -> bool {
        if !self.exists() {
            return true;
        }

        let pool = match db::connect(&self.db_path).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("clear_all: cannot open store: {e}");
                return false;
            }
        };

        let result = sqlx::query("DELETE FROM memories").execute(&pool).await;
        pool.close().await;

        match result {
            Ok(_) => true,
            Err(e) => {
                warn!("clear_all failed: {e}");
                false
            }
        }
    }

    /// All indexed document ids in storage order.
    pub async fn list_ids(&self) -> Vec<String> {
        if !self.exists() {
            return Vec::new();
        }

        let pool = match db::connect(&self.db_path).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("list_ids: cannot open store: {e}");
                return Vec::new();
            }
        };

        let rows: Result<Vec<String>, sqlx::Error> =
            sqlx::query_scalar("SELECT id FROM memories").fetch_all(&pool).await;
        pool.close().await;

        match rows {
            Ok(ids) => ids,
            Err(e) => {
                warn!("list_ids failed: {e}");
                Vec::new()
            }
        }
    }
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='memories'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE memories USING fts5(
                id,
                title,
                keywords,
                content,
                summary,
                tokenize='porter unicode61'
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn insert_replacing(pool: &SqlitePool, doc: &Document) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM memories WHERE id = ?")
        .bind(&doc.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO memories (id, title, keywords, content, summary)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&doc.id)
    .bind(&doc.title)
    .bind(doc.keywords.join(" "))
    .bind(&doc.content)
    .bind(&doc.summary)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
