//! SQLite store for memories and workspaces.
//!
//! Uses a single SQLite database file with three tables:
//! - `semantic_memories`: long-term facts, embeddings as little-endian f32 blobs
//! - `episodic_memories`: append-only turn log, ordered by an autoincrement id
//! - `workspaces`: one JSON document per user, replaced on every save

use async_trait::async_trait;
use attune_core::error::{MemoryError, SessionError};
use attune_core::memory::{EpisodicMemory, MemorySource, SemanticMemory};
use attune_core::session::SessionStore;
use attune_core::workspace::CognitiveWorkspace;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info};

use crate::in_memory::ensure_id;

/// A SQLite-backed store implementing both memory and session collaborators.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a database.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every connection to an in-memory database is a separate database
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, MemoryError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS semantic_memories (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                id           TEXT UNIQUE NOT NULL,
                domain_id    TEXT NOT NULL,
                kind         TEXT NOT NULL DEFAULT '',
                text_content TEXT NOT NULL,
                embedding    BLOB,
                metadata     TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("semantic_memories table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_semantic_domain ON semantic_memories(domain_id, iid)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("semantic domain index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS episodic_memories (
                interaction_id   INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id          TEXT NOT NULL,
                domain_id        TEXT NOT NULL,
                user_input       TEXT NOT NULL,
                assistant_output TEXT NOT NULL,
                timestamp        TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("episodic_memories table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_episodic_user_domain ON episodic_memories(user_id, domain_id, interaction_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("episodic index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workspaces (
                user_id    TEXT PRIMARY KEY,
                document   TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("workspaces table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Insert or replace semantic memories.
    pub async fn import_semantic(&self, memories: Vec<SemanticMemory>) -> Result<usize, MemoryError> {
        let count = memories.len();
        for mut memory in memories {
            ensure_id(&mut memory);
            let metadata = serde_json::to_string(&memory.attributes)
                .map_err(|e| MemoryError::Storage(format!("Metadata serialization: {e}")))?;
            let blob: Option<Vec<u8>> = memory.embedding.as_deref().map(embedding_to_blob);

            sqlx::query(
                r#"
                INSERT INTO semantic_memories (id, domain_id, kind, text_content, embedding, metadata)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    domain_id = excluded.domain_id,
                    kind = excluded.kind,
                    text_content = excluded.text_content,
                    embedding = excluded.embedding,
                    metadata = excluded.metadata
                "#,
            )
            .bind(&memory.id)
            .bind(&memory.domain_id)
            .bind(&memory.kind)
            .bind(&memory.text)
            .bind(blob.as_deref())
            .bind(&metadata)
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("INSERT semantic failed: {e}")))?;
        }
        Ok(count)
    }

    fn row_to_semantic(row: &sqlx::sqlite::SqliteRow) -> Result<SemanticMemory, MemoryError> {
        let column = |name: &str, e: sqlx::Error| MemoryError::QueryFailed(format!("{name} column: {e}"));

        let id: String = row.try_get("id").map_err(|e| column("id", e))?;
        let domain_id: String = row.try_get("domain_id").map_err(|e| column("domain_id", e))?;
        let kind: String = row.try_get("kind").map_err(|e| column("kind", e))?;
        let text: String = row.try_get("text_content").map_err(|e| column("text_content", e))?;
        let blob: Option<Vec<u8>> = row.try_get("embedding").map_err(|e| column("embedding", e))?;
        let metadata: String = row.try_get("metadata").map_err(|e| column("metadata", e))?;

        let attributes: HashMap<String, serde_json::Value> =
            serde_json::from_str(&metadata).unwrap_or_default();

        Ok(SemanticMemory {
            id,
            domain_id,
            kind,
            text,
            embedding: blob.map(|b| blob_to_embedding(&b)),
            attributes,
        })
    }

    fn row_to_episodic(row: &sqlx::sqlite::SqliteRow) -> Result<EpisodicMemory, MemoryError> {
        let column = |name: &str, e: sqlx::Error| MemoryError::QueryFailed(format!("{name} column: {e}"));

        let timestamp_str: String = row.try_get("timestamp").map_err(|e| column("timestamp", e))?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MemoryError::QueryFailed(format!("timestamp '{timestamp_str}': {e}")))?;

        Ok(EpisodicMemory {
            user_id: row.try_get("user_id").map_err(|e| column("user_id", e))?,
            domain_id: row.try_get("domain_id").map_err(|e| column("domain_id", e))?,
            user_input: row.try_get("user_input").map_err(|e| column("user_input", e))?,
            assistant_output: row
                .try_get("assistant_output")
                .map_err(|e| column("assistant_output", e))?,
            timestamp,
        })
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[async_trait]
impl MemorySource for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn fetch_semantic_memories(
        &self,
        _query: &str,
        domain_id: &str,
        top_k: usize,
    ) -> Result<Vec<SemanticMemory>, MemoryError> {
        let rows = sqlx::query(
            "SELECT * FROM semantic_memories WHERE domain_id = ?1 ORDER BY iid ASC LIMIT ?2",
        )
        .bind(domain_id)
        .bind(top_k as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("semantic fetch: {e}")))?;

        rows.iter().map(Self::row_to_semantic).collect()
    }

    async fn fetch_episodic_memories(
        &self,
        user_id: &str,
        domain_id: &str,
        last_n: usize,
    ) -> Result<Vec<EpisodicMemory>, MemoryError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM (
                SELECT * FROM episodic_memories
                WHERE user_id = ?1 AND domain_id = ?2
                ORDER BY interaction_id DESC
                LIMIT ?3
            ) ORDER BY interaction_id ASC
            "#,
        )
        .bind(user_id)
        .bind(domain_id)
        .bind(last_n as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("episodic fetch: {e}")))?;

        rows.iter().map(Self::row_to_episodic).collect()
    }

    async fn log_interaction(&self, interaction: EpisodicMemory) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            INSERT INTO episodic_memories (user_id, domain_id, user_input, assistant_output, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&interaction.user_id)
        .bind(&interaction.domain_id)
        .bind(&interaction.user_input)
        .bind(&interaction.assistant_output)
        .bind(interaction.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("INSERT episodic failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get_workspace(&self, user_id: &str) -> Result<Option<CognitiveWorkspace>, SessionError> {
        let load_failed = |reason: String| SessionError::LoadFailed {
            user_id: user_id.to_string(),
            reason,
        };

        let row = sqlx::query("SELECT document FROM workspaces WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| load_failed(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let document: String = row.try_get("document").map_err(|e| load_failed(e.to_string()))?;
        let workspace = serde_json::from_str(&document).map_err(|e| load_failed(e.to_string()))?;
        Ok(Some(workspace))
    }

    async fn save_workspace(&self, workspace: &CognitiveWorkspace) -> Result<(), SessionError> {
        let save_failed = |reason: String| SessionError::SaveFailed {
            user_id: workspace.user_id.clone(),
            reason,
        };

        let document = serde_json::to_string(workspace).map_err(|e| save_failed(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO workspaces (user_id, document, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&workspace.user_id)
        .bind(&document)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| save_failed(e.to_string()))?;

        debug!(user_id = %workspace.user_id, "Workspace saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn semantic_import_and_fetch() {
        let db = test_store().await;
        db.import_semantic(vec![
            SemanticMemory::new("a", "fiscal", "ICMS rule").with_embedding(vec![0.5, -1.0]),
            SemanticMemory::new("b", "product_catalog", "SKU format"),
            SemanticMemory::new("c", "fiscal", "CFOP rule"),
        ])
        .await
        .unwrap();

        let found = db.fetch_semantic_memories("", "fiscal", 5).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "a");
        assert_eq!(found[0].embedding.as_deref(), Some(&[0.5, -1.0][..]));
        assert!(found[1].embedding.is_none());

        let limited = db.fetch_semantic_memories("", "fiscal", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn semantic_upsert_on_conflict() {
        let db = test_store().await;
        db.import_semantic(vec![SemanticMemory::new("a", "fiscal", "old")]).await.unwrap();
        db.import_semantic(vec![SemanticMemory::new("a", "fiscal", "new")]).await.unwrap();
        let found = db.fetch_semantic_memories("", "fiscal", 5).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "new");
    }

    #[tokio::test]
    async fn episodic_last_n_oldest_first() {
        let db = test_store().await;
        for i in 0..6 {
            db.log_interaction(EpisodicMemory::now("u1", "fiscal", format!("q{i}"), "a"))
                .await
                .unwrap();
        }
        db.log_interaction(EpisodicMemory::now("u1", "other", "x", "y")).await.unwrap();

        let turns = db.fetch_episodic_memories("u1", "fiscal", 3).await.unwrap();
        let inputs: Vec<_> = turns.iter().map(|t| t.user_input.as_str()).collect();
        assert_eq!(inputs, vec!["q3", "q4", "q5"]);
    }

    #[tokio::test]
    async fn workspace_round_trip() {
        let db = test_store().await;
        assert!(db.get_workspace("u1").await.unwrap().is_none());

        let mut ws = CognitiveWorkspace::new("u1");
        ws.current_focus = Some("fiscal".into());
        ws.active_domains.insert("fiscal".into(), Default::default());
        db.save_workspace(&ws).await.unwrap();

        ws.active_domains.get_mut("fiscal").unwrap().session_summary = "updated".into();
        db.save_workspace(&ws).await.unwrap();

        let loaded = db.get_workspace("u1").await.unwrap().unwrap();
        assert_eq!(loaded, ws);
    }

    #[test]
    fn blob_round_trip() {
        let v = vec![1.5f32, -0.25, 0.0];
        assert_eq!(blob_to_embedding(&embedding_to_blob(&v)), v);
    }
}
