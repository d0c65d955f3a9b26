//! SQLite-based chunk store implementation.
//!
//! One row per video. The transcript is a JSON array of `{timestamp, text}`
//! entries and the embeddings a JSON array of textual vectors, index-aligned
//! with the transcript.

use super::{decode_vector, encode_vector, Chunk, ChunkStore, VideoChunkSet, VideoSummary};
use crate::error::{Result, ScrubError};
use crate::timestamp::Timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS video_chunks (
        video_id TEXT PRIMARY KEY,
        transcript TEXT NOT NULL,
        embedding TEXT NOT NULL,
        embedding_model TEXT,
        chunk_count INTEGER NOT NULL,
        dimensions INTEGER NOT NULL,
        ingested_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_video_chunks_ingested_at ON video_chunks(ingested_at);
"#;

/// Transcript entry as persisted in the `transcript` column.
#[derive(Debug, Serialize, Deserialize)]
struct TranscriptEntry {
    timestamp: Timestamp,
    text: String,
}

/// SQLite-based chunk store.
pub struct SqliteChunkStore {
    conn: Mutex<Connection>,
}

impl SqliteChunkStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while an ingestion is writing
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite chunk store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ScrubError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn encode_row(set: &VideoChunkSet) -> Result<(String, String)> {
        let transcript: Vec<TranscriptEntry> = set
            .chunks
            .iter()
            .map(|c| TranscriptEntry {
                timestamp: c.timestamp,
                text: c.text.clone(),
            })
            .collect();
        let embeddings: Vec<String> = set.chunks.iter().map(|c| encode_vector(&c.embedding)).collect();

        Ok((serde_json::to_string(&transcript)?, serde_json::to_string(&embeddings)?))
    }

    fn decode_row(video_id: &str, transcript_json: &str, embedding_json: &str) -> Result<Vec<Chunk>> {
        let transcript: Vec<TranscriptEntry> = serde_json::from_str(transcript_json)?;
        let embeddings: Vec<String> = serde_json::from_str(embedding_json)?;

        if transcript.len() != embeddings.len() {
            return Err(ScrubError::Store(format!(
                "Row for video {} has {} transcript entries but {} embeddings",
                video_id,
                transcript.len(),
                embeddings.len()
            )));
        }

        transcript
            .into_iter()
            .zip(embeddings)
            .map(|(entry, vector)| Ok(Chunk::new(entry.timestamp, entry.text, decode_vector(&vector)?)))
            .collect()
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScrubError::Store(format!("Invalid ingestion time {:?}: {}", value, e)))
}

#[async_trait]
impl ChunkStore for SqliteChunkStore {
    #[instrument(skip(self))]
    async fn get(&self, video_id: &str) -> Result<Option<VideoChunkSet>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                r#"
                SELECT transcript, embedding, embedding_model, ingested_at
                FROM video_chunks
                WHERE video_id = ?1
                "#,
                params![video_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((transcript, embedding, embedding_model, ingested_at)) = row else {
            debug!("No chunk set for video {}", video_id);
            return Ok(None);
        };

        let chunks = Self::decode_row(video_id, &transcript, &embedding)?;
        debug!("Loaded {} chunks for video {}", chunks.len(), video_id);

        Ok(Some(VideoChunkSet {
            video_id: video_id.to_string(),
            chunks,
            embedding_model,
            ingested_at: parse_time(&ingested_at)?,
        }))
    }

    #[instrument(skip(self, set), fields(video_id = %set.video_id, chunks = set.len()))]
    async fn put(&self, set: VideoChunkSet) -> Result<VideoChunkSet> {
        let (transcript, embedding) = Self::encode_row(&set)?;
        let dimensions = set.chunks.first().map(|c| c.embedding.len()).unwrap_or(0);

        let conn = self.lock()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO video_chunks
            (video_id, transcript, embedding, embedding_model, chunk_count, dimensions, ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                set.video_id,
                transcript,
                embedding,
                set.embedding_model,
                set.chunks.len() as i64,
                dimensions as i64,
                set.ingested_at.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => {
                info!("Stored {} chunks for video {}", set.len(), set.video_id);
                Ok(set)
            }
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                Err(ScrubError::Conflict(set.video_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<VideoSummary>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT video_id, chunk_count, dimensions, embedding_model, ingested_at
            FROM video_chunks
            ORDER BY ingested_at DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut videos = Vec::new();
        for row in rows {
            let (video_id, chunk_count, dimensions, embedding_model, ingested_at) = row?;
            videos.push(VideoSummary {
                video_id,
                chunk_count: chunk_count as usize,
                dimensions: dimensions as usize,
                embedding_model,
                ingested_at: parse_time(&ingested_at)?,
            });
        }

        Ok(videos)
    }

    #[instrument(skip(self))]
    async fn delete(&self, video_id: &str) -> Result<bool> {
        let conn = self.lock()?;

        let deleted = conn.execute("DELETE FROM video_chunks WHERE video_id = ?1", params![video_id])?;

        info!("Deleted chunk set for video {} ({} rows)", video_id, deleted);
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set(video_id: &str) -> VideoChunkSet {
        VideoChunkSet::new(
            video_id,
            vec![
                Chunk::new(Timestamp::from_seconds(0), "intro", vec![0.1, 0.2, 0.3]),
                Chunk::new(Timestamp::from_seconds(90), "main topic", vec![-0.012_345_679, 1.0e-7, 42.5]),
                Chunk::new(Timestamp::from_seconds(225), "summary", vec![0.0, 0.0, 1.0]),
            ],
            Some("text-embedding-3-small".to_string()),
        )
    }

    #[tokio::test]
    async fn test_sqlite_chunk_store() {
        let store = SqliteChunkStore::in_memory().unwrap();
        assert!(store.get("abc123").await.unwrap().is_none());

        let original = sample_set("abc123");
        store.put(original.clone()).await.unwrap();

        let fetched = store.get("abc123").await.unwrap().unwrap();
        assert_eq!(fetched.chunks, original.chunks);
        assert_eq!(fetched.embedding_model.as_deref(), Some("text-embedding-3-small"));

        let videos = store.list().await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].chunk_count, 3);
        assert_eq!(videos[0].dimensions, 3);

        assert!(store.delete("abc123").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_put_is_conflict() {
        let store = SqliteChunkStore::in_memory().unwrap();
        store.put(sample_set("abc123")).await.unwrap();

        let err = store.put(sample_set("abc123")).await.unwrap_err();
        assert!(matches!(err, ScrubError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_embeddings_stored_as_text() {
        let store = SqliteChunkStore::in_memory().unwrap();
        store.put(sample_set("abc123")).await.unwrap();

        let raw: String = {
            let conn = store.lock().unwrap();
            conn.query_row(
                "SELECT embedding FROM video_chunks WHERE video_id = ?1",
                params!["abc123"],
                |row| row.get(0),
            )
            .unwrap()
        };

        let vectors: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(vectors[0], "[0.1,0.2,0.3]");
        assert!(vectors.iter().all(|v| !v.contains(' ')));
    }

    #[tokio::test]
    async fn test_reopen_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chunks.db");

        {
            let store = SqliteChunkStore::new(&path).unwrap();
            store.put(sample_set("abc123")).await.unwrap();
        }

        let store = SqliteChunkStore::new(&path).unwrap();
        let fetched = store.get("abc123").await.unwrap().unwrap();
        assert_eq!(fetched.chunks, sample_set("abc123").chunks);
    }
}
