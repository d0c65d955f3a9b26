//! In-memory chunk store implementation.
//!
//! Useful for testing and one-off sessions that need no persistence.

use super::{ChunkStore, VideoChunkSet, VideoSummary};
use crate::error::{Result, ScrubError};
use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// In-memory chunk store.
pub struct MemoryChunkStore {
    sets: RwLock<HashMap<String, VideoChunkSet>>,
}

impl MemoryChunkStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, VideoChunkSet>>> {
        self.sets
            .read()
            .map_err(|e| ScrubError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, VideoChunkSet>>> {
        self.sets
            .write()
            .map_err(|e| ScrubError::Store(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn get(&self, video_id: &str) -> Result<Option<VideoChunkSet>> {
        Ok(self.read()?.get(video_id).cloned())
    }

    async fn put(&self, set: VideoChunkSet) -> Result<VideoChunkSet> {
        let mut sets = self.write()?;
        match sets.entry(set.video_id.clone()) {
            Entry::Occupied(_) => Err(ScrubError::Conflict(set.video_id)),
            Entry::Vacant(slot) => {
                debug!("Stored {} chunks for video {}", set.len(), set.video_id);
                Ok(slot.insert(set).clone())
            }
        }
    }

    async fn list(&self) -> Result<Vec<VideoSummary>> {
        let mut videos: Vec<VideoSummary> = self.read()?.values().map(|s| s.summary()).collect();
        videos.sort_by(|a, b| b.ingested_at.cmp(&a.ingested_at));
        Ok(videos)
    }

    async fn delete(&self, video_id: &str) -> Result<bool> {
        Ok(self.write()?.remove(video_id).is_some())
    }
}
