//! Shared room directory: room code -> authoritative `GameState`.
//!
//! Reads and writes are independent calls. Nothing here serializes a
//! read-modify-write across callers; the last write wins.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use dare_core::GameState;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::StoreError;

pub trait RoomStore: Send + Sync + 'static {
    fn load(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<Option<GameState>, StoreError>> + Send;

    fn save(
        &self,
        room_id: &str,
        state: &GameState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn contains(&self, room_id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<String, GameState>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for MemoryRoomStore {
    async fn load(&self, room_id: &str) -> Result<Option<GameState>, StoreError> {
        Ok(self.rooms.read().await.get(room_id).cloned())
    }

    async fn save(&self, room_id: &str, state: &GameState) -> Result<(), StoreError> {
        self.rooms
            .write()
            .await
            .insert(room_id.to_string(), state.clone());
        Ok(())
    }

    async fn contains(&self, room_id: &str) -> Result<bool, StoreError> {
        Ok(self.rooms.read().await.contains_key(room_id))
    }
}

/// Room directory mirrored to a single JSON file, rewritten on every save.
pub struct FileRoomStore {
    path: PathBuf,
    rooms: RwLock<HashMap<String, GameState>>,
}

impl FileRoomStore {
    /// Load the directory from `path`. A missing file starts empty; a malformed
    /// one is logged and replaced on the next save.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let rooms = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, GameState>>(&bytes) {
                Ok(saved) => saved,
                Err(err) => {
                    warn!(path = %path.display(), %err, "room directory unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            rooms: RwLock::new(rooms),
        }
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

impl RoomStore for FileRoomStore {
    async fn load(&self, room_id: &str) -> Result<Option<GameState>, StoreError> {
        Ok(self.rooms.read().await.get(room_id).cloned())
    }

    async fn save(&self, room_id: &str, state: &GameState) -> Result<(), StoreError> {
        // Held across the write so the file never lags behind an older snapshot.
        let mut rooms = self.rooms.write().await;
        rooms.insert(room_id.to_string(), state.clone());
        let json = serde_json::to_vec_pretty(&*rooms)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn contains(&self, room_id: &str) -> Result<bool, StoreError> {
        Ok(self.rooms.read().await.contains_key(room_id))
    }
}
