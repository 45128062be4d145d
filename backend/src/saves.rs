//! Offline play: a single local game whose snapshot, custom packs and
//! lifetime stats live in a directory as three JSON blobs.

use std::path::{Path, PathBuf};

use dare_core::{reduce, Action, CustomDarePack, GameState, LifetimeStats};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::StoreError;

const GAME_STATE_FILE: &str = "game_state.json";
const CUSTOM_PACKS_FILE: &str = "custom_packs.json";
const LIFETIME_STATS_FILE: &str = "lifetime_stats.json";

#[derive(Debug, Clone)]
pub struct LocalSaves {
    dir: PathBuf,
}

impl LocalSaves {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replay whatever blobs are present onto `state`. Missing or unreadable
    /// blobs are skipped.
    pub async fn restore(&self, state: &GameState) -> GameState {
        let mut game = state.clone();
        if let Some(snapshot) = self.read::<GameState>(GAME_STATE_FILE).await {
            game = reduce(&game, &Action::LoadState(Box::new(snapshot)));
        }
        if let Some(packs) = self.read::<Vec<CustomDarePack>>(CUSTOM_PACKS_FILE).await {
            game = reduce(&game, &Action::LoadCustomPacks(packs));
        }
        if let Some(stats) = self.read::<LifetimeStats>(LIFETIME_STATS_FILE).await {
            game = reduce(&game, &Action::LoadLifetimeStats(stats));
        }
        game
    }

    /// Write all three blobs. The game snapshot is skipped while the game is
    /// still being set up.
    pub async fn save(&self, state: &GameState) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        if state.is_persistable() {
            self.write(GAME_STATE_FILE, state).await?;
        }
        self.write(CUSTOM_PACKS_FILE, &state.custom_packs).await?;
        self.write(LIFETIME_STATS_FILE, &state.lifetime_stats).await?;
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.dir.join(name);
        let bytes = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(path = %path.display(), %err, "ignoring unreadable save");
                None
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(self.dir.join(name), json).await?;
        Ok(())
    }
}

/// A game played on one device, saved after every change.
pub struct LocalGame {
    state: GameState,
    saves: LocalSaves,
}

impl LocalGame {
    pub async fn open(saves: LocalSaves) -> Self {
        let state = saves.restore(&GameState::default()).await;
        debug!(dir = %saves.dir().display(), phase = ?state.phase, "local game restored");
        Self { state, saves }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub async fn dispatch(&mut self, action: &Action) -> Result<&GameState, StoreError> {
        let next = reduce(&self.state, action);
        if next != self.state {
            self.saves.save(&next).await?;
            self.state = next;
        }
        Ok(&self.state)
    }
}
