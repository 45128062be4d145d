//! Per-turn countdown for online rooms.
//!
//! A watcher follows room broadcasts and keeps at most one timer per room,
//! armed for the active turn. When a timer runs out the turn is forfeited,
//! unless the room has moved on to a different turn in the meantime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use dare_core::{Action, GamePhase, GameState};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::rooms::{RoomHub, SyncMessage};
use crate::store::RoomStore;

/// Identifies one turn of one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnKey {
    turns_played: usize,
    player_index: usize,
    round: u32,
    started_at: Option<u64>,
}

impl TurnKey {
    /// The running turn and its time limit, if the room is playing a timed turn.
    pub fn of(state: &GameState) -> Option<(TurnKey, Duration)> {
        let limit = state.settings.timer_duration;
        if state.phase != GamePhase::Playing || state.current_turn.is_none() || limit == 0 {
            return None;
        }
        let key = TurnKey {
            turns_played: state.history.len(),
            player_index: state.current_player_index,
            round: state.current_round,
            started_at: state.turn_start_time,
        };
        Some((key, Duration::from_secs(u64::from(limit))))
    }
}

#[derive(Debug)]
struct Expiry {
    room_id: String,
    key: TurnKey,
}

struct Armed {
    key: TurnKey,
    handle: JoinHandle<()>,
}

pub struct TurnTimers {
    armed: Mutex<HashMap<String, Armed>>,
    expired: mpsc::UnboundedSender<Expiry>,
}

impl TurnTimers {
    fn new(expired: mpsc::UnboundedSender<Expiry>) -> Self {
        Self {
            armed: Mutex::new(HashMap::new()),
            expired,
        }
    }

    /// Arm, keep or cancel the room's timer to match `state`.
    pub fn sync(&self, room_id: &str, state: &GameState) {
        let mut armed = self.armed.lock().unwrap_or_else(|e| e.into_inner());
        let Some((key, limit)) = TurnKey::of(state) else {
            if let Some(old) = armed.remove(room_id) {
                old.handle.abort();
            }
            return;
        };
        if armed.get(room_id).is_some_and(|a| a.key == key) {
            return;
        }
        if let Some(old) = armed.remove(room_id) {
            old.handle.abort();
        }

        let expired = self.expired.clone();
        let room = room_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            let _ = expired.send(Expiry { room_id: room, key });
        });
        debug!(room = %room_id, seconds = limit.as_secs(), "turn timer armed");
        armed.insert(room_id.to_string(), Armed { key, handle });
    }

    pub fn cancel(&self, room_id: &str) {
        let mut armed = self.armed.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = armed.remove(room_id) {
            old.handle.abort();
        }
    }

    /// Drop the room's entry once its expiry has been handled, unless a newer
    /// turn has been armed since.
    fn retire(&self, room_id: &str, key: TurnKey) {
        let mut armed = self.armed.lock().unwrap_or_else(|e| e.into_inner());
        if armed.get(room_id).is_some_and(|a| a.key == key) {
            armed.remove(room_id);
        }
    }

    /// Rooms holding a timer entry, spent or not.
    pub fn tracked_rooms(&self) -> usize {
        self.armed.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_armed(&self, room_id: &str) -> bool {
        let armed = self.armed.lock().unwrap_or_else(|e| e.into_inner());
        armed.get(room_id).is_some_and(|a| !a.handle.is_finished())
    }
}

impl Drop for TurnTimers {
    fn drop(&mut self) {
        let armed = self.armed.get_mut().unwrap_or_else(|e| e.into_inner());
        for (_, timer) in armed.drain() {
            timer.handle.abort();
        }
    }
}

/// Start the watcher and expiry tasks for `hub`. Both wind down once the
/// returned handle is dropped.
pub fn spawn_turn_timers<S: RoomStore>(hub: RoomHub<S>) -> Arc<TurnTimers> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Expiry>();
    let timers = Arc::new(TurnTimers::new(tx));
    let mut updates = hub.subscribe();
    let watcher: Weak<TurnTimers> = Arc::downgrade(&timers);
    let retirer = watcher.clone();

    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(SyncMessage::StateUpdate(update)) => {
                    let Some(timers) = watcher.upgrade() else {
                        break;
                    };
                    timers.sync(&update.room_id, &update.new_state);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "turn timers lagged behind room broadcasts");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::spawn(async move {
        while let Some(Expiry { room_id, key }) = rx.recv().await {
            let forfeit = Action::CompleteTurn { completed: false };
            let still_running = |state: &GameState| TurnKey::of(state).map(|(k, _)| k) == Some(key);
            match hub.apply_when(&room_id, &forfeit, still_running).await {
                Ok(Some(_)) => info!(room = %room_id, "turn timed out, forfeited"),
                Ok(None) => debug!(room = %room_id, "timer expired for a finished turn"),
                Err(err) => warn!(room = %room_id, %err, "could not forfeit timed out turn"),
            }
            let Some(timers) = retirer.upgrade() else {
                break;
            };
            timers.retire(&room_id, key);
        }
    });

    timers
}
