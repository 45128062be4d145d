//! Room directory and full-snapshot replication.
//!
//! Every mutation is read (persisted copy) -> reduce -> write -> broadcast.
//! Receivers replace their local state with whatever snapshot arrives last.
//! There is no versioning: two writers racing on the same stale snapshot
//! silently overwrite each other.

use std::sync::{Arc, Mutex};

use dare_core::{reduce, Action, GameState, NewPlayer, Player, PlayerId, MAX_PLAYERS};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::RoomError;
use crate::session::Session;
use crate::store::RoomStore;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 4;
const MAX_CODE_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    pub room_id: String,
    pub new_state: GameState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMessage {
    StateUpdate(StateUpdate),
}

impl SyncMessage {
    pub fn room_id(&self) -> &str {
        match self {
            SyncMessage::StateUpdate(update) => &update.room_id,
        }
    }
}

/// Shared pieces every participant in the process talks through: the room
/// directory and the broadcast channel.
pub struct RoomHub<S> {
    store: Arc<S>,
    updates: broadcast::Sender<SyncMessage>,
    codes: Arc<Mutex<ChaCha8Rng>>,
}

impl<S> Clone for RoomHub<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            updates: self.updates.clone(),
            codes: Arc::clone(&self.codes),
        }
    }
}

fn seat_id() -> PlayerId {
    format!("player_{}", Uuid::new_v4().simple())
}

impl<S: RoomStore> RoomHub<S> {
    pub fn new(store: S, capacity: usize) -> Self {
        Self::with_seed(store, capacity, None)
    }

    /// `seed` makes room codes reproducible.
    pub fn with_seed(store: S, capacity: usize, seed: Option<u64>) -> Self {
        let rng = seed
            .map(ChaCha8Rng::seed_from_u64)
            .unwrap_or_else(ChaCha8Rng::from_entropy);
        let (updates, _) = broadcast::channel(capacity.max(1));
        Self {
            store: Arc::new(store),
            updates,
            codes: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncMessage> {
        self.updates.subscribe()
    }

    pub async fn fetch(&self, room_id: &str) -> Result<Option<GameState>, RoomError> {
        Ok(self.store.load(room_id).await?)
    }

    /// Open a room with the host as its only player. Returns the host's id and
    /// the room state.
    pub async fn create_room(
        &self,
        host_name: &str,
        host_avatar: &str,
    ) -> Result<(PlayerId, GameState), RoomError> {
        let room_id = self.free_code().await?;
        let host_id = seat_id();
        let state = GameState {
            players: vec![Player::new(host_id.clone(), host_name, host_avatar)],
            room_id: Some(room_id.clone()),
            host_id: Some(host_id.clone()),
            player_id: Some(host_id.clone()),
            ..GameState::default()
        };

        self.store.save(&room_id, &state).await?;
        self.broadcast(&room_id, &state);
        info!(room = %room_id, host = %host_id, "room created");
        Ok((host_id, state))
    }

    pub async fn join_room(
        &self,
        room_id: &str,
        name: &str,
        avatar: &str,
    ) -> Result<(PlayerId, GameState), RoomError> {
        let current = self
            .store
            .load(room_id)
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;
        if current.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull(room_id.to_string()));
        }

        let player_id = seat_id();
        let action = Action::JoinRoom {
            player: NewPlayer {
                id: player_id.clone(),
                name: name.to_string(),
                avatar: avatar.to_string(),
                title: None,
            },
        };
        let next = reduce(&current, &action);

        self.store.save(room_id, &next).await?;
        self.broadcast(room_id, &next);
        info!(room = %room_id, player = %player_id, players = next.players.len(), "player joined");
        Ok((player_id, next))
    }

    /// Reduce `action` against the persisted copy of the room, store and
    /// broadcast the result.
    pub async fn apply(&self, room_id: &str, action: &Action) -> Result<GameState, RoomError> {
        self.apply_when(room_id, action, |_| true)
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))
    }

    /// Like [`apply`](Self::apply) but only when `guard` accepts the persisted
    /// state. `Ok(None)` means the guard declined.
    pub async fn apply_when<F>(
        &self,
        room_id: &str,
        action: &Action,
        guard: F,
    ) -> Result<Option<GameState>, RoomError>
    where
        F: FnOnce(&GameState) -> bool + Send,
    {
        let current = self
            .store
            .load(room_id)
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;
        if !guard(&current) {
            return Ok(None);
        }

        let next = reduce(&current, action);
        self.store.save(room_id, &next).await?;
        self.broadcast(room_id, &next);
        debug!(room = %room_id, action = action.name(), phase = ?next.phase, "action applied");
        Ok(Some(next))
    }

    fn broadcast(&self, room_id: &str, state: &GameState) {
        // No subscribers is not an error; delivery is fire-and-forget.
        let _ = self.updates.send(SyncMessage::StateUpdate(StateUpdate {
            room_id: room_id.to_string(),
            new_state: state.clone(),
        }));
    }

    async fn free_code(&self) -> Result<String, RoomError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = {
                let mut rng = self.codes.lock().unwrap_or_else(|e| e.into_inner());
                (0..CODE_LEN)
                    .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
                    .collect::<String>()
            };
            if !self.store.contains(&code).await? {
                return Ok(code);
            }
        }
        Err(RoomError::CodesExhausted)
    }
}

/// One participant: a session binding, a local copy of the room state and a
/// subscription to room broadcasts.
pub struct RoomClient<S> {
    hub: RoomHub<S>,
    session: Session,
    updates: broadcast::Receiver<SyncMessage>,
    state: Option<GameState>,
}

impl<S: RoomStore> RoomClient<S> {
    pub fn new(hub: RoomHub<S>) -> Self {
        Self::with_session(hub, Session::default())
    }

    /// Rebuild a client from a session kept across a reload.
    pub fn with_session(hub: RoomHub<S>, session: Session) -> Self {
        let updates = hub.subscribe();
        Self {
            hub,
            session,
            updates,
            state: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    pub async fn create_room(
        &mut self,
        host_name: &str,
        host_avatar: &str,
    ) -> Result<GameState, RoomError> {
        let (host_id, state) = self.hub.create_room(host_name, host_avatar).await?;
        let room_id = state.room_id.clone().unwrap_or_default();
        self.session.bind(room_id, host_id);
        Ok(self.adopt(state))
    }

    pub async fn join_room(
        &mut self,
        room_id: &str,
        name: &str,
        avatar: &str,
    ) -> Result<GameState, RoomError> {
        let (player_id, state) = self.hub.join_room(room_id, name, avatar).await?;
        self.session.bind(room_id, player_id);
        Ok(self.adopt(state))
    }

    /// Apply an action to the room this client is bound to. The result is
    /// adopted locally right away instead of waiting for the broadcast echo.
    pub async fn send_action(&mut self, action: Action) -> Result<GameState, RoomError> {
        let room_id = self
            .session
            .room_id()
            .ok_or(RoomError::NotInRoom)?
            .to_string();
        let next = self.hub.apply(&room_id, &action).await?;
        Ok(self.adopt(next))
    }

    /// Re-fetch the bound room if this client's player is still seated there.
    /// Otherwise the binding is dropped and `None` returned.
    pub async fn reconnect(&mut self) -> Result<Option<GameState>, RoomError> {
        let Some(binding) = self.session.binding().cloned() else {
            return Ok(None);
        };
        match self.hub.fetch(&binding.room_id).await? {
            Some(state) if state.has_player(&binding.player_id) => Ok(Some(self.adopt(state))),
            _ => {
                info!(room = %binding.room_id, player = %binding.player_id, "stale session cleared");
                self.session.clear();
                self.state = None;
                Ok(None)
            }
        }
    }

    /// Wait for the next snapshot of this client's room and adopt it.
    /// Returns `None` once the channel is closed.
    pub async fn next_update(&mut self) -> Option<GameState> {
        loop {
            match self.updates.recv().await {
                Ok(msg) => {
                    if let Some(state) = self.accept(msg) {
                        return Some(state);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "client lagged behind room broadcasts");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Adopt every snapshot already queued, without waiting. Returns the
    /// latest one for this client's room, if any arrived.
    pub fn drain_updates(&mut self) -> Option<GameState> {
        let mut latest = None;
        loop {
            match self.updates.try_recv() {
                Ok(msg) => {
                    if let Some(state) = self.accept(msg) {
                        latest = Some(state);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "client lagged behind room broadcasts");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return latest,
            }
        }
    }

    fn accept(&mut self, msg: SyncMessage) -> Option<GameState> {
        if Some(msg.room_id()) != self.session.room_id() {
            return None;
        }
        let SyncMessage::StateUpdate(update) = msg;
        Some(self.adopt(update.new_state))
    }

    /// Replace the local state wholesale. `player_id` is the one local field:
    /// it always names this client's own player.
    fn adopt(&mut self, mut state: GameState) -> GameState {
        if let Some(player_id) = self.session.player_id() {
            state.player_id = Some(player_id.to_string());
        }
        self.state = Some(state.clone());
        state
    }
}
