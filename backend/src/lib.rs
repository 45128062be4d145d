pub mod config;
pub mod error;
pub mod rooms;
pub mod saves;
pub mod session;
pub mod store;
pub mod timer;

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use dare_core::{Action, GameState, PlayerId};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::RoomError;
use crate::rooms::{RoomHub, StateUpdate, SyncMessage};
use crate::store::RoomStore;
use crate::timer::{spawn_turn_timers, TurnTimers};

pub struct AppState<S> {
    hub: RoomHub<S>,
    timers: Arc<TurnTimers>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
            timers: Arc::clone(&self.timers),
        }
    }
}

impl<S: RoomStore> AppState<S> {
    /// Wrap `hub` and start turn timers for its rooms. Must be called inside a
    /// tokio runtime.
    pub fn new(hub: RoomHub<S>) -> Self {
        let timers = spawn_turn_timers(hub.clone());
        Self { hub, timers }
    }

    pub fn hub(&self) -> &RoomHub<S> {
        &self.hub
    }

    pub fn timers(&self) -> &TurnTimers {
        &self.timers
    }
}

pub fn app<S: RoomStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/room", post(create_room::<S>))
        .route("/room/:id", get(get_room::<S>))
        .route("/room/:id/join", post(join_room::<S>))
        .route("/room/:id/action", post(room_action::<S>))
        .route("/ws/:id/:player_id", get(ws_handler::<S>))
        .with_state(state)
}

#[derive(Deserialize)]
struct SeatRequest {
    name: String,
    #[serde(default)]
    avatar: String,
}

impl SeatRequest {
    fn name(&self) -> Result<&str, (StatusCode, &'static str)> {
        match self.name.trim() {
            "" => Err((StatusCode::BAD_REQUEST, "name required")),
            name => Ok(name),
        }
    }
}

#[derive(Serialize)]
struct SeatResponse {
    room_id: String,
    player_id: PlayerId,
    state: GameState,
}

#[derive(Deserialize)]
struct ActionRequest {
    player_id: PlayerId,
    action: Action,
}

#[derive(Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
enum ErrorFrame {
    Error { message: String },
}

async fn create_room<S: RoomStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<SeatRequest>,
) -> impl IntoResponse {
    let name = match payload.name() {
        Ok(name) => name,
        Err(rejection) => return rejection.into_response(),
    };
    match state.hub.create_room(name, &payload.avatar).await {
        Ok((player_id, game)) => {
            let room_id = game.room_id.clone().unwrap_or_default();
            let body = SeatResponse {
                room_id,
                player_id,
                state: game,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn join_room<S: RoomStore>(
    State(state): State<AppState<S>>,
    Path(room_id): Path<String>,
    Json(payload): Json<SeatRequest>,
) -> impl IntoResponse {
    let name = match payload.name() {
        Ok(name) => name,
        Err(rejection) => return rejection.into_response(),
    };
    match state.hub.join_room(&room_id, name, &payload.avatar).await {
        Ok((player_id, game)) => Json(SeatResponse {
            room_id,
            state: seen_by(&player_id, game),
            player_id,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_room<S: RoomStore>(
    State(state): State<AppState<S>>,
    Path(room_id): Path<String>,
) -> Result<Json<GameState>, RoomError> {
    state
        .hub
        .fetch(&room_id)
        .await?
        .map(Json)
        .ok_or(RoomError::RoomNotFound(room_id))
}

async fn room_action<S: RoomStore>(
    State(state): State<AppState<S>>,
    Path(room_id): Path<String>,
    Json(payload): Json<ActionRequest>,
) -> Result<Json<GameState>, RoomError> {
    let next = act(&state.hub, &room_id, &payload.player_id, &payload.action).await?;
    Ok(Json(next))
}

/// Apply an action on behalf of a seated player and return the result as that
/// player sees it.
async fn act<S: RoomStore>(
    hub: &RoomHub<S>,
    room_id: &str,
    player_id: &str,
    action: &Action,
) -> Result<GameState, RoomError> {
    hub.apply_when(room_id, action, |game| game.has_player(player_id))
        .await?
        .map(|game| seen_by(player_id, game))
        .ok_or_else(|| RoomError::PlayerNotFound(player_id.to_string()))
}

async fn ws_handler<S: RoomStore>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
    Path((room_id, player_id)): Path<(String, String)>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub, room_id, player_id))
}

fn frame<T: Serialize>(msg: &T) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(text) => Some(Message::Text(text)),
        Err(err) => {
            warn!(%err, "could not encode socket frame");
            None
        }
    }
}

fn error_frame(message: impl Into<String>) -> Option<Message> {
    frame(&ErrorFrame::Error {
        message: message.into(),
    })
}

/// `playerId` in anything handed to a client always names that client.
fn seen_by(player_id: &str, mut game: GameState) -> GameState {
    game.player_id = Some(player_id.to_string());
    game
}

fn snapshot_for(room_id: &str, player_id: &str, game: GameState) -> SyncMessage {
    SyncMessage::StateUpdate(StateUpdate {
        room_id: room_id.to_string(),
        new_state: seen_by(player_id, game),
    })
}

async fn handle_socket<S: RoomStore>(
    stream: WebSocket,
    hub: RoomHub<S>,
    room_id: String,
    player_id: String,
) {
    let (sender, mut receiver) = stream.split();
    let sender = Arc::new(Mutex::new(sender));

    // Subscribe before the snapshot read so no update slips between the two.
    let mut updates = hub.subscribe();
    let rejection = match hub.fetch(&room_id).await {
        Ok(Some(game)) if game.has_player(&player_id) => {
            if let Some(msg) = frame(&snapshot_for(&room_id, &player_id, game)) {
                let _ = sender.lock().await.send(msg).await;
            }
            None
        }
        Ok(Some(_)) => Some(RoomError::PlayerNotFound(player_id.clone())),
        Ok(None) => Some(RoomError::RoomNotFound(room_id.clone())),
        Err(err) => Some(err),
    };
    if let Some(err) = rejection {
        if let Some(msg) = error_frame(err.to_string()) {
            let _ = sender.lock().await.send(msg).await;
        }
        return;
    }
    info!(room = %room_id, player = %player_id, "socket connected");

    let forward = sender.clone();
    let (watch_room, watch_player) = (room_id.clone(), player_id.clone());
    let mut send_task = tokio::spawn(async move {
        loop {
            let update = match updates.recv().await {
                Ok(SyncMessage::StateUpdate(update)) => update,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(room = %watch_room, skipped, "socket lagged behind room broadcasts");
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            };
            if update.room_id != watch_room {
                continue;
            }
            let snapshot = snapshot_for(&watch_room, &watch_player, update.new_state);
            let Some(msg) = frame(&snapshot) else {
                continue;
            };
            if forward.lock().await.send(msg).await.is_err() {
                break;
            }
        }
    });

    let reply = sender.clone();
    let (act_room, act_player) = (room_id.clone(), player_id.clone());
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            let outcome = match serde_json::from_str::<Action>(&text) {
                Ok(action) => {
                    debug!(room = %act_room, player = %act_player, action = action.name(), "socket action");
                    act(&hub, &act_room, &act_player, &action)
                        .await
                        .map(|_| ())
                        .map_err(|err| err.to_string())
                }
                Err(err) => Err(format!("malformed action: {err}")),
            };
            if let Err(message) = outcome {
                if let Some(msg) = error_frame(message) {
                    let _ = reply.lock().await.send(msg).await;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    info!(room = %room_id, player = %player_id, "socket closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileRoomStore, MemoryRoomStore};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use dare_core::{GamePhase, MAX_PLAYERS};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn test_app() -> (Router, AppState<MemoryRoomStore>) {
        let state = AppState::new(RoomHub::with_seed(MemoryRoomStore::new(), 32, Some(42)));
        (app(state.clone()), state)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn open_room(app: &Router) -> serde_json::Value {
        let res = app
            .clone()
            .oneshot(post_json("/room", json!({ "name": "Ana", "avatar": "🦊" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        json_body(res).await
    }

    #[tokio::test]
    async fn create_room_returns_ids() {
        let (app, _) = test_app();
        let body = open_room(&app).await;

        let room_id = body["room_id"].as_str().unwrap();
        let player_id = body["player_id"].as_str().unwrap();
        assert_eq!(room_id.len(), 4);
        assert_eq!(body["state"]["roomId"], room_id);
        assert_eq!(body["state"]["hostId"], player_id);
        assert_eq!(body["state"]["players"][0]["name"], "Ana");
        assert_eq!(body["state"]["gamePhase"], "setup");
    }

    #[tokio::test]
    async fn create_room_requires_name() {
        let (app, _) = test_app();
        let res = app
            .oneshot(post_json("/room", json!({ "name": "   " })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn join_and_fetch_room() {
        let (app, _) = test_app();
        let created = open_room(&app).await;
        let room_id = created["room_id"].as_str().unwrap();

        let res = app
            .clone()
            .oneshot(post_json(
                &format!("/room/{room_id}/join"),
                json!({ "name": "Ben", "avatar": "🐻" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let joined = json_body(res).await;
        assert_ne!(joined["player_id"], created["player_id"]);
        assert_eq!(joined["state"]["playerId"], joined["player_id"]);
        assert_eq!(joined["state"]["hostId"], created["player_id"]);

        let res = app.clone().oneshot(get(&format!("/room/{room_id}"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        let names: Vec<&str> = body["players"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Ana", "Ben"]);
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let (app, _) = test_app();
        let res = app.clone().oneshot(get("/room/ZZZZ")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app
            .oneshot(post_json("/room/ZZZZ/join", json!({ "name": "Ben" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn full_room_rejects_join() {
        let (app, _) = test_app();
        let created = open_room(&app).await;
        let room_id = created["room_id"].as_str().unwrap();
        let uri = format!("/room/{room_id}/join");
        for i in 1..MAX_PLAYERS {
            let res = app
                .clone()
                .oneshot(post_json(&uri, json!({ "name": format!("p{i}") })))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }

        let res = app
            .oneshot(post_json(&uri, json!({ "name": "late" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn seated_player_drives_the_game() {
        let (app, state) = test_app();
        let created = open_room(&app).await;
        let room_id = created["room_id"].as_str().unwrap();
        let host = created["player_id"].as_str().unwrap();
        app.clone()
            .oneshot(post_json(
                &format!("/room/{room_id}/join"),
                json!({ "name": "Ben" }),
            ))
            .await
            .unwrap();

        let mut updates = state.hub().subscribe();
        let uri = format!("/room/{room_id}/action");
        let res = app
            .clone()
            .oneshot(post_json(
                &uri,
                json!({ "player_id": host, "action": { "type": "START_GAME" } }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["gamePhase"], "playing");

        let SyncMessage::StateUpdate(update) = updates.recv().await.unwrap();
        assert_eq!(update.room_id, room_id);
        assert_eq!(update.new_state.phase, GamePhase::Playing);

        let res = app
            .oneshot(post_json(
                &uri,
                json!({
                    "player_id": host,
                    "action": { "type": "SET_DARE", "payload": { "isDoubleDown": true } }
                }),
            ))
            .await
            .unwrap();
        let body = json_body(res).await;
        assert_eq!(body["currentTurn"]["isDoubleDown"], true);
    }

    #[tokio::test]
    async fn action_response_names_the_actor() {
        let (app, _) = test_app();
        let created = open_room(&app).await;
        let room_id = created["room_id"].as_str().unwrap();
        let res = app
            .clone()
            .oneshot(post_json(
                &format!("/room/{room_id}/join"),
                json!({ "name": "Ben" }),
            ))
            .await
            .unwrap();
        let guest = json_body(res).await["player_id"].clone();

        let res = app
            .oneshot(post_json(
                &format!("/room/{room_id}/action"),
                json!({ "player_id": guest, "action": { "type": "START_GAME" } }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["playerId"], guest);
        assert_eq!(body["hostId"], created["player_id"]);
    }

    #[tokio::test]
    async fn strangers_cannot_act() {
        let (app, state) = test_app();
        let created = open_room(&app).await;
        let room_id = created["room_id"].as_str().unwrap();

        let res = app
            .oneshot(post_json(
                &format!("/room/{room_id}/action"),
                json!({ "player_id": "player_nobody", "action": { "type": "RESET_GAME" } }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let stored = state.hub().fetch(room_id).await.unwrap().unwrap();
        assert_eq!(stored.players.len(), 1);
    }

    #[tokio::test]
    async fn malformed_action_is_rejected() {
        let (app, _) = test_app();
        let created = open_room(&app).await;
        let room_id = created["room_id"].as_str().unwrap();

        let res = app
            .oneshot(post_json(
                &format!("/room/{room_id}/action"),
                json!({ "player_id": created["player_id"], "action": { "type": "FLY_AWAY" } }),
            ))
            .await
            .unwrap();
        assert!(res.status().is_client_error());
    }

    #[test]
    fn error_frame_wire_format() {
        let json = serde_json::to_value(ErrorFrame::Error {
            message: "room ABCD not found".into(),
        })
        .unwrap();
        assert_eq!(json, json!({ "type": "ERROR", "payload": { "message": "room ABCD not found" } }));
    }

    #[tokio::test]
    async fn persistence_writes_and_loads_rooms() {
        let path = std::env::temp_dir().join(format!("dare_state_{}.json", Uuid::new_v4()));
        let store = FileRoomStore::open(path.clone()).await;
        let state = AppState::new(RoomHub::new(store, 32));
        let app = app(state.clone());

        let created = open_room(&app).await;
        assert!(tokio::fs::metadata(&path).await.is_ok());

        let loaded = FileRoomStore::open(path.clone()).await;
        assert_eq!(loaded.len().await, 1);
        let room_id = created["room_id"].as_str().unwrap();
        assert!(loaded.contains(room_id).await.unwrap());
        let _ = tokio::fs::remove_file(&path).await;
    }
}
