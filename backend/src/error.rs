use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    RoomNotFound(String),
    #[error("room {0} is full")]
    RoomFull(String),
    #[error("session is not bound to a room")]
    NotInRoom,
    #[error("player {0} is not in this room")]
    PlayerNotFound(String),
    #[error("no free room code")]
    CodesExhausted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        let status = match &self {
            RoomError::RoomNotFound(_) | RoomError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            RoomError::RoomFull(_) => StatusCode::CONFLICT,
            RoomError::NotInRoom => StatusCode::BAD_REQUEST,
            RoomError::CodesExhausted => StatusCode::SERVICE_UNAVAILABLE,
            RoomError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
