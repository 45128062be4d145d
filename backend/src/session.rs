use dare_core::PlayerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionBinding {
    pub room_id: String,
    pub player_id: PlayerId,
}

/// Per-client record of which room seat this client occupies. Not shared
/// between clients; serializable so a client can keep it across reloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    binding: Option<SessionBinding>,
}

impl Session {
    pub fn bound(room_id: impl Into<String>, player_id: impl Into<PlayerId>) -> Self {
        let mut session = Self::default();
        session.bind(room_id, player_id);
        session
    }

    pub fn bind(&mut self, room_id: impl Into<String>, player_id: impl Into<PlayerId>) {
        self.binding = Some(SessionBinding {
            room_id: room_id.into(),
            player_id: player_id.into(),
        });
    }

    pub fn clear(&mut self) {
        self.binding = None;
    }

    pub fn binding(&self) -> Option<&SessionBinding> {
        self.binding.as_ref()
    }

    pub fn room_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.room_id.as_str())
    }

    pub fn player_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.player_id.as_str())
    }
}
