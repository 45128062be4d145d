use serde::{Deserialize, Serialize};

use crate::model::{
    CustomDarePack, Dare, GameState, LifetimeStats, NewPlayer, PackId, Player, PlayerId,
    PlayerTitle, SettingsPatch, Team, ToastKind,
};

/// Everything a player, the UI or the network can ask the reducer to do.
///
/// On the wire this is `{"type": "SET_DARE", "payload": {...}}`; unit variants
/// carry no payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddPlayer {
        name: String,
        avatar: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<PlayerTitle>,
    },
    RemovePlayer {
        id: PlayerId,
    },
    UpdateSettings(SettingsPatch),
    SetupTeams {
        teams: Vec<Team>,
        players: Vec<Player>,
    },
    StartGame,
    SubmitPersonalDare {
        dare: Dare,
    },
    NextDareSubmitter,
    #[serde(rename_all = "camelCase")]
    SetDare {
        is_double_down: bool,
    },
    AddCustomDareToGame {
        dare: Dare,
    },
    CompleteTurn {
        completed: bool,
    },
    EndGame,
    ResetGame,
    PauseGame,
    ResumeGame,
    #[serde(rename_all = "camelCase")]
    UpdatePlayerTitle {
        player_id: PlayerId,
        title: PlayerTitle,
    },
    SaveCustomPack(CustomDarePack),
    DeleteCustomPack {
        id: PackId,
    },
    LoadCustomPacks(Vec<CustomDarePack>),
    LoadState(Box<GameState>),
    LoadLifetimeStats(LifetimeStats),
    AddToast {
        message: String,
        #[serde(rename = "type")]
        kind: ToastKind,
    },
    RemoveToast {
        id: u64,
    },
    JoinRoom {
        player: NewPlayer,
    },
}

impl Action {
    /// Wire name of the variant, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddPlayer { .. } => "ADD_PLAYER",
            Action::RemovePlayer { .. } => "REMOVE_PLAYER",
            Action::UpdateSettings(_) => "UPDATE_SETTINGS",
            Action::SetupTeams { .. } => "SETUP_TEAMS",
            Action::StartGame => "START_GAME",
            Action::SubmitPersonalDare { .. } => "SUBMIT_PERSONAL_DARE",
            Action::NextDareSubmitter => "NEXT_DARE_SUBMITTER",
            Action::SetDare { .. } => "SET_DARE",
            Action::AddCustomDareToGame { .. } => "ADD_CUSTOM_DARE_TO_GAME",
            Action::CompleteTurn { .. } => "COMPLETE_TURN",
            Action::EndGame => "END_GAME",
            Action::ResetGame => "RESET_GAME",
            Action::PauseGame => "PAUSE_GAME",
            Action::ResumeGame => "RESUME_GAME",
            Action::UpdatePlayerTitle { .. } => "UPDATE_PLAYER_TITLE",
            Action::SaveCustomPack(_) => "SAVE_CUSTOM_PACK",
            Action::DeleteCustomPack { .. } => "DELETE_CUSTOM_PACK",
            Action::LoadCustomPacks(_) => "LOAD_CUSTOM_PACKS",
            Action::LoadState(_) => "LOAD_STATE",
            Action::LoadLifetimeStats(_) => "LOAD_LIFETIME_STATS",
            Action::AddToast { .. } => "ADD_TOAST",
            Action::RemoveToast { .. } => "REMOVE_TOAST",
            Action::JoinRoom { .. } => "JOIN_ROOM",
        }
    }
}
