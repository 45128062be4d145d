use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub type PlayerId = String;
pub type TeamId = String;
pub type PackId = String;

/// Hard cap on roster size, shared by local play and online rooms.
pub const MAX_PLAYERS: usize = 12;
pub const MIN_PLAYERS: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub avatar: String,
    pub score: u32,
    pub streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<PlayerTitle>,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: avatar.into(),
            score: 0,
            streak: 0,
            team_id: None,
            title: None,
        }
    }
}

/// Identity of a player entering a room; score and streak always start at zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub id: PlayerId,
    pub name: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<PlayerTitle>,
}

impl From<NewPlayer> for Player {
    fn from(p: NewPlayer) -> Self {
        Self {
            title: p.title,
            ..Player::new(p.id, p.name, p.avatar)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlayerTitle {
    Rookie,
    Veteran,
    #[serde(rename = "Dare Conqueror")]
    DareConqueror,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub players: Vec<PlayerId>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("dare difficulty must be 1, 2 or 3 (got {0})")]
pub struct InvalidDifficulty(pub u8);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Easy = 1,
    Medium = 2,
    Hard = 3,
}

impl TryFrom<u8> for Difficulty {
    type Error = InvalidDifficulty;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Medium),
            3 => Ok(Difficulty::Hard),
            other => Err(InvalidDifficulty(other)),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d as u8
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DareKind {
    #[default]
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Dare {
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: DareKind,
    pub difficulty: Difficulty,
}

impl Dare {
    pub fn new(text: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            text: text.into(),
            kind: DareKind::Text,
            difficulty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DarePack {
    pub id: PackId,
    pub name: String,
    pub description: String,
    pub dares: Vec<Dare>,
}

/// A player-authored pack. Persisted separately from the game snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomDarePack {
    pub id: PackId,
    pub name: String,
    pub description: String,
    pub dares: Vec<Dare>,
    #[serde(default = "custom_flag")]
    pub is_custom: bool,
}

fn custom_flag() -> bool {
    true
}

impl CustomDarePack {
    pub fn new(
        id: impl Into<PackId>,
        name: impl Into<String>,
        description: impl Into<String>,
        dares: Vec<Dare>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            dares,
            is_custom: true,
        }
    }

    pub fn to_pack(&self) -> DarePack {
        DarePack {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            dares: self.dares.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub player: Player,
    pub dare: Dare,
    pub completed: bool,
    pub is_double_down: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTurn {
    pub player: Player,
    pub dare: Dare,
    pub is_double_down: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Setup,
    DareSubmission,
    Playing,
    Paused,
    GameOver,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Solo,
    Teams,
    HotSeat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum WinCondition {
    Score(u32),
    Rounds(u32),
}

impl Default for WinCondition {
    fn default() -> Self {
        WinCondition::Score(10)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Neon,
    Spooky,
    Pirate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    pub selected_packs: Vec<PackId>,
    pub forfeit_penalty: u32,
    pub adult_mode: bool,
    pub game_mode: GameMode,
    pub win_condition: WinCondition,
    /// Seconds per dare; 0 disables the countdown.
    pub timer_duration: u32,
    pub theme: Theme,
    pub sound_volume: f32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            selected_packs: vec!["classic".to_string()],
            forfeit_penalty: 1,
            adult_mode: false,
            game_mode: GameMode::Solo,
            win_condition: WinCondition::default(),
            timer_duration: 0,
            theme: Theme::Neon,
            sound_volume: 1.0,
        }
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_packs: Option<Vec<PackId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forfeit_penalty: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adult_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<GameMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_condition: Option<WinCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_volume: Option<f32>,
}

impl GameSettings {
    pub fn merge(&mut self, patch: &SettingsPatch) {
        if let Some(packs) = &patch.selected_packs {
            self.selected_packs = packs.clone();
        }
        if let Some(penalty) = patch.forfeit_penalty {
            self.forfeit_penalty = penalty;
        }
        if let Some(adult) = patch.adult_mode {
            self.adult_mode = adult;
        }
        if let Some(mode) = patch.game_mode {
            self.game_mode = mode;
        }
        if let Some(win) = patch.win_condition {
            self.win_condition = win;
        }
        if let Some(secs) = patch.timer_duration {
            self.timer_duration = secs;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(volume) = patch.sound_volume {
            self.sound_volume = volume.clamp(0.0, 1.0);
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ToastKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub games_played: u32,
    pub wins: u32,
    pub dares_completed: u32,
    pub perfect_games: u32,
}

pub type LifetimeStats = BTreeMap<PlayerId, PlayerStats>;

/// Aggregate root. Every field defaults so partially written snapshots still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    #[serde(rename = "gamePhase")]
    pub phase: GamePhase,
    pub settings: GameSettings,
    pub current_player_index: usize,
    pub current_turn: Option<CurrentTurn>,
    pub history: Vec<Turn>,
    pub available_dares: Vec<Dare>,
    pub custom_packs: Vec<CustomDarePack>,
    pub current_round: u32,
    pub turn_start_time: Option<u64>,
    pub personal_dares: Vec<Dare>,
    pub dare_submission_index: usize,
    pub toasts: Vec<Toast>,
    pub lifetime_stats: LifetimeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            teams: Vec::new(),
            phase: GamePhase::Setup,
            settings: GameSettings::default(),
            current_player_index: 0,
            current_turn: None,
            history: Vec::new(),
            available_dares: Vec::new(),
            custom_packs: Vec::new(),
            current_round: 1,
            turn_start_time: None,
            personal_dares: Vec::new(),
            dare_submission_index: 0,
            toasts: Vec::new(),
            lifetime_stats: LifetimeStats::new(),
            room_id: None,
            host_id: None,
            player_id: None,
        }
    }
}

impl GameState {
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn has_player(&self, id: &str) -> bool {
        self.player(id).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Snapshots taken during setup are half-configured and are not written out.
    pub fn is_persistable(&self) -> bool {
        self.phase != GamePhase::Setup
    }
}
