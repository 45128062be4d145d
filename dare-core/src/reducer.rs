//! The game state machine.
//!
//! `reduce` is total: an action whose precondition does not hold returns a copy
//! of the input unchanged. The input is never mutated.

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::action::Action;
use crate::catalog::{assemble_pool, no_dares_sentinel, ADULT_PACK_ID};
use crate::model::{
    CurrentTurn, CustomDarePack, Dare, GameMode, GamePhase, GameState, NewPlayer, Player,
    PlayerId, PlayerTitle, SettingsPatch, Team, Toast, ToastKind, Turn, WinCondition,
    MIN_PLAYERS,
};
use crate::standings::top_scorers;
use crate::stats::record_game;
use crate::teams::{check_team_partition, sync_membership};

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn new_player_id<R: Rng + ?Sized>(rng: &mut R) -> PlayerId {
    format!("player_{:012x}", rng.gen::<u64>() >> 16)
}

/// Apply `action` using the thread RNG and the wall clock.
pub fn reduce(state: &GameState, action: &Action) -> GameState {
    reduce_with(state, action, &mut thread_rng(), now_millis())
}

/// Apply `action` with explicit randomness and time, for replayable games.
pub fn reduce_with<R: Rng + ?Sized>(
    state: &GameState,
    action: &Action,
    rng: &mut R,
    now_ms: u64,
) -> GameState {
    let mut game = state.clone();
    match action {
        Action::AddPlayer {
            name,
            avatar,
            title,
        } => add_player(&mut game, name, avatar, *title, rng),
        Action::RemovePlayer { id } => remove_player(&mut game, id),
        Action::UpdateSettings(patch) => update_settings(&mut game, patch),
        Action::SetupTeams { teams, players } => setup_teams(&mut game, teams, players),
        Action::StartGame => start_game(&mut game, rng),
        Action::SubmitPersonalDare { dare } => {
            if game.phase == GamePhase::DareSubmission {
                game.personal_dares.push(dare.clone());
            }
        }
        Action::NextDareSubmitter => next_dare_submitter(&mut game, rng),
        Action::SetDare { is_double_down } => set_dare(&mut game, *is_double_down, rng, now_ms),
        Action::AddCustomDareToGame { dare } => game.available_dares.insert(0, dare.clone()),
        Action::CompleteTurn { completed } => complete_turn(&mut game, *completed),
        Action::EndGame => end_game(&mut game),
        Action::ResetGame => reset_game(&mut game),
        Action::PauseGame => {
            if game.phase == GamePhase::Playing {
                game.phase = GamePhase::Paused;
            }
        }
        Action::ResumeGame => {
            if game.phase == GamePhase::Paused {
                game.phase = GamePhase::Playing;
            }
        }
        Action::UpdatePlayerTitle { player_id, title } => {
            set_title(&mut game, player_id, *title)
        }
        Action::SaveCustomPack(pack) => save_custom_pack(&mut game, pack),
        Action::DeleteCustomPack { id } => game.custom_packs.retain(|p| &p.id != id),
        Action::LoadCustomPacks(packs) => game.custom_packs = packs.clone(),
        Action::LoadState(snapshot) => game = (**snapshot).clone(),
        Action::LoadLifetimeStats(stats) => game.lifetime_stats = stats.clone(),
        Action::AddToast { message, kind } => add_toast(&mut game, message, *kind, now_ms),
        Action::RemoveToast { id } => game.toasts.retain(|t| t.id != *id),
        Action::JoinRoom { player } => join_room(&mut game, player),
    }
    game
}

fn add_player<R: Rng + ?Sized>(
    game: &mut GameState,
    name: &str,
    avatar: &str,
    title: Option<PlayerTitle>,
    rng: &mut R,
) {
    if game.is_full() {
        return;
    }
    let mut player = Player::new(new_player_id(rng), name, avatar);
    player.title = title;
    game.players.push(player);
    keep_partition(game);
}

fn join_room(game: &mut GameState, player: &NewPlayer) {
    if game.is_full() || game.has_player(&player.id) {
        return;
    }
    game.players.push(Player::from(player.clone()));
    keep_partition(game);
}

fn remove_player(game: &mut GameState, id: &str) {
    let Some(index) = game.players.iter().position(|p| p.id == id) else {
        return;
    };
    game.players.remove(index);

    if index < game.current_player_index {
        game.current_player_index -= 1;
    }
    if game.current_player_index >= game.players.len() {
        game.current_player_index = 0;
    }
    if game
        .current_turn
        .as_ref()
        .is_some_and(|turn| turn.player.id == id)
    {
        game.current_turn = None;
        game.turn_start_time = None;
    }
    keep_partition(game);
}

/// Re-establish the player/team invariant after the roster changed. A
/// partition that no longer covers the roster is dissolved and has to be set
/// up again.
fn keep_partition(game: &mut GameState) {
    sync_membership(&mut game.players, &mut game.teams);
    if check_team_partition(&game.players, &game.teams).is_err() {
        game.teams.clear();
        for player in game.players.iter_mut() {
            player.team_id = None;
        }
    }
}

fn update_settings(game: &mut GameState, patch: &SettingsPatch) {
    game.settings.merge(patch);
    let packs = &mut game.settings.selected_packs;
    match patch.adult_mode {
        Some(false) => packs.retain(|id| id != ADULT_PACK_ID),
        Some(true) if !packs.iter().any(|id| id == ADULT_PACK_ID) => {
            packs.push(ADULT_PACK_ID.to_string())
        }
        _ => {}
    }
}

/// Only the seating order and `team_id` are taken from `players`; scores and
/// the rest of each record stay as they are in `game`.
fn setup_teams(game: &mut GameState, teams: &[Team], players: &[Player]) {
    if game.phase != GamePhase::Setup || game.settings.game_mode != GameMode::Teams {
        return;
    }
    let seated: Vec<Player> = players
        .iter()
        .filter_map(|p| {
            game.player(&p.id).map(|own| Player {
                team_id: p.team_id.clone(),
                ..own.clone()
            })
        })
        .collect();
    let distinct: HashSet<&str> = seated.iter().map(|p| p.id.as_str()).collect();
    let same_roster = seated.len() == players.len() && distinct.len() == game.players.len();
    if !same_roster || check_team_partition(&seated, teams).is_err() {
        return;
    }
    game.teams = teams.to_vec();
    game.players = seated;
}

fn start_game<R: Rng + ?Sized>(game: &mut GameState, rng: &mut R) {
    if game.players.len() < MIN_PLAYERS {
        return;
    }
    let unpartitioned = game.teams.is_empty()
        || check_team_partition(&game.players, &game.teams).is_err();
    if game.settings.game_mode == GameMode::Teams && unpartitioned {
        return;
    }

    for player in game.players.iter_mut() {
        player.score = 0;
        player.streak = 0;
    }
    game.players.shuffle(rng);
    game.current_player_index = 0;
    game.current_round = 1;
    game.history.clear();
    game.current_turn = None;
    game.turn_start_time = None;

    if game.settings.game_mode == GameMode::HotSeat {
        game.phase = GamePhase::DareSubmission;
        game.personal_dares.clear();
        game.dare_submission_index = 0;
        game.available_dares.clear();
        game.teams.clear();
        sync_membership(&mut game.players, &mut game.teams);
    } else {
        game.available_dares = assemble_pool(&game.settings, &game.custom_packs);
        game.phase = GamePhase::Playing;
    }
}

fn next_dare_submitter<R: Rng + ?Sized>(game: &mut GameState, rng: &mut R) {
    if game.phase != GamePhase::DareSubmission {
        return;
    }
    let next = game.dare_submission_index + 1;
    if next >= game.players.len() {
        game.dare_submission_index = game.players.len();
        let mut pool = game.personal_dares.clone();
        pool.shuffle(rng);
        game.available_dares = pool;
        game.phase = GamePhase::Playing;
    } else {
        game.dare_submission_index = next;
    }
}

/// Draw a dare for the current player. The dare stays in the pool until the
/// turn resolves.
fn set_dare<R: Rng + ?Sized>(game: &mut GameState, is_double_down: bool, rng: &mut R, now_ms: u64) {
    if game.phase != GamePhase::Playing || game.current_turn.is_some() {
        return;
    }
    let Some(player) = game.current_player().cloned() else {
        return;
    };

    game.current_turn = Some(match game.available_dares.choose(rng) {
        Some(dare) => {
            game.turn_start_time = Some(now_ms);
            CurrentTurn {
                player,
                dare: dare.clone(),
                is_double_down,
            }
        }
        None => CurrentTurn {
            player,
            dare: no_dares_sentinel(),
            is_double_down: false,
        },
    });
}

fn stake(is_double_down: bool) -> u32 {
    if is_double_down {
        2
    } else {
        1
    }
}

fn complete_turn(game: &mut GameState, completed: bool) {
    let index = game.current_player_index;
    if index >= game.players.len() {
        return;
    }
    let Some(turn) = game.current_turn.take() else {
        return;
    };

    let stake = stake(turn.is_double_down);
    let penalty = game.settings.forfeit_penalty.saturating_mul(stake);
    let player = &mut game.players[index];
    if completed {
        player.score += stake;
        player.streak += 1;
    } else {
        player.score = player.score.saturating_sub(penalty);
        player.streak = 0;
    }
    let acting = player.clone();

    let next_index = (index + 1) % game.players.len();
    let new_round = next_index == 0;
    if new_round {
        game.current_round += 1;
    }
    game.current_player_index = next_index;
    game.turn_start_time = None;

    remove_first(&mut game.available_dares, &turn.dare);
    game.history.push(Turn {
        player: acting.clone(),
        dare: turn.dare,
        completed,
        is_double_down: turn.is_double_down,
    });

    let won = match game.settings.win_condition {
        WinCondition::Score(target) => acting.score >= target,
        WinCondition::Rounds(target) => new_round && game.current_round > target,
    };
    // Hot seat pools are player-written and may be short; running dry there
    // does not end the game.
    let exhausted =
        game.available_dares.is_empty() && game.settings.game_mode != GameMode::HotSeat;
    if won || exhausted {
        game.phase = GamePhase::GameOver;
    }
}

fn remove_first(pool: &mut Vec<Dare>, dare: &Dare) {
    if let Some(pos) = pool.iter().position(|d| d == dare) {
        pool.remove(pos);
    }
}

fn end_game(game: &mut GameState) {
    game.phase = GamePhase::GameOver;
    let winners: Vec<&str> = top_scorers(&game.players)
        .into_iter()
        .map(|p| p.id.as_str())
        .collect();
    record_game(
        &mut game.lifetime_stats,
        &game.players,
        &game.history,
        &winners,
    );
}

fn reset_game(game: &mut GameState) {
    let players = game
        .players
        .iter()
        .map(|p| Player {
            title: p.title,
            ..Player::new(p.id.clone(), p.name.clone(), p.avatar.clone())
        })
        .collect();

    *game = GameState {
        players,
        settings: std::mem::take(&mut game.settings),
        custom_packs: std::mem::take(&mut game.custom_packs),
        lifetime_stats: std::mem::take(&mut game.lifetime_stats),
        room_id: game.room_id.take(),
        host_id: game.host_id.take(),
        player_id: game.player_id.take(),
        ..GameState::default()
    };
}

fn set_title(game: &mut GameState, player_id: &str, title: PlayerTitle) {
    if let Some(player) = game.players.iter_mut().find(|p| p.id == player_id) {
        player.title = Some(title);
    }
}

fn save_custom_pack(game: &mut GameState, pack: &CustomDarePack) {
    match game.custom_packs.iter_mut().find(|p| p.id == pack.id) {
        Some(existing) => *existing = pack.clone(),
        None => game.custom_packs.push(pack.clone()),
    }
}

fn add_toast(game: &mut GameState, message: &str, kind: ToastKind, now_ms: u64) {
    let id = game
        .toasts
        .iter()
        .map(|t| t.id)
        .max()
        .map_or(now_ms, |last| now_ms.max(last + 1));
    game.toasts.push(Toast {
        id,
        message: message.to_string(),
        kind,
    });
}
