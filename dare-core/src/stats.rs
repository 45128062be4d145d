use crate::model::{LifetimeStats, Player, PlayerStats, PlayerTitle, Turn};

const VETERAN_GAMES: u32 = 10;
const CONQUEROR_WINS: u32 = 5;

/// Titles a player has unlocked. Everyone is at least a rookie.
pub fn eligible_titles(stats: Option<&PlayerStats>) -> Vec<PlayerTitle> {
    let mut titles = vec![PlayerTitle::Rookie];
    if let Some(stats) = stats {
        if stats.games_played >= VETERAN_GAMES {
            titles.push(PlayerTitle::Veteran);
        }
        if stats.wins >= CONQUEROR_WINS {
            titles.push(PlayerTitle::DareConqueror);
        }
    }
    titles
}

/// Fold one finished game into the lifetime table.
///
/// `winners` are the ids of everyone sharing the top score. A perfect game is a
/// win without a single forfeit by that player.
pub fn record_game(
    lifetime: &mut LifetimeStats,
    players: &[Player],
    history: &[Turn],
    winners: &[&str],
) {
    for player in players {
        let stats = lifetime.entry(player.id.clone()).or_default();
        stats.games_played += 1;
        stats.dares_completed += history
            .iter()
            .filter(|t| t.player.id == player.id && t.completed)
            .count() as u32;

        if winners.contains(&player.id.as_str()) {
            stats.wins += 1;
            let forfeited = history
                .iter()
                .any(|t| t.player.id == player.id && !t.completed);
            if !forfeited {
                stats.perfect_games += 1;
            }
        }
    }
}
