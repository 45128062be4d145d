//! Final scores and winner resolution.
//!
//! Solo and hot seat games report an all-zero board as `NoWinner`; team games
//! report it as a `Tie` between every team. The asymmetry is kept on purpose.

use serde::{Deserialize, Serialize};

use crate::model::{GameMode, GameState, Player, Team};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Winner(String),
    Tie(Vec<String>),
    NoWinner,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamScore {
    pub team: Team,
    pub score: u32,
}

/// Everyone sharing the highest score, zero included.
pub fn top_scorers(players: &[Player]) -> Vec<&Player> {
    let Some(best) = players.iter().map(|p| p.score).max() else {
        return Vec::new();
    };
    players.iter().filter(|p| p.score == best).collect()
}

/// Players ordered by score, highest first; ties keep roster order.
pub fn leaderboard(players: &[Player]) -> Vec<&Player> {
    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted
}

pub fn team_scores(state: &GameState) -> Vec<TeamScore> {
    state
        .teams
        .iter()
        .map(|team| TeamScore {
            team: team.clone(),
            score: team
                .players
                .iter()
                .filter_map(|id| state.player(id))
                .map(|p| p.score)
                .sum(),
        })
        .collect()
}

pub fn outcome(state: &GameState) -> Outcome {
    match state.settings.game_mode {
        GameMode::Teams => team_outcome(&team_scores(state)),
        GameMode::Solo | GameMode::HotSeat => {
            let top = top_scorers(&state.players);
            match top.first() {
                None => Outcome::NoWinner,
                Some(leader) if leader.score == 0 => Outcome::NoWinner,
                Some(_) => resolve(top.into_iter().map(|p| p.id.clone()).collect()),
            }
        }
    }
}

fn team_outcome(scores: &[TeamScore]) -> Outcome {
    let Some(best) = scores.iter().map(|t| t.score).max() else {
        return Outcome::NoWinner;
    };
    resolve(
        scores
            .iter()
            .filter(|t| t.score == best)
            .map(|t| t.team.id.clone())
            .collect(),
    )
}

fn resolve(mut ids: Vec<String>) -> Outcome {
    if ids.len() == 1 {
        Outcome::Winner(ids.remove(0))
    } else {
        Outcome::Tie(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, score: u32, team: Option<&str>) -> Player {
        Player {
            score,
            team_id: team.map(str::to_string),
            ..Player::new(id, id.to_uppercase(), "🎲")
        }
    }

    fn team(id: &str, members: &[&str]) -> Team {
        Team {
            id: id.into(),
            name: id.into(),
            players: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn solo_all_zero_is_no_winner() {
        let state = GameState {
            players: vec![scored("a", 0, None), scored("b", 0, None)],
            ..GameState::default()
        };
        assert_eq!(outcome(&state), Outcome::NoWinner);
    }

    #[test]
    fn solo_shared_lead_is_a_tie() {
        let state = GameState {
            players: vec![scored("a", 3, None), scored("b", 3, None), scored("c", 1, None)],
            ..GameState::default()
        };
        assert_eq!(outcome(&state), Outcome::Tie(vec!["a".into(), "b".into()]));
        assert_eq!(leaderboard(&state.players)[2].id, "c");
    }

    #[test]
    fn team_all_zero_is_a_tie() {
        let mut state = GameState {
            players: vec![
                scored("a", 0, Some("t1")),
                scored("b", 0, Some("t1")),
                scored("c", 0, Some("t2")),
                scored("d", 0, Some("t2")),
            ],
            teams: vec![team("t1", &["a", "b"]), team("t2", &["c", "d"])],
            ..GameState::default()
        };
        state.settings.game_mode = GameMode::Teams;
        assert_eq!(outcome(&state), Outcome::Tie(vec!["t1".into(), "t2".into()]));

        state.players[2].score = 4;
        assert_eq!(outcome(&state), Outcome::Winner("t2".into()));
        assert_eq!(team_scores(&state)[1].score, 4);
    }
}
