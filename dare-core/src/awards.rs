//! End-of-game superlatives derived from turn history.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{Player, PlayerId, Turn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AwardKind {
    Daredevil,
    #[serde(rename = "Most Cautious")]
    MostCautious,
    #[serde(rename = "High Roller")]
    HighRoller,
    #[serde(rename = "Streak Master")]
    StreakMaster,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Award {
    #[serde(rename = "type")]
    pub kind: AwardKind,
    pub player: Player,
    pub description: String,
}

#[derive(Default, Clone, Copy)]
struct Tally {
    completed: u32,
    forfeited: u32,
    double_downs: u32,
    best_streak: u32,
}

/// Awards go only to a unique leader with a non-zero count; a shared lead
/// produces nothing for that category.
pub fn generate_awards(history: &[Turn], players: &[Player]) -> Vec<Award> {
    if history.is_empty() || players.is_empty() {
        return Vec::new();
    }

    let mut tallies: HashMap<&PlayerId, Tally> =
        players.iter().map(|p| (&p.id, Tally::default())).collect();
    let mut running: HashMap<&PlayerId, u32> = HashMap::new();

    for turn in history {
        let Some(tally) = tallies.get_mut(&turn.player.id) else {
            continue;
        };
        let streak = running.entry(&turn.player.id).or_insert(0);
        if turn.completed {
            tally.completed += 1;
            *streak += 1;
            tally.best_streak = tally.best_streak.max(*streak);
        } else {
            tally.forfeited += 1;
            *streak = 0;
        }
        if turn.is_double_down {
            tally.double_downs += 1;
        }
    }

    let mut awards = Vec::new();
    let mut grant = |kind: AwardKind, metric: fn(&Tally) -> u32, describe: fn(u32) -> String| {
        if let Some((player, value)) = unique_leader(players, &tallies, metric) {
            awards.push(Award {
                kind,
                player: player.clone(),
                description: describe(value),
            });
        }
    };

    grant(
        AwardKind::Daredevil,
        |t| t.completed,
        |n| format!("Completed the most dares ({n})!"),
    );
    grant(
        AwardKind::MostCautious,
        |t| t.forfeited,
        |n| format!("Forfeited the most dares ({n})!"),
    );
    grant(
        AwardKind::HighRoller,
        |t| t.double_downs,
        |n| format!("Took the biggest risks with {n} Double Downs!"),
    );
    grant(
        AwardKind::StreakMaster,
        |t| t.best_streak,
        |n| format!("Longest streak of {n} dares in a row!"),
    );

    awards
}

fn unique_leader<'a>(
    players: &'a [Player],
    tallies: &HashMap<&PlayerId, Tally>,
    metric: fn(&Tally) -> u32,
) -> Option<(&'a Player, u32)> {
    let value = |p: &Player| tallies.get(&p.id).map(metric).unwrap_or(0);
    let best = players.iter().map(value).max()?;
    if best == 0 {
        return None;
    }
    let mut leaders = players.iter().filter(|p| value(*p) == best);
    match (leaders.next(), leaders.next()) {
        (Some(leader), None) => Some((leader, best)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dare, Difficulty};

    fn turn(player: &Player, completed: bool, double_down: bool) -> Turn {
        Turn {
            player: player.clone(),
            dare: Dare::new("d", Difficulty::Medium),
            completed,
            is_double_down: double_down,
        }
    }

    fn kinds(awards: &[Award]) -> Vec<AwardKind> {
        awards.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn tied_completions_yield_no_daredevil() {
        let a = Player::new("a", "A", "🦊");
        let b = Player::new("b", "B", "🐻");
        let history = vec![turn(&a, true, false), turn(&b, true, false)];

        let awards = generate_awards(&history, &[a, b]);
        assert!(!kinds(&awards).contains(&AwardKind::Daredevil));
    }

    #[test]
    fn unique_leaders_collect_awards() {
        let a = Player::new("a", "A", "🦊");
        let b = Player::new("b", "B", "🐻");
        let history = vec![
            turn(&a, true, true),
            turn(&b, false, false),
            turn(&a, true, false),
            turn(&b, true, false),
        ];

        let awards = generate_awards(&history, &[a.clone(), b.clone()]);
        let by_kind = |k| awards.iter().find(|aw| aw.kind == k).map(|aw| aw.player.id.clone());

        assert_eq!(by_kind(AwardKind::Daredevil), Some("a".to_string()));
        assert_eq!(by_kind(AwardKind::MostCautious), Some("b".to_string()));
        assert_eq!(by_kind(AwardKind::HighRoller), Some("a".to_string()));
        assert_eq!(by_kind(AwardKind::StreakMaster), Some("a".to_string()));
        assert_eq!(
            awards[0].description,
            "Completed the most dares (2)!".to_string()
        );
    }

    #[test]
    fn empty_history_has_no_awards() {
        assert!(generate_awards(&[], &[Player::new("a", "A", "🦊")]).is_empty());
    }
}
