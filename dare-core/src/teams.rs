//! Team partitioning and the player/team membership invariant.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::{Player, Team};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TeamError {
    #[error("cannot split {players} players into {requested} teams")]
    InvalidTeamCount { requested: usize, players: usize },
    #[error("team partition mismatch: {0}")]
    PartitionMismatch(String),
}

/// Shuffle the roster and deal players round-robin into `count` teams.
///
/// Returns the teams and the roster (in dealt order) with `team_id` set.
pub fn partition_teams<R: Rng + ?Sized>(
    players: &[Player],
    count: usize,
    rng: &mut R,
) -> Result<(Vec<Team>, Vec<Player>), TeamError> {
    if count < 2 || count > players.len() {
        return Err(TeamError::InvalidTeamCount {
            requested: count,
            players: players.len(),
        });
    }

    let mut teams: Vec<Team> = (1..=count)
        .map(|i| Team {
            id: format!("team_{i}"),
            name: format!("Team {i}"),
            players: Vec::new(),
        })
        .collect();

    let mut shuffled = players.to_vec();
    shuffled.shuffle(rng);
    for (index, player) in shuffled.iter_mut().enumerate() {
        let team = &mut teams[index % count];
        team.players.push(player.id.clone());
        player.team_id = Some(team.id.clone());
    }

    Ok((teams, shuffled))
}

/// Every player belongs to exactly one team and `team_id` agrees with the
/// team's member list. An empty team list is trivially consistent.
pub fn check_team_partition(players: &[Player], teams: &[Team]) -> Result<(), TeamError> {
    if teams.is_empty() {
        return match players.iter().find(|p| p.team_id.is_some()) {
            Some(p) => Err(TeamError::PartitionMismatch(format!(
                "player {} assigned to a team but no teams exist",
                p.id
            ))),
            None => Ok(()),
        };
    }

    let mut seen = HashSet::new();
    for team in teams {
        for member in &team.players {
            if !seen.insert(member.as_str()) {
                return Err(TeamError::PartitionMismatch(format!(
                    "player {member} listed more than once"
                )));
            }
            let player = players.iter().find(|p| &p.id == member).ok_or_else(|| {
                TeamError::PartitionMismatch(format!("team {} lists unknown player {member}", team.id))
            })?;
            if player.team_id.as_deref() != Some(team.id.as_str()) {
                return Err(TeamError::PartitionMismatch(format!(
                    "player {member} does not point back at team {}",
                    team.id
                )));
            }
        }
    }

    match players.iter().find(|p| !seen.contains(p.id.as_str())) {
        Some(p) => Err(TeamError::PartitionMismatch(format!(
            "player {} is not on any team",
            p.id
        ))),
        None => Ok(()),
    }
}

/// Drop dangling references after the roster or team list changed.
pub fn sync_membership(players: &mut [Player], teams: &mut [Team]) {
    for team in teams.iter_mut() {
        team.players.retain(|id| players.iter().any(|p| &p.id == id));
    }
    for player in players.iter_mut() {
        let listed = player.team_id.as_ref().is_some_and(|tid| {
            teams
                .iter()
                .any(|t| &t.id == tid && t.players.contains(&player.id))
        });
        if !listed {
            player.team_id = None;
        }
    }
}
