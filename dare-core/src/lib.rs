//! Rules of the party dare game: domain types, dare catalog, awards and the
//! pure state reducer shared by offline play and online rooms.

pub mod action;
pub mod awards;
pub mod catalog;
pub mod model;
pub mod reducer;
pub mod standings;
pub mod stats;
pub mod teams;

pub use action::Action;
pub use awards::{generate_awards, Award, AwardKind};
pub use model::*;
pub use reducer::{new_player_id, now_millis, reduce, reduce_with};
pub use standings::{outcome, Outcome};
pub use teams::{check_team_partition, partition_teams, TeamError};
