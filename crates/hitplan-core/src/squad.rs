// Squad snapshot and the shape rules every squad must satisfy.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::player::{Player, PlayerId, Position, ProjectionTable};

/// Players in a full squad.
pub const SQUAD_SIZE: usize = 15;

/// Most players a squad may hold from any one real-world team.
pub const MAX_PER_TEAM: usize = 3;

/// Players in a starting eleven.
pub const STARTING_XI: usize = 11;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum SquadError {
    #[error("squad must contain {expected} players, found {found}")]
    WrongSize { expected: usize, found: usize },

    #[error("player {player_id} appears more than once in the squad")]
    DuplicatePlayer { player_id: PlayerId },

    #[error("unknown player id {player_id}")]
    UnknownPlayer { player_id: PlayerId },

    #[error("squad needs {expected} {position} players, found {found}")]
    FormationMismatch {
        position: Position,
        expected: usize,
        found: usize,
    },

    #[error("squad holds {count} players from {team}, limit is 3")]
    TeamLimitExceeded { team: String, count: usize },

    #[error("bank must be a finite value >= 0, got {bank}")]
    InvalidBank { bank: f64 },

    #[error("player {player_id} is missing projections for {horizon} cycles (has {available})")]
    MissingProjection {
        player_id: PlayerId,
        horizon: usize,
        available: usize,
    },

    #[error("player {player_id} has an invalid {field}: {value}")]
    InvalidValue {
        player_id: PlayerId,
        field: &'static str,
        value: f64,
    },
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Alternate strategic modes the optimizer does not plan for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chip {
    Wildcard,
    FreeHit,
    BenchBoost,
    TripleCaptain,
}

/// The manager's squad going into the target cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadSnapshot {
    pub player_ids: Vec<PlayerId>,
    pub bank: f64,
    pub free_transfers: u32,
    #[serde(default)]
    pub active_chip: Option<Chip>,
}

/// A snapshot whose ids have been resolved against the projection table and
/// whose shape has been checked.
#[derive(Debug, Clone)]
pub struct ResolvedSquad<'a> {
    pub players: Vec<&'a Player>,
    pub bank: f64,
    pub free_transfers: u32,
}

impl<'a> ResolvedSquad<'a> {
    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id)
    }
}

// ---------------------------------------------------------------------------
// Shape checks (shared by snapshot validation and candidate validation)
// ---------------------------------------------------------------------------

/// Per-position head count, indexed by `Position::index()`.
pub fn position_counts<'p>(players: impl IntoIterator<Item = &'p Player>) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for p in players {
        counts[p.position.index()] += 1;
    }
    counts
}

/// First position whose count differs from its squad quota.
pub fn formation_violation(counts: &[usize; 4]) -> Option<(Position, usize)> {
    Position::ALL
        .iter()
        .find(|pos| counts[pos.index()] != pos.squad_quota())
        .map(|&pos| (pos, counts[pos.index()]))
}

/// First team (in squad order) represented more than `MAX_PER_TEAM` times.
pub fn team_limit_violation<'p>(
    players: impl IntoIterator<Item = &'p Player>,
) -> Option<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for p in players {
        let entry = counts.entry(p.team.as_str()).or_insert(0);
        if *entry == 0 {
            order.push(p.team.as_str());
        }
        *entry += 1;
    }
    order
        .into_iter()
        .find(|team| counts[team] > MAX_PER_TEAM)
        .map(|team| (team.to_string(), counts[team]))
}

/// Confirm a player's data is complete enough to score.
pub fn check_player_data(player: &Player, horizon: usize) -> Result<(), SquadError> {
    if !player.has_complete_horizon(horizon) {
        return Err(SquadError::MissingProjection {
            player_id: player.id,
            horizon,
            available: player
                .projected_points
                .iter()
                .take_while(|p| p.is_finite())
                .count(),
        });
    }
    let numeric_fields: &[(&'static str, f64)] = &[
        ("price", player.price),
        ("sale_value", player.sale_value),
        ("minutes_volatility", player.risk.minutes_volatility),
        ("rotation_risk", player.risk.rotation_risk),
    ];
    for &(field, value) in numeric_fields {
        if !value.is_finite() || value < 0.0 {
            return Err(SquadError::InvalidValue {
                player_id: player.id,
                field,
                value,
            });
        }
    }
    Ok(())
}

impl SquadSnapshot {
    /// Resolve ids against the projection table and enforce the squad
    /// invariants: 15 distinct known players, 2/5/5/3, at most three per team,
    /// non-negative bank, complete projections over `horizon`.
    pub fn resolve<'a>(
        &self,
        projections: &'a ProjectionTable,
        horizon: usize,
    ) -> Result<ResolvedSquad<'a>, SquadError> {
        if self.player_ids.len() != SQUAD_SIZE {
            return Err(SquadError::WrongSize {
                expected: SQUAD_SIZE,
                found: self.player_ids.len(),
            });
        }

        if !self.bank.is_finite() || self.bank < 0.0 {
            return Err(SquadError::InvalidBank { bank: self.bank });
        }

        let mut seen = HashSet::with_capacity(SQUAD_SIZE);
        let mut players = Vec::with_capacity(SQUAD_SIZE);
        for &id in &self.player_ids {
            if !seen.insert(id) {
                return Err(SquadError::DuplicatePlayer { player_id: id });
            }
            let player = projections
                .get(id)
                .ok_or(SquadError::UnknownPlayer { player_id: id })?;
            check_player_data(player, horizon)?;
            players.push(player);
        }

        let counts = position_counts(players.iter().copied());
        if let Some((position, found)) = formation_violation(&counts) {
            return Err(SquadError::FormationMismatch {
                position,
                expected: position.squad_quota(),
                found,
            });
        }

        if let Some((team, count)) = team_limit_violation(players.iter().copied()) {
            return Err(SquadError::TeamLimitExceeded { team, count });
        }

        Ok(ResolvedSquad {
            players,
            bank: self.bank,
            free_transfers: self.free_transfers,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
