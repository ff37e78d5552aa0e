// Constraint validation for transfer skeletons.
//
// Checks run cheapest first and stop at the first failure. A failure is not
// an error: the skeleton is dropped and the reason is tallied.

use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::player::{Player, ProjectionTable};
use crate::squad::{formation_violation, position_counts, team_limit_violation, ResolvedSquad};

use super::candidates::PlanSkeleton;
use super::score::hit_points;

/// Money comparisons tolerate this much floating-point slack.
pub const MONEY_EPSILON: f64 = 1e-9;

/// Why a skeleton was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// More transfers than the engine cap.
    TransferCap,
    /// Resulting squad is not 15 distinct players in a 2/5/5/3 shape.
    Formation,
    /// More than three players from one team.
    TeamLimit,
    /// Bank would go negative.
    Budget,
    /// Hit steeper than the configured maximum.
    HitCap,
}

/// A skeleton that passed every check, with the derived squad and money.
#[derive(Debug, Clone)]
pub struct Admitted<'a> {
    pub skeleton: PlanSkeleton,
    /// Squad after the transfers, in squad slot order.
    pub players: Vec<&'a Player>,
    pub outgoing: Vec<&'a Player>,
    pub incoming: Vec<&'a Player>,
    pub bank_after: f64,
    pub hit_points: i32,
}

/// Run all checks against one skeleton.
pub fn validate_skeleton<'a>(
    skeleton: &PlanSkeleton,
    squad: &ResolvedSquad<'a>,
    projections: &'a ProjectionTable,
    config: &EngineConfig,
) -> Result<Admitted<'a>, Rejection> {
    let transfers = skeleton.transfers.as_slice();

    // 1. Transfer cap
    if transfers.len() > config.max_transfers {
        return Err(Rejection::TransferCap);
    }

    // 2. Squad shape: every sale must be an owned player, every purchase a
    //    known player from outside the squad, no repeats on either side.
    let owned: HashSet<_> = squad.ids().collect();
    let mut outs = HashSet::with_capacity(transfers.len());
    let mut incoming = Vec::with_capacity(transfers.len());
    let mut outgoing = Vec::with_capacity(transfers.len());
    for t in transfers {
        if !owned.contains(&t.out_player_id) || !outs.insert(t.out_player_id) {
            return Err(Rejection::Formation);
        }
        if owned.contains(&t.in_player_id) || incoming.iter().any(|p: &&Player| p.id == t.in_player_id) {
            return Err(Rejection::Formation);
        }
        let Some(player_in) = projections.get(t.in_player_id) else {
            return Err(Rejection::Formation);
        };
        incoming.push(player_in);
    }

    let mut players = Vec::with_capacity(squad.players.len());
    for &p in &squad.players {
        match transfers.iter().position(|t| t.out_player_id == p.id) {
            Some(k) => {
                outgoing.push(p);
                players.push(incoming[k]);
            }
            None => players.push(p),
        }
    }

    if formation_violation(&position_counts(players.iter().copied())).is_some() {
        return Err(Rejection::Formation);
    }

    // 3. Team concentration
    if team_limit_violation(players.iter().copied()).is_some() {
        return Err(Rejection::TeamLimit);
    }

    // 4. Budget
    let proceeds: f64 = outgoing.iter().map(|p| p.sale_value).sum();
    let cost: f64 = incoming.iter().map(|p| p.price).sum();
    let bank_after = squad.bank + proceeds - cost;
    if bank_after < -MONEY_EPSILON {
        return Err(Rejection::Budget);
    }

    // 5. Hit cap
    let hit = hit_points(transfers.len(), squad.free_transfers);
    if hit < config.max_hit {
        return Err(Rejection::HitCap);
    }

    Ok(Admitted {
        skeleton: *skeleton,
        players,
        outgoing,
        incoming,
        bank_after: bank_after.max(0.0),
        hit_points: hit,
    })
}
