// Plan scoring: best-eleven points per cycle, hit penalty, and comparison
// against the zero-transfer baseline.

use crate::config::{RiskWeights, HIT_COST};
use crate::player::{Player, PlayerId, Position};
use crate::squad::STARTING_XI;

use super::candidates::PlanSkeleton;
use super::risk::mean_risk;
use super::validate::Admitted;

/// Points charged for a plan with `transfer_count` transfers. Zero or
/// negative; each transfer beyond the free allowance costs `HIT_COST`.
pub fn hit_points(transfer_count: usize, free_transfers: u32) -> i32 {
    let extra = transfer_count.saturating_sub(free_transfers as usize);
    -(extra as i32) * HIT_COST
}

/// Projected points of the strongest legal eleven for one 1-based cycle.
///
/// One goalkeeper starts. The outfield minimums (3 DEF, 2 MID, 1 FWD) are
/// filled with the best players of each position, then the remaining places
/// go to the highest projections left, subject to the per-position maximums.
/// Equal projections fall back to player id.
pub fn best_xi_points(players: &[&Player], cycle: usize) -> f64 {
    let mut ranked: Vec<(f64, PlayerId, Position)> = players
        .iter()
        .map(|p| (p.projection(cycle).unwrap_or(0.0), p.id, p.position))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut starters = [0usize; 4];
    let mut chosen = vec![false; ranked.len()];
    let mut total = 0.0;

    for pos in Position::ALL {
        for (i, &(points, _, p)) in ranked.iter().enumerate() {
            if starters[pos.index()] >= pos.min_starters() {
                break;
            }
            if p == pos {
                chosen[i] = true;
                starters[pos.index()] += 1;
                total += points;
            }
        }
    }

    let mut picked: usize = starters.iter().sum();
    for (i, &(points, _, pos)) in ranked.iter().enumerate() {
        if picked >= STARTING_XI {
            break;
        }
        if chosen[i] || starters[pos.index()] >= pos.max_starters() {
            continue;
        }
        chosen[i] = true;
        starters[pos.index()] += 1;
        picked += 1;
        total += points;
    }

    total
}

/// Target-cycle and horizon totals for a squad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquadPoints {
    pub ep_gw1: f64,
    pub ep_horizon: f64,
}

pub fn squad_points(players: &[&Player], horizon: usize) -> SquadPoints {
    let mut ep_gw1 = 0.0;
    let mut ep_horizon = 0.0;
    for cycle in 1..=horizon {
        let points = best_xi_points(players, cycle);
        if cycle == 1 {
            ep_gw1 = points;
        }
        ep_horizon += points;
    }
    SquadPoints { ep_gw1, ep_horizon }
}

// ---------------------------------------------------------------------------
// Scored plans
// ---------------------------------------------------------------------------

/// A validated plan with its points and risk. Small enough to keep every one
/// the search produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPlan {
    pub skeleton: PlanSkeleton,
    pub bank_after: f64,
    pub hit_points: i32,
    pub points: SquadPoints,
    /// Mean risk of incoming players.
    pub risk_score: f64,
    /// Mean risk of outgoing players.
    pub outgoing_risk: f64,
}

impl ScoredPlan {
    pub fn num_transfers(&self) -> usize {
        self.skeleton.transfers.len()
    }

    /// Deltas and net gain relative to `baseline`.
    pub fn compare(&self, baseline: &ScoredPlan) -> PlanDelta {
        let gw1 = self.points.ep_gw1 - baseline.points.ep_gw1;
        let horizon = self.points.ep_horizon - baseline.points.ep_horizon;
        PlanDelta {
            gw1,
            horizon,
            net_gain: horizon + f64::from(self.hit_points),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanDelta {
    pub gw1: f64,
    pub horizon: f64,
    /// Horizon delta after the hit is charged.
    pub net_gain: f64,
}

/// Score an admitted plan.
pub fn score_plan(admitted: &Admitted<'_>, horizon: usize, weights: &RiskWeights) -> ScoredPlan {
    ScoredPlan {
        skeleton: admitted.skeleton,
        bank_after: admitted.bank_after,
        hit_points: admitted.hit_points,
        points: squad_points(&admitted.players, horizon),
        risk_score: mean_risk(admitted.incoming.iter().copied(), weights),
        outgoing_risk: mean_risk(admitted.outgoing.iter().copied(), weights),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::RiskSignals;

    fn p(id: PlayerId, position: Position, points: &[f64]) -> Player {
        Player {
            id,
            name: format!("P{id}"),
            team: "T".into(),
            position,
            price: 5.0,
            sale_value: 5.0,
            projected_points: points.to_vec(),
            risk: RiskSignals::default(),
        }
    }

    /// 2/5/5/3 squad where everybody projects `base` except the overrides.
    fn squad(base: f64, overrides: &[(PlayerId, f64)]) -> Vec<Player> {
        let layout = [
            (Position::Goalkeeper, 2),
            (Position::Defender, 5),
            (Position::Midfielder, 5),
            (Position::Forward, 3),
        ];
        let mut out = Vec::new();
        let mut id = 1;
        for (pos, n) in layout {
            for _ in 0..n {
                let pts = overrides
                    .iter()
                    .find(|(oid, _)| *oid == id)
                    .map(|&(_, v)| v)
                    .unwrap_or(base);
                out.push(p(id, pos, &[pts, pts]));
                id += 1;
            }
        }
        out
    }

    fn refs(players: &[Player]) -> Vec<&Player> {
        players.iter().collect()
    }

    #[test]
    fn hit_is_free_within_allowance() {
        assert_eq!(hit_points(0, 1), 0);
        assert_eq!(hit_points(1, 1), 0);
        assert_eq!(hit_points(2, 2), 0);
        assert_eq!(hit_points(1, 5), 0);
    }

    #[test]
    fn hit_charges_four_per_extra() {
        assert_eq!(hit_points(2, 1), -4);
        assert_eq!(hit_points(3, 1), -8);
        assert_eq!(hit_points(3, 0), -12);
    }

    #[test]
    fn flat_squad_scores_eleven_times_base() {
        let players = squad(2.0, &[]);
        assert!((best_xi_points(&refs(&players), 1) - 22.0).abs() < 1e-9);
    }

    #[test]
    fn only_one_goalkeeper_starts() {
        // Both keepers project 10; the second one must sit.
        let players = squad(1.0, &[(1, 10.0), (2, 10.0)]);
        assert!((best_xi_points(&refs(&players), 1) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn formation_minimums_are_honored() {
        // Every midfielder and forward is strong, defenders are weak. Three
        // defenders must still start, so only 7 of the 8 strong players fit.
        let mut overrides = Vec::new();
        for id in 8..=15 {
            overrides.push((id, 5.0));
        }
        let players = squad(0.0, &overrides);
        // 1 GKP (0) + 3 DEF (0) + 7 strong at 5.0
        assert!((best_xi_points(&refs(&players), 1) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn fifth_defender_beats_weak_forward() {
        // Defenders at 4, one weak forward at 0.5: the eleven uses 5 DEF and
        // the single required forward.
        let overrides = vec![(3, 4.0), (4, 4.0), (5, 4.0), (6, 4.0), (7, 4.0), (13, 3.0), (14, 0.5), (15, 0.5)];
        let players = squad(1.0, &overrides);
        // GKP 1 + DEF 20 + MID (4 x 1.0) + FWD 3.0
        assert!((best_xi_points(&refs(&players), 1) - 28.0).abs() < 1e-9);
    }

    #[test]
    fn horizon_sums_cycles() {
        let mut players = squad(1.0, &[]);
        players[14].projected_points = vec![1.0, 6.0];
        let pts = squad_points(&refs(&players), 2);
        assert!((pts.ep_gw1 - 11.0).abs() < 1e-9);
        assert!((pts.ep_horizon - 27.0).abs() < 1e-9);
    }

    #[test]
    fn compare_adds_hit_to_horizon_delta() {
        let skeleton = PlanSkeleton {
            seq: 0,
            transfers: Default::default(),
        };
        let base = ScoredPlan {
            skeleton,
            bank_after: 0.0,
            hit_points: 0,
            points: SquadPoints {
                ep_gw1: 50.0,
                ep_horizon: 150.0,
            },
            risk_score: 0.0,
            outgoing_risk: 0.0,
        };
        let plan = ScoredPlan {
            hit_points: -4,
            points: SquadPoints {
                ep_gw1: 51.0,
                ep_horizon: 153.0,
            },
            ..base
        };
        let delta = plan.compare(&base);
        assert!((delta.gw1 - 1.0).abs() < 1e-9);
        assert!((delta.horizon - 3.0).abs() < 1e-9);
        assert!((delta.net_gain + 1.0).abs() < 1e-9);
    }
}
