// Human-readable reasons for a recommended plan.

use crate::config::RiskWeights;
use crate::player::Player;
use crate::report::{round_points, TransferPlan};

use super::risk::player_risk;
use super::score::ScoredPlan;

/// Request-level facts the reasons refer to.
#[derive(Debug, Clone, Copy)]
pub struct ExplainContext<'a> {
    pub target_cycle: u32,
    pub horizon: usize,
    pub free_transfers: u32,
    pub high_risk_threshold: f64,
    pub risk_weights: &'a RiskWeights,
}

impl ExplainContext<'_> {
    fn cycle_label(&self) -> String {
        let last = self.target_cycle + self.horizon.saturating_sub(1) as u32;
        if last == self.target_cycle {
            format!("GW{}", self.target_cycle)
        } else {
            format!("GW{}-GW{}", self.target_cycle, last)
        }
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Build 2-4 reasons. `report` supplies the rounded numbers so the text
/// agrees with the record; `plan` supplies the unrounded risk split.
pub fn build_reasons(
    report: &TransferPlan,
    plan: &ScoredPlan,
    incoming: &[&Player],
    ctx: &ExplainContext<'_>,
) -> Vec<String> {
    let mut reasons = Vec::with_capacity(4);

    let net = report.delta_after_hit;
    let verdict = if net > 0.0 {
        "better than rolling the transfer"
    } else if net < 0.0 {
        "worse than rolling the transfer"
    } else {
        "level with rolling the transfer"
    };
    reasons.push(format!(
        "Net {net:+.2} pts over {} after hits, {verdict}",
        ctx.cycle_label()
    ));

    let moves = plural(report.num_transfers, "transfer");
    if report.hit_points < 0 {
        reasons.push(format!(
            "Takes a {} pt hit: {moves} with {} free",
            report.hit_points, ctx.free_transfers
        ));
    } else {
        reasons.push(format!(
            "No hit: {moves} covered by {} free",
            ctx.free_transfers
        ));
    }

    let risk_reduction = plan.outgoing_risk - plan.risk_score;
    if report.delta_vs_baseline_horizon > 0.0 {
        reasons.push(format!(
            "Driven by projected points: {:+.2} over the horizon",
            report.delta_vs_baseline_horizon
        ));
    } else if risk_reduction > 0.0 {
        reasons.push(format!(
            "Driven by lower risk: incoming {:.2} vs outgoing {:.2}",
            round_points(plan.risk_score),
            round_points(plan.outgoing_risk)
        ));
    }

    let flagged = incoming.iter().find(|p| p.risk.injury_flag);
    if let Some(p) = flagged {
        reasons.push(format!("Flag: {} carries an injury/news flag", p.name));
    } else if let Some((p, risk)) = incoming
        .iter()
        .map(|p| (p, player_risk(&p.risk, ctx.risk_weights)))
        .find(|&(_, risk)| risk >= ctx.high_risk_threshold)
    {
        reasons.push(format!("Flag: {} has high minutes risk ({:.2})", p.name, risk));
    }

    reasons
}
