// Risk aggregation.
//
// A player's risk is a weighted blend of rotation risk, minutes volatility,
// and the injury/news flag, normalized by the weight total so the result
// stays in [0, 1]. A plan's risk is the mean over the players it brings in.

use crate::config::RiskWeights;
use crate::player::{Player, RiskSignals};

/// Collapse one player's sub-signals into a single score in [0, 1].
pub fn player_risk(signals: &RiskSignals, weights: &RiskWeights) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }
    let rotation = signals.rotation_risk.clamp(0.0, 1.0);
    let volatility = signals.minutes_volatility.clamp(0.0, 1.0);
    let injury = if signals.injury_flag { 1.0 } else { 0.0 };

    let blended =
        weights.rotation * rotation + weights.volatility * volatility + weights.injury * injury;
    (blended / total).clamp(0.0, 1.0)
}

/// Mean risk of the given players. An empty set introduces no risk, which is
/// how the zero-transfer plan gets a score of exactly 0.
pub fn mean_risk<'p>(players: impl IntoIterator<Item = &'p Player>, weights: &RiskWeights) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for p in players {
        sum += player_risk(&p.risk, weights);
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
