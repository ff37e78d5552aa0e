// Output record returned to callers and serialized as JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::candidates::Transfer;
use crate::engine::score::ScoredPlan;

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

fn round_to(value: f64, scale: f64) -> f64 {
    // `+ 0.0` folds -0.0 into 0.0 so it never prints as "-0".
    (value * scale).round() / scale + 0.0
}

/// Points and money: 2 decimals, half away from zero.
pub fn round_points(value: f64) -> f64 {
    round_to(value, 100.0)
}

/// Risk scores: 3 decimals.
pub fn round_risk(value: f64) -> f64 {
    round_to(value, 1000.0)
}

/// RFC 3339 with whole seconds and a `Z` suffix.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Ok,
    SpecialModeUnsupported,
}

/// One recommended plan as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferPlan {
    pub transfers: Vec<Transfer>,
    pub num_transfers: usize,
    pub hit_points: i32,
    pub bank_after: f64,
    pub ep_gw1: f64,
    pub ep_horizon: f64,
    pub delta_vs_baseline_gw1: f64,
    pub delta_vs_baseline_horizon: f64,
    pub delta_after_hit: f64,
    pub risk_score: f64,
    pub reasons: Vec<String>,
}

impl TransferPlan {
    /// Round a scored plan for output. Deltas are taken from the rounded
    /// totals so `delta_after_hit == delta_vs_baseline_horizon + hit_points`
    /// holds on the reported numbers.
    pub fn from_scored(plan: &ScoredPlan, baseline: &ScoredPlan) -> Self {
        let ep_gw1 = round_points(plan.points.ep_gw1);
        let ep_horizon = round_points(plan.points.ep_horizon);
        let delta_gw1 = round_points(ep_gw1 - round_points(baseline.points.ep_gw1));
        let delta_horizon = round_points(ep_horizon - round_points(baseline.points.ep_horizon));

        Self {
            transfers: plan.skeleton.transfers.as_slice().to_vec(),
            num_transfers: plan.num_transfers(),
            hit_points: plan.hit_points,
            bank_after: round_points(plan.bank_after),
            ep_gw1,
            ep_horizon,
            delta_vs_baseline_gw1: delta_gw1,
            delta_vs_baseline_horizon: delta_horizon,
            delta_after_hit: round_points(delta_horizon + f64::from(plan.hit_points)),
            risk_score: round_risk(plan.risk_score),
            reasons: Vec::new(),
        }
    }
}

/// The full response for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub status: PlanStatus,
    pub plans: Vec<TransferPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_ep_gw1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_ep_horizon: Option<f64>,
    pub model_version: String,
    pub data_timestamp_utc: String,
}

impl PlanReport {
    /// Status-only record for a chip week.
    pub fn special_mode(model_version: &str, data_timestamp_utc: DateTime<Utc>) -> Self {
        Self {
            status: PlanStatus::SpecialModeUnsupported,
            plans: Vec::new(),
            baseline_ep_gw1: None,
            baseline_ep_horizon: None,
            model_version: model_version.to_string(),
            data_timestamp_utc: format_timestamp(data_timestamp_utc),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::candidates::{PlanSkeleton, TransferSet};
    use crate::engine::score::SquadPoints;
    use chrono::TimeZone;

    fn scored(transfers: &[Transfer], hit: i32, gw1: f64, horizon: f64) -> ScoredPlan {
        ScoredPlan {
            skeleton: PlanSkeleton {
                seq: 0,
                transfers: TransferSet::from_slice(transfers).unwrap(),
            },
            bank_after: 0.5,
            hit_points: hit,
            points: SquadPoints {
                ep_gw1: gw1,
                ep_horizon: horizon,
            },
            risk_score: 0.12345,
            outgoing_risk: 0.0,
        }
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_points(1.005 + 1e-12), 1.01);
        assert_eq!(round_points(-2.345 - 1e-12), -2.35);
        assert_eq!(round_points(2.0), 2.0);
        assert_eq!(round_risk(0.12345), 0.123);
    }

    #[test]
    fn negative_zero_is_normalized() {
        let r = round_points(-0.001);
        assert_eq!(r, 0.0);
        assert!(r.is_sign_positive());
    }

    #[test]
    fn timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2024, 8, 16, 17, 30, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2024-08-16T17:30:00Z");
    }

    #[test]
    fn reported_identity_holds_on_rounded_values() {
        let t = Transfer {
            out_player_id: 1,
            in_player_id: 2,
        };
        let base = scored(&[], 0, 50.004, 150.006);
        let plan = scored(&[t, Transfer { out_player_id: 3, in_player_id: 4 }], -4, 51.333, 153.337);
        let out = TransferPlan::from_scored(&plan, &base);

        assert_eq!(out.num_transfers, 2);
        assert_eq!(out.hit_points, -4);
        assert_eq!(out.ep_horizon, 153.34);
        assert_eq!(out.delta_vs_baseline_horizon, 3.33);
        assert_eq!(out.delta_after_hit, -0.67);
        assert_eq!(out.risk_score, 0.123);
    }

    #[test]
    fn special_mode_omits_baseline_fields() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let report = PlanReport::special_mode("v1", ts);
        let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["status"], "special_mode_unsupported");
        assert_eq!(json["plans"].as_array().unwrap().len(), 0);
        assert!(json.get("baseline_ep_gw1").is_none());
        assert!(json.get("baseline_ep_horizon").is_none());
        assert_eq!(json["model_version"], "v1");
        assert_eq!(json["data_timestamp_utc"], "2024-01-02T03:04:05Z");
    }
}
