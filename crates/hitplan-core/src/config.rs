// Engine parameters, passed by value into every request.

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Longest supported planning horizon, in cycles.
pub const MAX_HORIZON: usize = 6;

/// Most transfers a single plan may contain.
pub const MAX_TRANSFERS: usize = 3;

/// Points deducted per transfer beyond the free allowance.
pub const HIT_COST: i32 = 4;

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Weights used to collapse the three risk sub-signals into one score.
/// They are normalized by their sum, so only their ratios matter.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub rotation: f64,
    pub volatility: f64,
    pub injury: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            rotation: 0.55,
            volatility: 0.30,
            injury: 0.15,
        }
    }
}

impl RiskWeights {
    pub fn total(&self) -> f64 {
        self.rotation + self.volatility + self.injury
    }
}

/// All knobs the engine reads. Built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cycles scored per plan, starting at the target cycle.
    pub horizon: usize,
    /// Largest transfer count enumerated.
    pub max_transfers: usize,
    /// Steepest hit a plan may take (non-positive, e.g. -8).
    pub max_hit: i32,
    /// Net-gain gap below which two adjacent plans are ordered by risk.
    pub tie_tolerance: f64,
    /// Incoming candidates considered per position, taken from the top of
    /// the ranked pool. Smaller values trade completeness for speed.
    pub pool_size_per_position: usize,
    pub risk_weights: RiskWeights,
    /// Player risk at or above this is called out in explanations.
    pub high_risk_threshold: f64,
    /// Evaluate candidate batches on the rayon thread pool.
    pub parallel: bool,
    /// Skeletons pulled from the generator per evaluation batch.
    pub batch_size: usize,
    /// Optional wall-clock budget for the search, in milliseconds.
    pub time_budget_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            horizon: 3,
            max_transfers: 3,
            max_hit: -8,
            tie_tolerance: 1.0,
            pool_size_per_position: 10,
            risk_weights: RiskWeights::default(),
            high_risk_threshold: 0.6,
            parallel: true,
            batch_size: 4096,
            time_budget_ms: None,
        }
    }
}

impl EngineConfig {
    /// Check every field against its legal range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_HORIZON).contains(&self.horizon) {
            return Err(invalid(
                "horizon",
                format!("must be between 1 and {MAX_HORIZON}, got {}", self.horizon),
            ));
        }

        if self.max_transfers > MAX_TRANSFERS {
            return Err(invalid(
                "max_transfers",
                format!("must be at most {MAX_TRANSFERS}, got {}", self.max_transfers),
            ));
        }

        if self.max_hit > 0 {
            return Err(invalid(
                "max_hit",
                format!("must be <= 0, got {}", self.max_hit),
            ));
        }

        if !self.tie_tolerance.is_finite() || self.tie_tolerance < 0.0 {
            return Err(invalid(
                "tie_tolerance",
                format!("must be a finite value >= 0, got {}", self.tie_tolerance),
            ));
        }

        if self.pool_size_per_position == 0 {
            return Err(invalid("pool_size_per_position", "must be > 0".into()));
        }

        if self.batch_size == 0 {
            return Err(invalid("batch_size", "must be > 0".into()));
        }

        let w = &self.risk_weights;
        let weight_fields: &[(&str, f64)] = &[
            ("risk_weights.rotation", w.rotation),
            ("risk_weights.volatility", w.volatility),
            ("risk_weights.injury", w.injury),
        ];
        for (name, val) in weight_fields {
            if !val.is_finite() || *val < 0.0 {
                return Err(invalid(name, format!("must be a finite value >= 0, got {val}")));
            }
        }
        if w.total() <= 0.0 {
            return Err(invalid(
                "risk_weights",
                "at least one weight must be > 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.high_risk_threshold) {
            return Err(invalid(
                "high_risk_threshold",
                format!(
                    "must be between 0.0 and 1.0 inclusive, got {}",
                    self.high_risk_threshold
                ),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
