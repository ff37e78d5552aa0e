// Transfer-plan search: guard, enumerate, validate, score, rank, explain.
//
// One request runs synchronously over read-only inputs. Skeletons are pulled
// from the lazy generator in fixed-size batches; each batch is evaluated in
// parallel (or sequentially) with order preserved, so the result never
// depends on scheduling.

pub mod candidates;
pub mod explain;
pub mod guard;
pub mod rank;
pub mod risk;
pub mod score;
pub mod validate;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::player::{PlayerId, ProjectionTable};
use crate::report::{format_timestamp, round_points, PlanReport, PlanStatus, TransferPlan};
use crate::squad::{ResolvedSquad, SquadError, SquadSnapshot};

use candidates::{CandidatePool, CandidateSpace, PlanSkeleton, PoolError};
use explain::{build_reasons, ExplainContext};
use guard::{check_mode, ModeDecision};
use rank::{top_plans, RankKey};
use score::{score_plan, squad_points, PlanDelta, ScoredPlan};
use validate::{validate_skeleton, Rejection};

/// Plans returned per request.
pub const TOP_PLANS: usize = 3;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid squad snapshot: {0}")]
    Squad(#[from] SquadError),

    #[error("invalid candidate pool: {0}")]
    Pool(#[from] PoolError),

    #[error("target cycle must be >= 1")]
    InvalidTargetCycle,
}

// ---------------------------------------------------------------------------
// Request / outcome types
// ---------------------------------------------------------------------------

/// Everything one planning request reads. All borrowed, none mutated.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub snapshot: &'a SquadSnapshot,
    pub projections: &'a ProjectionTable,
    /// Incoming candidates, best first, as ranked upstream.
    pub pool: &'a [PlayerId],
    /// Absolute cycle number of the first projected cycle.
    pub target_cycle: u32,
    pub model_version: &'a str,
    pub data_timestamp_utc: DateTime<Utc>,
}

/// Search counters. Not part of the output record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchDiagnostics {
    pub generated: u64,
    pub rejected_transfer_cap: u64,
    pub rejected_formation: u64,
    pub rejected_team_limit: u64,
    pub rejected_budget: u64,
    pub rejected_hit_cap: u64,
    pub scored: u64,
    /// The time budget ran out before the generator was exhausted.
    pub truncated: bool,
}

impl SearchDiagnostics {
    fn record_rejection(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::TransferCap => self.rejected_transfer_cap += 1,
            Rejection::Formation => self.rejected_formation += 1,
            Rejection::TeamLimit => self.rejected_team_limit += 1,
            Rejection::Budget => self.rejected_budget += 1,
            Rejection::HitCap => self.rejected_hit_cap += 1,
        }
    }

    pub fn rejected(&self) -> u64 {
        self.rejected_transfer_cap
            + self.rejected_formation
            + self.rejected_team_limit
            + self.rejected_budget
            + self.rejected_hit_cap
    }
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub report: PlanReport,
    pub diagnostics: SearchDiagnostics,
}

/// A non-baseline plan with its comparison against the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluatedPlan {
    pub plan: ScoredPlan,
    pub delta: PlanDelta,
}

impl RankKey for EvaluatedPlan {
    fn net_gain(&self) -> f64 {
        self.delta.net_gain
    }

    fn risk(&self) -> f64 {
        self.plan.risk_score
    }

    fn seq(&self) -> u64 {
        self.plan.skeleton.seq
    }
}

/// Every plan the search scored, before ranking.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub baseline: ScoredPlan,
    /// Non-baseline plans in generation order.
    pub plans: Vec<EvaluatedPlan>,
    pub diagnostics: SearchDiagnostics,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

fn evaluate_batch(
    batch: &[PlanSkeleton],
    squad: &ResolvedSquad<'_>,
    projections: &ProjectionTable,
    config: &EngineConfig,
) -> Vec<Result<ScoredPlan, Rejection>> {
    let evaluate = |skeleton: &PlanSkeleton| {
        validate_skeleton(skeleton, squad, projections, config)
            .map(|admitted| score_plan(&admitted, config.horizon, &config.risk_weights))
    };
    if config.parallel {
        batch.par_iter().map(evaluate).collect()
    } else {
        batch.iter().map(evaluate).collect()
    }
}

fn run_search(
    space: &CandidateSpace,
    squad: &ResolvedSquad<'_>,
    projections: &ProjectionTable,
    config: &EngineConfig,
) -> (Vec<ScoredPlan>, SearchDiagnostics) {
    let started = Instant::now();
    let budget = config.time_budget_ms.map(Duration::from_millis);
    let mut diagnostics = SearchDiagnostics::default();
    let mut scored = Vec::new();
    let mut generator = space.iter().peekable();
    let mut batch: Vec<PlanSkeleton> = Vec::with_capacity(config.batch_size);

    loop {
        batch.clear();
        batch.extend(generator.by_ref().take(config.batch_size));
        if batch.is_empty() {
            break;
        }
        diagnostics.generated += batch.len() as u64;

        for result in evaluate_batch(&batch, squad, projections, config) {
            match result {
                Ok(plan) => {
                    diagnostics.scored += 1;
                    scored.push(plan);
                }
                Err(rejection) => diagnostics.record_rejection(rejection),
            }
        }
        debug!(
            "Batch evaluated: {} generated, {} scored so far",
            diagnostics.generated, diagnostics.scored
        );

        if let Some(budget) = budget {
            if started.elapsed() >= budget && generator.peek().is_some() {
                warn!(
                    "Time budget of {} ms exhausted after {} candidates, ranking partial results",
                    budget.as_millis(),
                    diagnostics.generated
                );
                diagnostics.truncated = true;
                break;
            }
        }
    }

    (scored, diagnostics)
}

/// Score the current squad as the zero-transfer plan.
fn baseline_plan(squad: &ResolvedSquad<'_>, horizon: usize) -> ScoredPlan {
    ScoredPlan {
        skeleton: PlanSkeleton {
            seq: 0,
            transfers: Default::default(),
        },
        bank_after: squad.bank,
        hit_points: 0,
        points: squad_points(&squad.players, horizon),
        risk_score: 0.0,
        outgoing_risk: 0.0,
    }
}

/// Resolve inputs and score every admissible plan. Does not apply the mode
/// guard or ranking; `plan_transfers` does both.
pub fn evaluate(request: &PlanRequest<'_>, config: &EngineConfig) -> Result<Evaluation, EngineError> {
    config.validate()?;
    let squad = request.snapshot.resolve(request.projections, config.horizon)?;
    let pool = CandidatePool::build(
        request.pool,
        request.projections,
        &squad,
        config.horizon,
        config.pool_size_per_position,
    )?;
    let space = CandidateSpace::new(&squad, &pool, config.max_transfers);

    let (scored, diagnostics) = run_search(&space, &squad, request.projections, config);

    let mut baseline = None;
    let mut others = Vec::with_capacity(scored.len());
    for plan in scored {
        if plan.skeleton.transfers.is_empty() {
            baseline = Some(plan);
        } else {
            others.push(plan);
        }
    }
    let baseline = baseline.unwrap_or_else(|| baseline_plan(&squad, config.horizon));

    let plans = others
        .into_iter()
        .map(|plan| EvaluatedPlan {
            delta: plan.compare(&baseline),
            plan,
        })
        .collect();

    Ok(Evaluation {
        baseline,
        plans,
        diagnostics,
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run one planning request end to end.
pub fn plan_transfers(request: &PlanRequest<'_>, config: &EngineConfig) -> Result<PlanOutcome, EngineError> {
    config.validate()?;
    if request.target_cycle == 0 {
        return Err(EngineError::InvalidTargetCycle);
    }

    if let ModeDecision::Unsupported(chip) = check_mode(request.snapshot) {
        info!("Special mode {:?} active, skipping optimization", chip);
        return Ok(PlanOutcome {
            report: PlanReport::special_mode(request.model_version, request.data_timestamp_utc),
            diagnostics: SearchDiagnostics::default(),
        });
    }

    info!(
        "Planning transfers for GW{}: squad of {}, pool of {}, horizon {}",
        request.target_cycle,
        request.snapshot.player_ids.len(),
        request.pool.len(),
        config.horizon
    );

    let evaluation = evaluate(request, config)?;
    let diagnostics = evaluation.diagnostics;
    info!(
        "Search finished: {} generated, {} scored, {} rejected \
         (transfer cap {}, formation {}, team limit {}, budget {}, hit cap {}){}",
        diagnostics.generated,
        diagnostics.scored,
        diagnostics.rejected(),
        diagnostics.rejected_transfer_cap,
        diagnostics.rejected_formation,
        diagnostics.rejected_team_limit,
        diagnostics.rejected_budget,
        diagnostics.rejected_hit_cap,
        if diagnostics.truncated { ", truncated" } else { "" }
    );

    let baseline = evaluation.baseline;
    let ranked = top_plans(evaluation.plans, config.tie_tolerance, TOP_PLANS);

    let ctx = ExplainContext {
        target_cycle: request.target_cycle,
        horizon: config.horizon,
        free_transfers: request.snapshot.free_transfers,
        high_risk_threshold: config.high_risk_threshold,
        risk_weights: &config.risk_weights,
    };
    let plans: Vec<TransferPlan> = ranked
        .iter()
        .map(|evaluated| {
            let mut out = TransferPlan::from_scored(&evaluated.plan, &baseline);
            let incoming: Vec<_> = evaluated
                .plan
                .skeleton
                .transfers
                .incoming()
                .filter_map(|id| request.projections.get(id))
                .collect();
            out.reasons = build_reasons(&out, &evaluated.plan, &incoming, &ctx);
            out
        })
        .collect();

    match plans.first() {
        Some(top) => {
            let moves: Vec<String> = top
                .transfers
                .iter()
                .map(|t| format!("{} -> {}", t.out_player_id, t.in_player_id))
                .collect();
            info!(
                "Top plan [{}]: {:+.2} pts after hits, risk {:.3}",
                moves.join(", "),
                top.delta_after_hit,
                top.risk_score
            );
        }
        None => info!("No feasible transfer plan"),
    }

    Ok(PlanOutcome {
        report: PlanReport {
            status: PlanStatus::Ok,
            plans,
            baseline_ep_gw1: Some(round_points(baseline.points.ep_gw1)),
            baseline_ep_horizon: Some(round_points(baseline.points.ep_horizon)),
            model_version: request.model_version.to_string(),
            data_timestamp_utc: format_timestamp(request.data_timestamp_utc),
        },
        diagnostics,
    })
}
