// One planning run: read inputs named by the config, call the engine.

use std::path::{Path, PathBuf};

use anyhow::Context;
use hitplan_core::engine::{plan_transfers, PlanOutcome, PlanRequest};
use hitplan_core::projections::load_projections;
use tracing::info;

use crate::config::Config;
use crate::input::{data_timestamp, eligible_pool, load_snapshot};

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// Run the request described by `config`, with data paths relative to
/// `base_dir`.
pub fn run(config: &Config, base_dir: &Path) -> anyhow::Result<PlanOutcome> {
    let projections_path = resolve(base_dir, &config.data_paths.projections);
    let snapshot_path = resolve(base_dir, &config.data_paths.snapshot);

    let projections = load_projections(&projections_path)
        .with_context(|| format!("failed to load projections from {}", projections_path.display()))?;
    info!("Loaded {} projection rows", projections.len());

    let snapshot = load_snapshot(&snapshot_path)
        .with_context(|| format!("failed to load squad snapshot from {}", snapshot_path.display()))?;

    let pool = eligible_pool(&projections, config.engine.horizon);
    info!("Candidate pool has {} players", pool.len());

    let request = PlanRequest {
        snapshot: &snapshot,
        projections: &projections,
        pool: &pool,
        target_cycle: config.request.target_cycle,
        model_version: &config.request.model_version,
        data_timestamp_utc: data_timestamp(&projections_path),
    };

    plan_transfers(&request, &config.engine).context("transfer planning failed")
}
