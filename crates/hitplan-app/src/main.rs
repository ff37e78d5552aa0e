// Transfer planner entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout carries the JSON record)
// 2. Load config
// 3. Load projections and snapshot, run the engine
// 4. Print the output record

use std::path::{Path, PathBuf};

use anyhow::Context;
use hitplan_app::{app, config};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;

    // 1. Initialize tracing
    let log_path = init_tracing(&cwd)?;
    info!("Transfer planner starting up, logging to {}", log_path.display());

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: target GW{}, horizon {}, model {}",
        config.request.target_cycle, config.engine.horizon, config.request.model_version
    );

    // 3. Run
    let outcome = app::run(&config, &cwd)?;

    // 4. Output
    let json = outcome
        .report
        .to_json_pretty()
        .context("failed to serialize plan report")?;
    println!("{json}");

    info!(
        "Finished: {} plans from {} scored candidates",
        outcome.report.plans.len(),
        outcome.diagnostics.scored
    );
    Ok(())
}

/// Log file under `logs/`, appended to across runs.
const LOG_FILE: &str = "hitplan.log";

/// Used when `RUST_LOG` is unset: planner crates at info, everything else warn.
const DEFAULT_LOG_FILTER: &str = "hitplan=info,hitplan_app=info,hitplan_core=info,warn";

/// Send tracing output to `base_dir/logs/hitplan.log`; stdout carries only the
/// JSON record. Returns the log path.
fn init_tracing(base_dir: &Path) -> anyhow::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_path = log_dir.join(LOG_FILE);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(log_path)
}
