// Library root: data model, projection loading, engine configuration, the
// transfer-plan engine, and the output record.

pub mod config;
pub mod engine;
pub mod player;
pub mod projections;
pub mod report;
pub mod squad;

pub use config::EngineConfig;
pub use engine::{plan_transfers, EngineError, PlanOutcome, PlanRequest, SearchDiagnostics};
pub use report::{PlanReport, PlanStatus, TransferPlan};
