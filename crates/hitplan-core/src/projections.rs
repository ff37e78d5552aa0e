// Projection table loading.
//
// Reads the feature pipeline's per-player CSV: identity columns, price and
// sale value, risk sub-signals, and one `ep_<n>` column per projected cycle.
// Row order is kept; it is the ranked order of the candidate pool.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::player::{Player, PlayerId, Position, ProjectionTable, RiskSignals};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("line {line}: missing required column `{column}`")]
    MissingColumn { line: usize, column: &'static str },

    #[error("line {line}: invalid value {value:?} in column `{column}`")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error("line {line}: duplicate player id {id}")]
    DuplicateId { line: usize, id: PlayerId },

    #[error("validation error: {0}")]
    Validation(String),
}

/// Prefix of the per-cycle projection columns (`ep_1`, `ep_2`, ...).
const EP_PREFIX: &str = "ep_";

/// Availability code meaning "no news".
const STATUS_AVAILABLE: &str = "a";

// ---------------------------------------------------------------------------
// Row parsing helpers
// ---------------------------------------------------------------------------

type Row = HashMap<String, String>;

fn field<'r>(row: &'r Row, column: &str) -> Option<&'r str> {
    row.get(column).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn required<'r>(row: &'r Row, line: usize, column: &'static str) -> Result<&'r str, ProjectionError> {
    field(row, column).ok_or(ProjectionError::MissingColumn { line, column })
}

fn parse_f64(line: usize, column: &str, raw: &str) -> Result<f64, ProjectionError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProjectionError::InvalidValue {
            line,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

fn required_f64(row: &Row, line: usize, column: &'static str) -> Result<f64, ProjectionError> {
    parse_f64(line, column, required(row, line, column)?)
}

fn optional_f64(row: &Row, line: usize, column: &str) -> Result<Option<f64>, ProjectionError> {
    field(row, column)
        .map(|raw| parse_f64(line, column, raw))
        .transpose()
}

fn parse_flag(line: usize, column: &str, raw: &str) -> Result<bool, ProjectionError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ProjectionError::InvalidValue {
            line,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Collect the `ep_<n>` columns into a cycle-ordered vector. Cycles are kept
/// up to the first gap or empty cell; later cycles are unusable without it.
fn projected_points(row: &Row, line: usize) -> Result<Vec<f64>, ProjectionError> {
    let mut by_cycle: BTreeMap<usize, &str> = BTreeMap::new();
    for (column, value) in row {
        let Some(suffix) = column.trim().strip_prefix(EP_PREFIX) else {
            continue;
        };
        let Ok(cycle) = suffix.parse::<usize>() else {
            continue;
        };
        by_cycle.insert(cycle, value.trim());
    }

    let mut points = Vec::with_capacity(by_cycle.len());
    for (expected, (cycle, raw)) in (1..).zip(by_cycle) {
        if cycle != expected || raw.is_empty() {
            break;
        }
        points.push(parse_f64(line, &format!("{EP_PREFIX}{cycle}"), raw)?);
    }
    Ok(points)
}

fn parse_row(row: &Row, line: usize) -> Result<Player, ProjectionError> {
    let id_raw = required(row, line, "id")?;
    let id = id_raw
        .parse::<PlayerId>()
        .map_err(|_| ProjectionError::InvalidValue {
            line,
            column: "id".into(),
            value: id_raw.to_string(),
        })?;

    let position_raw = required(row, line, "position")?;
    let position =
        Position::from_str_pos(position_raw).ok_or_else(|| ProjectionError::InvalidValue {
            line,
            column: "position".into(),
            value: position_raw.to_string(),
        })?;

    let price = required_f64(row, line, "price")?;
    let sale_value = optional_f64(row, line, "sale_value")?.unwrap_or(price);

    // Risk signals feed the tie-break and the flags; a blank is an error.
    let injury_flag = match (field(row, "injury_flag"), field(row, "status")) {
        (Some(raw), _) => parse_flag(line, "injury_flag", raw)?,
        (None, Some(status)) => !status.eq_ignore_ascii_case(STATUS_AVAILABLE),
        (None, None) => {
            return Err(ProjectionError::MissingColumn {
                line,
                column: "injury_flag",
            })
        }
    };

    Ok(Player {
        id,
        name: required(row, line, "name")?.to_string(),
        team: required(row, line, "team")?.to_string(),
        position,
        price,
        sale_value,
        projected_points: projected_points(row, line)?,
        risk: RiskSignals {
            minutes_volatility: required_f64(row, line, "minutes_volatility")?,
            injury_flag,
            rotation_risk: required_f64(row, line, "rotation_risk")?,
        },
    })
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_from_reader<R: Read>(rdr: R, path: &str) -> Result<ProjectionTable, ProjectionError> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut table = ProjectionTable::new();

    for (idx, result) in reader.deserialize::<Row>().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let row = result.map_err(|e| ProjectionError::Csv {
            path: path.to_string(),
            source: e,
        })?;
        let player = parse_row(&row, line)?;
        if player.projected_points.is_empty() {
            warn!("player {} ({}) has no projected cycles", player.id, player.name);
        }
        let id = player.id;
        if table.insert(player).is_some() {
            return Err(ProjectionError::DuplicateId { line, id });
        }
    }

    debug!("loaded {} projection rows from {}", table.len(), path);
    Ok(table)
}

// ---------------------------------------------------------------------------
// Public loaders
// ---------------------------------------------------------------------------

/// Load a projection table from a CSV file.
pub fn load_projections(path: &Path) -> Result<ProjectionTable, ProjectionError> {
    let file = std::fs::File::open(path).map_err(|e| ProjectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let table = load_from_reader(file, &path.display().to_string())?;
    if table.is_empty() {
        return Err(ProjectionError::Validation(format!(
            "{} produced zero rows",
            path.display()
        )));
    }
    Ok(table)
}

/// Load a projection table from in-memory CSV text.
pub fn parse_projections(csv_text: &str) -> Result<ProjectionTable, ProjectionError> {
    load_from_reader(csv_text.as_bytes(), "<memory>")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
