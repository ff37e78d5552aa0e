// Request inputs read from disk: squad snapshot, candidate pool, data
// timestamp.

use std::path::Path;

use chrono::{DateTime, Utc};
use hitplan_core::player::{PlayerId, ProjectionTable};
use hitplan_core::squad::{check_player_data, SquadSnapshot};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid squad snapshot in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Load the squad snapshot JSON.
pub fn load_snapshot(path: &Path) -> Result<SquadSnapshot, InputError> {
    let text = std::fs::read_to_string(path).map_err(|e| InputError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| InputError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

/// Candidate pool in projection-file order, limited to players that can be
/// scored over `horizon`. Rows the engine could not score are left out here
/// rather than failing the whole request.
pub fn eligible_pool(projections: &ProjectionTable, horizon: usize) -> Vec<PlayerId> {
    let mut pool = Vec::with_capacity(projections.len());
    let mut skipped = 0usize;
    for player in projections.iter() {
        match check_player_data(player, horizon) {
            Ok(()) => pool.push(player.id),
            Err(e) => {
                debug!("excluding player {} from pool: {}", player.id, e);
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!("{} projection rows excluded from the candidate pool", skipped);
    }
    pool
}

/// Modification time of the projection file, or now if unavailable.
pub fn data_timestamp(path: &Path) -> DateTime<Utc> {
    match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => DateTime::<Utc>::from(modified),
        Err(e) => {
            warn!("no modification time for {}: {}; using current time", path.display(), e);
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitplan_core::projections::parse_projections;
    use std::fs;

    #[test]
    fn pool_keeps_file_order_and_drops_short_rows() {
        let table = parse_projections(
            "id,name,team,position,price,minutes_volatility,injury_flag,rotation_risk,ep_1,ep_2,ep_3\n\
             30,A,X,MID,5.0,0,0,0,1,1,1\n\
             10,B,X,FWD,5.0,0,0,0,1,1,\n\
             20,C,Y,DEF,5.0,0,0,0,1,1,1\n",
        )
        .unwrap();
        assert_eq!(eligible_pool(&table, 3), vec![30, 20]);
        assert_eq!(eligible_pool(&table, 2), vec![30, 10, 20]);
    }

    #[test]
    fn snapshot_round_trips_from_file() {
        let tmp = std::env::temp_dir().join("hitplan_input_snapshot");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("snapshot.json");
        fs::write(
            &path,
            r#"{"player_ids": [1, 2, 3], "bank": 1.5, "free_transfers": 2}"#,
        )
        .unwrap();

        let snap = load_snapshot(&path).unwrap();
        assert_eq!(snap.player_ids, vec![1, 2, 3]);
        assert_eq!(snap.free_transfers, 2);
        assert!(snap.active_chip.is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn snapshot_errors_carry_path() {
        let missing = std::env::temp_dir().join("hitplan_input_missing/snapshot.json");
        match load_snapshot(&missing).unwrap_err() {
            InputError::Io { path, .. } => assert!(path.ends_with("snapshot.json")),
            other => panic!("expected Io, got: {other}"),
        }

        let tmp = std::env::temp_dir().join("hitplan_input_bad_json");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("snapshot.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_snapshot(&path).unwrap_err(), InputError::Json { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn timestamp_falls_back_to_now() {
        let before = Utc::now();
        let ts = data_timestamp(Path::new("/definitely/not/here.csv"));
        assert!(ts >= before);
    }
}
