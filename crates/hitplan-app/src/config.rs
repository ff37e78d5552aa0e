// Configuration loading and parsing (config/planner.toml).

use hitplan_core::config::{ConfigError as EngineConfigError, EngineConfig};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

impl From<EngineConfigError> for ConfigError {
    fn from(err: EngineConfigError) -> Self {
        match err {
            EngineConfigError::ValidationError { field, message } => ConfigError::ValidationError {
                field: format!("engine.{field}"),
                message,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Everything the binary needs for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    pub data_paths: DataPaths,
    pub request: RequestConfig,
}

/// On-disk shape of planner.toml.
#[derive(Debug, Clone, Deserialize)]
struct PlannerFile {
    data_paths: DataPaths,
    request: RequestConfig,
    #[serde(default)]
    engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    /// Projection table CSV, one row per player.
    pub projections: String,
    /// Squad snapshot JSON.
    pub snapshot: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestConfig {
    /// Absolute cycle number of the first projected cycle.
    pub target_cycle: u32,
    /// Version tag of the projection model, echoed in the output record.
    pub model_version: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/planner.toml` relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(PLANNER_FILE);
    let text = read_file(&path)?;
    let file: PlannerFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        engine: file.engine,
        data_paths: file.data_paths,
        request: file.request,
    };

    validate(&config)?;

    Ok(config)
}

/// The one file the planner reads from `config/`.
pub const PLANNER_FILE: &str = "planner.toml";

/// Seed `config/` with every `*.toml` in `defaults/` that is not there yet.
/// Existing files are never overwritten. Returns the files written, sorted.
///
/// Fails when neither directory can supply `planner.toml`.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let seeds = default_tomls(&base_dir.join("defaults"))?;

    if seeds.is_empty() {
        if config_dir.join(PLANNER_FILE).is_file() {
            return Ok(Vec::new());
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {PLANNER_FILE} in {} or its defaults/; \
                 run the planner from its project directory",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", config_dir.display()),
    })?;

    let mut copied = Vec::new();
    for source in seeds {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        if seed_file(&source, &target)? {
            info!("Seeded {} from defaults", target.display());
            copied.push(target);
        }
    }

    copied.sort();
    Ok(copied)
}

/// `*.toml` files directly under `dir`; empty when `dir` is missing.
fn default_tomls(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read {}: {e}", dir.display()),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to read entry in {}: {e}", dir.display()),
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    Ok(files)
}

/// Copy `source` to `target` unless `target` already exists. Returns whether
/// anything was written.
fn seed_file(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let copy_error = |action: &str, path: &Path, e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to {action} {}: {e}", path.display()),
    };

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error("create", target, e)),
    };
    let content = std::fs::read(source).map_err(|e| copy_error("read", source, e))?;
    dest.write_all(&content)
        .map_err(|e| copy_error("write", target, e))?;
    Ok(true)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.data_paths.projections.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data_paths.projections".into(),
            message: "must not be empty".into(),
        });
    }
    if config.data_paths.snapshot.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data_paths.snapshot".into(),
            message: "must not be empty".into(),
        });
    }

    if config.request.target_cycle == 0 {
        return Err(ConfigError::ValidationError {
            field: "request.target_cycle".into(),
            message: "must be >= 1".into(),
        });
    }
    if config.request.model_version.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "request.model_version".into(),
            message: "must not be empty".into(),
        });
    }

    config.engine.validate()?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
