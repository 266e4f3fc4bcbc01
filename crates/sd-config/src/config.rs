//! Pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::industry::IndustrySet;
use crate::validate::{validate, ValidationError};

/// Default prefix batch files are resolved against (`<prefix>_<index>.json`).
pub const DEFAULT_INPUT_PREFIX: &str = "batches/batch";

/// Default file name of the main scores table.
pub const DEFAULT_SCORES_TABLE: &str = "scores_table.csv";

/// Default file name of the historical drift table.
pub const DEFAULT_DRIFT_TABLE: &str = "historical_percentiles_table.csv";

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

impl From<ConfigError> for sd_common::Error {
    fn from(err: ConfigError) -> Self {
        sd_common::Error::Config(err.to_string())
    }
}

/// Everything the pipeline needs to know up front.
///
/// Passed by value into the pipeline at construction; nothing reads process
/// state after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtlConfig {
    /// Industries that receive computed percentiles.
    pub industries: IndustrySet,

    /// Batch files are read from `<input_prefix>_<index>.json`.
    pub input_prefix: PathBuf,

    /// Main output table (`id, score, industry, percentile`).
    pub scores_table: PathBuf,

    /// Historical drift table (`run_id, id, percentile`).
    pub drift_table: PathBuf,

    /// Field separator for both tables.
    pub delimiter: char,

    /// Character used to quote fields that need it.
    pub quote_char: char,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            industries: IndustrySet::default(),
            input_prefix: PathBuf::from(DEFAULT_INPUT_PREFIX),
            scores_table: PathBuf::from(DEFAULT_SCORES_TABLE),
            drift_table: PathBuf::from(DEFAULT_DRIFT_TABLE),
            delimiter: ',',
            quote_char: '|',
        }
    }
}

impl EtlConfig {
    /// Parse a config from JSON and validate it. Missing fields take defaults.
    pub fn from_json(json: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: EtlConfig =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        validate(&config)?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, path)
    }

    /// Place both output tables inside `dir`, keeping their file names.
    pub fn with_output_dir(mut self, dir: &Path) -> Self {
        self.scores_table = rebase(&self.scores_table, dir);
        self.drift_table = rebase(&self.drift_table, dir);
        self
    }
}

fn rebase(path: &Path, dir: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => dir.join(name),
        None => dir.to_path_buf(),
    }
}
