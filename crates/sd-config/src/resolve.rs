//! Config resolution: CLI → environment → config file → defaults.

use std::path::PathBuf;

use crate::config::{ConfigError, EtlConfig};
use crate::industry::IndustrySet;
use crate::validate::validate;

/// Env var naming a JSON config file.
pub const ENV_CONFIG: &str = "SCORE_DRIFT_CONFIG";
/// Env var overriding the batch input prefix.
pub const ENV_INPUT: &str = "SCORE_DRIFT_INPUT";
/// Env var placing both output tables in a directory.
pub const ENV_OUT_DIR: &str = "SCORE_DRIFT_OUT_DIR";

/// Values supplied on the command line. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub input_prefix: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub scores_table: Option<PathBuf>,
    pub drift_table: Option<PathBuf>,
    pub industries: Vec<String>,
}

/// Resolve the effective config from the process environment.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<EtlConfig, ConfigError> {
    resolve_with_env(overrides, |key| std::env::var(key).ok())
}

/// Resolve the effective config with an explicit environment lookup.
///
/// Later layers win: defaults, then the config file (CLI path, else
/// `SCORE_DRIFT_CONFIG`), then env vars, then explicit CLI values.
pub fn resolve_with_env<F>(overrides: &ConfigOverrides, env: F) -> Result<EtlConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config_path = overrides
        .config_path
        .clone()
        .or_else(|| env(ENV_CONFIG).filter(|v| !v.is_empty()).map(PathBuf::from));

    let mut config = match config_path {
        Some(path) => EtlConfig::load_from_file(&path)?,
        None => EtlConfig::default(),
    };

    if let Some(prefix) = env(ENV_INPUT).filter(|v| !v.is_empty()) {
        config.input_prefix = PathBuf::from(prefix);
    }
    if let Some(dir) = env(ENV_OUT_DIR).filter(|v| !v.is_empty()) {
        config = config.with_output_dir(&PathBuf::from(dir));
    }

    if let Some(prefix) = &overrides.input_prefix {
        config.input_prefix = prefix.clone();
    }
    if let Some(dir) = &overrides.out_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(path) = &overrides.scores_table {
        config.scores_table = path.clone();
    }
    if let Some(path) = &overrides.drift_table {
        config.drift_table = path.clone();
    }
    if !overrides.industries.is_empty() {
        config.industries = IndustrySet::new(overrides.industries.iter().cloned());
    }

    validate(&config)?;
    Ok(config)
}
