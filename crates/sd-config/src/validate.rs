//! Semantic validation of a parsed [`EtlConfig`].

use std::collections::HashSet;

use crate::config::EtlConfig;

/// A config that parsed but cannot drive the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("industry set is empty")]
    NoIndustries,

    #[error("industry {0:?} is listed more than once")]
    DuplicateIndustry(String),

    #[error("industry labels must not be blank")]
    BlankIndustry,

    #[error("delimiter and quote character are both {0:?}")]
    DelimiterIsQuote(char),

    #[error("{0:?} cannot be used as a delimiter or quote character")]
    LineBreakSeparator(char),

    #[error("scores table and drift table both point at {0}")]
    SharedTablePath(String),
}

pub type ValidationResult = Result<(), ValidationError>;

/// Check a config for problems serde cannot catch. Reports the first one.
pub fn validate(config: &EtlConfig) -> ValidationResult {
    if config.industries.is_empty() {
        return Err(ValidationError::NoIndustries);
    }
    let mut seen = HashSet::new();
    for label in config.industries.labels() {
        if label.trim().is_empty() {
            return Err(ValidationError::BlankIndustry);
        }
        if !seen.insert(label.as_str()) {
            return Err(ValidationError::DuplicateIndustry(label.clone()));
        }
    }

    for c in [config.delimiter, config.quote_char] {
        if c == '\n' || c == '\r' {
            return Err(ValidationError::LineBreakSeparator(c));
        }
    }
    if config.delimiter == config.quote_char {
        return Err(ValidationError::DelimiterIsQuote(config.delimiter));
    }

    if config.scores_table == config.drift_table {
        return Err(ValidationError::SharedTablePath(
            config.scores_table.display().to_string(),
        ));
    }
    Ok(())
}
