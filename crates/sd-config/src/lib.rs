//! Score Drift configuration loading and validation.
//!
//! This crate provides:
//! - The typed [`EtlConfig`] passed into the pipeline at construction
//! - The closed [`IndustrySet`] percentiles are computed for
//! - Config resolution (CLI → env → config file → defaults)
//! - Semantic validation

pub mod config;
pub mod industry;
pub mod resolve;
pub mod validate;

pub use config::{ConfigError, EtlConfig};
pub use industry::IndustrySet;
pub use resolve::{resolve_config, resolve_with_env, ConfigOverrides};
pub use validate::{validate, ValidationError, ValidationResult};
