//! Score Drift common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the sd-* crates:
//! - Batch and entity identity types
//! - Output table schema versioning
//! - The unified error taxonomy

pub mod error;
pub mod id;
pub mod schema;

pub use error::{Error, Result};
pub use id::{BatchIndex, EntityId};
pub use schema::SCHEMA_VERSION;
