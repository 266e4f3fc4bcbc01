//! Exit codes for the score-drift CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.

use sd_common::Error;

/// Exit codes for score-drift operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// All requested batches processed
    Clean = 0,

    /// Query returned nothing (e.g. unknown entity in `drift`)
    NoData = 1,

    /// Configuration error
    ConfigError = 10,

    /// A batch was missing or out of order
    SourceError = 11,

    /// A batch contained a structurally malformed record
    MalformedInput = 12,

    /// Output table could not be written or read
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::NoData)
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) => ExitCode::ConfigError,
            Error::BatchUnavailable { .. } | Error::OutOfOrder { .. } => ExitCode::SourceError,
            Error::MalformedRecord { .. } => ExitCode::MalformedInput,
            Error::WriteFailure { .. } | Error::TableRead { .. } | Error::Io(_) => {
                ExitCode::IoError
            }
            Error::Json(_) => ExitCode::InternalError,
        }
    }
}
