//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum WarmstartError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The variable-name sets of two networks do not match.
    ///
    /// Raised once at agent construction; the target critic must expose
    /// exactly the same named parameters as the critic it tracks.
    #[error("Parameter name sets do not match: {0}")]
    ParamNameMismatch(String),
}
