//! # Design
//!
//! - Provide structured, constant-message errors for the mission pipeline.
//! - Capture operation context (paths, fields, endpoints) so failures are reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for mission operations.
pub type MissionResult<T> = Result<T, MissionError>;

/// Errors produced while running a mission.
#[derive(Debug, Error)]
pub enum MissionError {
    /// Directory traversal failed; aborts the scan and the cycle that requested it.
    #[error("mission scan failure")]
    Scan {
        /// Root the scan was started from.
        root: PathBuf,
        /// Entry that could not be traversed, when walkdir reports one.
        path: Option<PathBuf>,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// IO failures while appending the marker to a target.
    #[error("mission io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Report payload could not be serialized.
    #[error("mission report serialization failure")]
    Serialize {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The controller could not be reached or the exchange was interrupted.
    #[error("mission transport failure")]
    Transport {
        /// Operation that triggered the transport failure.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The controller acknowledgement was not valid obfuscated text.
    #[error("mission acknowledgement decode failure")]
    Decode {
        /// Underlying base64 error.
        source: base64::DecodeError,
    },
    /// The HTTP client could not be constructed.
    #[error("mission http client build failure")]
    ClientBuild {
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// Configuration values were invalid.
    #[error("invalid mission configuration")]
    InvalidConfig {
        /// Field name that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl MissionError {
    pub(crate) fn scan(root: impl Into<PathBuf>, source: walkdir::Error) -> Self {
        Self::Scan {
            root: root.into(),
            path: source.path().map(PathBuf::from),
            source,
        }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) const fn transport(
        operation: &'static str,
        url: String,
        source: reqwest::Error,
    ) -> Self {
        Self::Transport {
            operation,
            url,
            source,
        }
    }

    pub(crate) fn invalid_config(
        field: &'static str,
        reason: &'static str,
        value: Option<impl Into<String>>,
    ) -> Self {
        Self::InvalidConfig {
            field,
            reason,
            value: value.map(Into::into),
        }
    }

    /// Whether this error came from directory traversal.
    #[must_use]
    pub const fn is_scan_failure(&self) -> bool {
        matches!(self, Self::Scan { .. })
    }

    /// Whether this error reflects invalid operator input rather than a runtime failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}
