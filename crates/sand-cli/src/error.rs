//! CLI error type distinguishing operator mistakes from runtime failures.

use std::fmt::{self, Display, Formatter};

use sand_mission::MissionError;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl From<MissionError> for CliError {
    fn from(error: MissionError) -> Self {
        match error {
            MissionError::InvalidConfig {
                field,
                reason,
                value,
            } => Self::Validation(match value {
                Some(value) => format!("invalid {field} '{value}': {reason}"),
                None => format!("invalid {field}: {reason}"),
            }),
            other => Self::failure(other),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}
