//! Mission configuration and startup validation.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use url::Url;

use crate::error::{MissionError, MissionResult};

/// Controller base URL used when none is supplied.
pub const DEFAULT_SERVER: &str = "http://localhost:8888";
/// Mission length in seconds used when none is supplied.
pub const DEFAULT_DURATION_SECS: u64 = 60;
/// Extension targeted when none is supplied.
pub const DEFAULT_EXTENSION: &str = ".caldera";
/// Marker appended to each target when none is supplied.
pub const DEFAULT_MARKER: &str = "caldera wuz here";
/// Directory the scan starts from when none is supplied.
pub const DEFAULT_ROOT: &str = "/";

/// How long the mission loop keeps cycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionDuration {
    /// Stop once the wall-clock deadline has passed.
    Bounded(Duration),
    /// Cycle until the process is terminated.
    Unbounded,
}

impl MissionDuration {
    /// Bounded duration measured in whole seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self::Bounded(Duration::from_secs(secs))
    }

    /// Wall-clock deadline for a mission starting at `start`; `None` when unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::InvalidConfig`] when the duration reaches past
    /// what the platform clock can represent.
    pub fn deadline(self, start: Instant) -> MissionResult<Option<Instant>> {
        match self {
            Self::Bounded(duration) => start.checked_add(duration).map(Some).ok_or_else(|| {
                MissionError::invalid_config("duration", "too_large", Some(self.to_string()))
            }),
            Self::Unbounded => Ok(None),
        }
    }
}

impl Default for MissionDuration {
    fn default() -> Self {
        Self::from_secs(DEFAULT_DURATION_SECS)
    }
}

impl FromStr for MissionDuration {
    type Err = MissionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("unbounded") {
            return Ok(Self::Unbounded);
        }
        trimmed
            .parse::<u64>()
            .map(Self::from_secs)
            .map_err(|_| MissionError::invalid_config("duration", "not_seconds", Some(trimmed)))
    }
}

impl Display for MissionDuration {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(duration) => write!(formatter, "{}", duration.as_secs()),
            Self::Unbounded => formatter.write_str("unbounded"),
        }
    }
}

/// What a failed scan does to the rest of the mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanFailurePolicy {
    /// Abort the cycle and end the mission with the scan error.
    #[default]
    Abort,
    /// Abandon the cycle without mutating or reporting, then keep cycling.
    Skip,
}

impl ScanFailurePolicy {
    /// Stable label used in logs and CLI values.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Skip => "skip",
        }
    }
}

impl FromStr for ScanFailurePolicy {
    type Err = MissionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(MissionError::invalid_config(
                "on_scan_failure",
                "unknown_policy",
                Some(other),
            )),
        }
    }
}

/// Everything the mission loop needs to run.
#[derive(Debug, Clone)]
pub struct MissionConfig {
    /// Controller base URL; reports go to `{server}/sand/results`.
    pub server: Url,
    /// How long to keep cycling.
    pub duration: MissionDuration,
    /// Extension (leading dot included) of the files to mutate.
    pub extension: String,
    /// Text appended to each target.
    pub marker: String,
    /// Directory the scan starts from.
    pub root: PathBuf,
    /// Pause between cycles; zero runs cycles back to back.
    pub cycle_delay: Duration,
    /// Controller request timeout; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Behaviour when a scan fails.
    pub on_scan_failure: ScanFailurePolicy,
}

impl MissionConfig {
    /// Build a configuration with defaults for everything but the controller.
    #[must_use]
    pub fn new(server: Url) -> Self {
        Self {
            server,
            duration: MissionDuration::default(),
            extension: DEFAULT_EXTENSION.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            root: PathBuf::from(DEFAULT_ROOT),
            cycle_delay: Duration::ZERO,
            request_timeout: None,
            on_scan_failure: ScanFailurePolicy::default(),
        }
    }

    /// Check the values a mission cannot run without.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::InvalidConfig`] when the extension is not a
    /// dotted suffix, the duration overflows the clock, or the controller URL
    /// is not HTTP(S).
    pub fn validate(&self) -> MissionResult<()> {
        validate_extension(&self.extension)?;
        self.duration.deadline(Instant::now())?;
        match self.server.scheme() {
            "http" | "https" => Ok(()),
            _ => Err(MissionError::invalid_config(
                "server",
                "unsupported_scheme",
                Some(self.server.as_str()),
            )),
        }
    }
}

/// Parse a controller URL.
///
/// # Errors
///
/// Returns [`MissionError::InvalidConfig`] when the input is not an absolute URL.
pub fn parse_server(input: &str) -> MissionResult<Url> {
    input
        .trim()
        .parse::<Url>()
        .map_err(|_| MissionError::invalid_config("server", "invalid_url", Some(input)))
}

fn validate_extension(extension: &str) -> MissionResult<()> {
    let Some(rest) = extension.strip_prefix('.') else {
        return Err(MissionError::invalid_config(
            "extension",
            "missing_leading_dot",
            Some(extension),
        ));
    };
    if rest.is_empty() {
        return Err(MissionError::invalid_config(
            "extension",
            "empty_suffix",
            Some(extension),
        ));
    }
    if rest.contains(['.', '/', std::path::MAIN_SEPARATOR]) {
        return Err(MissionError::invalid_config(
            "extension",
            "not_a_single_suffix",
            Some(extension),
        ));
    }
    Ok(())
}
