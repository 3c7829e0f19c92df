//! The scan → claim → mutate → report loop.
//!
//! # Design
//! - Cycles run strictly one after another; nothing inside a cycle is cancelled.
//! - The deadline is checked before every cycle, so an elapsed or zero duration runs none.
//! - The processed set lives here and is only touched through `claim_new`.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{error, info, warn};

use crate::config::{MissionConfig, ScanFailurePolicy};
use crate::error::MissionResult;
use crate::mutate;
use crate::report::Reporter;
use crate::scan::scan;
use crate::tracker::ProcessedSet;

/// Lifecycle of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionState {
    /// Cycles are still being scheduled.
    Running,
    /// The deadline passed or a fatal error ended the mission. Terminal.
    Done,
}

/// What a single cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Matching paths the scan found, including ones claimed earlier.
    pub discovered: usize,
    /// Paths claimed for the first time this cycle.
    pub claimed: usize,
    /// Paths the marker was appended to, in scan order. This is what got reported.
    pub modified: Vec<PathBuf>,
}

/// Totals across every cycle of a mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissionSummary {
    /// Cycles that completed and reported.
    pub cycles: u64,
    /// Cycles abandoned after a scan failure.
    pub skipped_cycles: u64,
    /// Paths claimed over the whole mission.
    pub files_claimed: usize,
    /// Paths successfully marked over the whole mission.
    pub files_modified: usize,
}

impl MissionSummary {
    fn record(&mut self, cycle: &CycleSummary) {
        self.cycles += 1;
        self.files_claimed += cycle.claimed;
        self.files_modified += cycle.modified.len();
    }
}

/// A configured mission and the state it accumulates while running.
pub struct Mission {
    config: MissionConfig,
    processed: ProcessedSet,
    reporter: Reporter,
    state: MissionState,
}

impl Mission {
    /// Validate `config` and build a mission reporting to its server.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the HTTP client cannot be built.
    pub fn new(config: MissionConfig) -> MissionResult<Self> {
        config.validate()?;
        let reporter = Reporter::new(&config.server, config.request_timeout)?;
        Ok(Self::with_reporter(config, reporter))
    }

    /// Build a mission around a pre-configured reporter.
    #[must_use]
    pub fn with_reporter(config: MissionConfig, reporter: Reporter) -> Self {
        Self {
            config,
            processed: ProcessedSet::new(),
            reporter,
            state: MissionState::Running,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> MissionState {
        self.state
    }

    /// Paths claimed so far.
    #[must_use]
    pub const fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    /// Run one full cycle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MissionError::Scan`] when the scan fails; nothing is
    /// claimed, marked, or reported in that case.
    pub async fn run_cycle(&mut self) -> MissionResult<CycleSummary> {
        info!("mission cycle starting");
        let discovered = scan(&self.config.root, &self.config.extension)?;
        let found = discovered.len();
        let claimed = self.processed.claim_new(discovered);
        let claimed_count = claimed.len();
        let modified = mutate::apply(claimed, &self.config.marker);
        for path in &modified {
            info!(path = %path.display(), "modified target");
        }
        self.reporter.report(&modified).await;
        Ok(CycleSummary {
            discovered: found,
            claimed: claimed_count,
            modified,
        })
    }

    /// Cycle until the configured duration elapses.
    ///
    /// Runs forever for [`crate::MissionDuration::Unbounded`] unless a fatal error occurs.
    /// Calling this again after the mission is done returns immediately.
    ///
    /// # Errors
    ///
    /// Returns the scan error that ended the mission under [`ScanFailurePolicy::Abort`],
    /// or [`crate::MissionError::InvalidConfig`] when the duration overflows the clock.
    pub async fn run(&mut self) -> MissionResult<MissionSummary> {
        let deadline = match self.config.duration.deadline(std::time::Instant::now()) {
            Ok(deadline) => deadline.map(Instant::from_std),
            Err(err) => {
                self.state = MissionState::Done;
                return Err(err);
            }
        };
        info!(
            duration = %self.config.duration,
            server = %self.config.server,
            "running mission"
        );

        let mut summary = MissionSummary::default();
        while self.state == MissionState::Running {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                self.state = MissionState::Done;
                break;
            }

            match self.run_cycle().await {
                Ok(cycle) => summary.record(&cycle),
                Err(err)
                    if err.is_scan_failure()
                        && self.config.on_scan_failure == ScanFailurePolicy::Skip =>
                {
                    warn!(error = ?err, "scan failed; cycle abandoned");
                    summary.skipped_cycles += 1;
                }
                Err(err) => {
                    error!(error = ?err, "scan failed; mission aborted");
                    self.state = MissionState::Done;
                    return Err(err);
                }
            }

            pause(self.config.cycle_delay).await;
        }

        info!(
            cycles = summary.cycles,
            modified = summary.files_modified,
            "done with mission"
        );
        Ok(summary)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MissionDuration, parse_server};
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    fn offline_config(root: &TempDir) -> Result<MissionConfig> {
        let mut config = MissionConfig::new(parse_server("http://127.0.0.1:9")?);
        config.root = root.path().to_path_buf();
        config.marker = "X".to_string();
        config.request_timeout = Some(Duration::from_millis(200));
        Ok(config)
    }

    #[tokio::test]
    async fn zero_duration_runs_no_cycles() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("a.caldera"), "")?;
        let mut config = offline_config(&temp)?;
        config.duration = MissionDuration::from_secs(0);

        let mut mission = Mission::new(config)?;
        let summary = mission.run().await?;
        assert_eq!(summary, MissionSummary::default());
        assert_eq!(mission.state(), MissionState::Done);
        assert_eq!(fs::read_to_string(temp.path().join("a.caldera"))?, "");
        Ok(())
    }

    #[tokio::test]
    async fn cycle_counts_discovered_claimed_and_modified() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("a.caldera"), "")?;
        fs::create_dir(temp.path().join("locked.caldera"))?;
        let mut mission = Mission::new(offline_config(&temp)?)?;

        let first = mission.run_cycle().await?;
        assert_eq!(first.discovered, 2);
        assert_eq!(first.claimed, 2);
        assert_eq!(first.modified, vec![temp.path().join("a.caldera")]);

        let second = mission.run_cycle().await?;
        assert_eq!(second.discovered, 2);
        assert_eq!(second.claimed, 0);
        assert!(second.modified.is_empty());
        assert_eq!(mission.processed().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn abort_policy_ends_mission_on_scan_failure() -> Result<()> {
        let temp = TempDir::new()?;
        let mut config = offline_config(&temp)?;
        config.root = temp.path().join("gone");

        let mut mission = Mission::new(config)?;
        let err = mission.run().await.expect_err("scan failure should abort");
        assert!(err.is_scan_failure());
        assert_eq!(mission.state(), MissionState::Done);

        let again = mission.run().await?;
        assert_eq!(again, MissionSummary::default());
        Ok(())
    }

    #[tokio::test]
    async fn skip_policy_keeps_cycling_until_deadline() -> Result<()> {
        let temp = TempDir::new()?;
        let mut config = offline_config(&temp)?;
        config.root = temp.path().join("gone");
        config.on_scan_failure = ScanFailurePolicy::Skip;
        config.duration = MissionDuration::Bounded(Duration::from_millis(200));
        config.cycle_delay = Duration::from_millis(50);

        let mut mission = Mission::new(config)?;
        let summary = mission.run().await?;
        assert_eq!(summary.cycles, 0);
        assert!(summary.skipped_cycles >= 2);
        assert_eq!(mission.state(), MissionState::Done);
        Ok(())
    }

    #[tokio::test]
    async fn oversized_duration_fails_instead_of_overflowing() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("a.caldera"), "")?;
        let mut config = offline_config(&temp)?;
        config.duration = "18446744073709551615".parse()?;
        let Err(err) = Mission::new(config.clone()) else {
            anyhow::bail!("expected validation failure");
        };
        assert!(err.is_validation());

        let reporter = Reporter::new(&config.server, config.request_timeout)?;
        let mut mission = Mission::with_reporter(config, reporter);
        let err = mission.run().await.expect_err("overflowing deadline should fail");
        assert!(err.is_validation());
        assert_eq!(mission.state(), MissionState::Done);
        assert_eq!(fs::read_to_string(temp.path().join("a.caldera"))?, "");
        Ok(())
    }

    #[test]
    fn new_rejects_invalid_configuration() -> Result<()> {
        let temp = TempDir::new()?;
        let mut config = offline_config(&temp)?;
        config.extension = "caldera".to_string();
        let Err(err) = Mission::new(config) else {
            anyhow::bail!("expected validation failure");
        };
        assert!(err.is_validation());
        Ok(())
    }
}
