//! Report observer that records what the reporter would otherwise swallow.

use std::sync::Mutex;

use sand_mission::{MissionError, ReportObserver};

/// Records failed deliveries and acknowledgement statuses.
#[derive(Default)]
pub struct RecordingObserver {
    failures: Mutex<Vec<String>>,
    statuses: Mutex<Vec<u16>>,
}

impl RecordingObserver {
    /// Debug renderings of every swallowed failure, oldest first.
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.failures
            .lock()
            .map(|failures| failures.clone())
            .unwrap_or_default()
    }

    /// Status codes of every acknowledged report, oldest first.
    #[must_use]
    pub fn statuses(&self) -> Vec<u16> {
        self.statuses
            .lock()
            .map(|statuses| statuses.clone())
            .unwrap_or_default()
    }
}

impl ReportObserver for RecordingObserver {
    fn report_failed(&self, error: &MissionError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(format!("{error:?}"));
        }
    }

    fn acknowledged(&self, status: u16) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push(status);
        }
    }
}
