//! Process-lifetime span carrying the mission identity.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the mission span entered for the lifetime of the process.
pub struct MissionContextGuard {
    _guard: Entered<'static>,
}

impl MissionContextGuard {
    /// Enter a `mission` span tagged with `mission_id` and the build SHA.
    #[must_use]
    pub fn new(mission_id: impl Into<String>) -> Self {
        let mission_id = mission_id.into();
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "mission",
            mission_id = %mission_id,
            build_sha = %build_sha()
        )));
        let guard = span.enter();
        Self { _guard: guard }
    }
}
