#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Disruption mission engine: find targets, mark each once, report what changed.
//!
//! Layout: `scan.rs` (target discovery), `tracker.rs` (claim bookkeeping),
//! `mutate.rs` (marker append), `codec.rs` + `report.rs` (controller delivery),
//! `mission.rs` (the timed loop), `config.rs` and `error.rs` (shared plumbing).

pub mod codec;
pub mod config;
pub mod error;
pub mod mission;
pub mod mutate;
pub mod report;
pub mod scan;
pub mod tracker;

pub use config::{MissionConfig, MissionDuration, ScanFailurePolicy, parse_server};
pub use error::{MissionError, MissionResult};
pub use mission::{CycleSummary, Mission, MissionState, MissionSummary};
pub use mutate::MutationOutcome;
pub use report::{ReportObserver, Reporter};
pub use tracker::ProcessedSet;
