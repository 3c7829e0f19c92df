//! Delivery of per-cycle results to the controller.
//!
//! # Design
//! - One `POST {server}/sand/results` per cycle, body is the obfuscated JSON report.
//! - Transport failures are swallowed: logged, handed to the observer, never returned.
//! - The acknowledgement is decoded for diagnostics only and then dropped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::codec;
use crate::error::{MissionError, MissionResult};

/// Controller route that receives mission results.
pub const RESULTS_PATH: &str = "/sand/results";

/// Hook for observing what the reporter otherwise swallows.
pub trait ReportObserver: Send + Sync {
    /// A report could not be delivered.
    fn report_failed(&self, error: &MissionError);

    /// The controller answered; the status is recorded, the body is not.
    fn acknowledged(&self, _status: u16) {}
}

#[derive(Serialize)]
struct ResultsPayload<'a> {
    modified_files: &'a str,
}

/// Join paths into the comma-delimited list the controller expects.
#[must_use]
pub fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.to_string_lossy())
        .collect::<Vec<_>>()
        .join(",")
}

/// Canonical JSON for a cycle report, before obfuscation.
///
/// # Errors
///
/// Returns [`MissionError::Serialize`] if the payload cannot be encoded.
pub fn serialize_report(paths: &[PathBuf]) -> MissionResult<Vec<u8>> {
    let joined = join_paths(paths);
    serde_json::to_vec(&ResultsPayload {
        modified_files: &joined,
    })
    .map_err(|source| MissionError::Serialize { source })
}

/// Sends cycle reports to the controller.
#[derive(Clone)]
pub struct Reporter {
    client: Client,
    results_url: String,
    observer: Option<Arc<dyn ReportObserver>>,
}

impl Reporter {
    /// Build a reporter for `server`, optionally bounding each request.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::ClientBuild`] if the HTTP client cannot be constructed,
    /// or [`MissionError::InvalidConfig`] if `server` cannot carry a path.
    pub fn new(server: &Url, timeout: Option<Duration>) -> MissionResult<Self> {
        let builder = Client::builder();
        let builder = match timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };
        let client = builder
            .build()
            .map_err(|source| MissionError::ClientBuild { source })?;
        Self::with_client(client, server)
    }

    /// Build a reporter around an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::InvalidConfig`] if `server` cannot carry a path.
    pub fn with_client(client: Client, server: &Url) -> MissionResult<Self> {
        Ok(Self {
            client,
            results_url: results_url(server)?,
            observer: None,
        })
    }

    /// Attach an observer for swallowed failures and acknowledgements.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ReportObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Fully resolved results endpoint.
    #[must_use]
    pub fn results_url(&self) -> &str {
        &self.results_url
    }

    /// Deliver the paths modified this cycle. Never fails from the caller's view.
    pub async fn report(&self, paths: &[PathBuf]) {
        if let Err(err) = self.deliver(paths).await {
            warn!(url = %self.results_url, error = ?err, "report abandoned");
            if let Some(observer) = &self.observer {
                observer.report_failed(&err);
            }
        }
    }

    async fn deliver(&self, paths: &[PathBuf]) -> MissionResult<()> {
        let body = codec::encode(&serialize_report(paths)?);
        let response = self
            .client
            .post(self.results_url.as_str())
            .body(body)
            .send()
            .await
            .map_err(|err| MissionError::transport("send", self.results_url.clone(), err))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| MissionError::transport("read", self.results_url.clone(), err))?;
        if let Some(observer) = &self.observer {
            observer.acknowledged(status.as_u16());
        }

        match codec::decode(&bytes) {
            Ok(ack) => debug!(
                status = status.as_u16(),
                ack_bytes = ack.len(),
                "controller acknowledged report"
            ),
            Err(err) => debug!(
                status = status.as_u16(),
                error = ?err,
                "discarding undecodable acknowledgement"
            ),
        }
        Ok(())
    }
}

/// `{server}/sand/results`, keeping any base path and dropping query and fragment.
fn results_url(server: &Url) -> MissionResult<String> {
    let mut url = server.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| {
            MissionError::invalid_config("server", "cannot_be_a_base", Some(server.as_str()))
        })?
        .pop_if_empty()
        .extend(RESULTS_PATH.split('/').filter(|segment| !segment.is_empty()));
    Ok(url.into())
}
