//! Wire obfuscation shared with the controller.
//!
//! Standard padded base64 over the whole payload. This hides nothing from a
//! determined reader; it only keeps report bodies from being plain JSON.

use base64::{Engine as _, engine::general_purpose};

use crate::error::{MissionError, MissionResult};

/// Obfuscate a serialized payload for transmission.
#[must_use]
pub fn encode(payload: &[u8]) -> String {
    general_purpose::STANDARD.encode(payload)
}

/// Recover the bytes behind an obfuscated body.
///
/// Surrounding whitespace is ignored so trailing newlines from the controller
/// do not count as corruption.
///
/// # Errors
///
/// Returns [`MissionError::Decode`] when the body is not valid base64.
pub fn decode(body: &[u8]) -> MissionResult<Vec<u8>> {
    general_purpose::STANDARD
        .decode(body.trim_ascii())
        .map_err(|source| MissionError::Decode { source })
}
