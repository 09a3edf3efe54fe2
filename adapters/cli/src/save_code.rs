use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use digi_defence_core::{RunState, TowerRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SAVE_DOMAIN: &str = "dd";
const SAVE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded run payload.
pub(crate) const SAVE_HEADER: &str = "dd:v1";
/// Delimiter used to separate the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Run progress and tower layout captured between waves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct SaveCode {
    /// Currency, lives, wave and mode.
    pub(crate) run: RunState,
    /// Towers in identifier order.
    #[serde(default)]
    pub(crate) towers: Vec<TowerRecord>,
}

impl SaveCode {
    /// Encodes the save into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, SaveCodeError> {
        let json = serde_json::to_vec(self).map_err(SaveCodeError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{SAVE_HEADER}{FIELD_DELIMITER}{encoded}"))
    }

    /// Decodes a save from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, SaveCodeError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SaveCodeError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
        let domain = parts.next().ok_or(SaveCodeError::MissingPrefix)?;
        let version = parts.next().ok_or(SaveCodeError::MissingVersion)?;
        let payload = parts.next().ok_or(SaveCodeError::MissingPayload)?;

        if domain != SAVE_DOMAIN {
            return Err(SaveCodeError::InvalidPrefix(domain.to_owned()));
        }
        if version != SAVE_VERSION {
            return Err(SaveCodeError::UnsupportedVersion(version.to_owned()));
        }

        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(SaveCodeError::InvalidEncoding)?;
        serde_json::from_slice(&bytes).map_err(SaveCodeError::InvalidPayload)
    }
}

/// Errors that can occur while encoding or decoding save codes.
#[derive(Debug, Error)]
pub(crate) enum SaveCodeError {
    /// The provided string was empty or contained only whitespace.
    #[error("save code was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("save code is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("save code is missing the version")]
    MissingVersion,
    /// The payload segment was missing.
    #[error("save code is missing the payload")]
    MissingPayload,
    /// The prefix segment was not `dd`.
    #[error("save prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version segment is unknown.
    #[error("save version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode save payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be (de)serialised.
    #[error("could not parse save payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}
