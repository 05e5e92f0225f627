//! Dial info carried in the metadata of outbound jobs.
//!
//! Metadata is validated in a single strict step: it must be a JSON object
//! with exactly the fields of [`DialInfo`], and the phone number must be in
//! E.164 form. Anything else is rejected with a descriptive error; there is
//! no best-effort recovery of malformed payloads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of digits accepted after the leading `+`.
const MIN_PHONE_DIGITS: usize = 8;

/// Maximum number of digits allowed by E.164.
const MAX_PHONE_DIGITS: usize = 15;

/// The target of an outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DialInfo {
    /// Callee number in E.164 form, e.g. `+51987654321`.
    pub phone_number: String,
    /// Name of the person being called.
    #[serde(default)]
    pub name: Option<String>,
    /// Human-readable appointment time the call is about.
    #[serde(default)]
    pub appointment_time: Option<String>,
}

/// Errors produced while validating job metadata.
#[derive(Debug, Error)]
pub enum DialInfoError {
    /// The metadata is not a JSON object matching the dial-info schema.
    #[error("dial info metadata does not match the expected schema: {0}")]
    Schema(#[from] serde_json::Error),

    /// The phone number is not a valid E.164 number.
    #[error("invalid phone number '{0}': expected '+' followed by 8 to 15 digits")]
    InvalidPhoneNumber(String),
}

impl DialInfo {
    /// Parses and validates job metadata.
    ///
    /// Surrounding whitespace is trimmed from every field and empty optional
    /// fields are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`DialInfoError::Schema`] if the metadata is not valid JSON,
    /// is not an object, lacks `phone_number`, or carries unknown fields, and
    /// [`DialInfoError::InvalidPhoneNumber`] if the number is not E.164.
    pub fn from_metadata(metadata: &str) -> Result<Self, DialInfoError> {
        let raw: DialInfo = serde_json::from_str(metadata)?;

        let phone_number = raw.phone_number.trim().to_string();
        validate_e164(&phone_number)?;

        Ok(Self {
            phone_number,
            name: non_empty(raw.name),
            appointment_time: non_empty(raw.appointment_time),
        })
    }

    /// Returns the digits of the phone number without the leading `+`.
    pub fn digits(&self) -> &str {
        self.phone_number.trim_start_matches('+')
    }
}

fn validate_e164(number: &str) -> Result<(), DialInfoError> {
    let digits = number
        .strip_prefix('+')
        .ok_or_else(|| DialInfoError::InvalidPhoneNumber(number.to_string()))?;

    let valid = (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !digits.starts_with('0');

    if valid {
        Ok(())
    } else {
        Err(DialInfoError::InvalidPhoneNumber(number.to_string()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
