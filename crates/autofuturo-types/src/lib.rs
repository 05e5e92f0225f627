//! Shared types for the AutoFuturo voice agent.
//!
//! This crate holds the serde types that cross crate boundaries: the
//! direction of a telephony job, the dial-info record parsed from job
//! metadata, tool declarations handed to the LLM runtime, and the plugin
//! settings of a voice session. It has no I/O of its own.

pub mod dial;
pub mod session;

pub use dial::{DialInfo, DialInfoError};
pub use session::{
    InterruptionSettings, LlmSettings, McpServer, NoiseCancellation, SessionSettings, SttSettings,
    TtsSettings,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a job answers a caller or places a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    /// Someone called in (or joined the room from a browser).
    Inbound,
    /// The agent dials a callee described by the job metadata.
    Outbound,
}

impl CallDirection {
    /// Classifies a job by its metadata.
    ///
    /// Jobs without metadata, or with blank metadata, are inbound. Any other
    /// metadata marks an outbound job whose dial info still has to be
    /// validated with [`DialInfo::from_metadata`].
    pub fn classify(metadata: Option<&str>) -> Self {
        match metadata {
            Some(m) if !m.trim().is_empty() => Self::Outbound,
            _ => Self::Inbound,
        }
    }

    /// Returns the string label for this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of a function the LLM may call.
///
/// `parameters` is a JSON schema object (`type`, `properties`, `required`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The job a tool invocation belongs to.
///
/// Both fields are optional: a tool called outside of a live job (for
/// example from a console session) has no room to act on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContext {
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub participant_identity: Option<String>,
}
