//! LiveKit integration for the AutoFuturo voice agent.
//!
//! The media itself flows through the LiveKit server and the external agent
//! framework. This crate covers the server-side API calls the assistant makes
//! on its own behalf: minting the agent's join token, hanging up by deleting
//! the room, transferring the caller to a human line, and placing outbound
//! calls through a SIP trunk.

pub mod config;
pub mod error;
pub mod service;
pub mod sip;

pub use config::LiveKitConfig;
pub use error::VoiceError;
pub use service::{callee_identity, CallControl, VoiceService};
pub use sip::{transfer_uri, SipParticipant};
