use livekit_api::services::{ServiceError, TwirpError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("LiveKit API error: {0}")]
    LiveKit(#[from] livekit_api::access_token::AccessTokenError),

    #[error("Room service error: {0}")]
    RoomService(String),

    #[error("SIP request failed ({code}): {message}")]
    Sip { code: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<ServiceError> for VoiceError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Twirp(TwirpError::Twirp(e)) => VoiceError::Sip {
                code: e.code,
                message: e.msg,
            },
            ServiceError::AccessToken(e) => VoiceError::LiveKit(e),
            other => VoiceError::RoomService(other.to_string()),
        }
    }
}
