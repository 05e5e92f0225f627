//! SIP call transfer over the LiveKit server API.
//!
//! Outbound calls go through `livekit_api::services::sip::SIPClient`. Its
//! 0.4 line has no transfer method, so `TransferSIPParticipant` is sent here
//! as a Twirp `POST /twirp/livekit.SIP/<Method>` with a JSON body, authorized
//! by a short-lived access token carrying SIP grants. Failures come back as
//! `{"code": ..., "msg": ...}`.

use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use livekit_api::access_token::{AccessToken, SIPGrants, VideoGrants};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifetime of the tokens minted for individual SIP requests.
const SIP_TOKEN_TTL: Duration = Duration::from_secs(600);

const SIP_SERVICE: &str = "livekit.SIP";

/// The callee's participant, as reported once an outbound call is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipParticipant {
    #[serde(default, alias = "participantId")]
    pub participant_id: String,
    #[serde(default, alias = "participantIdentity")]
    pub participant_identity: String,
    #[serde(default, alias = "roomName")]
    pub room_name: String,
    #[serde(default, alias = "sipCallId")]
    pub sip_call_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TransferSipParticipantRequest<'a> {
    pub participant_identity: &'a str,
    pub room_name: &'a str,
    pub transfer_to: &'a str,
    pub play_dialtone: bool,
}

#[derive(Debug, Deserialize)]
struct TwirpError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    msg: String,
}

/// Normalizes a transfer destination into a SIP-routable URI.
///
/// `tel:` and `sip:` URIs are passed through; a bare number becomes a
/// `tel:` URI.
pub fn transfer_uri(destination: &str) -> String {
    let destination = destination.trim();
    if destination.starts_with("tel:") || destination.starts_with("sip:") {
        destination.to_string()
    } else {
        format!("tel:{destination}")
    }
}

/// Minimal JSON Twirp client for the `livekit.SIP` transfer method.
#[derive(Clone)]
pub struct SipClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl std::fmt::Debug for SipClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SipClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl SipClient {
    pub fn new(http: reqwest::Client, config: &LiveKitConfig) -> Self {
        Self {
            http,
            base_url: config.http_url(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    /// Mints a token allowed to place calls and to administer `room_name`.
    fn request_token(&self, room_name: &str) -> Result<String, VoiceError> {
        let token = AccessToken::with_api_key(&self.api_key, &self.api_secret)
            .with_grants(VideoGrants {
                room_admin: true,
                room: room_name.to_string(),
                ..Default::default()
            })
            .with_sip_grants(SIPGrants {
                admin: false,
                call: true,
            })
            .with_ttl(SIP_TOKEN_TTL);

        token.to_jwt().map_err(VoiceError::LiveKit)
    }

    async fn call<Req: Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        room_name: &str,
        request: &Req,
    ) -> Result<Resp, VoiceError> {
        let url = format!("{}/twirp/{}/{}", self.base_url, SIP_SERVICE, method);
        let token = self.request_token(room_name)?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let (code, message) = match serde_json::from_str::<TwirpError>(&body) {
                Ok(e) => (e.code, e.msg),
                Err(_) => (status.as_u16().to_string(), body),
            };
            return Err(VoiceError::Sip { code, message });
        }

        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| VoiceError::Sip {
            code: "malformed_response".to_string(),
            message: e.to_string(),
        })
    }

    /// Transfers a SIP participant to another destination (SIP REFER).
    pub(crate) async fn transfer_participant(
        &self,
        request: &TransferSipParticipantRequest<'_>,
    ) -> Result<(), VoiceError> {
        let _: serde_json::Value = self
            .call("TransferSIPParticipant", request.room_name, request)
            .await?;
        Ok(())
    }
}
