use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use crate::sip::{transfer_uri, SipClient, SipParticipant, TransferSipParticipantRequest};
use async_trait::async_trait;
use autofuturo_types::DialInfo;
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_api::services::room::RoomClient;
use livekit_api::services::sip::{CreateSIPParticipantOptions, SIPClient};
use std::time::Duration;
use tracing::info;

/// Call-control operations the assistant's tools rely on.
#[async_trait]
pub trait CallControl: Send + Sync {
    /// Ends the call for every participant by deleting the room.
    async fn hang_up(&self, room_name: &str) -> Result<(), VoiceError>;

    /// Transfers a SIP participant to `transfer_to` (`tel:`/`sip:` URI or
    /// E.164 number).
    async fn transfer(
        &self,
        room_name: &str,
        participant_identity: &str,
        transfer_to: &str,
    ) -> Result<(), VoiceError>;

    /// Places an outbound call and joins the callee to `room_name`.
    async fn dial(&self, room_name: &str, dial: &DialInfo) -> Result<SipParticipant, VoiceError>;
}

/// Participant identity given to the callee of an outbound call.
pub fn callee_identity(dial: &DialInfo) -> String {
    format!("sip_{}", dial.digits())
}

#[derive(Debug)]
pub struct VoiceService {
    config: LiveKitConfig,
    room_client: RoomClient,
    sip: SIPClient,
    sip_client: SipClient,
}

impl VoiceService {
    pub fn new(config: LiveKitConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Builds the service on a shared HTTP client.
    pub fn with_http_client(config: LiveKitConfig, http: reqwest::Client) -> Self {
        let host = config.http_url();
        let room_client = RoomClient::with_api_key(&host, &config.api_key, &config.api_secret);
        let sip = SIPClient::with_api_key(&host, &config.api_key, &config.api_secret);
        let sip_client = SipClient::new(http, &config);
        Self {
            config,
            room_client,
            sip,
            sip_client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.url.is_empty()
    }

    /// Returns whether outbound calls can be placed.
    pub fn can_dial(&self) -> bool {
        self.is_enabled() && !self.config.sip_outbound_trunk_id.is_empty()
    }

    fn ensure_enabled(&self) -> Result<(), VoiceError> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(VoiceError::Config("LiveKit URL is not configured".to_string()))
        }
    }

    /// Generates the token the agent participant joins the room with.
    pub fn generate_agent_token(
        &self,
        room_name: &str,
        participant_identity: &str,
        participant_name: &str,
    ) -> Result<String, VoiceError> {
        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(participant_identity)
            .with_name(participant_name)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: true,
                can_subscribe: true,
                can_publish_data: true,
                ..Default::default()
            })
            .with_ttl(Duration::from_secs(self.config.token_ttl_seconds));

        token.to_jwt().map_err(VoiceError::LiveKit)
    }
}

#[async_trait]
impl CallControl for VoiceService {
    async fn hang_up(&self, room_name: &str) -> Result<(), VoiceError> {
        self.ensure_enabled()?;
        self.room_client
            .delete_room(room_name)
            .await
            .map_err(|e| VoiceError::RoomService(e.to_string()))?;
        info!(room = room_name, "room deleted");
        Ok(())
    }

    async fn transfer(
        &self,
        room_name: &str,
        participant_identity: &str,
        transfer_to: &str,
    ) -> Result<(), VoiceError> {
        self.ensure_enabled()?;
        let destination = transfer_uri(transfer_to);
        info!(
            room = room_name,
            participant = participant_identity,
            destination = %destination,
            "transferring SIP participant"
        );

        self.sip_client
            .transfer_participant(&TransferSipParticipantRequest {
                participant_identity,
                room_name,
                transfer_to: &destination,
                play_dialtone: false,
            })
            .await
    }

    async fn dial(&self, room_name: &str, dial: &DialInfo) -> Result<SipParticipant, VoiceError> {
        self.ensure_enabled()?;
        if self.config.sip_outbound_trunk_id.is_empty() {
            return Err(VoiceError::Config(
                "no outbound SIP trunk configured (set SIP_OUTBOUND_TRUNK_ID)".to_string(),
            ));
        }

        let identity = callee_identity(dial);
        info!(room = room_name, participant = %identity, "placing outbound call");

        let participant = self
            .sip
            .create_sip_participant(
                self.config.sip_outbound_trunk_id.clone(),
                dial.phone_number.clone(),
                room_name.to_string(),
                CreateSIPParticipantOptions {
                    participant_identity: identity,
                    participant_name: dial.name.clone(),
                    wait_until_answered: Some(true),
                    ..Default::default()
                },
                None,
            )
            .await?;

        Ok(SipParticipant {
            participant_id: participant.participant_id,
            participant_identity: participant.participant_identity,
            room_name: participant.room_name,
            sip_call_id: participant.sip_call_id,
        })
    }
}
