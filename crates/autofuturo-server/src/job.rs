//! Planning of a single agent job.
//!
//! A job is one room the assistant is dispatched into. The planner decides
//! whether it answers a caller or places a call, dials outbound callees, and
//! assembles everything the media framework needs to run the session.

use crate::prompt::{self, FAREWELL_INSTRUCTION, GREETING_INSTRUCTION};
use autofuturo_types::{
    CallDirection, DialInfo, DialInfoError, McpServer, SessionSettings, ToolDefinition,
};
use autofuturo_voice::{CallControl, SipParticipant, VoiceError, VoiceService};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct JobRequest {
    pub room_name: String,
    #[serde(default)]
    pub metadata: Option<String>,
    /// Set when the caller joined the room over SIP (a phone call).
    #[serde(default)]
    pub sip_caller: bool,
}

/// Everything needed to start the voice session of a job.
#[derive(Debug, Clone, Serialize)]
pub struct SessionPlan {
    pub agent_name: String,
    pub agent_identity: String,
    pub direction: CallDirection,
    pub room_name: String,
    pub instructions: String,
    /// Spoken as soon as the session starts. Outbound calls wait for the
    /// callee instead.
    pub greeting: Option<String>,
    pub farewell: String,
    pub session: SessionSettings,
    pub tools: Vec<ToolDefinition>,
    pub mcp_servers: Vec<McpServer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dial: Option<SipParticipant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("room_name must not be empty")]
    MissingRoom,

    #[error(transparent)]
    InvalidMetadata(#[from] DialInfoError),

    #[error("outbound call failed: {0}")]
    Dial(#[source] VoiceError),

    #[error("failed to issue agent token: {0}")]
    Token(#[source] VoiceError),
}

/// Identity of the assistant inside a room.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub name: String,
    pub identity: String,
    pub display_name: String,
}

pub struct JobPlanner {
    agent: AgentIdentity,
    template: String,
    session: SessionSettings,
    mcp_servers: Vec<McpServer>,
    tools: Vec<ToolDefinition>,
    calls: Arc<dyn CallControl>,
    voice: Option<Arc<VoiceService>>,
}

impl std::fmt::Debug for JobPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobPlanner")
            .field("agent", &self.agent)
            .field("tools", &self.tools.len())
            .field("mcp_servers", &self.mcp_servers.len())
            .finish()
    }
}

impl JobPlanner {
    pub fn new(
        agent: AgentIdentity,
        template: String,
        session: SessionSettings,
        calls: Arc<dyn CallControl>,
    ) -> Self {
        Self {
            agent,
            template,
            session,
            mcp_servers: Vec::new(),
            tools: Vec::new(),
            calls,
            voice: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_mcp_servers(mut self, servers: Vec<McpServer>) -> Self {
        self.mcp_servers = servers;
        self
    }

    /// Issues an agent join token with every plan when LiveKit is configured.
    pub fn with_voice(mut self, voice: Arc<VoiceService>) -> Self {
        self.voice = Some(voice);
        self
    }

    pub async fn plan(&self, request: &JobRequest) -> Result<SessionPlan, JobError> {
        self.plan_at(request, prompt::local_now()).await
    }

    /// Plans a job as of `now`.
    ///
    /// Metadata is validated before anything is dialed, so a rejected job
    /// never places a call.
    pub async fn plan_at(
        &self,
        request: &JobRequest,
        now: DateTime<FixedOffset>,
    ) -> Result<SessionPlan, JobError> {
        let room_name = request.room_name.trim();
        if room_name.is_empty() {
            return Err(JobError::MissingRoom);
        }

        let direction = CallDirection::classify(request.metadata.as_deref());
        let dial_info = match (direction, request.metadata.as_deref()) {
            (CallDirection::Outbound, Some(metadata)) => {
                Some(DialInfo::from_metadata(metadata).inspect_err(|e| {
                    warn!(room = room_name, error = %e, "rejecting job metadata");
                })?)
            }
            _ => None,
        };

        let agent_token = match &self.voice {
            Some(voice) if voice.is_enabled() => Some(
                voice
                    .generate_agent_token(room_name, &self.agent.identity, &self.agent.display_name)
                    .map_err(JobError::Token)?,
            ),
            _ => None,
        };

        let mut instructions = prompt::render_instructions(&self.template, now);
        let dial = match &dial_info {
            Some(info) => {
                instructions.push_str(&prompt::outbound_context(info));
                let participant = self
                    .calls
                    .dial(room_name, info)
                    .await
                    .map_err(JobError::Dial)?;
                info!(
                    room = room_name,
                    participant = %participant.participant_identity,
                    "outbound call answered"
                );
                Some(participant)
            }
            None => None,
        };

        info!(
            room = room_name,
            direction = %direction,
            sip_caller = request.sip_caller,
            tools = self.tools.len(),
            mcp_servers = self.mcp_servers.len(),
            "job planned"
        );

        Ok(SessionPlan {
            agent_name: self.agent.name.clone(),
            agent_identity: self.agent.identity.clone(),
            direction,
            room_name: room_name.to_string(),
            instructions,
            greeting: match direction {
                CallDirection::Inbound => Some(GREETING_INSTRUCTION.to_string()),
                CallDirection::Outbound => None,
            },
            farewell: FAREWELL_INSTRUCTION.to_string(),
            session: self.session.for_call(direction, request.sip_caller),
            tools: self.tools.clone(),
            mcp_servers: self.mcp_servers.clone(),
            dial,
            agent_token,
        })
    }
}
