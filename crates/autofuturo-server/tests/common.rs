#![allow(dead_code)]

use async_trait::async_trait;
use autofuturo_knowledge::{
    Embedder, KnowledgeBase, KnowledgeError, MatchRecord, RetrievalSettings, VectorStore,
};
use autofuturo_server::job::{AgentIdentity, JobPlanner};
use autofuturo_server::tools::{
    EndCallTool, KnowledgeSearchTool, PendingHangups, ToolRegistry, TransferCallTool,
};
use autofuturo_server::AppState;
use autofuturo_types::{DialInfo, McpServer, SessionSettings};
use autofuturo_voice::{callee_identity, CallControl, SipParticipant, VoiceError};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const TRANSFER_LINE: &str = "+51014567890";
pub const HANGUP_GRACE: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    HangUp(String),
    Transfer {
        room: String,
        participant: String,
        to: String,
    },
    Dial {
        room: String,
        phone: String,
    },
}

/// Records call-control operations instead of talking to LiveKit.
#[derive(Default)]
pub struct FakeCalls {
    pub events: Mutex<Vec<CallEvent>>,
    pub fail: bool,
    hangups: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl FakeCalls {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Returns a fake that also reports every hang-up on a channel.
    pub fn with_hangup_channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let calls = Self {
            hangups: Mutex::new(Some(tx)),
            ..Default::default()
        };
        (calls, rx)
    }

    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: CallEvent) -> Result<(), VoiceError> {
        self.events.lock().unwrap().push(event);
        if self.fail {
            return Err(VoiceError::Sip {
                code: "unavailable".to_string(),
                message: "trunk down".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CallControl for FakeCalls {
    async fn hang_up(&self, room_name: &str) -> Result<(), VoiceError> {
        if let Some(tx) = self.hangups.lock().unwrap().as_ref() {
            let _ = tx.send(room_name.to_string());
        }
        self.record(CallEvent::HangUp(room_name.to_string()))
    }

    async fn transfer(
        &self,
        room_name: &str,
        participant_identity: &str,
        transfer_to: &str,
    ) -> Result<(), VoiceError> {
        self.record(CallEvent::Transfer {
            room: room_name.to_string(),
            participant: participant_identity.to_string(),
            to: transfer_to.to_string(),
        })
    }

    async fn dial(&self, room_name: &str, dial: &DialInfo) -> Result<SipParticipant, VoiceError> {
        self.record(CallEvent::Dial {
            room: room_name.to_string(),
            phone: dial.phone_number.clone(),
        })?;
        Ok(SipParticipant {
            participant_id: "PA_fake".to_string(),
            participant_identity: callee_identity(dial),
            room_name: room_name.to_string(),
            sip_call_id: "SCL_fake".to_string(),
        })
    }
}

pub struct FakeEmbedder;

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(
        &self,
        _input: &str,
        _model: &str,
        dimensions: usize,
    ) -> Result<Vec<f32>, KnowledgeError> {
        Ok(vec![0.25; dimensions])
    }
}

/// Store returning the same records for every query.
pub struct FixedStore(pub Vec<MatchRecord>);

#[async_trait]
impl VectorStore for FixedStore {
    async fn match_documents(
        &self,
        _query_embedding: &[f32],
        match_count: usize,
        _filter: &Map<String, Value>,
    ) -> Result<Vec<MatchRecord>, KnowledgeError> {
        Ok(self.0.iter().take(match_count).cloned().collect())
    }
}

pub fn financing_record() -> MatchRecord {
    MatchRecord {
        id: Some(json!(7)),
        similarity: Some(0.8123),
        content: Some("Ofrecemos financiamiento a 36 meses.\r\n".to_string()),
    }
}

pub fn knowledge(store: Option<Arc<dyn VectorStore>>) -> Arc<KnowledgeBase> {
    Arc::new(KnowledgeBase::new(
        Arc::new(FakeEmbedder),
        store,
        RetrievalSettings {
            embedding_dimensions: 8,
            ..Default::default()
        },
    ))
}

pub fn mcp_server() -> McpServer {
    let mut headers = BTreeMap::new();
    headers.insert("token".to_string(), "mcp-token".to_string());
    McpServer {
        url: "https://mcp.autofuturo.test/mcp".to_string(),
        headers,
        timeout_secs: 10,
        session_timeout_secs: 30,
    }
}

/// Builds application state around the fakes.
pub fn test_state(
    calls: Arc<FakeCalls>,
    store: Option<Arc<dyn VectorStore>>,
    api_token: Option<&str>,
) -> AppState {
    let calls: Arc<dyn CallControl> = calls;

    let hangups = PendingHangups::new();
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(KnowledgeSearchTool::new(knowledge(store))));
    tools.register(Arc::new(TransferCallTool::new(
        Arc::clone(&calls),
        Some(TRANSFER_LINE.to_string()),
    )));
    tools.register(Arc::new(EndCallTool::new(
        Arc::clone(&calls),
        HANGUP_GRACE,
        hangups.clone(),
    )));

    let planner = JobPlanner::new(
        AgentIdentity {
            name: "autofuturo-ia".to_string(),
            identity: "agent-alex".to_string(),
            display_name: "Alex".to_string(),
        },
        "Hoy es {today}. Eres Alex.".to_string(),
        SessionSettings::default(),
        calls,
    )
    .with_tools(tools.definitions())
    .with_mcp_servers(vec![mcp_server()]);

    AppState {
        planner,
        tools,
        api_token: api_token.map(str::to_string),
        hangups,
    }
}
