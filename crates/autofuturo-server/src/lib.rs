//! AutoFuturo voice assistant server.
//!
//! The LiveKit agent framework dispatches jobs to this service: it plans
//! each session (instructions, plugins, tools, outbound dialing) and executes
//! the assistant's function tools on the framework's behalf.

pub mod api;
pub mod api_jobs;
pub mod api_tools;
pub mod config;
pub mod job;
pub mod middleware;
pub mod prompt;
pub mod tools;

use autofuturo_knowledge::{KnowledgeBase, OpenAiEmbedder, SupabaseStore, VectorStore};
use autofuturo_voice::{CallControl, VoiceService};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::{Config, ConfigError};
use job::{AgentIdentity, JobPlanner};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tools::{EndCallTool, KnowledgeSearchTool, PendingHangups, ToolRegistry, TransferCallTool};
use tower_http::trace::TraceLayer;

/// Maximum accepted request body size.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across all request handlers.
pub struct AppState {
    pub planner: JobPlanner,
    pub tools: ToolRegistry,
    /// Bearer token required on `/api/*`, if any.
    pub api_token: Option<String>,
    /// Hang-ups scheduled by `end_call`, drained on shutdown.
    pub hangups: PendingHangups,
}

/// Wires the knowledge base, the LiveKit service and the tools from
/// configuration.
///
/// # Errors
///
/// Returns [`ConfigError::FileRead`] when the configured instructions file
/// cannot be read.
pub fn build_state(config: &Config) -> Result<AppState, ConfigError> {
    let http = reqwest::Client::new();

    let embedder = Arc::new(OpenAiEmbedder::new(
        http.clone(),
        config.providers.openai_base_url.as_str(),
        config.providers.openai_api_key.as_str(),
    ));
    let store = config.knowledge.supabase().map(|(url, key)| {
        Arc::new(SupabaseStore::new(
            http.clone(),
            url,
            key,
            config.knowledge.match_function.as_str(),
        )) as Arc<dyn VectorStore>
    });
    if store.is_none() {
        tracing::warn!("SUPABASE_URL/SUPABASE_KEY not set, knowledge base disabled");
    }
    let knowledge = Arc::new(KnowledgeBase::new(
        embedder,
        store,
        config.knowledge.retrieval_settings(),
    ));

    let voice = Arc::new(VoiceService::with_http_client(
        config.livekit.clone(),
        http,
    ));
    if !voice.is_enabled() {
        tracing::warn!("LIVEKIT_URL not set, call control disabled");
    }
    let calls: Arc<dyn CallControl> = voice.clone();

    let hangups = PendingHangups::new();
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(KnowledgeSearchTool::new(knowledge)));
    tools.register(Arc::new(TransferCallTool::new(
        Arc::clone(&calls),
        config.telephony.transfer_to.clone(),
    )));
    tools.register(Arc::new(EndCallTool::new(
        Arc::clone(&calls),
        Duration::from_millis(config.agent.hangup_grace_ms),
        hangups.clone(),
    )));

    let mcp_servers = config.mcp.servers();
    match mcp_servers.first() {
        Some(server) => tracing::info!(url = %server.url, "MCP server configured"),
        None => tracing::info!("MCP server not configured, running without MCP tools"),
    }

    let template = prompt::load_template(config.agent.instructions_path.as_deref())?;
    let planner = JobPlanner::new(
        AgentIdentity {
            name: config.agent.name.clone(),
            identity: config.agent.identity.clone(),
            display_name: config.agent.display_name.clone(),
        },
        template,
        config.session.clone(),
        calls,
    )
    .with_tools(tools.definitions())
    .with_mcp_servers(mcp_servers)
    .with_voice(voice);

    Ok(AppState {
        planner,
        tools,
        api_token: config.server.api_token.clone(),
        hangups,
    })
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/jobs", post(api_jobs::create_job_handler))
        .route("/api/tools", get(api_tools::list_tools_handler))
        .route("/api/tools/{name}", post(api_tools::invoke_tool_handler))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
