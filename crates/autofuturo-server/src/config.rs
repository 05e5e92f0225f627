//! Server configuration loading from file and environment variables.
//!
//! Configuration is built once at startup and passed by reference into the
//! constructors of the knowledge base, the voice service and the job
//! planner. Nothing reads the environment after that.

use autofuturo_knowledge::RetrievalSettings;
use autofuturo_types::{McpServer, SessionSettings};
use autofuturo_voice::LiveKitConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Identity and behavior of the assistant.
    #[serde(default)]
    pub agent: AgentConfig,

    /// API keys of the model providers.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Knowledge base (Supabase + embeddings).
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// LiveKit server API.
    #[serde(default)]
    pub livekit: LiveKitConfig,

    /// Telephony options.
    #[serde(default)]
    pub telephony: TelephonyConfig,

    /// Remote MCP server providing inventory, prospect and calendar tools.
    #[serde(default)]
    pub mcp: McpConfig,

    /// Plugin settings handed to the media framework.
    #[serde(default)]
    pub session: SessionSettings,
}

/// Network configuration for the HTTP server.
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on `/api/*`. `None` leaves the API open.
    #[serde(default)]
    pub api_token: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "autofuturo_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Name the worker registers under for explicit dispatch.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Participant identity of the agent in the room.
    #[serde(default = "default_agent_identity")]
    pub identity: String,

    /// Display name of the agent in the room.
    #[serde(default = "default_agent_display_name")]
    pub display_name: String,

    /// Markdown file replacing the bundled instructions.
    #[serde(default)]
    pub instructions_path: Option<String>,

    /// Delay between `end_call` and the room deletion, so the farewell can
    /// be played out.
    #[serde(default = "default_hangup_grace_ms")]
    pub hangup_grace_ms: u64,
}

#[derive(Clone, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai_api_key: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Only checked for presence; the speech-to-text plugin consumes it.
    #[serde(default)]
    pub deepgram_api_key: String,
}

#[derive(Clone, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,

    #[serde(default)]
    pub supabase_key: Option<String>,

    /// Table holding the documents. Not queried directly; the similarity
    /// function reads it.
    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_match_function")]
    pub match_function: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelephonyConfig {
    /// Human line callers are transferred to (E.164 number or SIP URI).
    #[serde(default)]
    pub transfer_to: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_mcp_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_mcp_session_timeout")]
    pub session_timeout_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8081
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_agent_name() -> String {
    "autofuturo-ia".to_string()
}

fn default_agent_identity() -> String {
    "agent-alex".to_string()
}

fn default_agent_display_name() -> String {
    "Alex".to_string()
}

fn default_hangup_grace_ms() -> u64 {
    5000
}

fn default_openai_base_url() -> String {
    autofuturo_knowledge::embedder::DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_table() -> String {
    "documents".to_string()
}

fn default_match_function() -> String {
    autofuturo_knowledge::store::DEFAULT_MATCH_FUNCTION.to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> usize {
    1536
}

fn default_top_k() -> usize {
    3
}

fn default_mcp_timeout() -> u64 {
    10
}

fn default_mcp_session_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_token: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            identity: default_agent_identity(),
            display_name: default_agent_display_name(),
            instructions_path: None,
            hangup_grace_ms: default_hangup_grace_ms(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_openai_base_url(),
            deepgram_api_key: String::new(),
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_key: None,
            table: default_table(),
            match_function: default_match_function(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            top_k: default_top_k(),
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: default_mcp_timeout(),
            session_timeout_secs: default_mcp_session_timeout(),
        }
    }
}

fn redacted(value: &Option<String>) -> &'static str {
    match value {
        Some(_) => "[REDACTED]",
        None => "<unset>",
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_token", &redacted(&self.api_token))
            .finish()
    }
}

impl fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvidersConfig")
            .field("openai_api_key", &"[REDACTED]")
            .field("openai_base_url", &self.openai_base_url)
            .field("deepgram_api_key", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for KnowledgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeConfig")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &redacted(&self.supabase_key))
            .field("table", &self.table)
            .field("match_function", &self.match_function)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimensions", &self.embedding_dimensions)
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl fmt::Debug for McpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpConfig")
            .field("url", &self.url)
            .field("token", &redacted(&self.token))
            .field("timeout_secs", &self.timeout_secs)
            .field("session_timeout_secs", &self.session_timeout_secs)
            .finish()
    }
}

impl KnowledgeConfig {
    /// Returns the Supabase URL and key when both are set.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (self.supabase_url.as_deref(), self.supabase_key.as_deref()) {
            (Some(url), Some(key)) => Some((url, key)),
            _ => None,
        }
    }

    pub fn retrieval_settings(&self) -> RetrievalSettings {
        RetrievalSettings {
            embedding_model: self.embedding_model.clone(),
            embedding_dimensions: self.embedding_dimensions,
            top_k: self.top_k,
        }
    }
}

impl McpConfig {
    /// Returns the MCP server list: one entry when both URL and token are
    /// set, empty otherwise.
    pub fn servers(&self) -> Vec<McpServer> {
        match (self.url.as_deref(), self.token.as_deref()) {
            (Some(url), Some(token)) => {
                let mut headers = BTreeMap::new();
                headers.insert("token".to_string(), token.to_string());
                vec![McpServer {
                    url: url.to_string(),
                    headers,
                    timeout_secs: self.timeout_secs,
                    session_timeout_secs: self.session_timeout_secs,
                }]
            }
            _ => Vec::new(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required credential is missing.
    #[error("{0} is not configured")]
    MissingKey(&'static str),

    /// A setting holds a value of the wrong type or out of range.
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

impl Config {
    /// Checks that the credentials the assistant cannot run without are set
    /// and that retrieval settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] naming the first missing variable,
    /// or [`ConfigError::InvalidValue`] when `K_TOP` or
    /// `EMBEDDING_DIMENSIONS` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.openai_api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("OPENAI_API_KEY"));
        }
        if self.providers.deepgram_api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("DEEPGRAM_API_KEY"));
        }
        if self.knowledge.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                name: "K_TOP",
                value: self.knowledge.top_k.to_string(),
            });
        }
        if self.knowledge.embedding_dimensions == 0 {
            return Err(ConfigError::InvalidValue {
                name: "EMBEDDING_DIMENSIONS",
                value: self.knowledge.embedding_dimensions.to_string(),
            });
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides (see [`apply_env_overrides`]).
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if a numeric environment variable does not parse.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

/// Applies environment variable overrides read through `var`.
///
/// Blank values count as unset.
///
/// - `AUTOFUTURO_HOST`, `AUTOFUTURO_PORT`, `AUTOFUTURO_API_TOKEN` → `server`
/// - `AUTOFUTURO_LOG_LEVEL`, `AUTOFUTURO_LOG_JSON` → `logging`
/// - `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `DEEPGRAM_API_KEY` → `providers`
/// - `SUPABASE_URL`, `SUPABASE_KEY`, `SUPABASE_TABLE`,
///   `SUPABASE_MATCH_FUNCTION`, `EMBEDDING_MODEL`, `EMBEDDING_DIMENSIONS`,
///   `K_TOP` → `knowledge`
/// - `LIVEKIT_URL`, `LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET`,
///   `SIP_OUTBOUND_TRUNK_ID` → `livekit`
/// - `TRANSFER_PHONE_NUMBER` → `telephony.transfer_to`
/// - `MCP_SERVER`, `MCP_TOKEN`, `MCP_TIMEOUT`, `MCP_SESSION_TIMEOUT` → `mcp`
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when a numeric variable does not
/// parse. `AUTOFUTURO_HOST` is the exception: an unparsable host is ignored.
pub fn apply_env_overrides(
    config: &mut Config,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let get = |name: &str| var(name).filter(|v| !v.trim().is_empty());

    if let Some(host) = get("AUTOFUTURO_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = get("AUTOFUTURO_PORT") {
        config.server.port = parse_var("AUTOFUTURO_PORT", port)?;
    }
    if let Some(token) = get("AUTOFUTURO_API_TOKEN") {
        config.server.api_token = Some(token);
    }
    if let Some(level) = get("AUTOFUTURO_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = get("AUTOFUTURO_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    if let Some(key) = get("OPENAI_API_KEY") {
        config.providers.openai_api_key = key;
    }
    if let Some(url) = get("OPENAI_BASE_URL") {
        config.providers.openai_base_url = url;
    }
    if let Some(key) = get("DEEPGRAM_API_KEY") {
        config.providers.deepgram_api_key = key;
    }

    if let Some(url) = get("SUPABASE_URL") {
        config.knowledge.supabase_url = Some(url);
    }
    if let Some(key) = get("SUPABASE_KEY") {
        config.knowledge.supabase_key = Some(key);
    }
    if let Some(table) = get("SUPABASE_TABLE") {
        config.knowledge.table = table;
    }
    if let Some(function) = get("SUPABASE_MATCH_FUNCTION") {
        config.knowledge.match_function = function;
    }
    if let Some(model) = get("EMBEDDING_MODEL") {
        config.knowledge.embedding_model = model;
    }
    if let Some(dims) = get("EMBEDDING_DIMENSIONS") {
        config.knowledge.embedding_dimensions = parse_var("EMBEDDING_DIMENSIONS", dims)?;
    }
    if let Some(k) = get("K_TOP") {
        config.knowledge.top_k = parse_var("K_TOP", k)?;
    }

    if let Some(url) = get("LIVEKIT_URL") {
        config.livekit.url = url;
    }
    if let Some(key) = get("LIVEKIT_API_KEY") {
        config.livekit.api_key = key;
    }
    if let Some(secret) = get("LIVEKIT_API_SECRET") {
        config.livekit.api_secret = secret;
    }
    if let Some(trunk) = get("SIP_OUTBOUND_TRUNK_ID") {
        config.livekit.sip_outbound_trunk_id = trunk;
    }
    if let Some(number) = get("TRANSFER_PHONE_NUMBER") {
        config.telephony.transfer_to = Some(number);
    }

    if let Some(url) = get("MCP_SERVER") {
        config.mcp.url = Some(url);
    }
    if let Some(token) = get("MCP_TOKEN") {
        config.mcp.token = Some(token);
    }
    if let Some(timeout) = get("MCP_TIMEOUT") {
        config.mcp.timeout_secs = parse_var("MCP_TIMEOUT", timeout)?;
    }
    if let Some(timeout) = get("MCP_SESSION_TIMEOUT") {
        config.mcp.session_timeout_secs = parse_var("MCP_SESSION_TIMEOUT", timeout)?;
    }

    Ok(())
}
