//! Plugin settings for a voice session.
//!
//! The media framework that runs the call owns the STT, LLM, TTS, VAD and
//! turn-detection plugins. These types describe which plugins to load and
//! how to tune them; the job planner hands them over as part of the session
//! plan.

use crate::CallDirection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_stt_provider() -> String {
    "deepgram".to_string()
}

fn default_stt_model() -> String {
    "nova-2".to_string()
}

fn default_language() -> String {
    "es".to_string()
}

fn default_llm_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_max_tool_steps() -> u32 {
    3
}

fn default_tts_voice() -> String {
    "cartesia/sonic-2:5c5ad5e7-1020-476b-8b91-fdcbe9cc313c".to_string()
}

fn default_vad() -> String {
    "silero".to_string()
}

fn default_turn_detection() -> String {
    "multilingual".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_interruption_duration() -> f32 {
    0.5
}

fn default_min_endpointing_delay() -> f32 {
    0.5
}

fn default_max_endpointing_delay() -> f32 {
    6.0
}

/// Speech-to-text plugin selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SttSettings {
    #[serde(default = "default_stt_provider")]
    pub provider: String,
    #[serde(default = "default_stt_model")]
    pub model: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for SttSettings {
    fn default() -> Self {
        Self {
            provider: default_stt_provider(),
            model: default_stt_model(),
            language: default_language(),
        }
    }
}

/// Language model selection, as a `provider/model` descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Upper bound on consecutive tool calls in one turn.
    #[serde(default = "default_max_tool_steps")]
    pub max_tool_steps: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            max_tool_steps: default_max_tool_steps(),
        }
    }
}

/// Text-to-speech voice, as a `provider/model:voice` descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsSettings {
    #[serde(default = "default_tts_voice")]
    pub voice: String,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            voice: default_tts_voice(),
        }
    }
}

/// Noise cancellation model applied to the caller's audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseCancellation {
    /// Background voice cancellation tuned for wideband (browser) audio.
    #[default]
    Bvc,
    /// Background voice cancellation tuned for narrowband telephone audio.
    BvcTelephony,
    /// No noise cancellation.
    Off,
}

/// Turn-taking and interruption tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptionSettings {
    #[serde(default = "default_true")]
    pub allow_interruptions: bool,
    /// Seconds of caller speech before the agent yields.
    #[serde(default = "default_min_interruption_duration")]
    pub min_interruption_duration: f32,
    /// Words the caller must say before the agent yields (0 disables).
    #[serde(default)]
    pub min_interruption_words: u32,
    #[serde(default = "default_min_endpointing_delay")]
    pub min_endpointing_delay: f32,
    #[serde(default = "default_max_endpointing_delay")]
    pub max_endpointing_delay: f32,
    /// Start generating a reply before the end of turn is confirmed.
    #[serde(default)]
    pub preemptive_generation: bool,
}

impl Default for InterruptionSettings {
    fn default() -> Self {
        Self {
            allow_interruptions: true,
            min_interruption_duration: default_min_interruption_duration(),
            min_interruption_words: 0,
            min_endpointing_delay: default_min_endpointing_delay(),
            max_endpointing_delay: default_max_endpointing_delay(),
            preemptive_generation: false,
        }
    }
}

/// All plugin settings of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub stt: SttSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub tts: TtsSettings,
    #[serde(default = "default_vad")]
    pub vad: String,
    #[serde(default = "default_turn_detection")]
    pub turn_detection: String,
    #[serde(default)]
    pub noise_cancellation: NoiseCancellation,
    #[serde(default)]
    pub interruptions: InterruptionSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            stt: SttSettings::default(),
            llm: LlmSettings::default(),
            tts: TtsSettings::default(),
            vad: default_vad(),
            turn_detection: default_turn_detection(),
            noise_cancellation: NoiseCancellation::default(),
            interruptions: InterruptionSettings::default(),
        }
    }
}

impl SessionSettings {
    /// Returns a copy adjusted for the call.
    ///
    /// Phone calls get the telephony noise model instead of the wideband
    /// one. Outbound jobs are always phone calls; inbound ones are when
    /// `sip_caller` is set. An explicit `Off` is kept.
    pub fn for_call(&self, direction: CallDirection, sip_caller: bool) -> Self {
        let mut settings = self.clone();
        let phone_call = sip_caller || direction == CallDirection::Outbound;
        if phone_call && settings.noise_cancellation == NoiseCancellation::Bvc {
            settings.noise_cancellation = NoiseCancellation::BvcTelephony;
        }
        settings
    }
}

/// A remote MCP server whose tools the framework exposes to the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServer {
    pub url: String,
    /// Extra HTTP headers sent on every request (the access token lives here).
    pub headers: BTreeMap<String, String>,
    pub timeout_secs: u64,
    pub session_timeout_secs: u64,
}
