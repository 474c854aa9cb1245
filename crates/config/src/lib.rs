//! Configuration loading, validation, and management for Groundwire.
//!
//! Loads configuration from `~/.groundwire/config.toml` with environment
//! variable overrides. Validates all settings at startup. Every constant the
//! pipeline uses (persona, top-k, delimiter, model) lives here with the
//! shipped value as its default.

use groundwire_core::vector::Metric;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persona instruction block sent as the first-turn system message.
pub const DEFAULT_PERSONA: &str = "You are a friendly and knowledgeable New Yorker who loves sharing recommendations about the city. \
You have lived in NYC for years and know both the famous tourist spots and hidden local gems. \
Your goal is to give recommendations tailored to what the user is asking for, whether they want iconic attractions \
or lesser-known spots loved by locals.\n\n\
Use the provided context to enhance your responses with real local insights, but only include details that are relevant \
to the user’s question. If the context provides useful recommendations that match what the user is asking for, use them. \
If the context is unrelated or does not fully answer the question, rely on your general NYC knowledge instead.\n\n\
Be specific when recommending places—mention neighborhoods, the atmosphere, and why someone might like a spot. \
Keep your tone warm, conversational, and engaging, like a close friend who genuinely enjoys sharing their city.";

/// Preface of the context-only system message on follow-up turns.
pub const DEFAULT_FOLLOWUP_PREFACE: &str = "Here is additional context based on the newest query.";

/// Separator between retrieved snippets inside a `CONTEXT:` block.
pub const DEFAULT_DELIMITER: &str = "\n---\n";

/// Documents retrieved per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Environment variable holding the generation-service credential.
pub const GENERATION_KEY_ENV: &str = "GROQ_API_KEY";

/// Environment variable holding the vector-store credential.
pub const VECTOR_STORE_KEY_ENV: &str = "PINECONE_API_KEY";

/// The root configuration structure.
///
/// Maps directly to `~/.groundwire/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat-completion service
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Embedding model service
    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Similarity index
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Prompt assembly constants
    #[serde(default)]
    pub assembly: AssemblyConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider name; selects the default base URL
    #[serde(default = "default_generation_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_generation_provider() -> String {
    "groq".into()
}
fn default_generation_model() -> String {
    "llama3-70b-8192".into()
}
fn default_generation_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            api_key: None,
            api_url: None,
            model: default_generation_model(),
            temperature: None,
            max_tokens: None,
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// "tei" (text-embeddings-inference) or "openai"
    #[serde(default = "default_encoder_backend")]
    pub backend: String,

    #[serde(default = "default_encoder_url")]
    pub url: String,

    #[serde(default = "default_encoder_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Placeholder text encoded once at startup to learn the dimension
    #[serde(default = "default_probe_text")]
    pub probe_text: String,

    #[serde(default = "default_encoder_timeout")]
    pub timeout_secs: u64,
}

fn default_encoder_backend() -> String {
    "tei".into()
}
fn default_encoder_url() -> String {
    "http://localhost:8080".into()
}
fn default_encoder_model() -> String {
    "dwzhu/e5-base-4k".into()
}
fn default_probe_text() -> String {
    "this is a test".into()
}
fn default_encoder_timeout() -> u64 {
    30
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            backend: default_encoder_backend(),
            url: default_encoder_url(),
            model: default_encoder_model(),
            api_key: None,
            probe_text: default_probe_text(),
            timeout_secs: default_encoder_timeout(),
        }
    }
}

impl std::fmt::Debug for EncoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderConfig")
            .field("backend", &self.backend)
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("probe_text", &self.probe_text)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// "pinecone" or "memory"
    #[serde(default = "default_vector_backend")]
    pub backend: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default)]
    pub metric: Metric,

    #[serde(default = "default_cloud")]
    pub cloud: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Metadata field holding the snippet text of each match
    #[serde(default = "default_content_field")]
    pub content_field: String,

    #[serde(default = "default_controller_url")]
    pub controller_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_vector_timeout")]
    pub timeout_secs: u64,

    /// Whether startup should create the index when it is missing
    #[serde(default = "default_true")]
    pub create_if_missing: bool,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// JSON documents (`[{"id", "content"}]`) loaded into the in-memory store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<PathBuf>,
}

fn default_vector_backend() -> String {
    "pinecone".into()
}
fn default_index_name() -> String {
    "groq-llama-3-rag".into()
}
fn default_cloud() -> String {
    "aws".into()
}
fn default_region() -> String {
    "us-east-1".into()
}
fn default_content_field() -> String {
    "content_snippet".into()
}
fn default_controller_url() -> String {
    "https://api.pinecone.io".into()
}
fn default_api_version() -> String {
    "2024-07".into()
}
fn default_vector_timeout() -> u64 {
    30
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_vector_backend(),
            api_key: None,
            index_name: default_index_name(),
            metric: Metric::default(),
            cloud: default_cloud(),
            region: default_region(),
            content_field: default_content_field(),
            controller_url: default_controller_url(),
            api_version: default_api_version(),
            timeout_secs: default_vector_timeout(),
            create_if_missing: true,
            readiness: ReadinessConfig::default(),
            seed_path: None,
        }
    }
}

impl std::fmt::Debug for VectorStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreConfig")
            .field("backend", &self.backend)
            .field("api_key", &redact(&self.api_key))
            .field("index_name", &self.index_name)
            .field("metric", &self.metric)
            .field("cloud", &self.cloud)
            .field("region", &self.region)
            .field("content_field", &self.content_field)
            .field("controller_url", &self.controller_url)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("create_if_missing", &self.create_if_missing)
            .field("readiness", &self.readiness)
            .field("seed_path", &self.seed_path)
            .finish()
    }
}

/// Bounded exponential backoff for the index-readiness poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    10
}
fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    16_000
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// How caller history is turned back into messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// One user and one assistant message per exchange
    #[default]
    Single,
    /// The assistant message is appended twice per exchange
    DuplicateAssistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    #[serde(default = "default_persona")]
    pub persona: String,

    #[serde(default = "default_followup_preface")]
    pub followup_preface: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default)]
    pub history_mode: HistoryMode,
}

fn default_persona() -> String {
    DEFAULT_PERSONA.into()
}
fn default_followup_preface() -> String {
    DEFAULT_FOLLOWUP_PREFACE.into()
}
fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_delimiter() -> String {
    DEFAULT_DELIMITER.into()
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            followup_preface: default_followup_preface(),
            top_k: DEFAULT_TOP_K,
            delimiter: default_delimiter(),
            history_mode: HistoryMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origins; empty means same-origin only
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    7860
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.groundwire/config.toml),
    /// then apply environment overrides.
    ///
    /// Recognised variables:
    /// - `GROQ_API_KEY`, `PINECONE_API_KEY` (credentials)
    /// - `GROUNDWIRE_MODEL`, `GROUNDWIRE_INDEX`, `GROUNDWIRE_ENCODER_URL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Credentials from the file win over the environment; model, index and
    /// encoder URL from the environment win over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.generation.api_key.is_none() {
            self.generation.api_key = lookup(GENERATION_KEY_ENV).filter(|k| !k.is_empty());
        }
        if self.vector_store.api_key.is_none() {
            self.vector_store.api_key = lookup(VECTOR_STORE_KEY_ENV).filter(|k| !k.is_empty());
        }
        if let Some(model) = lookup("GROUNDWIRE_MODEL") {
            self.generation.model = model;
        }
        if let Some(index) = lookup("GROUNDWIRE_INDEX") {
            self.vector_store.index_name = index;
        }
        if let Some(url) = lookup("GROUNDWIRE_ENCODER_URL") {
            self.encoder.url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".groundwire")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.generation.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "generation.temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if self.generation.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "generation.model must not be empty".into(),
            ));
        }

        if !matches!(self.encoder.backend.as_str(), "tei" | "openai") {
            return Err(ConfigError::ValidationError(format!(
                "encoder.backend must be \"tei\" or \"openai\", got \"{}\"",
                self.encoder.backend
            )));
        }

        if !matches!(self.vector_store.backend.as_str(), "pinecone" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "vector_store.backend must be \"pinecone\" or \"memory\", got \"{}\"",
                self.vector_store.backend
            )));
        }

        if self.vector_store.index_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "vector_store.index_name must not be empty".into(),
            ));
        }

        if self.vector_store.readiness.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "vector_store.readiness.max_attempts must be at least 1".into(),
            ));
        }

        if self.vector_store.readiness.initial_delay_ms > self.vector_store.readiness.max_delay_ms {
            return Err(ConfigError::ValidationError(
                "vector_store.readiness.initial_delay_ms must not exceed max_delay_ms".into(),
            ));
        }

        if self.assembly.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "assembly.top_k must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Fail if a credential required by the selected backends is missing.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        if self.vector_store.backend == "pinecone" && self.vector_store.api_key.is_none() {
            return Err(ConfigError::MissingCredential {
                service: "vector store",
                env_var: VECTOR_STORE_KEY_ENV,
            });
        }
        if self.generation.api_key.is_none() {
            return Err(ConfigError::MissingCredential {
                service: "generation service",
                env_var: GENERATION_KEY_ENV,
            });
        }
        Ok(())
    }

    /// Generate a default config TOML string (for `groundwire config --default`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing {service} credential: set {env_var}")]
    MissingCredential {
        service: &'static str,
        env_var: &'static str,
    },
}

impl From<ConfigError> for groundwire_core::Error {
    fn from(err: ConfigError) -> Self {
        groundwire_core::Error::config(err.to_string())
    }
}
