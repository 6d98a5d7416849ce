use serde::Deserialize;
use std::env;
use wayfare_shared::Masked;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub maps: MapsConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// A Postgres URL, or `memory` to run without a database.
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    3
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.trim().eq_ignore_ascii_case("memory")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Masked<String>,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Stripe,
    Mock,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub provider: PaymentProvider,
    #[serde(default)]
    pub secret_key: Option<Masked<String>>,
    #[serde(default = "default_payments_url")]
    pub api_url: String,
}

fn default_payments_url() -> String {
    "https://api.stripe.com/v1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Required at startup; see `Config::validate`.
    #[serde(default)]
    pub api_key: Option<Masked<String>>,
    #[serde(default = "default_llm_url")]
    pub api_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_llm_url(),
            model: default_llm_model(),
            max_tokens: default_llm_max_tokens(),
        }
    }
}

fn default_llm_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_llm_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_llm_max_tokens() -> u32 {
    1024
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MapsConfig {
    /// Without a key, place autocomplete answers with an empty list.
    #[serde(default)]
    pub api_key: Option<Masked<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// Without a relay, emails are only logged.
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<Masked<String>>,
    #[serde(default = "default_from")]
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from: default_from(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from() -> String {
    "Wayfare <no-reply@wayfare.travel>".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct InsightsConfig {
    /// How many recent activity records feed preference aggregation.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    50
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("Missing required setting {0}")]
    Missing(&'static str),
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Machine-local overrides, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `WAYFARE__LLM__API_KEY=...` sets `llm.api_key`
            .add_source(config::Environment::with_prefix("WAYFARE").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Settings whose absence is fatal rather than a degraded feature.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .llm
            .api_key
            .as_ref()
            .map_or(true, |k| k.expose().trim().is_empty())
        {
            return Err(ConfigError::Missing("llm.api_key"));
        }
        if self.auth.jwt_secret.expose().is_empty() {
            return Err(ConfigError::Missing("auth.jwt_secret"));
        }
        if self.payments.provider == PaymentProvider::Stripe && self.payments.secret_key.is_none() {
            return Err(ConfigError::Missing("payments.secret_key"));
        }
        Ok(())
    }
}
