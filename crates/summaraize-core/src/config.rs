//! Configuration: TOML file with `${VAR}` credential expansion
//!
//! The config is built once at startup (from a file or from the process
//! environment) and passed by reference. Nothing else in the crate reads
//! environment variables.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Environment variables that `${VAR}` references may resolve.
/// Anything else expands to an empty string.
const ALLOWED_ENV_VARS: &[&str] = &[
    "GROQ_API_KEY",
    "OPENAI_API_KEY",
    "GEMINI_API_KEY",
    "GOOGLE_API_KEY",
    "GOOGLE_GENAI_API_KEY",
    "SUMMARAIZE_BIND",
];

/// Variables consulted for the Gemini key, in order
const GEMINI_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_GENAI_API_KEY", "GOOGLE_API_KEY"];

/// Default config written by `summaraize init`
pub const DEFAULT_CONFIG_TOML: &str = r#"# summaraize configuration

[providers]
# Priority order of the fallback chain
order = ["groq", "openai", "gemini"]
# Per-provider deadline for a single call
timeout_secs = 30

[providers.groq]
api_key = "${GROQ_API_KEY}"
model = "mixtral-8x7b-32768"

[providers.openai]
api_key = "${OPENAI_API_KEY}"
model = "gpt-4o-mini"

[providers.gemini]
api_key = "${GEMINI_API_KEY}"
model = "gemini-1.5-pro"

[gateway]
bind = "127.0.0.1:8080"
max_body_bytes = 1048576
cors_origins = []
"#;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Supported providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderKind {
    Groq,
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProviderKind> for String {
    fn from(kind: ProviderKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Credential and model settings for one provider
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: String,
    /// Overrides the provider's default model
    #[serde(default)]
    pub model: Option<String>,
    /// Overrides the provider's default API base URL
    #[serde(default)]
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderSettings {
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }
}

/// The fallback chain: priority order, deadline, and per-provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_order")]
    pub order: Vec<ProviderKind>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub groq: ProviderSettings,
    #[serde(default)]
    pub openai: ProviderSettings,
    #[serde(default)]
    pub gemini: ProviderSettings,
}

fn default_order() -> Vec<ProviderKind> {
    vec![ProviderKind::Groq, ProviderKind::OpenAi, ProviderKind::Gemini]
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            timeout_secs: default_timeout_secs(),
            groq: ProviderSettings::default(),
            openai: ProviderSettings::default(),
            gemini: ProviderSettings::default(),
        }
    }
}

impl ProvidersConfig {
    pub fn settings(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Groq => &self.groq,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Gemini => &self.gemini,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// HTTP gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Allowed CORS origins; empty disables CORS headers
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            cors_origins: Vec::new(),
        }
    }
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.bind.clone()))
    }
}

impl Config {
    /// Load a config file, expanding `${VAR}` from the process environment
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Load a config file with an explicit variable lookup
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loading config");
        Self::parse_with(&raw, lookup)
    }

    /// Parse TOML text, expanding `${VAR}` references in string values through `lookup`
    pub fn parse_with<F>(raw: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut document = toml::Value::Table(toml::from_str::<toml::Table>(raw)?);
        expand_string_values(&mut document, &lookup);
        let config: Config = document.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Default config with credentials read from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Default config with credentials read through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |name: &str| lookup(name).unwrap_or_default();
        let gemini_key = GEMINI_KEY_VARS
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.is_empty()))
            .unwrap_or_default();

        let mut config = Config::default();
        config.providers.groq = ProviderSettings::with_key(key("GROQ_API_KEY"));
        config.providers.openai = ProviderSettings::with_key(key("OPENAI_API_KEY"));
        config.providers.gemini = ProviderSettings::with_key(gemini_key);
        if let Some(bind) = lookup("SUMMARAIZE_BIND").filter(|v| !v.is_empty()) {
            config.gateway.bind = bind;
        }
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.order.is_empty() {
            return Err(ConfigError::EmptyOrder);
        }
        let mut seen = Vec::with_capacity(self.providers.order.len());
        for kind in &self.providers.order {
            if seen.contains(kind) {
                return Err(ConfigError::DuplicateProvider(kind.to_string()));
            }
            seen.push(*kind);
        }
        if self.providers.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        self.gateway.bind_addr()?;
        Ok(())
    }
}

/// Expand `${VAR}` inside every string of a parsed document. Values are
/// substituted after parsing, so they never need TOML escaping.
fn expand_string_values<F>(value: &mut toml::Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        toml::Value::String(s) => *s = expand_env_vars(s, lookup),
        toml::Value::Array(items) => {
            for item in items {
                expand_string_values(item, lookup);
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                expand_string_values(item, lookup);
            }
        }
        _ => {}
    }
}

/// Replace `${VAR}` with the variable's value. Only allowlisted names resolve.
pub fn expand_env_vars<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let Ok(re) = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}") else {
        return raw.to_string();
    };
    re.replace_all(raw, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        if !ALLOWED_ENV_VARS.contains(&name) {
            warn!("Refusing to expand non-allowlisted variable '{}'", name);
            return String::new();
        }
        lookup(name).unwrap_or_default()
    })
    .into_owned()
}
