use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

/// Connection settings for the hosted Supabase project.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. https://abcdefgh.supabase.co
    #[serde(default)]
    pub url: String,
    /// Service-role key. Grants admin access; never ship it to clients.
    #[serde(default)]
    pub service_key: String,
    /// Timeout applied to every request against the project, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_days: default_token_ttl_days(),
        }
    }
}

fn default_jwt_secret() -> String {
    // Generate a random secret if not provided. Tokens minted against it
    // will not survive a restart; set auth.jwt_secret in production.
    uuid::Uuid::new_v4().to_string()
}

fn default_token_ttl_days() -> i64 {
    7
}

/// Settings for the AI assistant endpoint. The endpoint is disabled
/// unless an API key is configured.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_assistant_base_url")]
    pub base_url: String,
    #[serde(default = "default_assistant_model")]
    pub model: String,
    #[serde(default = "default_assistant_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_assistant_base_url(),
            model: default_assistant_model(),
            max_tokens: default_assistant_max_tokens(),
        }
    }
}

fn default_assistant_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_assistant_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_assistant_max_tokens() -> u32 {
    500
}

/// Settings used by the CLI client rather than the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Where the login session is persisted between invocations.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            session_file: default_session_file(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_session_file() -> PathBuf {
    PathBuf::from("./.knit-portal-session.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            supabase: SupabaseConfig::default(),
            auth: AuthConfig::default(),
            assistant: AssistantConfig::default(),
            client: ClientConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Checks that the server can actually be started with this
    /// configuration. The Supabase project settings have no usable
    /// defaults, so they are required here rather than at first use.
    pub fn validate_for_server(&self) -> Result<()> {
        if self.supabase.url.is_empty() {
            bail!("supabase.url is required (set it in the config file or SUPABASE_URL)");
        }
        if !self.supabase.url.starts_with("http://") && !self.supabase.url.starts_with("https://") {
            bail!("supabase.url must be an http(s) URL");
        }
        if self.supabase.service_key.is_empty() {
            bail!("supabase.service_key is required (set it in the config file or SUPABASE_SERVICE_KEY)");
        }
        if self.auth.token_ttl_days <= 0 {
            bail!("auth.token_ttl_days must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.supabase.request_timeout_secs, 30);
        assert!(config.assistant.api_key.is_none());
        assert!(!config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn validate_rejects_missing_supabase_settings() {
        let config = Config::default();
        assert!(config.validate_for_server().is_err());

        let mut config = Config::default();
        config.supabase.url = "https://example.supabase.co".to_string();
        assert!(config.validate_for_server().is_err());

        config.supabase.service_key = "service-key".to_string();
        assert!(config.validate_for_server().is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let toml = r#"
            [server]
            port = 8081

            [supabase]
            url = "https://example.supabase.co"
            service_key = "key"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.client.api_url, "http://localhost:4000");
    }
}
