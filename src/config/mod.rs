//! Application configuration
//!
//! Settings are layered from an optional `colloquy.toml` file and
//! `COLLOQUY_*` environment variables (e.g. `COLLOQUY_SERVER__PORT=8080`).

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::agent::AgentConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub model: ModelSettings,
    /// Agents registered at startup; a default agent is added when empty
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Remote completion endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelSettings {
    /// Base URL of an OpenAI-compatible chat-completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Upper bound on total elapsed retry time for transient errors, in seconds
    #[serde(default = "default_retry_max_elapsed")]
    pub retry_max_elapsed_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            retry_max_elapsed_secs: default_retry_max_elapsed(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_retry_max_elapsed() -> u64 {
    15
}

impl Settings {
    /// Load from the default config path plus environment overrides
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file(Path::new("colloquy.toml"))
    }

    /// Load from an explicit config path plus environment overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("COLLOQUY").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_are_usable() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.model.api_key_env, "OPENAI_API_KEY");
        assert!(settings.agents.is_empty());
    }

    #[test]
    fn parses_agents_from_toml() {
        let raw = r#"
            [server]
            port = 8080

            [[agents]]
            name = "researcher"
            instructions = "You research things."
            max_parallel_tools = 2
            tool_call_timeout_secs = 5
        "#;

        let settings: Settings = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .expect("builds")
            .try_deserialize()
            .expect("deserializes");

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.agents.len(), 1);
        assert_eq!(settings.agents[0].name, "researcher");
        assert_eq!(settings.agents[0].max_parallel_tools, 2);
        assert_eq!(settings.agents[0].max_rounds, 8);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings =
            Settings::from_file(Path::new("does-not-exist.toml")).expect("loads defaults");
        assert_eq!(settings.server.port, 3000);
    }
}
