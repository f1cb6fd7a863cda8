use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;
use crate::infrastructure::asr::{DEFAULT_BASE_URL, DEFAULT_FILE_MODEL, DEFAULT_URL_MODEL};

pub const DEFAULT_CONFIG_FILE: &str = "config/gateway.json";

/// Environment variables that override file and default values, by settings key.
const ENV_OVERRIDES: [(&str, &str); 11] = [
    ("environment", "APP_ENV"),
    ("http.host", "HTTP_INTERFACE_HOST"),
    ("http.port", "HTTP_INTERFACE_PORT"),
    ("http.cors_allow_origin", "CORS_ALLOW_ORIGIN"),
    ("asr.api_key", "DASHSCOPE_API_KEY"),
    ("asr.base_url", "DASHSCOPE_BASE_URL"),
    ("asr.url_model", "ASR_URL_MODEL"),
    ("asr.file_model", "ASR_FILE_MODEL"),
    ("asr.timeout_secs", "ASR_TIMEOUT_SECS"),
    ("scaffold.mock_response_delay_ms", "MOCK_RESPONSE_DELAY"),
    ("logging.json", "LOG_JSON"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub environment: Environment,
    pub http: HttpSettings,
    pub asr: AsrSettings,
    pub logging: LoggingSettings,
    pub scaffold: ScaffoldSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
    pub cors_allow_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AsrSettings {
    pub api_key: String,
    pub base_url: String,
    pub url_model: String,
    pub file_model: String,
    pub timeout_secs: u64,
}

impl AsrSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub json: bool,
}

/// Run with an echo agent instead of the real backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ScaffoldSettings {
    pub enabled: bool,
    pub mock_response_delay_ms: u64,
}

impl Settings {
    /// Defaults, then the optional config file, then the process environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(config_file, |key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(config_file: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder()
            .set_default("environment", "local")?
            .set_default("http.host", "localhost")?
            .set_default("http.port", 8080)?
            .set_default("http.cors_allow_origin", "*")?
            .set_default("asr.api_key", "")?
            .set_default("asr.base_url", DEFAULT_BASE_URL)?
            .set_default("asr.url_model", DEFAULT_URL_MODEL)?
            .set_default("asr.file_model", DEFAULT_FILE_MODEL)?
            .set_default("asr.timeout_secs", 300)?
            .set_default("logging.json", false)?
            .set_default("scaffold.enabled", false)?
            .set_default("scaffold.mock_response_delay_ms", 0)?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(false));
        }

        for (key, var) in ENV_OVERRIDES {
            builder = builder.set_override_option(key, lookup(var))?;
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            builder = builder.set_override("logging.json", format.eq_ignore_ascii_case("json"))?;
        }
        if let Some(flag) = lookup("SCAFFOLD_MODE") {
            let enabled = flag.eq_ignore_ascii_case("true") || flag == "1";
            builder = builder.set_override("scaffold.enabled", enabled)?;
        }

        builder.build()?.try_deserialize()
    }
}
