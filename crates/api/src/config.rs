use anyhow::{Context, Result, bail};
use extract::{ModelSettings, Profile};

pub const MODEL_URL_VAR: &str = "LANGEXTRACT_API_MODEL_URL";
pub const MODEL_ID_VAR: &str = "LANGEXTRACT_API_MODEL_ID";
pub const API_KEY_VAR: &str = "LANGEXTRACT_API_KEY";
pub const TEMPERATURE_VAR: &str = "LANGEXTRACT_API_TEMPERATURE";
pub const FENCE_OUTPUT_VAR: &str = "LANGEXTRACT_API_FENCE_OUTPUT";
pub const PROFILE_VAR: &str = "LANGEXTRACT_API_PROFILE";
pub const HOST_VAR: &str = "LANGEXTRACT_API_HOST";
pub const PORT_VAR: &str = "LANGEXTRACT_API_PORT";
/// Port name shared with the frontend's `.env`; read when `PORT_VAR` is unset.
pub const SHARED_PORT_VAR: &str = "API_PORT";
pub const LOG_JSON_VAR: &str = "LANGEXTRACT_API_LOG_JSON";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelSettings,
    pub fence_output: bool,
    pub profile: Profile,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got '{}'", other),
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).with_context(|| format!("{} is not set", key));

        let base_url = require(MODEL_URL_VAR)?;
        let model_id = require(MODEL_ID_VAR)?;

        let temperature = get(TEMPERATURE_VAR)
            .map(|v| {
                v.trim()
                    .parse::<f32>()
                    .with_context(|| format!("{} must be a number", TEMPERATURE_VAR))
            })
            .transpose()?;

        let fence_output = get(FENCE_OUTPUT_VAR)
            .map(|v| parse_bool(&v).with_context(|| format!("invalid {}", FENCE_OUTPUT_VAR)))
            .transpose()?
            .unwrap_or(false);

        let profile = get(PROFILE_VAR)
            .map(|v| v.parse::<Profile>())
            .transpose()?
            .unwrap_or_default();

        let mut server = ServerConfig::default();
        if let Some(host) = get(HOST_VAR) {
            server.host = host;
        }
        let port = get(PORT_VAR)
            .map(|v| (PORT_VAR, v))
            .or_else(|| get(SHARED_PORT_VAR).map(|v| (SHARED_PORT_VAR, v)));
        if let Some((key, port)) = port {
            server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", key, port))?;
        }

        Ok(Self {
            server,
            model: ModelSettings {
                base_url,
                model_id,
                api_key: get(API_KEY_VAR),
                temperature,
            },
            fence_output,
            profile,
        })
    }
}
