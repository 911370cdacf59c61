//! Configuration management for the Parley gateway
//!
//! Sources, lowest precedence first: built-in defaults, the TOML config
//! file, environment variables, then command-line flags (applied by the
//! binary).

pub mod file;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::relay::RelayConfig;
use crate::{Error, Result};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Default upload limit (Whisper rejects files above 25 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Default deadline for each provider call
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Parley gateway configuration
#[derive(Debug)]
pub struct Config {
    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// Capability provider configuration
    pub provider: ProviderConfig,

    /// Ingestion pipeline configuration
    pub pipeline: PipelineConfig,

    /// Delivery queue configuration
    pub relay: RelayConfig,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,

    /// Global requests per minute; `None` disables rate limiting
    pub rate_limit_rpm: Option<u32>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            rate_limit_rpm: None,
        }
    }
}

/// Capability provider configuration
#[derive(Debug)]
pub struct ProviderConfig {
    /// Provider API key
    pub api_key: SecretString,

    /// Base URL of the `OpenAI`-compatible API
    pub base_url: String,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// Chat model used for translation
    pub translation_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(String::new()),
            base_url: "https://api.openai.com/v1".to_string(),
            stt_model: "whisper-1".to_string(),
            translation_model: "gpt-4o-mini".to_string(),
            tts_model: "tts-1".to_string(),
            tts_speed: 1.0,
        }
    }
}

/// Ingestion pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Deadline for each provider call
    pub stage_timeout: Duration,

    /// Directory where uploads are staged while being processed
    pub staging_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            staging_dir: std::env::temp_dir(),
        }
    }
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// # Errors
    ///
    /// Returns error if the provider API key is missing, an explicit config
    /// file cannot be loaded, or an environment variable is malformed
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(config_path)?;
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the provider API key is missing or a value is malformed
    pub fn from_sources(
        fc: file::ParleyConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = env("OPENAI_API_KEY")
            .or(fc.provider.api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "OPENAI_API_KEY not set (or [provider].api_key in config file)".to_string(),
                )
            })?;

        let api_defaults = ApiServerConfig::default();
        // `PORT` is only consulted when `PARLEY_PORT` is absent
        let port = match parse_env::<u16>(&env, "PARLEY_PORT")? {
            Some(port) => Some(port),
            None => parse_env::<u16>(&env, "PORT")?,
        }
        .or(fc.server.port)
        .unwrap_or(api_defaults.port);
        let max_upload_bytes = parse_env(&env, "PARLEY_MAX_UPLOAD_BYTES")?
            .or(fc.server.max_upload_bytes)
            .unwrap_or(api_defaults.max_upload_bytes);
        let rate_limit_rpm = parse_env::<u32>(&env, "PARLEY_RATE_LIMIT_RPM")?
            .or(fc.server.rate_limit_rpm)
            .filter(|rpm| *rpm > 0);

        let provider_defaults = ProviderConfig::default();
        let provider = ProviderConfig {
            api_key: SecretString::from(api_key),
            base_url: env("PARLEY_PROVIDER_URL")
                .or(fc.provider.base_url)
                .unwrap_or(provider_defaults.base_url),
            stt_model: env("PARLEY_STT_MODEL")
                .or(fc.provider.stt_model)
                .unwrap_or(provider_defaults.stt_model),
            translation_model: env("PARLEY_TRANSLATION_MODEL")
                .or(fc.provider.translation_model)
                .unwrap_or(provider_defaults.translation_model),
            tts_model: env("PARLEY_TTS_MODEL")
                .or(fc.provider.tts_model)
                .unwrap_or(provider_defaults.tts_model),
            tts_speed: fc.provider.tts_speed.unwrap_or(provider_defaults.tts_speed),
        };

        if !(0.25..=4.0).contains(&provider.tts_speed) {
            return Err(Error::Config(format!(
                "tts_speed must be between 0.25 and 4.0, got {}",
                provider.tts_speed
            )));
        }

        let pipeline_defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            stage_timeout: parse_env::<u64>(&env, "PARLEY_STAGE_TIMEOUT_SECS")?
                .or(fc.pipeline.stage_timeout_secs)
                .filter(|secs| *secs > 0)
                .map_or(pipeline_defaults.stage_timeout, Duration::from_secs),
            staging_dir: env("PARLEY_STAGING_DIR")
                .or(fc.pipeline.staging_dir)
                .map_or(pipeline_defaults.staging_dir, PathBuf::from),
        };

        let relay = RelayConfig {
            max_pending: parse_env::<usize>(&env, "PARLEY_MAX_PENDING")?
                .or(fc.relay.max_pending)
                .and_then(NonZeroUsize::new),
        };

        Ok(Self {
            api_server: ApiServerConfig {
                port,
                max_upload_bytes,
                rate_limit_rpm,
            },
            provider,
            pipeline,
            relay,
        })
    }
}

/// Read and parse an optional environment variable
fn parse_env<T: FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid value for {key}: {raw:?}")))
        })
        .transpose()
}
