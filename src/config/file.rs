//! TOML configuration file loading
//!
//! Supports `~/.config/parley/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfigFile {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Capability provider configuration
    #[serde(default)]
    pub provider: ProviderFileConfig,

    /// Ingestion pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineFileConfig,

    /// Delivery queue configuration
    #[serde(default)]
    pub relay: RelayFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Largest accepted upload, in bytes
    pub max_upload_bytes: Option<usize>,

    /// Global request budget per minute
    pub rate_limit_rpm: Option<u32>,
}

/// Capability provider configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderFileConfig {
    /// API key (the `OPENAI_API_KEY` env var takes precedence)
    pub api_key: Option<String>,

    /// Base URL of the `OpenAI`-compatible API
    pub base_url: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Chat model used for translation
    pub translation_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,
}

/// Ingestion pipeline configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineFileConfig {
    /// Deadline for each provider call
    pub stage_timeout_secs: Option<u64>,

    /// Directory for staged uploads
    pub staging_dir: Option<String>,
}

/// Delivery queue configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayFileConfig {
    /// Per-slot queue capacity (0 or absent = unbounded)
    pub max_pending: Option<usize>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse_config(content: &str) -> Result<ParleyConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file
///
/// An explicit path must exist and parse. The default path is optional:
/// when it is missing or unreadable, defaults are used.
///
/// # Errors
///
/// Returns error if an explicitly requested file cannot be read or parsed
pub fn load_config_file(explicit: Option<&Path>) -> Result<ParleyConfigFile> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = parse_config(&content)?;
        tracing::info!(path = %path.display(), "loaded config file");
        return Ok(config);
    }

    let Some(path) = config_file_path() else {
        return Ok(ParleyConfigFile::default());
    };

    if !path.exists() {
        return Ok(ParleyConfigFile::default());
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                Ok(ParleyConfigFile::default())
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            Ok(ParleyConfigFile::default())
        }
    }
}

/// Return the config file path: `~/.config/parley/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("parley").join("config.toml"))
}
