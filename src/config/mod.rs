use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// One status check every 10 seconds while the remote file is processing.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Maximum interval waits before the workflow gives up on a remote file.
/// The upstream behavior was an unbounded wait; this bound is deliberate.
const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone)]
pub struct CaptionConfig {
    pub server: ServerConfig,
    pub google: GoogleConfig,
    pub media: MediaConfig,
    pub generation: GenerationConfig,
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: String,
}

/// Defaults applied to uploads whose multipart part carries no
/// content-type or filename of its own.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub mime_type: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Model for video description (e.g., gemini-2.0-flash)
    pub model: String,
    /// Fixed text prompt sent with every generation call
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl CaptionConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let server: ServerConfig = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(CaptionConfig {
            server,
            google: GoogleConfig {
                // The remote credential is required in every environment.
                api_key: get_env("GOOGLE_API_KEY", None, true)?,
            },
            media: MediaConfig {
                mime_type: get_env("CAPTION_MIME_TYPE", Some("video/mp4"), is_prod)?,
                display_name: get_env("CAPTION_DISPLAY_NAME", Some("uploaded-video"), is_prod)?,
            },
            generation: GenerationConfig {
                model: get_env("CAPTION_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                prompt: get_env(
                    "CAPTION_PROMPT",
                    Some("Describe this video clip in detail."),
                    is_prod,
                )?,
            },
            poll: PollConfig {
                interval_secs: get_env(
                    "CAPTION_POLL_INTERVAL_SECS",
                    Some(&DEFAULT_POLL_INTERVAL_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "CAPTION_POLL_INTERVAL_SECS must be an integer: {}",
                        e
                    ))
                })?,
                max_attempts: get_env(
                    "CAPTION_POLL_MAX_ATTEMPTS",
                    Some(&DEFAULT_POLL_MAX_ATTEMPTS.to_string()),
                    is_prod,
                )?
                .parse()
                .map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "CAPTION_POLL_MAX_ATTEMPTS must be an integer: {}",
                        e
                    ))
                })?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, required: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if required {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
