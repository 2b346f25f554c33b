//! Caption provider abstractions and implementations.
//!
//! This module provides a trait-based abstraction over the remote
//! generative-AI file/content API, allowing easy swapping between the real
//! Gemini backend and a mock.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Stable label for the error counter.
    pub fn error_type(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network",
        }
    }
}

/// Processing state reported by the remote service for an uploaded file.
///
/// The state set is owned by the service, not by us; values we do not
/// recognize land in `Unknown` and count as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Processing,
    Active,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Opaque reference to a file accepted by the remote service.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    /// Service-assigned resource name (e.g. `files/abc-123`).
    pub name: String,

    /// URI to reference the file in a generation call.
    pub uri: String,

    /// Declared MIME type of the uploaded content.
    pub mime_type: String,

    /// Processing state as of the last fetch.
    pub state: FileState,
}

/// Trait for media-caption providers (e.g., Gemini).
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Upload a local file to the remote service.
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, ProviderError>;

    /// Fetch the current state of a previously uploaded file.
    async fn get_file(&self, name: &str) -> Result<RemoteFile, ProviderError>;

    /// Issue a single generation call referencing the remote file.
    async fn generate(&self, file: &RemoteFile, prompt: &str) -> Result<String, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
