//! The upload-then-poll-then-generate workflow.
//!
//! Drives one uploaded file through remote processing to generated text.
//! There is no retry anywhere in the pipeline: the first failure at any step
//! terminates the request.

use crate::config::PollConfig;
use crate::services::metrics;
use crate::services::providers::{CaptionProvider, FileState, ProviderError, RemoteFile};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Error type for workflow operations, one variant per pipeline step.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("remote upload failed: {0}")]
    Upload(#[source] ProviderError),

    #[error("remote status check failed: {0}")]
    StatusCheck(#[source] ProviderError),

    #[error("remote service reported processing failure for {name}")]
    RemoteProcessing { name: String },

    #[error("remote file {name} still processing after {attempts} poll attempts")]
    PollTimeout { name: String, attempts: u32 },

    #[error("generation failed: {0}")]
    Generation(#[source] ProviderError),
}

/// A file extracted from an incoming form, spooled to a temporary location.
///
/// The temp file is removed when this value drops, whether the workflow
/// succeeded or not.
pub struct UploadedFile {
    file: NamedTempFile,
    pub mime_type: String,
    pub display_name: String,
}

impl UploadedFile {
    /// Spool the raw bytes of an uploaded part to a fresh temp file.
    pub async fn spool(
        data: &[u8],
        mime_type: String,
        display_name: String,
    ) -> std::io::Result<Self> {
        let file = NamedTempFile::new()?;
        tokio::fs::write(file.path(), data).await?;

        Ok(Self {
            file,
            mime_type,
            display_name,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Drives an uploaded file through the remote service: upload, poll until
/// the file leaves PROCESSING, then issue exactly one generation call.
pub struct CaptionWorkflow {
    provider: Arc<dyn CaptionProvider>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl CaptionWorkflow {
    pub fn new(provider: Arc<dyn CaptionProvider>, poll: &PollConfig) -> Self {
        Self {
            provider,
            poll_interval: poll.interval(),
            max_poll_attempts: poll.max_attempts,
        }
    }

    /// Generate text describing the uploaded file.
    pub async fn generate(
        &self,
        upload: &UploadedFile,
        prompt: &str,
    ) -> Result<String, WorkflowError> {
        // 1. Upload; any rejection short-circuits before a single status check.
        let started = Instant::now();
        let handle = self
            .provider
            .upload_file(upload.path(), &upload.mime_type, &upload.display_name)
            .await
            .map_err(|e| {
                metrics::record_provider_error("upload", e.error_type());
                WorkflowError::Upload(e)
            })?;
        metrics::record_provider_latency("upload", started.elapsed().as_secs_f64());

        tracing::info!(
            file = %handle.name,
            state = ?handle.state,
            "Remote upload accepted"
        );

        // 2. Poll until the service reports a state other than PROCESSING.
        // One initial status check, then bounded interval waits.
        let mut file = self.fetch_state(&handle.name).await?;
        let mut waits = 0u32;

        while file.state == FileState::Processing {
            if waits >= self.max_poll_attempts {
                tracing::warn!(
                    file = %handle.name,
                    attempts = waits,
                    "Giving up on remote processing"
                );
                return Err(WorkflowError::PollTimeout {
                    name: handle.name.clone(),
                    attempts: waits,
                });
            }

            tokio::time::sleep(self.poll_interval).await;
            waits += 1;
            file = self.fetch_state(&handle.name).await?;
        }

        metrics::record_poll_waits(waits);

        if file.state == FileState::Failed {
            tracing::warn!(file = %file.name, "Remote service reported processing failure");
            return Err(WorkflowError::RemoteProcessing { name: file.name });
        }

        // 3. Generate: exactly one call, referencing the remote file URI.
        let started = Instant::now();
        let text = self
            .provider
            .generate(&file, prompt)
            .await
            .map_err(|e| {
                metrics::record_provider_error("generate", e.error_type());
                WorkflowError::Generation(e)
            })?;
        metrics::record_provider_latency("generate", started.elapsed().as_secs_f64());

        // A silently empty result is a generation failure, whatever the
        // provider behind the trait did.
        if text.is_empty() {
            metrics::record_provider_error("generate", "empty");
            return Err(WorkflowError::Generation(ProviderError::ApiError(
                "Provider returned empty text".to_string(),
            )));
        }

        tracing::info!(
            file = %file.name,
            waits,
            chars = text.len(),
            "Generation completed"
        );

        Ok(text)
    }

    async fn fetch_state(&self, name: &str) -> Result<RemoteFile, WorkflowError> {
        self.provider.get_file(name).await.map_err(|e| {
            metrics::record_provider_error("get_file", e.error_type());
            WorkflowError::StatusCheck(e)
        })
    }
}
