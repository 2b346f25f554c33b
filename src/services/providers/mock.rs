//! Mock provider implementation for testing.
//!
//! Plays back a scripted sequence of processing states and counts every
//! remote call, so tests can assert exactly which calls a request issued.

use super::{CaptionProvider, FileState, ProviderError, RemoteFile};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock caption provider for testing.
pub struct MockCaptionProvider {
    states: Mutex<VecDeque<FileState>>,
    fail_upload: bool,
    fail_generation: bool,
    caption: String,
    upload_calls: AtomicUsize,
    status_calls: AtomicUsize,
    generate_calls: AtomicUsize,
}

impl MockCaptionProvider {
    /// Provider whose file is ready on the first status check.
    pub fn ready(caption: &str) -> Self {
        Self::with_states(vec![FileState::Active], caption)
    }

    /// Provider that reports the given states in order on successive status
    /// checks; once the script runs out, every further check reports Active.
    pub fn with_states(states: Vec<FileState>, caption: &str) -> Self {
        Self {
            states: Mutex::new(states.into()),
            fail_upload: false,
            fail_generation: false,
            caption: caption.to_string(),
            upload_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
        }
    }

    /// Provider whose upload call is rejected by the remote service.
    pub fn failing_upload() -> Self {
        Self {
            fail_upload: true,
            ..Self::ready("")
        }
    }

    /// Provider whose generation call fails after a successful upload.
    pub fn failing_generation() -> Self {
        Self {
            fail_generation: true,
            ..Self::ready("")
        }
    }

    pub fn upload_count(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn status_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn generate_count(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    fn remote_file(&self, state: FileState) -> RemoteFile {
        let n = self.upload_calls.load(Ordering::SeqCst);
        RemoteFile {
            name: format!("files/mock-{}", n),
            uri: format!("https://mock.invalid/v1beta/files/mock-{}", n),
            mime_type: "video/mp4".to_string(),
            state,
        }
    }
}

#[async_trait]
impl CaptionProvider for MockCaptionProvider {
    async fn upload_file(
        &self,
        _path: &Path,
        _mime_type: &str,
        _display_name: &str,
    ) -> Result<RemoteFile, ProviderError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_upload {
            return Err(ProviderError::ApiError(
                "Mock upload rejected".to_string(),
            ));
        }

        Ok(self.remote_file(FileState::Processing))
    }

    async fn get_file(&self, _name: &str) -> Result<RemoteFile, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let state = self
            .states
            .lock()
            .expect("state script lock poisoned")
            .pop_front()
            .unwrap_or(FileState::Active);

        Ok(self.remote_file(state))
    }

    async fn generate(&self, _file: &RemoteFile, _prompt: &str) -> Result<String, ProviderError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_generation {
            return Err(ProviderError::ApiError(
                "Mock generation failed".to_string(),
            ));
        }

        Ok(self.caption.clone())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
