//! Gemini caption provider implementation.
//!
//! Uploads media through the Gemini Files API (resumable upload protocol)
//! and describes it with a single `generateContent` call.

use super::{CaptionProvider, FileState, ProviderError, RemoteFile};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

/// Gemini caption provider.
pub struct GeminiCaptionProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiCaptionProvider {
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Files API endpoint that opens a resumable upload session.
    fn upload_start_url(&self) -> String {
        format!(
            "{}/upload/v1beta/files?key={}",
            GEMINI_API_BASE, self.config.api_key
        )
    }

    /// Metadata endpoint for an uploaded file resource.
    fn file_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}?key={}", GEMINI_API_BASE, name, self.config.api_key)
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            GEMINI_API_BASE, self.config.model, self.config.api_key
        )
    }
}

/// Map a non-success status to a provider error, consuming the body for context.
async fn api_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        return ProviderError::RateLimited;
    }

    ProviderError::ApiError(format!("Gemini API error {}: {}", status, error_text))
}

#[async_trait]
impl CaptionProvider for GeminiCaptionProvider {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, ProviderError> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            ProviderError::InvalidRequest(format!("Failed to read {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            size = data.len(),
            mime_type = %mime_type,
            display_name = %display_name,
            "Opening resumable upload session"
        );

        // Open the upload session; the service hands back the session URL
        // in the x-goog-upload-url header.
        let start_response = self
            .client
            .post(self.upload_start_url())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", data.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&StartUploadRequest {
                file: FileMetadata {
                    display_name: display_name.to_string(),
                },
            })
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !start_response.status().is_success() {
            return Err(api_error(start_response).await);
        }

        let upload_url = start_response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::ApiError(
                    "Upload session response missing x-goog-upload-url header".to_string(),
                )
            })?;

        // Send the bytes and finalize in one request.
        let response = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("X-Goog-Upload-Offset", "0")
            .body(data)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: UploadFileResponse = response.json().await.map_err(|e| {
            ProviderError::ApiError(format!("Failed to parse upload response: {}", e))
        })?;

        Ok(body.file.into_remote())
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, ProviderError> {
        let response = self
            .client
            .get(self.file_url(name))
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let file: GeminiFile = response.json().await.map_err(|e| {
            ProviderError::ApiError(format!("Failed to parse file response: {}", e))
        })?;

        Ok(file.into_remote())
    }

    async fn generate(&self, file: &RemoteFile, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    ContentPart::FileData {
                        file_data: FileData {
                            mime_type: file.mime_type.clone(),
                            file_uri: file.uri.clone(),
                        },
                    },
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };

        tracing::debug!(
            model = %self.config.model,
            file = %file.name,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        extract_text(api_response)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        // Try to list models to verify the API key works.
        let url = format!(
            "{}/v1beta/models?key={}",
            GEMINI_API_BASE, self.config.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

/// Pull the generated text out of a response, refusing silently empty output.
fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| ProviderError::ApiError("Response contained no candidates".to_string()))?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(ProviderError::ContentFiltered);
    }

    let text = candidate
        .content
        .parts
        .first()
        .and_then(|p| match p {
            ContentPart::Text { text } => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ProviderError::ApiError(
            "Gemini returned an empty response".to_string(),
        ));
    }

    Ok(text)
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct StartUploadRequest {
    file: FileMetadata,
}

#[derive(Debug, Serialize)]
struct FileMetadata {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct UploadFileResponse {
    file: GeminiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFile {
    name: String,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    state: Option<FileState>,
}

impl GeminiFile {
    fn into_remote(self) -> RemoteFile {
        RemoteFile {
            name: self.name,
            uri: self.uri.unwrap_or_default(),
            mime_type: self.mime_type.unwrap_or_default(),
            state: self.state.unwrap_or(FileState::Unknown),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text { text: String },
    FileData { file_data: FileData },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Content,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_file_resource_with_processing_state() {
        let json = r#"{
            "name": "files/abc-123",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc-123",
            "mimeType": "video/mp4",
            "state": "PROCESSING"
        }"#;

        let file: GeminiFile = serde_json::from_str(json).unwrap();
        let remote = file.into_remote();

        assert_eq!(remote.name, "files/abc-123");
        assert_eq!(remote.state, FileState::Processing);
        assert_eq!(remote.mime_type, "video/mp4");
    }

    #[test]
    fn extract_text_returns_first_text_part() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "A red ball bounces."}]
                },
                "finishReason": "STOP"
            }]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_text(response).unwrap(), "A red ball bounces.");
    }

    #[test]
    fn extract_text_rejects_empty_response() {
        let json = r#"{"candidates": []}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(extract_text(response).is_err());
    }

    #[test]
    fn extract_text_rejects_safety_filtered_response() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "blocked"}]},
                "finishReason": "SAFETY"
            }]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(ProviderError::ContentFiltered)
        ));
    }
}
