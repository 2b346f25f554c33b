use crate::error::AppError;
use crate::services::metrics;
use crate::services::workflow::UploadedFile;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

/// Success payload for `POST /api/upload`: the generated description.
#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub text: String,
}

pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    // 1. Find the first file part named "video"; other fields are drained
    // and ignored. Absence is a declared error, not a crash.
    let field = loop {
        let next = multipart.next_field().await.map_err(|e| {
            AppError::ParseError(anyhow::anyhow!("Failed to read multipart field: {}", e))
        })?;

        match next {
            Some(f) if f.name() == Some("video") => break f,
            Some(_) => continue,
            None => return Err(AppError::MissingFile("video".to_string())),
        }
    };

    let display_name = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| state.config.media.display_name.clone());
    let mime_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| state.config.media.mime_type.clone());

    let data = field.bytes().await.map_err(|e| {
        AppError::ParseError(anyhow::anyhow!("Failed to read file bytes: {}", e))
    })?;

    let upload_id = Uuid::new_v4();
    tracing::info!(
        %upload_id,
        filename = %display_name,
        mime_type = %mime_type,
        size = data.len(),
        "Video upload received"
    );

    // 2. Spool to a temp file; it is removed when this handler returns,
    // whether the workflow succeeded or not.
    let upload = UploadedFile::spool(&data, mime_type, display_name).await?;

    // 3. Run the workflow and return the generated text.
    let model = &state.config.generation.model;
    match state
        .workflow
        .generate(&upload, &state.config.generation.prompt)
        .await
    {
        Ok(text) => {
            metrics::record_caption_request(model, "success");
            tracing::info!(%upload_id, chars = text.len(), "Caption generated");
            Ok(Json(CaptionResponse { text }))
        }
        Err(e) => {
            metrics::record_caption_request(model, "error");
            tracing::warn!(%upload_id, error = %e, "Caption request failed");
            Err(e.into())
        }
    }
}
