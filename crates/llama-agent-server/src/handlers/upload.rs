use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::Path;
use tracing::{error, info};

use crate::models::chat::UploadResponse;
use crate::state::AppState;
use crate::utils::error::ApiError;

fn extension_allowed(file_name: &str, allowed: &[String]) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// `POST /upload`: summarize a text file and record it in the conversation
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    info!("File upload request received");

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, data) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let allowed = &state.settings.upload.allowed_extensions;
    if !extension_allowed(&file_name, allowed) {
        return Err(ApiError::UnsupportedMedia(format!(
            "Only {} files are supported",
            allowed
                .iter()
                .map(|ext| format!(".{}", ext))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let text = String::from_utf8(data)
        .map_err(|_| ApiError::BadRequest("File is not valid UTF-8 text".to_string()))?;
    info!("Processing {} ({} bytes)", file_name, text.len());

    let response = state
        .agent
        .summarize_upload(&file_name, &text)
        .await
        .map_err(|e| {
            error!("Failed to process {}: {}", file_name, e.detail());
            ApiError::from(e)
        })?;

    Ok(Json(UploadResponse {
        message: "File processed successfully".to_string(),
        response,
    }))
}
