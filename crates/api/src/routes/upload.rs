//! Shared handling of multipart uploads.

use axum::extract::Multipart;
use localfish_core::storage::{MediaStorage, UploadRequest, UploadedMedia};

use crate::error::{ApiError, ApiResult};

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

/// Reads the `file` field of a multipart body.
pub(crate) async fn read_file(mut multipart: Multipart, folder: &str) -> ApiResult<UploadRequest> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;

        return Ok(UploadRequest {
            data,
            filename,
            content_type,
            folder: Some(folder.to_string()),
        });
    }

    Err(ApiError::validation("Missing 'file' field in upload"))
}

/// Uploads a file; size and type are checked before any network call.
pub(crate) async fn store(media: &MediaStorage, request: UploadRequest) -> ApiResult<UploadedMedia> {
    let uploaded = media.upload(request).await?;
    tracing::info!(public_id = %uploaded.public_id, bytes = uploaded.bytes, "Media uploaded");
    Ok(uploaded)
}

/// Deletes a replaced or orphaned asset; failures are only logged.
pub(crate) async fn discard(media: Option<&MediaStorage>, public_id: Option<String>) {
    let (Some(media), Some(public_id)) = (media, public_id) else {
        return;
    };
    if let Err(e) = media.destroy(&public_id).await {
        tracing::warn!(public_id = %public_id, error = %e, "Failed to delete media asset");
    }
}
