/*
 * Responsibility
 * - POST /upload (multipart field `image`) and DELETE /upload/{filename}
 * - Size is enforced while streaming chunks, so oversized files are never fully buffered
 */
use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::PathRejection,
    },
    http::{HeaderMap, StatusCode, header},
};
use tracing::info;

use crate::{
    api::v1::{
        dto::{
            envelope::{Data, Empty, Envelope},
            upload::UploadResponse,
        },
        extractors::CurrentIdentity,
    },
    error::AppError,
    services::upload::{UploadError, public_url},
    state::AppState,
};

const FIELD_NAME: &str = "image";

fn multipart_error(e: MultipartError, max_bytes: usize) -> UploadError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { max_bytes }
    } else {
        UploadError::Malformed
    }
}

pub async fn upload_image(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Envelope<Data<UploadResponse>>>, AppError> {
    let mut multipart = multipart.map_err(|_| UploadError::Malformed)?;
    let max_bytes = state.uploads.max_bytes();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        // reject by type before reading the body
        state.uploads.check(content_type.as_deref(), 0)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge { max_bytes }.into());
            }
            bytes.extend_from_slice(&chunk);
        }

        let stored = state
            .uploads
            .save(&original_name, content_type.as_deref(), &bytes)
            .await?;

        let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
        let url = public_url(state.public_base_url.as_deref(), host, &stored.filename);

        info!(
            user_id = %identity.subject_id,
            filename = %stored.filename,
            size = stored.size,
            "upload stored"
        );

        return Ok(Json(
            Envelope::data(UploadResponse {
                filename: stored.filename,
                original_name: stored.original_name,
                size: stored.size,
                url,
            })
            .with_message("file uploaded"),
        ));
    }

    Err(UploadError::MissingFile.into())
}

/// Idempotent: deleting a file that is already gone still succeeds.
pub async fn delete_upload(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    filename: Result<Path<String>, PathRejection>,
) -> Result<Json<Envelope<Empty>>, AppError> {
    let Path(filename) = filename?;

    let removed = state.uploads.delete(&filename).await?;

    info!(
        user_id = %identity.subject_id,
        filename = %filename,
        removed,
        "upload delete requested"
    );

    Ok(Json(Envelope::message("file deleted")))
}
