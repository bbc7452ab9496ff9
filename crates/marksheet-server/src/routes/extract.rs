//! Marksheet extraction endpoint.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use marksheet_core::{ExtractionResponse, MarksheetError, MediaType};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// Headroom over the upload limit for multipart framing, so an oversize
/// file still reaches the explicit size check.
pub const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

struct Upload {
    bytes: Vec<u8>,
    content_type: String,
    file_name: Option<String>,
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(err.body_text())
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}

async fn read_upload(multipart: &mut Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload {
            bytes: bytes.to_vec(),
            content_type,
            file_name,
        });
    }

    Err(ApiError::bad_request(format!(
        "Missing multipart field `{}`",
        FILE_FIELD
    )))
}

/// Extract structured data from an uploaded marksheet.
/// POST /extract
pub async fn extract_marksheet(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ExtractionResponse>> {
    let request_id = Uuid::new_v4();
    let upload = read_upload(&mut multipart).await?;

    let limit = state.max_upload_bytes();
    if upload.bytes.len() > limit {
        return Err(MarksheetError::PayloadTooLarge {
            size: upload.bytes.len(),
            limit,
        }
        .into());
    }
    let media_type = MediaType::parse(&upload.content_type)?;

    let span = info_span!(
        "extract",
        %request_id,
        %media_type,
        file_name = upload.file_name.as_deref().unwrap_or(""),
        size = upload.bytes.len()
    );

    let result = state
        .pipeline
        .process_document(&upload.bytes, media_type)
        .instrument(span)
        .await;

    match result {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            warn!(
                %request_id,
                code = err.code().as_str(),
                error = %err,
                "Extraction failed"
            );
            Err(err.into())
        }
    }
}
