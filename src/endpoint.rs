//! `POST /api/compress`: one multipart image in, one re-encoded image out.

use crate::constants::{COMPRESSION_FAILED_MESSAGE, FORMAT_FIELD, IMAGE_FIELD, NO_IMAGE_MESSAGE};
use crate::formats::TargetFormat;
use crate::processing::{EncodeSpec, ImageEncoder, RasterEncoder};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Shared, immutable handler state.
#[derive(Clone)]
pub struct EndpointState {
    encoder: Arc<dyn ImageEncoder>,
}

impl EndpointState {
    pub fn new(encoder: Arc<dyn ImageEncoder>) -> Self {
        Self { encoder }
    }
}

impl Default for EndpointState {
    fn default() -> Self {
        Self::new(Arc::new(RasterEncoder))
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image uploaded")]
    NoImage,

    #[error("Image too large")]
    PayloadTooLarge,

    /// The reason is logged, never sent to the client.
    #[error("Compression failed")]
    CompressionFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NoImage => (StatusCode::BAD_REQUEST, NO_IMAGE_MESSAGE.to_string()),
            ApiError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            ApiError::CompressionFailed(reason) => {
                tracing::error!(reason = %reason, "Compression failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    COMPRESSION_FAILED_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Fields pulled out of the multipart form.
#[derive(Debug, Default)]
struct CompressForm {
    image: Option<Bytes>,
    file_name: Option<String>,
    format: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<CompressForm, ApiError> {
    let mut form = CompressForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ApiError::PayloadTooLarge);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed multipart body");
                break;
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            IMAGE_FIELD => {
                form.file_name = field.file_name().map(str::to_string);
                match field.bytes().await {
                    Ok(data) => form.image = Some(data),
                    Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                        return Err(ApiError::PayloadTooLarge);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read image field");
                        break;
                    }
                }
            }
            FORMAT_FIELD => {
                // an unreadable format value falls back to the default
                form.format = field.text().await.ok();
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Handler for `POST /api/compress`.
///
/// A request that is not multipart at all is treated the same as a form
/// without an `image` field.
pub async fn compress(
    State(state): State<EndpointState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Request is not multipart");
        ApiError::NoImage
    })?;

    let form = read_form(multipart).await?;
    let image = form.image.ok_or(ApiError::NoImage)?;
    let format = TargetFormat::from_form_value(form.format.as_deref());
    let spec = EncodeSpec::for_format(format);
    let original_size = image.len();

    let encoder = Arc::clone(&state.encoder);
    let encoded = tokio::task::spawn_blocking(move || encoder.encode(&image, &spec))
        .await
        .map_err(|e| ApiError::CompressionFailed(format!("encoder task failed: {e}")))?
        .map_err(|e| ApiError::CompressionFailed(e.to_string()))?;

    tracing::info!(
        file = form.file_name.as_deref().unwrap_or("<unnamed>"),
        format = %format,
        original_size,
        compressed_size = encoded.len(),
        "Image compressed"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.mime_type()),
            (header::CONTENT_DISPOSITION, "inline"),
        ],
        encoded,
    )
        .into_response())
}
