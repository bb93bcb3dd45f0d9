//! Convert Handler
//!
//! 文本转语音主端点: 成功时返回音频字节（buffered 整体写出，
//! streamed 按块写出），带 Content-Type / Content-Length /
//! Content-Disposition 头。客户端中途断开时，流的 Drop 负责释放产物。

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::application::{artifact_stream, ConvertInput, DeliveryMode};
use crate::infrastructure::http::dto::ConvertRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn convert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConvertRequest>,
) -> Result<Response, ApiError> {
    let input = ConvertInput {
        text: req.text,
        voice: req.voice,
        speed: req.speed,
    };

    let artifact = state.pipeline.convert(input).await?;

    let format = artifact.format();
    let content_length = artifact.len();

    let body = match state.delivery.mode() {
        DeliveryMode::Buffered => {
            let bytes = artifact
                .into_bytes()
                .await
                .map_err(|e| ApiError::Internal(format!("failed to read artifact: {}", e)))?;
            Body::from(bytes)
        }
        DeliveryMode::Streamed => {
            Body::from_stream(artifact_stream(artifact, state.delivery.chunk_size()))
        }
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(header::CONTENT_LENGTH, content_length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", format.filename()),
        )
        .body(body)
        .unwrap())
}
