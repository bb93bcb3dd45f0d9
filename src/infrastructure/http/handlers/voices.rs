//! Voices Handler
//!
//! 列出引擎可用音色

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{ApiResponse, VoiceResponse, VoicesResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn list_voices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<VoicesResponse>>, ApiError> {
    let voices = state
        .pipeline
        .voices()
        .await?
        .into_iter()
        .map(|v| VoiceResponse {
            index: v.index,
            name: v.name,
        })
        .collect();

    Ok(Json(ApiResponse::success(VoicesResponse { voices })))
}
