//! HTTP Routes
//!
//! API 路由定义
//!
//! API Endpoints:
//! - /api/convert   POST  文本转语音，返回音频字节
//! - /api/voices    GET   列出可用音色
//! - /api/ping      GET   健康检查

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/voices", get(handlers::list_voices))
        .route("/convert", post(handlers::convert))
}
