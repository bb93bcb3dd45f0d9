//! Data Transfer Objects

use serde::{Deserialize, Serialize};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式（JSON 端点）
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Convert DTOs
// ============================================================================

/// 转换请求体
///
/// 形状与入站契约一致: text 必填，voice 默认 0，speed 默认 100。
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub text: String,

    #[serde(default)]
    pub voice: usize,

    #[serde(default = "default_speed")]
    pub speed: i32,
}

fn default_speed() -> i32 {
    100
}

// ============================================================================
// Voice DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceResponse>,
}
