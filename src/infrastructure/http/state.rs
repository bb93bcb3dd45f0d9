//! Application State
//!
//! HTTP 层共享的应用状态

use std::sync::Arc;

use crate::application::{ArtifactDelivery, ConversionPipeline, EngineRegistry};

/// 应用状态
pub struct AppState {
    /// 转换 pipeline
    pub pipeline: Arc<ConversionPipeline>,
    /// 引擎注册表（优雅关闭时用于 shutdown）
    pub registry: Arc<EngineRegistry>,
    /// 产物交付配置
    pub delivery: ArtifactDelivery,
}

impl AppState {
    pub fn new(
        pipeline: Arc<ConversionPipeline>,
        registry: Arc<EngineRegistry>,
        delivery: ArtifactDelivery,
    ) -> Self {
        Self {
            pipeline,
            registry,
            delivery,
        }
    }
}
