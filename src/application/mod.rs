//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Synthesizer）
//! - engine: 引擎生命周期与互斥管理（EngineRegistry / EngineLease）
//! - retry: 有界重试策略
//! - pipeline: 转换用例编排（ConversionPipeline）
//! - delivery: 产物交付（buffered / streamed）
//! - error: 应用层错误定义

pub mod delivery;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod retry;

// Re-exports
pub use delivery::{artifact_stream, ArtifactDelivery, DeliveryError, DeliveryMode, DEFAULT_CHUNK_SIZE};
pub use engine::{EngineError, EngineLease, EngineRegistry};
pub use error::ConversionError;
pub use pipeline::{ArtifactMode, ConversionPipeline, ConvertInput, PipelineConfig};
pub use ports::{SynthesisFault, Synthesizer, SynthesizerFactory, VoiceInfo};
pub use retry::{RetryError, RetryPolicy};
