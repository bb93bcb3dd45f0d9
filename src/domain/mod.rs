//! Domain Layer - 领域层
//!
//! 包含一个限界上下文:
//! - Conversion Context: 文本转语音请求与音频产物

pub mod conversion;

pub use conversion::{
    AudioArtifact, AudioFormat, ConversionRequest, RequestError, RequestLimits, VoicePolicy,
};
