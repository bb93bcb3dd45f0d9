//! Conversion Context - 文本转语音上下文
//!
//! 值对象:
//! - ConversionRequest: 经过校验的合成请求
//! - AudioArtifact: 合成产物（内存缓冲或 spool 文件），保证恰好释放一次

mod artifact;
mod request;

pub use artifact::{AudioArtifact, AudioFormat};
pub use request::{ConversionRequest, RequestError, RequestLimits, VoicePolicy};
