//! 应用层错误定义
//!
//! 转换用例的统一错误分类，传播策略:
//! - Validation: 输入不合法，从不重试，引擎状态不被触碰
//! - Busy / EngineUnavailable: 本层不重试，由调用方/传输层决定
//! - SynthesisExhausted: 可重试失败在本层按策略重试后耗尽才透出
//! - SynthesisFailed: 不可重试失败，立即中止

use thiserror::Error;

use super::engine::EngineError;
use super::ports::SynthesisFault;
use crate::domain::RequestError;

/// 转换用例错误
#[derive(Debug, Error)]
pub enum ConversionError {
    /// 请求校验失败
    #[error("invalid request: {0}")]
    Validation(#[from] RequestError),

    /// 引擎初始化失败或等待超时
    #[error("engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineError),

    /// 在途转换数已达上限
    #[error("too many conversions in flight")]
    Busy,

    /// 可重试失败按策略重试后仍然耗尽
    #[error("synthesis failed after {attempts} attempts: {last}")]
    SynthesisExhausted {
        attempts: u32,
        #[source]
        last: SynthesisFault,
    },

    /// 不可重试的合成失败
    #[error("synthesis failed: {0}")]
    SynthesisFailed(#[source] SynthesisFault),
}
