//! Synthesizer Port - 语音合成引擎抽象
//!
//! 定义合成引擎的抽象接口，具体实现在 infrastructure/adapters 层。
//!
//! 引擎是有状态且不可重入的: set_rate / set_voice 修改引擎全局状态，
//! 随后的 synthesize 读取该状态。configure + synthesize 必须作为一个
//! 原子工作单元执行，由 EngineRegistry 的互斥纪律保证。

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::AudioFormat;

/// 单次合成尝试的失败分类
///
/// Transient 可按 RetryPolicy 自动重试，Fatal 立即中止。
#[derive(Debug, Error)]
pub enum SynthesisFault {
    #[error("transient synthesis failure: {0}")]
    Transient(String),

    #[error("fatal synthesis failure: {0}")]
    Fatal(String),
}

impl SynthesisFault {
    /// 该失败是否可重试
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Transient(r) | Self::Fatal(r) => r,
        }
    }
}

/// 引擎可用音色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// 音色下标（请求中的 voice 字段即此下标）
    pub index: usize,
    /// 音色名称
    pub name: String,
}

/// Synthesizer Port
///
/// 外部合成能力的抽象接口。方法签名使用 `&mut self`:
/// 引擎状态不可共享，调用方必须独占持有。
#[async_trait]
pub trait Synthesizer: Send {
    /// 设置引擎原生语速
    async fn set_rate(&mut self, rate: u32) -> Result<(), SynthesisFault>;

    /// 按下标选择音色
    ///
    /// 调用方保证下标有效（见 `voices`）。
    async fn set_voice(&mut self, index: usize) -> Result<(), SynthesisFault>;

    /// 列出可用音色
    fn voices(&self) -> Vec<VoiceInfo>;

    /// 以当前配置合成文本，返回完整音频字节
    async fn synthesize(&mut self, text: &str) -> Result<Vec<u8>, SynthesisFault>;

    /// 该引擎产出的音频格式
    fn output_format(&self) -> AudioFormat;
}

/// 引擎工厂
///
/// EngineRegistry 首次 acquire 时调用，用于惰性构造引擎实例。
pub type SynthesizerFactory =
    Arc<dyn Fn() -> Result<Box<dyn Synthesizer>, SynthesisFault> + Send + Sync>;
