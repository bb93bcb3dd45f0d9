//! Conversion Pipeline - 转换用例编排
//!
//! 流程: 校验请求 -> 获取引擎 -> 配置（语速/音色）-> 按重试策略合成
//! -> 产出 AudioArtifact -> 归还引擎。
//!
//! 并发模型: 引擎是唯一共享可变资源，configure + synthesize 全程持有
//! EngineLease，两个请求不可能观察到彼此的中间配置。重试发生在同一次
//! 租约内（不做释放-重取），避免两个请求的重试交错竞争。

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use uuid::Uuid;

use super::engine::{EngineLease, EngineRegistry};
use super::error::ConversionError;
use super::ports::{SynthesisFault, VoiceInfo};
use super::retry::{RetryError, RetryPolicy};
use crate::domain::{
    AudioArtifact, ConversionRequest, RequestError, RequestLimits, VoicePolicy,
};

/// 产物落地方式
///
/// Memory 对应 buffered 交付，Spooled 对应 streamed 交付的文件后备。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactMode {
    Memory,
    Spooled,
}

/// Pipeline 配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 请求校验边界
    pub limits: RequestLimits,
    /// 产物落地方式
    pub artifact_mode: ArtifactMode,
    /// spool 文件目录
    pub spool_dir: PathBuf,
    /// 在途转换上限（有界并发，超出直接拒绝）
    pub max_pending: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limits: RequestLimits::default(),
            artifact_mode: ArtifactMode::Memory,
            spool_dir: std::env::temp_dir(),
            max_pending: 32,
        }
    }
}

/// 未经校验的入站请求形状（transport 无关）
#[derive(Debug, Clone)]
pub struct ConvertInput {
    pub text: String,
    pub voice: usize,
    pub speed: i32,
}

/// 转换 Pipeline
pub struct ConversionPipeline {
    registry: Arc<EngineRegistry>,
    retry: RetryPolicy,
    config: PipelineConfig,
    admission: Semaphore,
}

impl ConversionPipeline {
    pub fn new(registry: Arc<EngineRegistry>, retry: RetryPolicy, config: PipelineConfig) -> Self {
        let admission = Semaphore::new(config.max_pending.max(1));
        Self {
            registry,
            retry,
            config,
            admission,
        }
    }

    /// 执行一次文本到音频的转换
    ///
    /// 成功返回的产物归调用方所有；任何失败路径都不会留下 spool 残片，
    /// 也不会持有引擎锁。
    pub async fn convert(&self, input: ConvertInput) -> Result<AudioArtifact, ConversionError> {
        // 1. 校验（在触碰引擎之前完成）
        let request =
            ConversionRequest::new(input.text, input.voice, input.speed, &self.config.limits)?;

        // 2. 有界并发准入
        let _permit = self
            .admission
            .try_acquire()
            .map_err(|_| ConversionError::Busy)?;

        // 3. 独占获取引擎；租约 Drop 即归还
        let mut lease = self.registry.acquire().await?;

        // 4. 解析音色: 越界按策略回退或报错
        let voice = self.resolve_voice(&mut lease, request.voice())?;

        // 5. 配置引擎（configure 错误快速失败，不重试）
        lease
            .engine()
            .set_rate(request.engine_rate())
            .await
            .map_err(ConversionError::SynthesisFailed)?;
        lease
            .engine()
            .set_voice(voice)
            .await
            .map_err(ConversionError::SynthesisFailed)?;

        // 6. 持有租约的前提下按策略重试合成
        let mode = self.config.artifact_mode;
        let spool_dir = self.config.spool_dir.clone();
        let text = request.text().to_string();

        let outcome = self
            .retry
            .run(
                &mut lease,
                move |lease, attempt| {
                    let text = text.clone();
                    let spool_dir = spool_dir.clone();
                    Box::pin(async move {
                        synthesize_attempt(lease, &text, attempt, mode, &spool_dir).await
                    })
                },
                SynthesisFault::is_transient,
            )
            .await;

        match outcome {
            Ok(artifact) => {
                tracing::info!(
                    bytes = artifact.len(),
                    format = ?artifact.format(),
                    "Conversion succeeded"
                );
                Ok(artifact)
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                tracing::error!(attempts, error = %last, "Synthesis retries exhausted");
                Err(ConversionError::SynthesisExhausted { attempts, last })
            }
            Err(RetryError::Aborted(fault)) => {
                tracing::error!(error = %fault, "Synthesis failed fatally");
                Err(ConversionError::SynthesisFailed(fault))
            }
        }
    }

    /// 列出引擎可用音色
    pub async fn voices(&self) -> Result<Vec<VoiceInfo>, ConversionError> {
        let mut lease = self.registry.acquire().await?;
        Ok(lease.engine().voices())
    }

    /// 音色下标解析
    ///
    /// 越界时默认回退到 0 号音色；strict 模式下作为校验错误拒绝。
    fn resolve_voice(
        &self,
        lease: &mut EngineLease,
        requested: usize,
    ) -> Result<usize, ConversionError> {
        let available = lease.engine().voices().len();
        if requested < available {
            return Ok(requested);
        }
        match self.config.limits.voice_policy {
            VoicePolicy::Strict => Err(ConversionError::Validation(RequestError::UnknownVoice {
                index: requested,
            })),
            VoicePolicy::Fallback => {
                tracing::warn!(
                    requested,
                    available,
                    "Requested voice out of range, falling back to voice 0"
                );
                Ok(0)
            }
        }
    }
}

/// 执行单次合成尝试
///
/// Spooled 模式下失败的写入会在返回前清除部分文件，保证重试从干净状态开始。
async fn synthesize_attempt(
    lease: &mut EngineLease,
    text: &str,
    attempt: u32,
    mode: ArtifactMode,
    spool_dir: &std::path::Path,
) -> Result<AudioArtifact, SynthesisFault> {
    tracing::debug!(attempt, text_len = text.len(), "Synthesis attempt");

    let bytes = lease.engine().synthesize(text).await.map_err(|e| {
        tracing::warn!(attempt, error = %e, "Synthesis attempt failed");
        e
    })?;
    let format = lease.engine().output_format();

    match mode {
        ArtifactMode::Memory => Ok(AudioArtifact::from_bytes(bytes, format)),
        ArtifactMode::Spooled => {
            tokio::fs::create_dir_all(spool_dir)
                .await
                .map_err(|e| SynthesisFault::Fatal(format!("spool dir unavailable: {}", e)))?;

            let path = spool_dir.join(format!("voxcast-{}.{}", Uuid::new_v4(), format.extension()));
            let len = bytes.len() as u64;
            if let Err(e) = tokio::fs::write(&path, &bytes).await {
                // 清除部分写入，失败只告警
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(path = %path.display(), error = %rm, "Failed to remove partial spool file");
                    }
                }
                return Err(SynthesisFault::Fatal(format!("spool write failed: {}", e)));
            }
            Ok(AudioArtifact::spooled(path, len, format))
        }
    }
}
