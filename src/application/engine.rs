//! Engine Registry - 引擎生命周期与互斥管理
//!
//! 引擎是全进程唯一的共享可变资源，不可重入。Registry 负责:
//! - 首次 acquire 时通过工厂惰性构造引擎
//! - 构造失败会被记录，后续 acquire 直接返回该错误而不反复执行昂贵的初始化，
//!   直到 shutdown 重置状态
//! - 以 tokio Mutex 串行化整个 configure + synthesize 区间，acquire 带超时
//! - EngineLease 是 RAII 租约，任何退出路径（含 panic / task 取消）都会归还引擎

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::ports::{Synthesizer, SynthesizerFactory};

/// 引擎获取错误
#[derive(Debug, Error)]
pub enum EngineError {
    /// 工厂初始化失败（已记录，shutdown 前不再重试初始化）
    #[error("engine initialization failed: {0}")]
    InitFailed(String),

    /// 等待引擎超时（可能有请求长时间占用引擎）
    #[error("timed out waiting for engine after {0:?}")]
    AcquireTimeout(Duration),
}

/// 引擎槽位
///
/// engine 与 init_error 互斥: 至多一个为 Some。
struct EngineSlot {
    engine: Option<Box<dyn Synthesizer>>,
    init_error: Option<String>,
}

/// 引擎注册表
///
/// 显式构造、按 Arc 传递，不做隐藏的全局单例，便于测试隔离。
pub struct EngineRegistry {
    factory: SynthesizerFactory,
    slot: Arc<Mutex<EngineSlot>>,
    acquire_timeout: Duration,
}

impl EngineRegistry {
    /// 创建注册表
    ///
    /// `acquire_timeout` 限制等待引擎的时长，防止卡死的引擎拖垮整个服务。
    pub fn new(factory: SynthesizerFactory, acquire_timeout: Duration) -> Self {
        Self {
            factory,
            slot: Arc::new(Mutex::new(EngineSlot {
                engine: None,
                init_error: None,
            })),
            acquire_timeout,
        }
    }

    /// 独占获取引擎
    ///
    /// 阻塞（带超时）直到前一个请求的完整 pipeline 释放引擎。
    /// 返回的租约在 Drop 时自动归还。
    pub async fn acquire(&self) -> Result<EngineLease, EngineError> {
        let mut guard = tokio::time::timeout(self.acquire_timeout, self.slot.clone().lock_owned())
            .await
            .map_err(|_| EngineError::AcquireTimeout(self.acquire_timeout))?;

        if let Some(reason) = guard.init_error.as_ref() {
            return Err(EngineError::InitFailed(reason.clone()));
        }

        if guard.engine.is_none() {
            tracing::info!("Initializing synthesis engine");
            match (self.factory)() {
                Ok(engine) => {
                    guard.engine = Some(engine);
                }
                Err(e) => {
                    let reason = e.to_string();
                    tracing::error!(error = %reason, "Engine initialization failed");
                    guard.init_error = Some(reason.clone());
                    return Err(EngineError::InitFailed(reason));
                }
            }
        }

        Ok(EngineLease { guard })
    }

    /// 停止引擎并清空槽位
    ///
    /// 幂等；之后的 acquire 会重新走初始化（包括之前初始化失败的情况）。
    pub async fn shutdown(&self) {
        let mut guard = self.slot.lock().await;
        if guard.engine.take().is_some() {
            tracing::info!("Synthesis engine shut down");
        }
        guard.init_error = None;
    }
}

/// 引擎租约
///
/// 持有期间独占引擎；Drop 即归还，保证任何退出路径都不会泄漏互斥锁。
pub struct EngineLease {
    guard: OwnedMutexGuard<EngineSlot>,
}

impl EngineLease {
    /// 访问被租用的引擎
    pub fn engine(&mut self) -> &mut dyn Synthesizer {
        // acquire 只在槽位就绪时发放租约
        self.guard
            .engine
            .as_deref_mut()
            .expect("lease issued without an initialized engine")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{SynthesisFault, VoiceInfo};
    use crate::domain::AudioFormat;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoopSynthesizer;

    #[async_trait]
    impl Synthesizer for NoopSynthesizer {
        async fn set_rate(&mut self, _rate: u32) -> Result<(), SynthesisFault> {
            Ok(())
        }

        async fn set_voice(&mut self, _index: usize) -> Result<(), SynthesisFault> {
            Ok(())
        }

        fn voices(&self) -> Vec<VoiceInfo> {
            vec![VoiceInfo {
                index: 0,
                name: "default".to_string(),
            }]
        }

        async fn synthesize(&mut self, _text: &str) -> Result<Vec<u8>, SynthesisFault> {
            Ok(vec![0u8; 4])
        }

        fn output_format(&self) -> AudioFormat {
            AudioFormat::Wav
        }
    }

    fn counting_factory(counter: Arc<AtomicUsize>) -> SynthesizerFactory {
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NoopSynthesizer) as Box<dyn Synthesizer>)
        })
    }

    fn failing_factory(counter: Arc<AtomicUsize>) -> SynthesizerFactory {
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(SynthesisFault::Fatal("no backend".to_string()))
        })
    }

    #[tokio::test]
    async fn test_lazy_init_runs_factory_once() {
        let inits = Arc::new(AtomicUsize::new(0));
        let registry =
            EngineRegistry::new(counting_factory(inits.clone()), Duration::from_secs(1));

        assert_eq!(inits.load(Ordering::SeqCst), 0);
        drop(registry.acquire().await.unwrap());
        drop(registry.acquire().await.unwrap());
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_init_failure_recorded_not_retried() {
        let inits = Arc::new(AtomicUsize::new(0));
        let registry =
            EngineRegistry::new(failing_factory(inits.clone()), Duration::from_secs(1));

        assert!(matches!(
            registry.acquire().await,
            Err(EngineError::InitFailed(_))
        ));
        assert!(matches!(
            registry.acquire().await,
            Err(EngineError::InitFailed(_))
        ));
        // 第二次 acquire 不再执行工厂
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_allows_fresh_init_attempt() {
        let inits = Arc::new(AtomicUsize::new(0));
        let registry =
            EngineRegistry::new(failing_factory(inits.clone()), Duration::from_secs(1));

        let _ = registry.acquire().await;
        registry.shutdown().await;
        let _ = registry.acquire().await;
        assert_eq!(inits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let inits = Arc::new(AtomicUsize::new(0));
        let registry =
            EngineRegistry::new(counting_factory(inits.clone()), Duration::from_secs(1));

        drop(registry.acquire().await.unwrap());
        registry.shutdown().await;
        registry.shutdown().await;
        drop(registry.acquire().await.unwrap());
        assert_eq!(inits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_acquire_times_out_while_lease_held() {
        let inits = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(EngineRegistry::new(
            counting_factory(inits),
            Duration::from_millis(50),
        ));

        let lease = registry.acquire().await.unwrap();
        assert!(matches!(
            registry.acquire().await,
            Err(EngineError::AcquireTimeout(_))
        ));
        drop(lease);

        // 租约归还后可以再次获取
        assert!(registry.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_lease_is_exclusive() {
        let registry = Arc::new(EngineRegistry::new(
            counting_factory(Arc::new(AtomicUsize::new(0))),
            Duration::from_secs(5),
        ));

        let in_use = Arc::new(AtomicUsize::new(0));
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            let in_use = in_use.clone();
            tasks.push(tokio::spawn(async move {
                let mut lease = registry.acquire().await.unwrap();
                assert_eq!(in_use.fetch_add(1, Ordering::SeqCst), 0, "lease overlap");
                lease.engine().synthesize("x").await.unwrap();
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_use.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
    }
}
