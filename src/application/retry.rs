//! Retry Policy - 有界重试
//!
//! 包装一个可失败操作，按分类器区分可重试 / 不可重试失败:
//! - 不可重试失败立即以原错误中止，不包装为耗尽
//! - 可重试失败延迟后再次尝试，最多 max_attempts 次
//! - 全部耗尽后返回 Exhausted，保留最后一次失败的细节
//!
//! 延迟默认固定 1s；backoff_factor >= 1.0 时延迟单调不减。

use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

/// 重试结束原因
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// 首个不可重试失败，原样透出
    #[error("operation aborted: {0}")]
    Aborted(E),

    /// 尝试次数耗尽
    #[error("operation failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
}

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), 1.0)
    }
}

impl RetryPolicy {
    /// 创建重试策略
    ///
    /// max_attempts 至少为 1；backoff_factor 低于 1.0 会被提升到 1.0
    /// 以保证延迟序列单调不减。
    pub fn new(max_attempts: u32, delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff_factor: if backoff_factor < 1.0 { 1.0 } else { backoff_factor },
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 第 attempt 次失败后的等待时长（attempt 从 1 开始计数）
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        self.delay.mul_f64(factor)
    }

    /// 在 `state` 上反复执行 `op` 直到成功、遇到不可重试失败或尝试耗尽
    ///
    /// `op` 接收独占的 state 引用与当前尝试序号（从 1 开始）。
    /// 约束: op 失败时必须自行清理本次尝试的任何部分输出，
    /// 使下一次尝试从干净状态开始。
    pub async fn run<S, T, E>(
        &self,
        state: &mut S,
        mut op: impl for<'a> FnMut(&'a mut S, u32) -> BoxFuture<'a, Result<T, E>>,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, RetryError<E>> {
        let mut attempt = 1u32;
        loop {
            match op(state, attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => return Err(RetryError::Aborted(e)),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(_) => {
                    let delay = self.delay_after(attempt);
                    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), 1.0)
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let policy = fast_policy(3);
        let mut calls = 0u32;
        let result: Result<u32, RetryError<&str>> = policy
            .run(
                &mut calls,
                |calls, _| {
                    *calls += 1;
                    Box::pin(async move { Ok(7) })
                },
                |_| true,
            )
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let policy = fast_policy(3);
        let mut calls = 0u32;
        let result: Result<&str, RetryError<&str>> = policy
            .run(
                &mut calls,
                |calls, attempt| {
                    *calls += 1;
                    Box::pin(async move {
                        if attempt < 3 {
                            Err("transient")
                        } else {
                            Ok("done")
                        }
                    })
                },
                |_| true,
            )
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_non_retryable_aborts_immediately() {
        let policy = fast_policy(5);
        let mut calls = 0u32;
        let result: Result<(), RetryError<&str>> = policy
            .run(
                &mut calls,
                |calls, _| {
                    *calls += 1;
                    Box::pin(async move { Err("fatal") })
                },
                |_| false,
            )
            .await;
        assert!(matches!(result, Err(RetryError::Aborted("fatal"))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_exhaustion_preserves_last_error() {
        let policy = fast_policy(3);
        let mut calls = 0u32;
        let result: Result<(), RetryError<String>> = policy
            .run(
                &mut calls,
                |calls, attempt| {
                    *calls += 1;
                    Box::pin(async move { Err(format!("fail-{}", attempt)) })
                },
                |_| true,
            )
            .await;
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "fail-3");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_fixed_delay_sequence() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100), 1.0);
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(100));
        assert_eq!(policy.delay_after(3), Duration::from_millis(100));
    }

    #[test]
    fn test_backoff_is_monotonic_non_decreasing() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), 2.0);
        let delays: Vec<_> = (1..5).map(|a| policy.delay_after(a)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(delays[0], Duration::from_millis(100));
        assert_eq!(delays[1], Duration::from_millis(200));
        assert_eq!(delays[2], Duration::from_millis(400));
    }

    #[test]
    fn test_sub_unit_backoff_factor_is_clamped() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), 0.5);
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1), 1.0);
        assert_eq!(policy.max_attempts(), 1);
    }
}
