//! Conversion Context - 合成请求值对象
//!
//! 不变量:
//! - text 去除首尾空白后非空，且不超过 max_text_len
//! - speed 必须落在 [speed_min, speed_max] 区间内（拒绝而非静默 clamp）

use thiserror::Error;

/// 请求校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("empty text")]
    EmptyText,

    #[error("text too long: {len} > {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("speed out of range: {speed} not in [{min}, {max}]")]
    SpeedOutOfRange { speed: i32, min: i32, max: i32 },

    #[error("unknown voice: {index}")]
    UnknownVoice { index: usize },
}

/// 音色越界策略
///
/// 观察到的上游实现对越界音色有两种处理：报错或回退到 0 号音色。
/// 默认回退，strict 模式下报错。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoicePolicy {
    /// 越界时回退到 0 号音色（默认）
    #[default]
    Fallback,
    /// 越界时返回校验错误
    Strict,
}

/// 请求校验边界
#[derive(Debug, Clone)]
pub struct RequestLimits {
    /// 语速下界
    pub speed_min: i32,
    /// 语速上界
    pub speed_max: i32,
    /// 文本最大长度（字符数）
    pub max_text_len: usize,
    /// 音色越界策略
    pub voice_policy: VoicePolicy,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            speed_min: 50,
            speed_max: 150,
            max_text_len: 5000,
            voice_policy: VoicePolicy::Fallback,
        }
    }
}

/// 合成请求
///
/// 只能通过 `ConversionRequest::new` 构造，构造成功即满足全部不变量。
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    text: String,
    voice: usize,
    speed: i32,
}

impl ConversionRequest {
    /// 校验并构造合成请求
    ///
    /// - 文本首尾空白会被去除
    /// - 空白文本、超长文本、越界语速直接拒绝
    pub fn new(
        text: impl Into<String>,
        voice: usize,
        speed: i32,
        limits: &RequestLimits,
    ) -> Result<Self, RequestError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(RequestError::EmptyText);
        }

        let len = trimmed.chars().count();
        if len > limits.max_text_len {
            return Err(RequestError::TextTooLong {
                len,
                max: limits.max_text_len,
            });
        }

        if speed < limits.speed_min || speed > limits.speed_max {
            return Err(RequestError::SpeedOutOfRange {
                speed,
                min: limits.speed_min,
                max: limits.speed_max,
            });
        }

        Ok(Self {
            text: trimmed.to_string(),
            voice,
            speed,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice(&self) -> usize {
        self.voice
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    /// 将请求语速映射到引擎原生语速域
    ///
    /// 线性映射: 请求域 [50, 150] -> 引擎域 [100, 300]，100 对应正常语速 200。
    /// 负语速（边界被配置成负值时才可能出现）钳制到 0，不做回绕转换。
    pub fn engine_rate(&self) -> u32 {
        (i64::from(self.speed) * 2).max(0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RequestLimits {
        RequestLimits::default()
    }

    #[test]
    fn test_valid_request() {
        let req = ConversionRequest::new("hello world", 0, 100, &limits()).unwrap();
        assert_eq!(req.text(), "hello world");
        assert_eq!(req.voice(), 0);
        assert_eq!(req.speed(), 100);
    }

    #[test]
    fn test_text_is_trimmed() {
        let req = ConversionRequest::new("  hi  ", 0, 100, &limits()).unwrap();
        assert_eq!(req.text(), "hi");
    }

    #[test]
    fn test_empty_text_rejected() {
        let err = ConversionRequest::new("", 0, 100, &limits()).unwrap_err();
        assert_eq!(err, RequestError::EmptyText);
    }

    #[test]
    fn test_whitespace_only_text_rejected() {
        let err = ConversionRequest::new("   \t\n ", 0, 100, &limits()).unwrap_err();
        assert_eq!(err, RequestError::EmptyText);
    }

    #[test]
    fn test_speed_below_range_rejected() {
        let err = ConversionRequest::new("hi", 0, 49, &limits()).unwrap_err();
        assert!(matches!(err, RequestError::SpeedOutOfRange { speed: 49, .. }));
    }

    #[test]
    fn test_speed_above_range_rejected() {
        let err = ConversionRequest::new("hi", 0, 9999, &limits()).unwrap_err();
        assert!(matches!(
            err,
            RequestError::SpeedOutOfRange { speed: 9999, .. }
        ));
    }

    #[test]
    fn test_speed_bounds_inclusive() {
        assert!(ConversionRequest::new("hi", 0, 50, &limits()).is_ok());
        assert!(ConversionRequest::new("hi", 0, 150, &limits()).is_ok());
    }

    #[test]
    fn test_text_too_long_rejected() {
        let mut l = limits();
        l.max_text_len = 4;
        let err = ConversionRequest::new("hello", 0, 100, &l).unwrap_err();
        assert_eq!(err, RequestError::TextTooLong { len: 5, max: 4 });
    }

    #[test]
    fn test_engine_rate_mapping_is_linear() {
        let l = limits();
        assert_eq!(ConversionRequest::new("a", 0, 50, &l).unwrap().engine_rate(), 100);
        assert_eq!(ConversionRequest::new("a", 0, 100, &l).unwrap().engine_rate(), 200);
        assert_eq!(ConversionRequest::new("a", 0, 150, &l).unwrap().engine_rate(), 300);
    }

    #[test]
    fn test_negative_speed_clamps_rate_instead_of_wrapping() {
        let l = RequestLimits {
            speed_min: -100,
            ..RequestLimits::default()
        };
        let req = ConversionRequest::new("a", 0, -50, &l).unwrap();
        assert_eq!(req.engine_rate(), 0);
    }
}
