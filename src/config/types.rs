//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::{ArtifactMode, DeliveryMode, PipelineConfig, RetryPolicy};
use crate::domain::{RequestLimits, VoicePolicy};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 引擎配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 外部 TTS 后端配置（engine.backend = "http" 时生效）
    #[serde(default)]
    pub synth: SynthConfig,

    /// 重试配置
    #[serde(default)]
    pub retry: RetryConfig,

    /// 交付配置
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 静态文件服务配置（Web UI）
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "default_static_enabled")]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,
}

fn default_static_enabled() -> bool {
    false
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_enabled(),
            dir: default_static_dir(),
        }
    }
}

/// 合成引擎后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    /// 外部 TTS HTTP 服务
    #[default]
    Http,
    /// 本地确定性后端（测试 / 离线）
    Fake,
}

/// 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// 后端选择
    #[serde(default)]
    pub backend: EngineBackend,

    /// 等待引擎的超时时间（秒）
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// 语速下界
    #[serde(default = "default_speed_min")]
    pub speed_min: i32,

    /// 语速上界
    #[serde(default = "default_speed_max")]
    pub speed_max: i32,

    /// 文本最大长度（字符数）
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,

    /// 音色越界时报错而非回退到 0 号音色
    #[serde(default)]
    pub strict_voice: bool,

    /// 在途转换上限
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_speed_min() -> i32 {
    50
}

fn default_speed_max() -> i32 {
    150
}

fn default_max_text_len() -> usize {
    5000
}

fn default_max_pending() -> usize {
    32
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: EngineBackend::default(),
            acquire_timeout_secs: default_acquire_timeout(),
            speed_min: default_speed_min(),
            speed_max: default_speed_max(),
            max_text_len: default_max_text_len(),
            strict_voice: false,
            max_pending: default_max_pending(),
        }
    }
}

impl EngineConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn request_limits(&self) -> RequestLimits {
        RequestLimits {
            speed_min: self.speed_min,
            speed_max: self.speed_max,
            max_text_len: self.max_text_len,
            voice_policy: if self.strict_voice {
                VoicePolicy::Strict
            } else {
                VoicePolicy::Fallback
            },
        }
    }
}

/// 外部 TTS 后端配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthConfig {
    /// TTS 服务基础 URL
    #[serde(default = "default_synth_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_synth_timeout")]
    pub timeout_secs: u64,
}

fn default_synth_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_synth_timeout() -> u64 {
    120
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            url: default_synth_url(),
            timeout_secs: default_synth_timeout(),
        }
    }
}

/// 重试配置
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// 最大尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 首次重试前的延迟（毫秒）
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,

    /// 退避因子（1.0 为固定延迟；必须 >= 1.0 保证延迟单调不减）
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    1.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.delay_ms),
            self.backoff_factor,
        )
    }
}

/// 交付配置
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// 交付模式: buffered / streamed
    #[serde(default = "default_delivery_mode")]
    pub mode: String,

    /// 流式交付块大小（字节）
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// spool 文件目录（streamed 模式）
    #[serde(default = "default_spool_dir")]
    pub spool_dir: PathBuf,
}

fn default_delivery_mode() -> String {
    "streamed".to_string()
}

fn default_chunk_size() -> usize {
    8 * 1024
}

fn default_spool_dir() -> PathBuf {
    std::env::temp_dir().join("voxcast")
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            mode: default_delivery_mode(),
            chunk_size: default_chunk_size(),
            spool_dir: default_spool_dir(),
        }
    }
}

impl DeliveryConfig {
    pub fn delivery_mode(&self) -> DeliveryMode {
        match self.mode.as_str() {
            "buffered" => DeliveryMode::Buffered,
            _ => DeliveryMode::Streamed,
        }
    }

    pub fn artifact_mode(&self) -> ArtifactMode {
        match self.delivery_mode() {
            DeliveryMode::Buffered => ArtifactMode::Memory,
            DeliveryMode::Streamed => ArtifactMode::Spooled,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// 汇总出 pipeline 配置
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            limits: self.engine.request_limits(),
            artifact_mode: self.delivery.artifact_mode(),
            spool_dir: self.delivery.spool_dir.clone(),
            max_pending: self.engine.max_pending,
        }
    }
}
