//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXCAST_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXCAST_SERVER__PORT=8080`
/// - `VOXCAST_ENGINE__BACKEND=fake`
/// - `VOXCAST_SYNTH__URL=http://tts-server:8000`
/// - `VOXCAST_RETRY__MAX_ATTEMPTS=5`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5080)?
        .set_default("engine.acquire_timeout_secs", 30)?
        .set_default("engine.speed_min", 50)?
        .set_default("engine.speed_max", 150)?
        .set_default("engine.max_text_len", 5000)?
        .set_default("engine.strict_voice", false)?
        .set_default("engine.max_pending", 32)?
        .set_default("synth.url", "http://localhost:8000")?
        .set_default("synth.timeout_secs", 120)?
        .set_default("retry.max_attempts", 3)?
        .set_default("retry.delay_ms", 1000)?
        .set_default("retry.backoff_factor", 1.0)?
        .set_default("delivery.chunk_size", 8 * 1024)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: VOXCAST_
    // 层级分隔符: __ (双下划线)
    // 例如: VOXCAST_SYNTH__URL=http://tts-server:8000
    builder = builder.add_source(
        Environment::with_prefix("VOXCAST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证端口范围
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    // 验证 TTS URL
    if config.synth.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Synth backend URL cannot be empty".to_string(),
        ));
    }

    // 验证语速边界
    if config.engine.speed_min < 0 {
        return Err(ConfigError::ValidationError(format!(
            "engine.speed_min cannot be negative: {}",
            config.engine.speed_min
        )));
    }
    if config.engine.speed_min > config.engine.speed_max {
        return Err(ConfigError::ValidationError(format!(
            "Invalid speed bounds: {} > {}",
            config.engine.speed_min, config.engine.speed_max
        )));
    }

    // 验证重试配置
    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }
    if config.retry.backoff_factor < 1.0 {
        return Err(ConfigError::ValidationError(
            "retry.backoff_factor must be >= 1.0 (delay must be non-decreasing)".to_string(),
        ));
    }

    // 验证交付配置
    match config.delivery.mode.as_str() {
        "buffered" | "streamed" => {}
        other => {
            return Err(ConfigError::ValidationError(format!(
                "Unknown delivery mode: {}",
                other
            )));
        }
    }
    if config.delivery.chunk_size == 0 {
        return Err(ConfigError::ValidationError(
            "delivery.chunk_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Engine Backend: {:?}", config.engine.backend);
    tracing::info!("Engine Acquire Timeout: {}s", config.engine.acquire_timeout_secs);
    tracing::info!(
        "Speed Bounds: [{}, {}]",
        config.engine.speed_min,
        config.engine.speed_max
    );
    tracing::info!("Synth URL: {}", config.synth.url);
    tracing::info!("Synth Timeout: {}s", config.synth.timeout_secs);
    tracing::info!(
        "Retry: {} attempts, {}ms delay, backoff x{}",
        config.retry.max_attempts,
        config.retry.delay_ms,
        config.retry.backoff_factor
    );
    tracing::info!("Delivery Mode: {}", config.delivery.mode);
    tracing::info!("Spool Directory: {:?}", config.delivery.spool_dir);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5080);
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_synth_url() {
        let mut config = AppConfig::default();
        config.synth.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_negative_speed_min() {
        let mut config = AppConfig::default();
        config.engine.speed_min = -10;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_inverted_speed_bounds() {
        let mut config = AppConfig::default();
        config.engine.speed_min = 200;
        config.engine.speed_max = 100;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_shrinking_backoff() {
        let mut config = AppConfig::default();
        config.retry.backoff_factor = 0.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unknown_delivery_mode() {
        let mut config = AppConfig::default();
        config.delivery.mode = "chunky".to_string();
        assert!(validate_config(&config).is_err());
    }
}
