//! Voxcast - 文本转语音转换服务
//!
//! 组装: config -> synthesizer factory -> EngineRegistry -> ConversionPipeline
//! -> HTTP server（带优雅关闭，关闭时 shutdown 引擎）

use std::sync::Arc;
use std::time::Duration;

use voxcast::application::{
    ArtifactDelivery, ConversionPipeline, EngineRegistry, Synthesizer, SynthesizerFactory,
};
use voxcast::config::{load_config, print_config, EngineBackend};
use voxcast::infrastructure::adapters::{
    FakeSynthesizer, FakeSynthesizerConfig, HttpSynthesizer, HttpSynthesizerConfig,
};
use voxcast::infrastructure::http::{AppState, HttpServer, HttpServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},voxcast={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt().with_env_filter(env_filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Voxcast - 文本转语音转换服务");
    print_config(&config);

    // 确保 spool 目录存在
    tokio::fs::create_dir_all(&config.delivery.spool_dir).await?;

    // 创建 synthesizer 工厂（引擎由 Registry 惰性初始化）
    let factory: SynthesizerFactory = match config.engine.backend {
        EngineBackend::Http => {
            let synth_config = HttpSynthesizerConfig {
                base_url: config.synth.url.clone(),
                timeout_secs: config.synth.timeout_secs,
                ..HttpSynthesizerConfig::default()
            };
            Arc::new(move || {
                Ok(Box::new(HttpSynthesizer::new(synth_config.clone())?) as Box<dyn Synthesizer>)
            })
        }
        EngineBackend::Fake => Arc::new(|| {
            Ok(Box::new(FakeSynthesizer::new(FakeSynthesizerConfig::default()))
                as Box<dyn Synthesizer>)
        }),
    };

    // 创建引擎注册表与转换 pipeline
    let registry = Arc::new(EngineRegistry::new(
        factory,
        config.engine.acquire_timeout(),
    ));
    let pipeline = Arc::new(ConversionPipeline::new(
        registry.clone(),
        config.retry.policy(),
        config.pipeline_config(),
    ));
    let delivery = ArtifactDelivery::new(
        config.delivery.delivery_mode(),
        config.delivery.chunk_size,
    );

    // 创建 HTTP 服务器
    let mut server_config = HttpServerConfig::new(&config.server.host, config.server.port);
    if config.server.static_files.enabled {
        server_config = server_config.with_static_dir(config.server.static_files.dir.clone());
    }
    let state = AppState::new(pipeline, registry.clone(), delivery);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 停止引擎（幂等）
    tokio::time::timeout(Duration::from_secs(5), registry.shutdown())
        .await
        .ok();

    tracing::info!("Server shutdown complete");

    Ok(())
}
