//! Voxcast - 文本转语音转换服务
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Conversion Context: 合成请求校验与音频产物生命周期
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Synthesizer）
//! - Engine: 引擎生命周期与互斥管理（EngineRegistry / EngineLease）
//! - Retry: 有界重试策略
//! - Pipeline: 转换用例编排
//! - Delivery: 产物交付（buffered / streamed）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Adapters: HttpSynthesizer（外部 TTS 服务）、FakeSynthesizer（测试/离线）

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
