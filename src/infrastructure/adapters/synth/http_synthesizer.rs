//! HTTP Synthesizer - 调用外部 TTS HTTP 服务
//!
//! 实现 Synthesizer trait，通过 HTTP 调用外部 TTS 服务
//!
//! 外部 TTS API:
//! POST {base_url}/api/tts/synthesize
//! Request: {"text": "...", "voice": 0, "rate": 200}  (JSON)
//! Response: audio/mpeg binary
//!
//! 失败分类: 超时 / 连接失败 / 5xx 为 Transient（可重试），
//! 4xx 为 Fatal（后端明确拒绝，重试无意义）。

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SynthesisFault, Synthesizer, VoiceInfo};
use crate::domain::AudioFormat;

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SynthesizeHttpRequest<'a> {
    /// 要合成的文本
    text: &'a str,
    /// 音色下标
    voice: usize,
    /// 引擎原生语速
    rate: u32,
}

/// HTTP Synthesizer 配置
#[derive(Debug, Clone)]
pub struct HttpSynthesizerConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 后端暴露的音色名称（下标即请求中的 voice 字段）
    pub voices: Vec<String>,
}

impl Default for HttpSynthesizerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            voices: vec!["male".to_string(), "female".to_string()],
        }
    }
}

impl HttpSynthesizerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP Synthesizer
///
/// rate / voice 是引擎侧状态，在这里本地持有并随每次合成请求下发；
/// set_rate / set_voice 与 synthesize 之间的原子性由上层租约保证。
pub struct HttpSynthesizer {
    client: Client,
    config: HttpSynthesizerConfig,
    rate: u32,
    voice: usize,
}

impl HttpSynthesizer {
    /// 创建新的 HTTP Synthesizer
    pub fn new(config: HttpSynthesizerConfig) -> Result<Self, SynthesisFault> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisFault::Fatal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            rate: 200,
            voice: 0,
        })
    }

    /// 使用默认配置创建
    pub fn with_default_config() -> Result<Self, SynthesisFault> {
        Self::new(HttpSynthesizerConfig::default())
    }

    /// 获取合成 URL
    fn synthesize_url(&self) -> String {
        format!("{}/api/tts/synthesize", self.config.base_url)
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn set_rate(&mut self, rate: u32) -> Result<(), SynthesisFault> {
        self.rate = rate;
        Ok(())
    }

    async fn set_voice(&mut self, index: usize) -> Result<(), SynthesisFault> {
        self.voice = index;
        Ok(())
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.config
            .voices
            .iter()
            .enumerate()
            .map(|(index, name)| VoiceInfo {
                index,
                name: name.clone(),
            })
            .collect()
    }

    async fn synthesize(&mut self, text: &str) -> Result<Vec<u8>, SynthesisFault> {
        let body = SynthesizeHttpRequest {
            text,
            voice: self.voice,
            rate: self.rate,
        };

        tracing::debug!(
            url = %self.synthesize_url(),
            text_len = text.len(),
            voice = self.voice,
            rate = self.rate,
            "Sending synthesize request"
        );

        let response = self
            .client
            .post(&self.synthesize_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisFault::Transient("request timed out".to_string())
                } else if e.is_connect() {
                    SynthesisFault::Transient(format!("cannot connect to TTS service: {}", e))
                } else {
                    SynthesisFault::Transient(format!("network error: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return if status.is_server_error() {
                Err(SynthesisFault::Transient(format!(
                    "HTTP {}: {}",
                    status, error_text
                )))
            } else {
                Err(SynthesisFault::Fatal(format!(
                    "HTTP {}: {}",
                    status, error_text
                )))
            };
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisFault::Transient(format!("failed to read audio: {}", e)))?
            .to_vec();

        tracing::info!(audio_size = audio.len(), "Synthesis completed");
        Ok(audio)
    }

    fn output_format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }
}
