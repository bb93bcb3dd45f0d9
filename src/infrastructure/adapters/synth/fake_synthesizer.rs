//! Fake Synthesizer - 本地确定性合成后端
//!
//! 不调用任何外部服务，产出合法的 WAV（RIFF 头 + 静音 PCM），
//! 时长与文本长度成正比、与语速成反比。用于测试与离线运行。

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{SynthesisFault, Synthesizer, VoiceInfo};
use crate::domain::AudioFormat;

/// Fake Synthesizer 配置
#[derive(Debug, Clone)]
pub struct FakeSynthesizerConfig {
    /// 采样率
    pub sample_rate: u32,
    /// 正常语速（rate=200）下每字符的采样数
    pub samples_per_char: usize,
    /// 模拟的合成延迟
    pub latency: Duration,
}

impl Default for FakeSynthesizerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            samples_per_char: 1200,
            latency: Duration::from_millis(5),
        }
    }
}

/// Fake Synthesizer
pub struct FakeSynthesizer {
    config: FakeSynthesizerConfig,
    rate: u32,
    voice: usize,
}

impl FakeSynthesizer {
    pub fn new(config: FakeSynthesizerConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            "FakeSynthesizer initialized"
        );
        Self {
            config,
            rate: 200,
            voice: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeSynthesizerConfig::default())
    }
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn set_rate(&mut self, rate: u32) -> Result<(), SynthesisFault> {
        self.rate = rate.max(1);
        Ok(())
    }

    async fn set_voice(&mut self, index: usize) -> Result<(), SynthesisFault> {
        self.voice = index;
        Ok(())
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        vec![
            VoiceInfo {
                index: 0,
                name: "male".to_string(),
            },
            VoiceInfo {
                index: 1,
                name: "female".to_string(),
            },
        ]
    }

    async fn synthesize(&mut self, text: &str) -> Result<Vec<u8>, SynthesisFault> {
        tracing::debug!(
            text_len = text.len(),
            voice = self.voice,
            rate = self.rate,
            "FakeSynthesizer: producing silence"
        );

        // 模拟合成延迟
        tokio::time::sleep(self.config.latency).await;

        let chars = text.chars().count();
        let samples = chars * self.config.samples_per_char * 200 / self.rate as usize;
        Ok(silent_wav(samples, self.config.sample_rate))
    }

    fn output_format(&self) -> AudioFormat {
        AudioFormat::Wav
    }
}

/// 构造 16-bit 单声道静音 WAV
fn silent_wav(samples: usize, sample_rate: u32) -> Vec<u8> {
    let data_len = (samples * 2) as u32;
    let byte_rate = sample_rate * 2;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}
