//! Synthesizer Adapters - 合成引擎实现
//!
//! - HttpSynthesizer: 调用外部 TTS HTTP 服务，产出 MP3
//! - FakeSynthesizer: 本地确定性后端，产出 WAV，用于测试与离线运行

mod fake_synthesizer;
mod http_synthesizer;

pub use fake_synthesizer::{FakeSynthesizer, FakeSynthesizerConfig};
pub use http_synthesizer::{HttpSynthesizer, HttpSynthesizerConfig};
