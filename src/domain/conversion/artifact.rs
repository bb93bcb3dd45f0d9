//! Conversion Context - 音频产物值对象
//!
//! 不变量:
//! - 产物底层资源（内存缓冲 / spool 文件）恰好释放一次
//! - 释放失败只记录日志，不向调用方传播

use std::path::PathBuf;

/// 音频格式
///
/// 由所配置的 Synthesizer 后端决定: 远端 HTTP 后端产出 MP3，本地 fake 后端产出 WAV。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    /// HTTP Content-Type
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }

    /// 下载建议文件名
    pub fn filename(&self) -> &'static str {
        match self {
            Self::Mp3 => "speech.mp3",
            Self::Wav => "speech.wav",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

/// 产物底层存储
#[derive(Debug)]
pub(crate) enum ArtifactBacking {
    /// 完全驻留内存
    Memory(Vec<u8>),
    /// 落盘 spool 文件（由产物负责删除）
    Spooled(PathBuf),
}

/// 音频产物
///
/// 由 ConversionPipeline 产出，所有权沿 pipeline -> delivery 单向移动。
/// 显式 `dispose` 或隐式 Drop 均会释放底层资源，且只释放一次。
#[derive(Debug)]
pub struct AudioArtifact {
    backing: Option<ArtifactBacking>,
    format: AudioFormat,
    len: u64,
}

impl AudioArtifact {
    /// 从内存字节构造产物
    pub fn from_bytes(bytes: Vec<u8>, format: AudioFormat) -> Self {
        let len = bytes.len() as u64;
        Self {
            backing: Some(ArtifactBacking::Memory(bytes)),
            format,
            len,
        }
    }

    /// 从已写好的 spool 文件构造产物
    ///
    /// 调用方保证 `len` 等于文件实际大小；文件自此归产物所有。
    pub fn spooled(path: PathBuf, len: u64, format: AudioFormat) -> Self {
        Self {
            backing: Some(ArtifactBacking::Spooled(path)),
            format,
            len,
        }
    }

    /// 产物字节数
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// 内存态产物的字节视图；spool 态返回 None
    pub fn memory(&self) -> Option<&[u8]> {
        match self.backing.as_ref() {
            Some(ArtifactBacking::Memory(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// spool 文件路径；内存态返回 None
    pub fn spool_path(&self) -> Option<&std::path::Path> {
        match self.backing.as_ref() {
            Some(ArtifactBacking::Spooled(path)) => Some(path),
            _ => None,
        }
    }

    /// 取出全部字节并释放产物
    ///
    /// spool 态会读取文件内容后删除文件。
    pub async fn into_bytes(mut self) -> Result<Vec<u8>, std::io::Error> {
        match self.backing.take() {
            Some(ArtifactBacking::Memory(bytes)) => Ok(bytes),
            Some(ArtifactBacking::Spooled(path)) => {
                // 读取失败也要删除 spool 文件
                let bytes = tokio::fs::read(&path).await;
                remove_spool(&path);
                Ok(bytes?)
            }
            None => Ok(Vec::new()),
        }
    }

    /// 显式释放产物
    ///
    /// 与 Drop 等价，供需要明确释放点的调用方使用。
    pub fn dispose(mut self) {
        self.release();
    }

    /// 释放底层资源；幂等
    fn release(&mut self) {
        if let Some(ArtifactBacking::Spooled(path)) = self.backing.take() {
            remove_spool(&path);
        }
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        self.release();
    }
}

/// 删除 spool 文件；失败只告警
fn remove_spool(path: &std::path::Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove spool file");
        }
    }
}
