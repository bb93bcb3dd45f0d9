//! Artifact Delivery - 产物交付
//!
//! 把 AudioArtifact 的 N 个字节交付给调用方，两种模式:
//! - Buffered: 一次性写出全部字节
//! - Streamed: 按固定块（默认 8 KiB）写出
//!
//! 产物释放保证恰好一次: 正常完成、写出失败、对端提前断开都会释放；
//! 释放失败只记录日志，不影响本次请求的结果。

use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::domain::AudioArtifact;

/// 流式交付的默认块大小
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// 交付模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// 全量写出后释放产物
    Buffered,
    /// 按块写出，最后一块之后（或提前终止时）释放产物
    Streamed,
}

/// 交付错误
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to write audio to sink: {0}")]
    Sink(#[source] std::io::Error),

    #[error("failed to read artifact backing: {0}")]
    Backing(#[source] std::io::Error),
}

/// 产物交付器
#[derive(Debug, Clone)]
pub struct ArtifactDelivery {
    mode: DeliveryMode,
    chunk_size: usize,
}

impl Default for ArtifactDelivery {
    fn default() -> Self {
        Self::new(DeliveryMode::Buffered, DEFAULT_CHUNK_SIZE)
    }
}

impl ArtifactDelivery {
    pub fn new(mode: DeliveryMode, chunk_size: usize) -> Self {
        Self {
            mode,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// 把产物写入 sink，返回交付的字节数
    ///
    /// 无论成功失败，产物都会在返回前被释放。
    pub async fn deliver<W>(
        &self,
        artifact: AudioArtifact,
        sink: &mut W,
    ) -> Result<u64, DeliveryError>
    where
        W: AsyncWrite + Unpin,
    {
        let result = self.write_out(&artifact, sink).await;
        // 显式释放点: 交付后产物的使命即告结束
        artifact.dispose();
        result
    }

    async fn write_out<W>(
        &self,
        artifact: &AudioArtifact,
        sink: &mut W,
    ) -> Result<u64, DeliveryError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut delivered = 0u64;

        if let Some(bytes) = artifact.memory() {
            match self.mode {
                DeliveryMode::Buffered => {
                    sink.write_all(bytes).await.map_err(DeliveryError::Sink)?;
                    delivered = bytes.len() as u64;
                }
                DeliveryMode::Streamed => {
                    for chunk in bytes.chunks(self.chunk_size) {
                        sink.write_all(chunk).await.map_err(DeliveryError::Sink)?;
                        delivered += chunk.len() as u64;
                    }
                }
            }
        } else if let Some(path) = artifact.spool_path() {
            let mut file = tokio::fs::File::open(path)
                .await
                .map_err(DeliveryError::Backing)?;
            let buf_size = match self.mode {
                DeliveryMode::Buffered => artifact.len().max(1) as usize,
                DeliveryMode::Streamed => self.chunk_size,
            };
            let mut buf = vec![0u8; buf_size];
            loop {
                let n = file.read(&mut buf).await.map_err(DeliveryError::Backing)?;
                if n == 0 {
                    break;
                }
                sink.write_all(&buf[..n]).await.map_err(DeliveryError::Sink)?;
                delivered += n as u64;
            }
        }

        sink.flush().await.map_err(DeliveryError::Sink)?;
        Ok(delivered)
    }
}

/// 把产物转成按块产出的字节流（用于 HTTP streamed body）
///
/// 流被消费完或中途被 Drop（客户端断开）时，state 连同产物一起析构，
/// 产物的 Drop 负责释放 spool 文件——交付中止也不会泄漏资源。
pub fn artifact_stream(
    artifact: AudioArtifact,
    chunk_size: usize,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send {
    struct StreamState {
        artifact: AudioArtifact,
        file: Option<tokio::fs::File>,
        offset: usize,
        chunk_size: usize,
    }

    let state = StreamState {
        artifact,
        file: None,
        offset: 0,
        chunk_size: chunk_size.max(1),
    };

    futures_util::stream::unfold(state, |mut state| async move {
        // 内存态: 直接切片
        if let Some(bytes) = state.artifact.memory() {
            if state.offset >= bytes.len() {
                return None;
            }
            let end = (state.offset + state.chunk_size).min(bytes.len());
            let chunk = Bytes::copy_from_slice(&bytes[state.offset..end]);
            state.offset = end;
            return Some((Ok(chunk), state));
        }

        // spool 态: 惰性打开文件后按块读取
        if state.file.is_none() {
            let path = state.artifact.spool_path()?;
            match tokio::fs::File::open(path).await {
                Ok(file) => state.file = Some(file),
                Err(e) => return Some((Err(e), state)),
            }
        }

        let file = state.file.as_mut()?;
        let mut buf = vec![0u8; state.chunk_size];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(Bytes::from(buf)), state))
            }
            Err(e) => Some((Err(e), state)),
        }
    })
}
