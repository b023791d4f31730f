//! # Stream IO
//!
//! Reads frames off an async byte stream field by field, so a frame is only ever
//! materialized once all of its declared bytes have arrived.
//!
//! ## Invariants
//! - A clean end-of-stream before the first byte of a request is `Ok(None)`.
//! - End-of-stream anywhere inside a frame is `Error::TruncatedFrame`.
//! - No buffer larger than `max_frame_size` is ever requested.

use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

use crate::config::WireConfig;
use crate::config::Width;
use crate::error::Error;
use crate::error::Result;
use crate::frame::ArgFrame;
use crate::frame::CommandRequest;
use crate::frame::CommandResponse;

/// Tracks how many bytes of the current frame have been read.
struct FrameBudget {
    used: u64,
    limit: u64,
}

impl FrameBudget {
    fn new(config: &WireConfig) -> Self {
        Self { used: 0, limit: config.max_frame_size }
    }

    fn spend(&mut self, n: u64) -> Result<()> {
        let used = self.used.saturating_add(n);
        if used > self.limit {
            return Err(Error::FrameTooLarge { size: used, limit: self.limit });
        }
        self.used = used;
        Ok(())
    }
}

/// Fills `buf` completely. Returns the number of bytes read before end-of-stream.
async fn fill<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

async fn read_uint<R: AsyncRead + Unpin>(
    reader: &mut R,
    config: &WireConfig,
    width: Width,
    budget: &mut FrameBudget,
) -> Result<u64> {
    budget.spend(width.bytes() as u64)?;
    let mut buf = [0u8; 8];
    let field = &mut buf[..width.bytes()];
    let got = fill(reader, field).await?;
    if got < field.len() {
        return Err(Error::TruncatedFrame { needed: field.len() as u64, remaining: got as u64 });
    }
    Ok(config.get_uint(field))
}

async fn read_sized<R: AsyncRead + Unpin>(reader: &mut R, size: u64, budget: &mut FrameBudget) -> Result<Vec<u8>> {
    budget.spend(size)?;
    let mut bytes = Vec::new();
    reader.take(size).read_to_end(&mut bytes).await?;
    if (bytes.len() as u64) < size {
        return Err(Error::TruncatedFrame { needed: size, remaining: bytes.len() as u64 });
    }
    Ok(bytes)
}

/// Reads one complete request, or `None` if the stream ended cleanly between requests.
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R, config: &WireConfig) -> Result<Option<CommandRequest>> {
    let mut budget = FrameBudget::new(config);

    // The first field decides between a clean close and a truncated frame.
    let width = config.command_width.bytes();
    budget.spend(width as u64)?;
    let mut head = [0u8; 8];
    let got = fill(reader, &mut head[..width]).await?;
    if got == 0 {
        return Ok(None);
    }
    if got < width {
        return Err(Error::TruncatedFrame { needed: width as u64, remaining: got as u64 });
    }
    let command_number = config.get_uint(&head[..width]);

    let count = read_uint(reader, config, config.count_width, &mut budget).await?;
    let mut args = Vec::new();
    for _ in 0..count {
        let size = read_uint(reader, config, config.size_width, &mut budget).await?;
        args.push(ArgFrame::new(read_sized(reader, size, &mut budget).await?));
    }

    Ok(Some(CommandRequest { command_number, args }))
}

/// Reads one complete response.
pub async fn read_response<R: AsyncRead + Unpin>(reader: &mut R, config: &WireConfig) -> Result<CommandResponse> {
    let mut budget = FrameBudget::new(config);
    let size = read_uint(reader, config, config.size_width, &mut budget).await?;
    if size != config.error_sentinel() {
        return Ok(CommandResponse::Value(read_sized(reader, size, &mut budget).await?));
    }

    let code = read_uint(reader, config, config.size_width, &mut budget).await?;
    let len = read_uint(reader, config, config.size_width, &mut budget).await?;
    let message = read_sized(reader, len, &mut budget).await?;
    let message = String::from_utf8(message).map_err(|_| Error::InvalidUtf8)?;
    Ok(CommandResponse::error(crate::frame::ErrorCode::from_wire(code), message))
}

/// Writes an encoded frame and flushes it.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}
