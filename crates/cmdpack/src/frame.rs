//! # Protocol Frames
//!
//! The request and response envelopes.
//!
//! ## Invariants
//! - **Panic Safety**: All decoding paths return `Result`, never panicking on hostile data.
//! - **Exactness**: A buffer decodes to one frame and nothing else; leftovers are an error.
//! - **No Partial Frames**: A request is only returned once every argument frame is complete.

use serde::Deserialize;
use serde::Serialize;

use crate::codec::decode_exact;
use crate::codec::encode_to_vec;
use crate::config::WireConfig;
use crate::cursor::Reader;
use crate::error::Error;
use crate::error::Result;
use crate::types::TypeDescriptor;
use crate::value::Value;

/// One argument: its declared size is the length of `bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgFrame {
    pub bytes: Vec<u8>,
}

impl ArgFrame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Encodes `value` as `ty` into a new frame.
    pub fn encode(config: &WireConfig, value: &Value, ty: &TypeDescriptor) -> Result<Self> {
        Ok(Self::new(encode_to_vec(config, value, ty)?))
    }

    /// Decodes the whole frame as one value of `ty`.
    pub fn decode(&self, config: &WireConfig, ty: &TypeDescriptor) -> Result<Value> {
        decode_exact(config, &self.bytes, ty)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A call to one table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command_number: u64,
    pub args: Vec<ArgFrame>,
}

impl CommandRequest {
    pub fn new(command_number: u64, args: Vec<ArgFrame>) -> Self {
        Self { command_number, args }
    }

    /// `[command: W1][arg_count: W2]([size: W3][bytes])*`
    ///
    /// # Errors
    /// `WidthOverflow` if a field does not fit its width, `FrameTooLarge` if the whole frame
    /// exceeds `max_frame_size`.
    pub fn encode(&self, config: &WireConfig) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len(config));
        config.put_uint(&mut out, self.command_number, config.command_width)?;
        config.put_uint(&mut out, self.args.len() as u64, config.count_width)?;
        for arg in &self.args {
            config.put_uint(&mut out, arg.size(), config.size_width)?;
            out.extend_from_slice(&arg.bytes);
        }
        check_limit(config, out.len() as u64)?;
        Ok(out)
    }

    /// Decodes exactly one request from `bytes`.
    ///
    /// # Errors
    /// `TruncatedFrame` if any declared size exceeds the bytes that remain.
    pub fn decode(bytes: &[u8], config: &WireConfig) -> Result<Self> {
        check_limit(config, bytes.len() as u64)?;
        let mut reader = Reader::new(bytes);
        let command_number = reader.uint(config, config.command_width)?;
        let count = reader.uint(config, config.count_width)?;

        let min_frame = config.size_width.bytes() as u64;
        let needed = count.saturating_mul(min_frame);
        if needed > reader.remaining() as u64 {
            return Err(Error::TruncatedFrame { needed, remaining: reader.remaining() as u64 });
        }

        let mut args = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let size = reader.uint(config, config.size_width)?;
            let bytes = reader.take(size)?;
            args.push(ArgFrame::new(bytes.to_vec()));
        }

        if !reader.is_empty() {
            return Err(Error::TrailingBytes(reader.remaining() as u64));
        }
        Ok(Self { command_number, args })
    }

    fn encoded_len(&self, config: &WireConfig) -> usize {
        let header = config.command_width.bytes() + config.count_width.bytes();
        let args: usize = self.args.iter().map(|a| config.size_width.bytes() + a.bytes.len()).sum();
        header + args
    }
}

/// Why a call produced no value.
///
/// Written on the wire as an unsigned integer in a size-width field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The invoked function itself failed (returned `Err` or panicked).
    Application,
    /// The request carried the wrong number of arguments.
    BadArgumentCount,
    /// An argument frame did not decode as its declared type.
    BadArgument,
    /// The command number is past the end of the table.
    OutOfRange,
    /// The entry exists but its signature was rejected at build time.
    Unsupported,
    /// The server failed to encode its own reply.
    Internal,
    /// A code this build does not know.
    Unknown(u64),
}

impl ErrorCode {
    pub fn to_wire(self) -> u64 {
        match self {
            ErrorCode::Application => 1,
            ErrorCode::BadArgumentCount => 2,
            ErrorCode::BadArgument => 3,
            ErrorCode::OutOfRange => 4,
            ErrorCode::Unsupported => 5,
            ErrorCode::Internal => 6,
            ErrorCode::Unknown(code) => code,
        }
    }

    pub fn from_wire(code: u64) -> Self {
        match code {
            1 => ErrorCode::Application,
            2 => ErrorCode::BadArgumentCount,
            3 => ErrorCode::BadArgument,
            4 => ErrorCode::OutOfRange,
            5 => ErrorCode::Unsupported,
            6 => ErrorCode::Internal,
            other => ErrorCode::Unknown(other),
        }
    }
}

/// The payload of an error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFrame {
    pub code: ErrorCode,
    pub message: String,
}

/// The single reply to a `CommandRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResponse {
    /// The encoded return value.
    Value(Vec<u8>),
    Error(ErrorFrame),
}

impl CommandResponse {
    pub fn value(bytes: Vec<u8>) -> Self {
        Self::Value(bytes)
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorFrame { code, message: message.into() })
    }

    /// `[size: W3][bytes]` or `[SENTINEL: W3][code: W3][len: W3][message]`.
    ///
    /// Error messages longer than the size field allows are cut at a char boundary.
    pub fn encode(&self, config: &WireConfig) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            CommandResponse::Value(bytes) => {
                let size = bytes.len() as u64;
                if size >= config.error_sentinel() {
                    return Err(Error::ReservedSize);
                }
                config.put_uint(&mut out, size, config.size_width)?;
                out.extend_from_slice(bytes);
            }
            CommandResponse::Error(frame) => {
                let limit = config.size_width.max_value().min(config.max_frame_size / 2);
                let message = truncate_at_char_boundary(&frame.message, limit);
                config.put_uint(&mut out, config.error_sentinel(), config.size_width)?;
                config.put_uint(&mut out, frame.code.to_wire(), config.size_width)?;
                config.put_uint(&mut out, message.len() as u64, config.size_width)?;
                out.extend_from_slice(message.as_bytes());
            }
        }
        check_limit(config, out.len() as u64)?;
        Ok(out)
    }

    /// Decodes exactly one response from `bytes`.
    pub fn decode(bytes: &[u8], config: &WireConfig) -> Result<Self> {
        check_limit(config, bytes.len() as u64)?;
        let mut reader = Reader::new(bytes);
        let size = reader.uint(config, config.size_width)?;
        let response = if size == config.error_sentinel() {
            let code = ErrorCode::from_wire(reader.uint(config, config.size_width)?);
            let len = reader.uint(config, config.size_width)?;
            let message = std::str::from_utf8(reader.take(len)?).map_err(|_| Error::InvalidUtf8)?;
            CommandResponse::error(code, message)
        } else {
            CommandResponse::Value(reader.take(size)?.to_vec())
        };

        if !reader.is_empty() {
            return Err(Error::TrailingBytes(reader.remaining() as u64));
        }
        Ok(response)
    }
}

fn check_limit(config: &WireConfig, size: u64) -> Result<()> {
    if size > config.max_frame_size {
        return Err(Error::FrameTooLarge { size, limit: config.max_frame_size });
    }
    Ok(())
}

fn truncate_at_char_boundary(s: &str, limit: u64) -> &str {
    if s.len() as u64 <= limit {
        return s;
    }
    let mut end = limit as usize;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
