//! # Error Definitions
//!
//! Everything that can go wrong while framing, encoding or decoding.

use crate::config::Width;

/// Cmdpack framing and value codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A size field declared more bytes than the frame or stream holds.
    #[error("truncated frame: needed {needed} bytes, {remaining} remain")]
    TruncatedFrame { needed: u64, remaining: u64 },
    /// A frame or argument exceeds `WireConfig::max_frame_size`.
    #[error("frame of {size} bytes exceeds the limit of {limit} bytes")]
    FrameTooLarge { size: u64, limit: u64 },
    /// An integer does not fit the declared field width.
    #[error("{value} does not fit in a {width} field")]
    WidthOverflow { value: u64, width: Width },
    /// A dynamic value does not conform to the descriptor it is encoded against.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    /// An integer value is outside the range of its descriptor.
    #[error("{value} is out of range for {ty}")]
    IntegerOutOfRange { value: i128, ty: String },
    /// A bool byte other than 0 or 1.
    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),
    /// String data is not valid UTF-8.
    #[error("string data is not valid UTF-8")]
    InvalidUtf8,
    /// A frame decoded cleanly but bytes were left over.
    #[error("{0} trailing bytes after the encoded value")]
    TrailingBytes(u64),
    /// A fixed array received the wrong number of elements.
    #[error("array expects {expected} elements, found {found}")]
    LengthMismatch { expected: u64, found: u64 },
    /// Values nested deeper than the codec allows.
    #[error("value nesting exceeds {0} levels")]
    RecursionLimitExceeded(usize),
    /// A value frame's size collides with the error sentinel.
    #[error("value frame size collides with the error sentinel")]
    ReservedSize,
    /// A descriptor that cannot be encoded (e.g. a 24-bit integer read from a table file).
    #[error("invalid type descriptor: {0}")]
    InvalidDescriptor(String),
    /// The wire configuration is unusable.
    #[error("invalid wire configuration: {0}")]
    InvalidConfig(String),
    /// The underlying stream failed for a reason other than end-of-file.
    #[error("i/o error ({kind:?}): {message}")]
    Io { kind: std::io::ErrorKind, message: String },
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io { kind: e.kind(), message: e.to_string() }
    }
}

/// Specialized `Result` for cmdpack operations.
pub type Result<T> = std::result::Result<T, Error>;
