//! # Cmdpack
//!
//! A small, strict framing library for invoking command table entries over a byte stream.
//!
//! ## Philosophy
//!
//! - **Declared, not implied**: Every field width and the byte order live in one `WireConfig`.
//!   Generator and runtime read the same declaration; nothing guesses.
//! - **Bounded**: Readers are bounds-checked views. A size field that points past the end of
//!   the buffer is a `TruncatedFrame`, never a panic or a short read.
//! - **Typed by descriptor**: Values carry no tags on the wire. The `TypeDescriptor` recorded at
//!   build time is the schema for both directions.
//!
//! ## Format
//!
//! - **Request**: `[command: W1][arg_count: W2]([size: W3][bytes: size])*`
//! - **Response**: `[size: W3][bytes: size]` or `[SENTINEL: W3][code: W3][len: W3][message: len]`
//!
//! `SENTINEL` is the largest value a `W3` field can hold.

pub mod codec;
pub mod config;
pub mod cursor;
pub mod error;
pub mod frame;
pub mod io;
pub mod types;
pub mod value;


pub use codec::decode_exact;
pub use codec::decode_value;
pub use codec::encode_to_vec;
pub use codec::encode_value;
pub use config::ByteOrder;
pub use config::WireConfig;
pub use config::Width;
pub use cursor::Reader;
pub use error::Error;
pub use error::Result;
pub use frame::ArgFrame;
pub use frame::CommandRequest;
pub use frame::CommandResponse;
pub use frame::ErrorCode;
pub use frame::ErrorFrame;
pub use io::read_request;
pub use io::read_response;
pub use io::write_frame;
pub use types::TypeDescriptor;
pub use value::Value;
