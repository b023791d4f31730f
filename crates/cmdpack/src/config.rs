//! # Wire Configuration
//!
//! The one place that decides field widths and byte order.
//!
//! ## Invariants
//! - Every unsigned field on the wire is written and read through `put_uint` / `get_uint`.
//! - `error_sentinel()` is reserved in the size field of a response; value frames never use it.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;

/// Width of an unsigned wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Width {
    U8,
    U16,
    U32,
    U64,
}

impl Width {
    /// Number of bytes the field occupies.
    pub const fn bytes(self) -> usize {
        match self {
            Width::U8 => 1,
            Width::U16 => 2,
            Width::U32 => 4,
            Width::U64 => 8,
        }
    }

    /// Largest value the field can carry.
    pub const fn max_value(self) -> u64 {
        match self {
            Width::U8 => u8::MAX as u64,
            Width::U16 => u16::MAX as u64,
            Width::U32 => u32::MAX as u64,
            Width::U64 => u64::MAX,
        }
    }

    /// Width for an integer of `bits` bits, if the codec supports it.
    pub const fn from_bits(bits: u8) -> Option<Width> {
        match bits {
            8 => Some(Width::U8),
            16 => Some(Width::U16),
            32 => Some(Width::U32),
            64 => Some(Width::U64),
            _ => None,
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Width::U8 => write!(f, "u8"),
            Width::U16 => write!(f, "u16"),
            Width::U32 => write!(f, "u32"),
            Width::U64 => write!(f, "u64"),
        }
    }
}

/// Byte order of every multi-byte field and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    Little,
    Big,
}

/// The shared convention between generator and runtime.
///
/// Loaded from JSON so both sides can point at the same file:
///
/// ```json
/// { "command_width": "u32", "count_width": "u16", "size_width": "u32", "byte_order": "big" }
/// ```
///
/// Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireConfig {
    /// W1: width of `command_number`.
    pub command_width: Width,
    /// W2: width of `arg_count`.
    pub count_width: Width,
    /// W3: width of every size field, string length and sequence count.
    pub size_width: Width,
    pub byte_order: ByteOrder,
    /// Upper bound on a whole request or response frame, in bytes.
    pub max_frame_size: u64,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            command_width: Width::U32,
            count_width: Width::U32,
            size_width: Width::U32,
            byte_order: ByteOrder::Little,
            max_frame_size: 16 * 1024 * 1024,
        }
    }
}

impl WireConfig {
    /// Parses and validates a JSON wire configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: WireConfig = serde_json::from_str(text)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON wire configuration file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `InvalidConfig` (naming the file) if it does not parse
    /// or validate.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|e| match e {
            Error::InvalidConfig(reason) => Error::InvalidConfig(format!("{}: {reason}", path.display())),
            other => other,
        })
    }

    /// Renders the configuration as pretty JSON.
    pub fn to_json(&self) -> String {
        // A struct of enums and integers always serializes.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_frame_size == 0 {
            return Err(Error::InvalidConfig("max_frame_size must be positive".into()));
        }
        Ok(())
    }

    /// The size value that marks an error response.
    pub fn error_sentinel(&self) -> u64 {
        self.size_width.max_value()
    }

    /// Appends `value` as a `width` field.
    ///
    /// # Errors
    /// Returns `Error::WidthOverflow` if `value` does not fit.
    pub fn put_uint(&self, buf: &mut Vec<u8>, value: u64, width: Width) -> Result<()> {
        if value > width.max_value() {
            return Err(Error::WidthOverflow { value, width });
        }
        let n = width.bytes();
        match self.byte_order {
            ByteOrder::Little => buf.extend_from_slice(&value.to_le_bytes()[..n]),
            ByteOrder::Big => buf.extend_from_slice(&value.to_be_bytes()[8 - n..]),
        }
        Ok(())
    }

    /// Reads an unsigned field from exactly `bytes.len()` (1..=8) bytes.
    pub fn get_uint(&self, bytes: &[u8]) -> u64 {
        let n = bytes.len().min(8);
        let mut raw = [0u8; 8];
        match self.byte_order {
            ByteOrder::Little => {
                raw[..n].copy_from_slice(&bytes[..n]);
                u64::from_le_bytes(raw)
            }
            ByteOrder::Big => {
                raw[8 - n..].copy_from_slice(&bytes[..n]);
                u64::from_be_bytes(raw)
            }
        }
    }
}
