//! # Codec
//!
//! The translation layer between dynamic `Value`s and their bytes on the wire.
//!
//! ## Invariants
//! - **Recursion Safety**: Nested descriptors are bounded by `MAX_RECURSION_DEPTH`.
//! - **Descriptor Strictness**: A value is encoded only against a descriptor it conforms to.
//! - **Allocation Safety**: Element counts are checked against the bytes actually present
//!   before anything is allocated for them. Sequences of zero-sized elements are refused, since
//!   their count is not backed by any bytes.

use crate::config::WireConfig;
use crate::config::Width;
use crate::cursor::Reader;
use crate::error::Error;
use crate::error::Result;
use crate::types::TypeDescriptor;
use crate::value::Value;

/// The maximum nesting depth for descriptors before failing.
const MAX_RECURSION_DEPTH: usize = 64;

/// Appends the encoding of `value` as `ty`.
///
/// # Errors
/// `TypeMismatch` if the value does not conform, `IntegerOutOfRange` if an integer does not
/// fit, `WidthOverflow` if a length does not fit the size field.
pub fn encode_value(config: &WireConfig, value: &Value, ty: &TypeDescriptor, out: &mut Vec<u8>) -> Result<()> {
    encode_impl(config, value, ty, out, 0)
}

/// Encodes a single value into a fresh buffer.
pub fn encode_to_vec(config: &WireConfig, value: &Value, ty: &TypeDescriptor) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_value(config, value, ty, &mut out)?;
    Ok(out)
}

fn mismatch(ty: &TypeDescriptor, value: &Value) -> Error {
    Error::TypeMismatch { expected: ty.to_string(), found: value.kind().to_string() }
}

fn int_width(ty: &TypeDescriptor, bits: u8) -> Result<Width> {
    Width::from_bits(bits).ok_or_else(|| Error::InvalidDescriptor(ty.to_string()))
}

fn encode_impl(config: &WireConfig, value: &Value, ty: &TypeDescriptor, out: &mut Vec<u8>, depth: usize) -> Result<()> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::RecursionLimitExceeded(MAX_RECURSION_DEPTH));
    }

    match (ty, value) {
        (TypeDescriptor::Int { bits, signed }, Value::Int(v)) => {
            encode_int(config, ty, *bits, *signed, i128::from(*v), out)?;
        }
        (TypeDescriptor::Int { bits, signed }, Value::UInt(v)) => {
            encode_int(config, ty, *bits, *signed, i128::from(*v), out)?;
        }
        (TypeDescriptor::Float { bits: 32 }, Value::Float(v)) => {
            config.put_uint(out, u64::from((*v as f32).to_bits()), Width::U32)?;
        }
        (TypeDescriptor::Float { bits: 64 }, Value::Float(v)) => {
            config.put_uint(out, v.to_bits(), Width::U64)?;
        }
        (TypeDescriptor::Float { .. }, Value::Float(_)) => {
            return Err(Error::InvalidDescriptor(ty.to_string()));
        }
        (TypeDescriptor::Bool, Value::Bool(b)) => out.push(u8::from(*b)),
        (TypeDescriptor::String, Value::String(s)) => {
            config.put_uint(out, s.len() as u64, config.size_width)?;
            out.extend_from_slice(s.as_bytes());
        }
        (TypeDescriptor::Sequence { element }, Value::Seq(_)) if element.is_zero_sized() => {
            return Err(Error::InvalidDescriptor(ty.to_string()));
        }
        (TypeDescriptor::Sequence { element }, Value::Seq(items)) => {
            config.put_uint(out, items.len() as u64, config.size_width)?;
            for item in items {
                encode_impl(config, item, element, out, depth + 1)?;
            }
        }
        (TypeDescriptor::Array { element, len }, Value::Seq(items)) => {
            if items.len() as u64 != *len {
                return Err(Error::LengthMismatch { expected: *len, found: items.len() as u64 });
            }
            for item in items {
                encode_impl(config, item, element, out, depth + 1)?;
            }
        }
        (TypeDescriptor::Void, Value::Void) => {}
        _ => return Err(mismatch(ty, value)),
    }
    Ok(())
}

fn encode_int(config: &WireConfig, ty: &TypeDescriptor, bits: u8, signed: bool, wide: i128, out: &mut Vec<u8>) -> Result<()> {
    let width = int_width(ty, bits)?;
    let (min, max) = int_range(bits, signed);
    if wide < min || wide > max {
        return Err(Error::IntegerOutOfRange { value: wide, ty: ty.to_string() });
    }
    // Two's complement truncated to the field width.
    let raw = (wide as u64) & width.max_value();
    config.put_uint(out, raw, width)
}

fn int_range(bits: u8, signed: bool) -> (i128, i128) {
    let bits = u32::from(bits);
    if signed {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    }
}

/// Decodes one value of type `ty` from the reader.
pub fn decode_value(config: &WireConfig, reader: &mut Reader<'_>, ty: &TypeDescriptor) -> Result<Value> {
    decode_impl(config, reader, ty, 0)
}

/// Decodes a whole frame as exactly one value of type `ty`.
///
/// # Errors
/// `TrailingBytes` if the frame holds more than the value.
pub fn decode_exact(config: &WireConfig, bytes: &[u8], ty: &TypeDescriptor) -> Result<Value> {
    let mut reader = Reader::new(bytes);
    let value = decode_value(config, &mut reader, ty)?;
    if !reader.is_empty() {
        return Err(Error::TrailingBytes(reader.remaining() as u64));
    }
    Ok(value)
}

fn decode_impl(config: &WireConfig, reader: &mut Reader<'_>, ty: &TypeDescriptor, depth: usize) -> Result<Value> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::RecursionLimitExceeded(MAX_RECURSION_DEPTH));
    }

    match ty {
        TypeDescriptor::Int { bits, signed } => {
            let width = int_width(ty, *bits)?;
            let raw = reader.uint(config, width)?;
            if *signed {
                let shift = 64 - u32::from(*bits);
                Ok(Value::Int(((raw << shift) as i64) >> shift))
            } else {
                Ok(Value::UInt(raw))
            }
        }
        TypeDescriptor::Float { bits: 32 } => {
            let raw = reader.uint(config, Width::U32)?;
            Ok(Value::Float(f64::from(f32::from_bits(raw as u32))))
        }
        TypeDescriptor::Float { bits: 64 } => {
            let raw = reader.uint(config, Width::U64)?;
            Ok(Value::Float(f64::from_bits(raw)))
        }
        TypeDescriptor::Float { .. } => Err(Error::InvalidDescriptor(ty.to_string())),
        TypeDescriptor::Bool => match reader.byte()? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            other => Err(Error::InvalidBool(other)),
        },
        TypeDescriptor::String => {
            let len = reader.uint(config, config.size_width)?;
            let bytes = reader.take(len)?;
            let s = std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;
            Ok(Value::String(s.to_string()))
        }
        TypeDescriptor::Sequence { element } if element.is_zero_sized() => Err(Error::InvalidDescriptor(ty.to_string())),
        TypeDescriptor::Sequence { element } => {
            let count = reader.uint(config, config.size_width)?;
            decode_elements(config, reader, element, count, depth)
        }
        TypeDescriptor::Array { element, len } => decode_elements(config, reader, element, *len, depth),
        TypeDescriptor::Void => Ok(Value::Void),
    }
}

fn decode_elements(
    config: &WireConfig,
    reader: &mut Reader<'_>,
    element: &TypeDescriptor,
    count: u64,
    depth: usize,
) -> Result<Value> {
    // Only arrays reach here with zero-sized elements, and their count comes from the descriptor.
    let min = element.min_size(config.size_width.bytes());
    let needed = count.saturating_mul(min);
    if needed > reader.remaining() as u64 {
        return Err(Error::TruncatedFrame { needed, remaining: reader.remaining() as u64 });
    }

    let mut items = Vec::with_capacity(count.min(reader.remaining() as u64) as usize);
    for _ in 0..count {
        items.push(decode_impl(config, reader, element, depth + 1)?);
    }
    Ok(Value::Seq(items))
}
