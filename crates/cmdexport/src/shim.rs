//! Helpers called by the code `#[export]` generates. Not a stable interface.

use std::fmt::Display;

use cmdpack::ArgFrame;
use cmdpack::WireConfig;

use crate::Fault;
use crate::NativeType;

pub fn check_arity(args: &[ArgFrame], expected: usize) -> Result<(), Fault> {
    if args.len() != expected {
        return Err(Fault::BadArgumentCount { expected, found: args.len() });
    }
    Ok(())
}

/// Decodes argument `index` as `T`.
pub fn decode_arg<T: NativeType>(wire: &WireConfig, args: &[ArgFrame], index: usize) -> Result<T, Fault> {
    let frame = args
        .get(index)
        .ok_or(Fault::BadArgumentCount { expected: index + 1, found: args.len() })?;
    let ty = T::descriptor();
    let value = frame.decode(wire, &ty).map_err(|error| Fault::BadArgument { index, error })?;
    let found = value.kind().to_string();
    T::from_value(value).ok_or_else(|| Fault::BadArgument {
        index,
        error: cmdpack::Error::TypeMismatch { expected: ty.to_string(), found },
    })
}

pub fn encode_return<T: NativeType>(wire: &WireConfig, ret: T) -> Result<Vec<u8>, Fault> {
    cmdpack::encode_to_vec(wire, &ret.into_value(), &T::descriptor()).map_err(Fault::Encode)
}

/// Like `encode_return`, with `Err` reported as an application fault.
pub fn encode_result<T: NativeType, E: Display>(wire: &WireConfig, ret: Result<T, E>) -> Result<Vec<u8>, Fault> {
    match ret {
        Ok(value) => encode_return(wire, value),
        Err(e) => Err(Fault::Application(e.to_string())),
    }
}
