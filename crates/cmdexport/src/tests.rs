use cmdpack::ArgFrame;
use cmdpack::Error;
use cmdpack::ErrorCode;
use cmdpack::TypeDescriptor;
use cmdpack::Value;
use cmdpack::WireConfig;

use crate::Fault;
use crate::NativeType;
use crate::shim;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn frame<T: NativeType>(wire: &WireConfig, value: T) -> Result<ArgFrame> {
    Ok(ArgFrame::encode(wire, &value.into_value(), &T::descriptor())?)
}

// ============================================================================
// Native Types
// ============================================================================

#[test]
fn test_descriptors_follow_rust_types() {
    assert_eq!(i8::descriptor(), TypeDescriptor::I8);
    assert_eq!(u64::descriptor(), TypeDescriptor::U64);
    assert_eq!(f32::descriptor(), TypeDescriptor::F32);
    assert_eq!(<()>::descriptor(), TypeDescriptor::Void);
    assert_eq!(Vec::<String>::descriptor(), TypeDescriptor::sequence(TypeDescriptor::String));
    assert_eq!(<[u8; 4]>::descriptor(), TypeDescriptor::array(TypeDescriptor::U8, 4));
    assert_eq!(
        Vec::<[bool; 2]>::descriptor(),
        TypeDescriptor::sequence(TypeDescriptor::array(TypeDescriptor::Bool, 2))
    );
}

#[test]
fn test_from_value_rejects_out_of_range_integers() {
    assert_eq!(i8::from_value(Value::Int(127)), Some(127));
    assert_eq!(i8::from_value(Value::Int(128)), None);
    assert_eq!(u16::from_value(Value::Int(-1)), None);
    assert_eq!(u16::from_value(Value::UInt(65_535)), Some(65_535));
    assert_eq!(i64::from_value(Value::UInt(u64::MAX)), None);
}

#[test]
fn test_fixed_array_needs_exact_length() {
    let three = Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(<[i32; 3]>::from_value(three.clone()), Some([1, 2, 3]));
    assert_eq!(<[i32; 2]>::from_value(three), None);
}

// ============================================================================
// Shims
// ============================================================================

#[test]
fn test_check_arity() {
    let args = vec![ArgFrame::default(); 2];
    assert!(shim::check_arity(&args, 2).is_ok());
    assert_eq!(
        shim::check_arity(&args, 3),
        Err(Fault::BadArgumentCount { expected: 3, found: 2 })
    );
}

#[test]
fn test_decode_arg_reports_index() -> Result<()> {
    let wire = WireConfig::default();
    let args = vec![frame(&wire, 7i32)?, ArgFrame::new(vec![2])];

    let first: i32 = shim::decode_arg(&wire, &args, 0)?;
    assert_eq!(first, 7);

    let second: std::result::Result<bool, Fault> = shim::decode_arg(&wire, &args, 1);
    assert_eq!(second, Err(Fault::BadArgument { index: 1, error: Error::InvalidBool(2) }));

    let missing: std::result::Result<bool, Fault> = shim::decode_arg(&wire, &args, 2);
    assert!(matches!(missing, Err(Fault::BadArgumentCount { .. })));
    Ok(())
}

#[test]
fn test_decode_arg_rejects_trailing_bytes() -> Result<()> {
    let wire = WireConfig::default();
    let mut padded = frame(&wire, 1u8)?;
    padded.bytes.push(0);

    let decoded: std::result::Result<u8, Fault> = shim::decode_arg(&wire, &[padded], 0);
    assert_eq!(decoded, Err(Fault::BadArgument { index: 0, error: Error::TrailingBytes(1) }));
    Ok(())
}

#[test]
fn test_encode_result_maps_err_to_application() -> Result<()> {
    let wire = WireConfig::default();
    let ok: std::result::Result<u32, String> = Ok(9);
    assert_eq!(shim::encode_result(&wire, ok)?, vec![9, 0, 0, 0]);

    let err: std::result::Result<u32, String> = Err("disk on fire".to_string());
    let fault = shim::encode_result(&wire, err).unwrap_err();
    assert_eq!(fault, Fault::Application("disk on fire".to_string()));
    assert_eq!(fault.code(), ErrorCode::Application);
    Ok(())
}

#[test]
fn test_fault_codes() {
    assert_eq!(Fault::BadArgumentCount { expected: 1, found: 0 }.code(), ErrorCode::BadArgumentCount);
    assert_eq!(
        Fault::BadArgument { index: 0, error: Error::InvalidUtf8 }.code(),
        ErrorCode::BadArgument
    );
    assert_eq!(Fault::Encode(Error::ReservedSize).code(), ErrorCode::Internal);
}
