//! Exports through the attribute and reads them back from the live region.

use cmdexport::Fault;
use cmdexport::Slot;
use cmdexport::export;
use cmdpack::ArgFrame;
use cmdpack::TypeDescriptor;
use cmdpack::Value;
use cmdpack::WireConfig;

type TestResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[export]
fn add(a: i32, b: i32) -> i32 {
    a + b
}

#[export]
fn greet(name: &str) -> String {
    format!("hello, {name}")
}

#[export]
fn split(line: String) -> Vec<String> {
    line.split(',').map(str::to_string).collect()
}

#[export]
fn checked_div(a: u32, b: u32) -> Result<u32, String> {
    a.checked_div(b).ok_or_else(|| "division by zero".to_string())
}

#[export]
fn reset() {}

#[export(prefix = "admin_")]
fn rgb(pixel: [u8; 3]) -> bool {
    pixel.iter().all(|c| *c == 0)
}

/// Same name and types as the root `add`; only the prefix keeps the symbols apart.
mod admin {
    use cmdexport::export;

    #[export(prefix = "admin_")]
    pub fn add(a: i32, b: i32) -> i32 {
        a.saturating_add(b)
    }
}

fn find(signature: &str) -> Option<&'static Slot> {
    cmdexport::region().iter().find(|slot| slot.signature() == signature)
}

fn arg(wire: &WireConfig, value: impl Into<Value>, ty: &TypeDescriptor) -> TestResult<ArgFrame> {
    Ok(ArgFrame::encode(wire, &value.into(), ty)?)
}

#[test]
fn test_region_holds_every_export() {
    let signatures: Vec<_> = cmdexport::region().iter().map(Slot::signature).collect();
    for expected in [
        "ex_add(a: i32, b: i32) -> i32",
        "ex_greet(name: &str) -> String",
        "ex_split(line: String) -> Vec<String>",
        "ex_checked_div(a: u32, b: u32) -> u32",
        "ex_reset()",
        "admin_rgb(pixel: [u8; 3]) -> bool",
        "admin_add(a: i32, b: i32) -> i32",
    ] {
        assert!(signatures.contains(&expected), "missing {expected} in {signatures:?}");
    }
    assert_eq!(cmdexport::region().len(), 7);
}

#[test]
fn test_signatures_are_unique_per_binary() -> TestResult<()> {
    let mut signatures: Vec<_> = cmdexport::region().iter().map(Slot::signature).collect();
    signatures.sort_unstable();
    let before = signatures.len();
    signatures.dedup();
    assert_eq!(signatures.len(), before);

    // Same Rust name in another module, told apart by its prefix.
    let wire = WireConfig::default();
    let admin = find("admin_add(a: i32, b: i32) -> i32").ok_or("admin add not exported")?;
    let args = [arg(&wire, i32::MAX, &TypeDescriptor::I32)?, arg(&wire, 1, &TypeDescriptor::I32)?];
    let ret = (admin.export().invoke)(&wire, &args)?;
    assert_eq!(cmdpack::decode_exact(&wire, &ret, &TypeDescriptor::I32)?, Value::Int(i64::from(i32::MAX)));
    Ok(())
}

#[test]
fn test_slots_are_pointer_sized_and_contiguous() {
    assert_eq!(cmdexport::SLOT_WIDTH, std::mem::size_of::<usize>());
    let region = cmdexport::region();
    for pair in region.windows(2) {
        let a = &pair[0] as *const Slot as usize;
        let b = &pair[1] as *const Slot as usize;
        assert_eq!(b - a, cmdexport::SLOT_WIDTH);
    }
}

#[test]
fn test_invoke_add() -> TestResult<()> {
    let wire = WireConfig::default();
    let slot = find("ex_add(a: i32, b: i32) -> i32").ok_or("add not exported")?;
    let args = [arg(&wire, 2, &TypeDescriptor::I32)?, arg(&wire, 3, &TypeDescriptor::I32)?];
    let ret = (slot.export().invoke)(&wire, &args)?;
    assert_eq!(cmdpack::decode_exact(&wire, &ret, &TypeDescriptor::I32)?, Value::Int(5));
    Ok(())
}

#[test]
fn test_invoke_borrowed_str_and_sequences() -> TestResult<()> {
    let wire = WireConfig::default();

    let greet = find("ex_greet(name: &str) -> String").ok_or("greet not exported")?;
    let ret = (greet.export().invoke)(&wire, &[arg(&wire, "ada", &TypeDescriptor::String)?])?;
    assert_eq!(cmdpack::decode_exact(&wire, &ret, &TypeDescriptor::String)?, Value::from("hello, ada"));

    let split = find("ex_split(line: String) -> Vec<String>").ok_or("split not exported")?;
    let ret = (split.export().invoke)(&wire, &[arg(&wire, "a,b", &TypeDescriptor::String)?])?;
    let ty = TypeDescriptor::sequence(TypeDescriptor::String);
    assert_eq!(
        cmdpack::decode_exact(&wire, &ret, &ty)?,
        Value::Seq(vec![Value::from("a"), Value::from("b")])
    );
    Ok(())
}

#[test]
fn test_invoke_reports_faults() -> TestResult<()> {
    let wire = WireConfig::default();
    let div = find("ex_checked_div(a: u32, b: u32) -> u32").ok_or("checked_div not exported")?;

    let zero = [arg(&wire, 1u64, &TypeDescriptor::U32)?, arg(&wire, 0u64, &TypeDescriptor::U32)?];
    assert_eq!(
        (div.export().invoke)(&wire, &zero),
        Err(Fault::Application("division by zero".to_string()))
    );

    let one = [arg(&wire, 1u64, &TypeDescriptor::U32)?];
    assert_eq!(
        (div.export().invoke)(&wire, &one),
        Err(Fault::BadArgumentCount { expected: 2, found: 1 })
    );
    Ok(())
}

#[test]
fn test_void_return_is_empty_frame() -> TestResult<()> {
    let wire = WireConfig::default();
    let reset = find("ex_reset()").ok_or("reset not exported")?;
    assert!((reset.export().invoke)(&wire, &[])?.is_empty());
    Ok(())
}
