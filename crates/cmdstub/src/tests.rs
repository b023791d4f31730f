use std::sync::Arc;
use std::time::Duration;

use cmdpack::CommandRequest;
use cmdpack::CommandResponse;
use cmdpack::ErrorCode;
use cmdpack::TypeDescriptor;
use cmdpack::Value;
use cmdpack::WireConfig;
use cmdtab::CommandTable;
use cmdtab::TableBuilder;

use crate::Binding;
use crate::Client;
use crate::Error;
use crate::RemoteError;
use crate::StreamTransport;
use crate::TransportError;
use crate::generate;
use crate::mock_transport::CallTransport;
use crate::mock_transport::SilentTransport;
use crate::render_python;
use crate::render_rejections;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn table(signatures: &[&str]) -> Result<CommandTable> {
    let mut text = String::from("0000000000001000 D __start_linkme_COMMANDS\n");
    for (i, signature) in signatures.iter().enumerate() {
        text.push_str(&format!("{:016x} D {signature}\n", 0x1000 + 8 * i));
    }
    Ok(TableBuilder::default().build_from_dump(&text)?)
}

fn binding<'a>(bindings: &'a [Binding], name: &str) -> Result<&'a Binding> {
    Ok(bindings.iter().find(|b| b.name == name).ok_or_else(|| format!("no binding {name}"))?)
}

fn dirlist() -> Result<Binding> {
    let table = table(&["ex_dirlist(path: string) -> sequence<string>"])?;
    Ok(generate(&table).remove(0))
}

// ============================================================================
// Generation
// ============================================================================

#[test]
fn test_generate_strips_prefix_and_skips_rejected() -> Result<()> {
    let table = table(&["ex_add(a: i32, b: i32) -> i32", "ex_open(h: Handle)", "ex_ping() -> bool"])?;
    let bindings = generate(&table);

    let names: Vec<_> = bindings.iter().map(|b| (b.command_number, b.name.as_str())).collect();
    assert_eq!(names, [(0, "add"), (2, "ping")]);
    Ok(())
}

#[test]
fn test_generate_disambiguates_overloads() -> Result<()> {
    let table = table(&[
        "ex_area(r: f64) -> f64",
        "ex_len(s: string) -> u64",
        "ex_area(w: f64, h: f64) -> f64",
        "ex_area(s: i32) -> i32",
    ])?;
    let bindings = generate(&table);

    let names: Vec<_> = bindings.iter().map(|b| (b.command_number, b.name.as_str())).collect();
    assert_eq!(names, [(0, "area_0"), (1, "len"), (2, "area_1"), (3, "area_2")]);
    Ok(())
}

#[test]
fn test_generate_avoids_keywords_and_collisions() -> Result<()> {
    let table = table(&[
        "ex_import(path: string)",
        "ex_import_(path: string)",
        "ex_WIRE() -> bool",
        "ex_9lives() -> u8",
    ])?;
    let bindings = generate(&table);

    let names: Vec<_> = bindings.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["import_", "import__", "WIRE_", "_9lives"]);
    Ok(())
}

#[test]
fn test_generate_is_deterministic() -> Result<()> {
    let signatures = ["ex_b(x: u8)", "ex_a(s: string) -> sequence<string>", "ex_b(y: u16)"];
    let wire = WireConfig::default();
    let first = render_python(&generate(&table(&signatures)?), &wire);
    let second = render_python(&generate(&table(&signatures)?), &wire);
    assert_eq!(first, second);
    Ok(())
}

// ============================================================================
// Encoding
// ============================================================================

#[test]
fn test_dirlist_round_trip() -> Result<()> {
    let wire = WireConfig::default();
    let binding = dirlist()?;
    assert_eq!(binding.signature.params[0].ty, TypeDescriptor::String);

    let request = binding.encode_request(&wire, &[Value::from("/tmp")])?;
    assert_eq!(request.command_number, 0);
    assert_eq!(request.args[0].decode(&wire, &TypeDescriptor::String)?, Value::from("/tmp"));

    let listing = Value::Seq(vec![Value::from("a.txt"), Value::from("b.txt"), Value::from("c")]);
    let bytes = cmdpack::encode_to_vec(&wire, &listing, &binding.signature.ret)?;
    assert_eq!(binding.decode_response(&wire, CommandResponse::value(bytes))?, listing);
    Ok(())
}

#[test]
fn test_encode_request_checks_arguments() -> Result<()> {
    let wire = WireConfig::default();
    let binding = dirlist()?;

    assert!(matches!(
        binding.encode_request(&wire, &[]),
        Err(Error::ArgumentCount { expected: 1, found: 0, .. })
    ));
    assert!(matches!(
        binding.encode_request(&wire, &[Value::Int(3)]),
        Err(Error::Argument { index: 0, .. })
    ));
    Ok(())
}

#[test]
fn test_decode_response_surfaces_error_frames() -> Result<()> {
    let wire = WireConfig::default();
    let binding = dirlist()?;
    let response = CommandResponse::error(ErrorCode::Application, "no such directory");
    match binding.decode_response(&wire, response) {
        Err(Error::Remote(RemoteError { code, message })) => {
            assert_eq!(code, ErrorCode::Application);
            assert_eq!(message, "no such directory");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_python_shape() -> Result<()> {
    let table = table(&["ex_add(a: integer, b: integer) -> integer", "ex_dirlist(lambda: string) -> sequence<string>"])?;
    let source = render_python(&generate(&table), &WireConfig::default());

    assert!(source.starts_with("# Generated from the command table. Do not edit.\nimport cmdtab_client\n"));
    assert!(source.contains(
        "WIRE = cmdtab_client.WireConfig(command_width=4, count_width=4, size_width=4, byte_order=\"little\", max_frame_size=16777216)"
    ));
    assert!(source.contains(
        "COMMANDS = [\n    cmdtab_client.Command(0, [cmdtab_client.I64, cmdtab_client.I64], cmdtab_client.I64),\n    cmdtab_client.Command(1, [cmdtab_client.STRING], cmdtab_client.sequence(cmdtab_client.STRING)),\n]\n"
    ));
    assert!(source.contains(
        "def add(a, b):\n    \"\"\"ex_add(a: i64, b: i64) -> i64\"\"\"\n    return cmdtab_client.call(WIRE, COMMANDS[0], [a, b])\n"
    ));
    assert!(source.contains("def dirlist(lambda_):"));
    assert!(source.contains("return cmdtab_client.call(WIRE, COMMANDS[1], [lambda_])\n"));
    Ok(())
}

#[test]
fn test_render_python_codecs_follow_descriptors() -> Result<()> {
    let table = table(&[
        "ex_skip()",
        "ex_mix(a: [u8; 3], b: Vec<Vec<f32>>, c: bool) -> u16",
    ])?;
    let source = render_python(&generate(&table), &WireConfig::default());

    assert!(source.contains("    cmdtab_client.Command(0, [], cmdtab_client.VOID),\n"));
    assert!(source.contains(
        "    cmdtab_client.Command(1, [cmdtab_client.array(cmdtab_client.U8, 3), cmdtab_client.sequence(cmdtab_client.sequence(cmdtab_client.F32)), cmdtab_client.BOOL], cmdtab_client.U16),\n"
    ));
    assert!(source.contains("return cmdtab_client.call(WIRE, COMMANDS[1], [a, b, c])\n"));
    // Type text only appears in docstrings.
    assert!(!source.contains("\"u16\""));
    Ok(())
}

#[test]
fn test_render_python_params_do_not_shadow_module_names() -> Result<()> {
    let table = table(&["ex_f(WIRE: i32, cmdtab_client: i32, COMMANDS: i32) -> i32"])?;
    let source = render_python(&generate(&table), &WireConfig::default());

    assert!(source.contains("def f(WIRE_, cmdtab_client_, COMMANDS_):"));
    assert!(source.contains("return cmdtab_client.call(WIRE, COMMANDS[0], [WIRE_, cmdtab_client_, COMMANDS_])\n"));
    Ok(())
}

#[test]
fn test_render_rejections() -> Result<()> {
    let table = table(&["ex_ok() -> bool", "ex_open(h: Handle)"])?;
    assert_eq!(render_rejections(&table), "rejected #1 `ex_open(h: Handle)`: unsupported type `Handle`\n");

    let clean = self::table(&["ex_ok() -> bool"])?;
    assert!(render_rejections(&clean).is_empty());
    Ok(())
}

// ============================================================================
// Client
// ============================================================================

#[tokio::test]
async fn test_client_over_call_transport() -> Result<()> {
    let wire = WireConfig::default();
    let table = table(&["ex_add(a: i32, b: i32) -> i32"])?;
    let bindings = generate(&table);
    let add = binding(&bindings, "add")?;

    let server_wire = wire.clone();
    let transport = CallTransport::new(move |bytes| {
        let request = CommandRequest::decode(bytes, &server_wire)?;
        let mut sum = 0;
        for arg in &request.args {
            sum += arg.decode(&server_wire, &TypeDescriptor::I32)?.as_i64().unwrap_or_default();
        }
        let ret = cmdpack::encode_to_vec(&server_wire, &Value::Int(sum), &TypeDescriptor::I32)?;
        Ok(CommandResponse::value(ret))
    });
    let client = Client::new(Arc::new(transport), wire);

    assert_eq!(client.call(add, &[Value::Int(2), Value::Int(3)]).await?, Value::Int(5));
    Ok(())
}

#[tokio::test]
async fn test_client_times_out() -> Result<()> {
    let binding = dirlist()?;
    let client = Client::new(Arc::new(SilentTransport), WireConfig::default()).with_timeout(Duration::from_millis(20));

    let result = client.call(&binding, &[Value::from("/")]).await;
    assert!(matches!(result, Err(Error::Timeout(_))));
    Ok(())
}

#[tokio::test]
async fn test_client_over_stream() -> Result<()> {
    let wire = WireConfig::default();
    let binding = dirlist()?;
    let (client_end, mut server_end) = tokio::io::duplex(1024);

    let server_wire = wire.clone();
    let server = tokio::spawn(async move {
        let request = cmdpack::read_request(&mut server_end, &server_wire).await?.ok_or(cmdpack::Error::TruncatedFrame { needed: 1, remaining: 0 })?;
        let path = request.args[0].decode(&server_wire, &TypeDescriptor::String)?;
        let listing = Value::Seq(vec![path.clone(), path]);
        let ty = TypeDescriptor::sequence(TypeDescriptor::String);
        let response = CommandResponse::value(cmdpack::encode_to_vec(&server_wire, &listing, &ty)?);
        cmdpack::write_frame(&mut server_end, &response.encode(&server_wire)?).await?;
        Ok::<_, cmdpack::Error>(())
    });

    let client = Client::new(Arc::new(StreamTransport::new(client_end, wire.clone())), wire);
    let listing = client.call(&binding, &[Value::from("x")]).await?;
    assert_eq!(listing, Value::Seq(vec![Value::from("x"), Value::from("x")]));
    server.await??;
    Ok(())
}

#[tokio::test]
async fn test_late_reply_is_never_taken_for_the_next_call() -> Result<()> {
    let wire = WireConfig::default();
    let table = table(&["ex_id(x: i64) -> i64"])?;
    let bindings = generate(&table);
    let id = binding(&bindings, "id")?;
    let (client_end, mut server_end) = tokio::io::duplex(1024);

    // Echoes every argument back, the first one only after the caller has given up.
    let server_wire = wire.clone();
    let server = tokio::spawn(async move {
        let mut delay = Duration::from_millis(100);
        while let Ok(Some(request)) = cmdpack::read_request(&mut server_end, &server_wire).await {
            tokio::time::sleep(delay).await;
            delay = Duration::ZERO;
            let response = CommandResponse::value(request.args[0].bytes.clone());
            let Ok(bytes) = response.encode(&server_wire) else { break };
            if cmdpack::write_frame(&mut server_end, &bytes).await.is_err() {
                break;
            }
        }
    });

    let transport = StreamTransport::new(client_end, wire.clone());
    let client = Client::new(Arc::new(transport), wire).with_timeout(Duration::from_millis(30));

    assert!(matches!(client.call(id, &[Value::Int(1)]).await, Err(Error::Timeout(_))));
    let second = client.call(id, &[Value::Int(2)]).await;
    assert!(
        matches!(second, Err(Error::Transport(TransportError::ConnectionLost(_)))),
        "expected a lost connection, got {second:?}"
    );
    server.abort();
    Ok(())
}

#[tokio::test]
async fn test_truncated_reply_closes_the_transport() -> Result<()> {
    let wire = WireConfig::default();
    let binding = dirlist()?;
    let (client_end, mut server_end) = tokio::io::duplex(1024);

    let server_wire = wire.clone();
    let server = tokio::spawn(async move {
        let _ = cmdpack::read_request(&mut server_end, &server_wire).await;
        // Half a size field, then hang up.
        let _ = cmdpack::write_frame(&mut server_end, &[8, 0]).await;
    });

    let client = Client::new(Arc::new(StreamTransport::new(client_end, wire.clone())), wire);
    let first = client.call(&binding, &[Value::from("/")]).await;
    assert!(matches!(first, Err(Error::Transport(TransportError::Wire(cmdpack::Error::TruncatedFrame { .. })))));
    let second = client.call(&binding, &[Value::from("/")]).await;
    assert!(matches!(second, Err(Error::Transport(TransportError::ConnectionLost(_)))));
    server.await?;
    Ok(())
}
