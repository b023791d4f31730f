//! End to end: real exports, a table built from this binary's own region, a TCP server and
//! generated caller bindings.

use std::sync::Arc;

use cmdexport::export;
use cmdpack::ErrorCode;
use cmdpack::Value;
use cmdpack::WireConfig;
use cmdrun::Engine;
use cmdrun::EngineConfig;
use cmdrun::Registry;
use cmdrun::Server;
use cmdstub::Binding;
use cmdstub::Client;
use cmdstub::RemoteError;
use cmdtab::CommandTable;
use cmdtab::TableBuilder;

type TestResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[export]
fn add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

#[export]
fn dirlist(path: &str) -> Vec<String> {
    ["a.txt", "b.txt"].iter().map(|name| format!("{path}/{name}")).collect()
}

#[export]
fn checked_div(a: u32, b: u32) -> Result<u32, String> {
    a.checked_div(b).ok_or_else(|| format!("cannot divide {a} by zero"))
}

fn table() -> TestResult<CommandTable> {
    Ok(TableBuilder::default().build_from_region(cmdexport::region())?)
}

async fn start() -> TestResult<(Client, Vec<Binding>)> {
    let table = Arc::new(table()?);
    let registry = Registry::from_region(table.clone())?;
    let engine = Engine::new(Arc::new(registry), EngineConfig::default());

    let server = Server::bind("127.0.0.1:0", engine).await?;
    let addr = server.local_addr()?;
    tokio::spawn(server.run());

    let client = Client::connect(addr, WireConfig::default()).await?;
    Ok((client, cmdstub::generate(&table)))
}

fn binding<'a>(bindings: &'a [Binding], name: &str) -> TestResult<&'a Binding> {
    Ok(bindings.iter().find(|b| b.name == name).ok_or_else(|| format!("no binding {name}"))?)
}

#[test]
fn test_region_table_accepts_every_export() -> TestResult<()> {
    let table = table()?;
    assert_eq!(table.len(), 3);
    assert_eq!(table.rejected().count(), 0);

    let mut names: Vec<_> = table.entries.iter().map(|e| e.symbol.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        [
            "ex_add(a: i32, b: i32) -> i32",
            "ex_checked_div(a: u32, b: u32) -> u32",
            "ex_dirlist(path: &str) -> Vec<String>",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_calls_over_tcp() -> TestResult<()> {
    let (client, bindings) = start().await?;

    let add = binding(&bindings, "add")?;
    assert_eq!(client.call(add, &[Value::Int(2), Value::Int(3)]).await?, Value::Int(5));

    let dirlist = binding(&bindings, "dirlist")?;
    let listing = client.call(dirlist, &[Value::from("/tmp")]).await?;
    assert_eq!(listing, Value::Seq(vec![Value::from("/tmp/a.txt"), Value::from("/tmp/b.txt")]));
    Ok(())
}

#[tokio::test]
async fn test_application_error_keeps_connection() -> TestResult<()> {
    let (client, bindings) = start().await?;
    let div = binding(&bindings, "checked_div")?;

    match client.call(div, &[Value::UInt(9), Value::UInt(0)]).await {
        Err(cmdstub::Error::Remote(RemoteError { code, message })) => {
            assert_eq!(code, ErrorCode::Application);
            assert_eq!(message, "cannot divide 9 by zero");
        }
        other => return Err(format!("expected an application error, got {other:?}").into()),
    }

    assert_eq!(client.call(div, &[Value::UInt(9), Value::UInt(3)]).await?, Value::UInt(3));
    Ok(())
}

/// The generator's path: symbols read from this test binary on disk, not from memory.
#[cfg(target_os = "linux")]
#[test]
fn test_artifact_table_matches_the_running_region() -> TestResult<()> {
    let records = cmdtab::read_artifact(&std::env::current_exe()?)?;
    let from_artifact = TableBuilder::default().build(&records)?;
    let from_region = table()?;

    // Link-time and load-time addresses differ under PIE, so only the layout is compared.
    let layout = |table: &CommandTable| -> Vec<_> {
        table
            .entries
            .iter()
            .map(|e| (e.command_number, e.symbol.name.clone(), e.symbol.offset, e.status.clone()))
            .collect()
    };
    assert_eq!(layout(&from_artifact), layout(&from_region));
    assert_eq!(from_artifact.slot_width, from_region.slot_width);

    // A table written by the generator is accepted by the server of the same build.
    let registry = Registry::from_region(Arc::new(from_artifact))?;
    assert_eq!(registry.len(), 3);
    Ok(())
}
