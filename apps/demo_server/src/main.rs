use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmdpack::WireConfig;
use cmdrun::Engine;
use cmdrun::EngineConfig;
use cmdrun::Registry;
use cmdrun::Server;
use cmdtab::CommandTable;
use cmdtab::TableBuilder;

mod commands;


#[derive(Debug, Parser)]
#[command(name = "demo_server")]
#[command(about = "Serve this binary's exported commands over TCP", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:7878")]
    listen: String,
    /// Command table JSON written by `cmdgen --table` (built from the live region when absent)
    #[arg(long)]
    table: Option<PathBuf>,
    /// Wire configuration JSON shared with the generator
    #[arg(long)]
    wire_config: Option<PathBuf>,
    /// Seconds to wait for a complete request before closing the connection
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn load_table(path: Option<&PathBuf>) -> Result<CommandTable> {
    match path {
        Some(path) => CommandTable::read(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(TableBuilder::default().build_from_region(cmdexport::region())?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let table = Arc::new(load_table(args.table.as_ref())?);
    for (entry, error) in table.rejected() {
        tracing::warn!(command_number = entry.command_number, symbol = %entry.symbol.name, %error, "not callable");
    }
    let registry = Registry::from_region(table).context("table does not describe this binary")?;

    let config = EngineConfig {
        wire: match &args.wire_config {
            Some(path) => WireConfig::read(path).with_context(|| format!("loading {}", path.display()))?,
            None => WireConfig::default(),
        },
        request_timeout: Duration::from_secs(args.timeout_secs),
    };
    let server = Server::bind(&args.listen, Engine::new(Arc::new(registry), config)).await?;
    tracing::info!(addr = %server.local_addr()?, "listening");
    server.run().await?;
    Ok(())
}
