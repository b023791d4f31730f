use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "cmdgen")]
#[command(about = "Build a command table and render Python bindings for it", long_about = None)]
pub struct Args {
    /// Compiled artifact, or a symbol dump (`address kind signature` per line)
    pub input: PathBuf,
    /// Treat the input as a symbol dump even if it parses as an object file
    #[arg(long)]
    pub dump: bool,
    /// Name prefix that marks an exported symbol
    #[arg(long)]
    pub prefix: Option<String>,
    /// Symbol placed at the first byte of the export region
    #[arg(long)]
    pub start_marker: Option<String>,
    /// Byte width of one region slot
    #[arg(long)]
    pub slot_width: Option<u64>,
    /// Wire configuration JSON shared with the server
    #[arg(long)]
    pub wire_config: Option<PathBuf>,
    /// Where to write the Python bindings (stdout when absent)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Also write the command table as JSON
    #[arg(long)]
    pub table: Option<PathBuf>,
    /// Fail if any exported symbol was rejected
    #[arg(long)]
    pub strict: bool,
}
