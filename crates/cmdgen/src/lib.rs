//! # Cmdgen
//!
//! Build-time half of the pipeline: symbols in, command table and caller bindings out.
//!
//! ## Philosophy
//!
//! - **One pass, one table**: The table written with `--table` and the bindings written with
//!   `-o` come from the same build, so their command numbers cannot drift apart.
//! - **Rejections are loud**: Every rejected symbol is reported; `--strict` turns any of them
//!   into a failure.

pub mod args;


use std::path::Path;

use anyhow::Context;
use anyhow::Result;

use cmdpack::WireConfig;
use cmdtab::BuildConfig;
use cmdtab::CommandTable;
use cmdtab::TableBuilder;

pub use args::Args;

/// Everything one run produces.
#[derive(Debug)]
pub struct Generated {
    pub table: CommandTable,
    pub python: String,
    /// One line per rejected symbol; empty when all were accepted.
    pub rejections: String,
}

impl Generated {
    pub fn rejected(&self) -> usize {
        self.table.rejected().count()
    }
}

pub fn build_config(args: &Args) -> BuildConfig {
    let defaults = BuildConfig::default();
    BuildConfig {
        prefix: args.prefix.clone().unwrap_or(defaults.prefix),
        start_marker: args.start_marker.clone().unwrap_or(defaults.start_marker),
        slot_width: args.slot_width.unwrap_or(defaults.slot_width),
    }
}

pub fn load_wire_config(path: Option<&Path>) -> Result<WireConfig> {
    match path {
        Some(path) => WireConfig::read(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(WireConfig::default()),
    }
}

/// Builds the table from `args.input`, renders bindings and writes the requested files.
pub fn run(args: &Args) -> Result<Generated> {
    let wire = load_wire_config(args.wire_config.as_deref())?;
    let builder = TableBuilder::new(build_config(args));
    let data = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let table = build_table(&builder, &data, args.dump)?;

    let bindings = cmdstub::generate(&table);
    let generated = Generated {
        python: cmdstub::render_python(&bindings, &wire),
        rejections: cmdstub::render_rejections(&table),
        table,
    };
    tracing::info!(
        entries = generated.table.len(),
        bindings = bindings.len(),
        rejected = generated.rejected(),
        "generated"
    );

    if let Some(path) = &args.output {
        std::fs::write(path, &generated.python).with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &args.table {
        generated.table.write(path).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(generated)
}

fn build_table(builder: &TableBuilder, data: &[u8], dump: bool) -> Result<CommandTable> {
    if dump {
        return Ok(builder.build_from_dump(dump_text(data)?)?);
    }
    match builder.build_from_artifact(data) {
        Err(cmdtab::Error::Object(e)) => {
            tracing::debug!(error = %e, "input is not an object file, reading it as a symbol dump");
            Ok(builder.build_from_dump(dump_text(data)?)?)
        }
        other => Ok(other?),
    }
}

fn dump_text(data: &[u8]) -> Result<&str> {
    std::str::from_utf8(data).context("symbol dump is not valid UTF-8")
}
