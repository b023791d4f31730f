//! Python source for a set of bindings, and the report of rejected symbols.
//!
//! The generated module only imports `cmdtab_client`, the caller-side runtime that owns
//! sockets and value marshaling. Each descriptor is written out as a reference to the codec
//! routine that handles it, and all of them are assembled once at import into `COMMANDS`.
//! A call only indexes that list; no type text is interpreted per call.

use std::collections::BTreeSet;
use std::fmt::Write;

use cmdpack::ByteOrder;
use cmdpack::TypeDescriptor;
use cmdpack::WireConfig;
use cmdtab::CommandTable;

use crate::binding::Binding;
use crate::binding::RESERVED_NAMES;
use crate::binding::claim;
use crate::binding::identifier;

/// Renders one `def` per binding. Identical input renders identical bytes.
pub fn render_python(bindings: &[Binding], wire: &WireConfig) -> String {
    let mut out = String::new();
    out.push_str("# Generated from the command table. Do not edit.\n");
    out.push_str("import cmdtab_client\n\n");
    let byte_order = match wire.byte_order {
        ByteOrder::Little => "little",
        ByteOrder::Big => "big",
    };
    // Writing to a String cannot fail.
    let _ = writeln!(
        out,
        "WIRE = cmdtab_client.WireConfig(command_width={}, count_width={}, size_width={}, byte_order=\"{}\", max_frame_size={})",
        wire.command_width.bytes(),
        wire.count_width.bytes(),
        wire.size_width.bytes(),
        byte_order,
        wire.max_frame_size,
    );

    out.push_str("\nCOMMANDS = [\n");
    for binding in bindings {
        let params: Vec<String> = binding.signature.params.iter().map(|p| codec(&p.ty)).collect();
        let _ = writeln!(
            out,
            "    cmdtab_client.Command({}, [{}], {}),",
            binding.command_number,
            params.join(", "),
            codec(&binding.signature.ret),
        );
    }
    out.push_str("]\n");

    for (index, binding) in bindings.iter().enumerate() {
        render_binding(&mut out, index, binding);
    }
    out
}

/// The `cmdtab_client` expression for the codec of `ty`.
fn codec(ty: &TypeDescriptor) -> String {
    match ty {
        TypeDescriptor::Int { bits, signed: true } => format!("cmdtab_client.I{bits}"),
        TypeDescriptor::Int { bits, signed: false } => format!("cmdtab_client.U{bits}"),
        TypeDescriptor::Float { bits } => format!("cmdtab_client.F{bits}"),
        TypeDescriptor::Bool => "cmdtab_client.BOOL".to_string(),
        TypeDescriptor::String => "cmdtab_client.STRING".to_string(),
        TypeDescriptor::Sequence { element } => format!("cmdtab_client.sequence({})", codec(element)),
        TypeDescriptor::Array { element, len } => format!("cmdtab_client.array({}, {len})", codec(element)),
        TypeDescriptor::Void => "cmdtab_client.VOID".to_string(),
    }
}

fn render_binding(out: &mut String, index: usize, binding: &Binding) {
    // Parameters must not shadow the module globals the body refers to.
    let mut used: BTreeSet<String> = RESERVED_NAMES.iter().map(|n| n.to_string()).collect();
    let params: Vec<String> = binding
        .signature
        .params
        .iter()
        .map(|p| claim(&mut used, identifier(&p.name)))
        .collect();
    let params = params.join(", ");

    let _ = write!(
        out,
        "\n\ndef {name}({params}):\n    \"\"\"{doc}\"\"\"\n    return cmdtab_client.call(WIRE, COMMANDS[{index}], [{params}])\n",
        name = binding.name,
        doc = escape(&binding.signature.to_string()),
    );
}

/// Lists every rejected symbol and why. Empty when nothing was rejected.
pub fn render_rejections(table: &CommandTable) -> String {
    let mut out = String::new();
    for (entry, error) in table.rejected() {
        let _ = writeln!(out, "rejected #{} `{}`: {}", entry.command_number, entry.symbol.name, error);
    }
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
