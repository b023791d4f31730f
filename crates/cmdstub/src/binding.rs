//! # Bindings
//!
//! One caller-visible function per accepted table entry.
//!
//! ## Invariants
//! - **Pure**: `generate` depends only on the accepted entries, in table order.
//! - **Distinct names**: Overloads get `_<ordinal>` (ordinal among same-named signatures, in
//!   table order), keywords get a trailing `_`, and anything still colliding gets more `_`.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use cmdpack::ArgFrame;
use cmdpack::CommandRequest;
use cmdpack::CommandResponse;
use cmdpack::Value;
use cmdpack::WireConfig;
use cmdtab::CommandTable;
use cmdtab::Signature;

use crate::error::Error;
use crate::error::RemoteError;
use crate::error::Result;

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
    "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with",
    "yield",
];

/// Names the generated module defines itself.
pub(crate) const RESERVED_NAMES: &[&str] = &["WIRE", "COMMANDS", "cmdtab_client"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub command_number: u64,
    /// Caller-visible name.
    pub name: String,
    pub signature: Signature,
}

impl Binding {
    /// Encodes `args` against the parameter descriptors.
    pub fn encode_request(&self, wire: &WireConfig, args: &[Value]) -> Result<CommandRequest> {
        if args.len() != self.signature.arity() {
            return Err(Error::ArgumentCount {
                name: self.name.clone(),
                expected: self.signature.arity(),
                found: args.len(),
            });
        }
        let frames = args
            .iter()
            .zip(&self.signature.params)
            .enumerate()
            .map(|(index, (value, param))| {
                ArgFrame::encode(wire, value, &param.ty).map_err(|source| Error::Argument {
                    name: self.name.clone(),
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CommandRequest::new(self.command_number, frames))
    }

    /// Decodes a value frame as the return type. Error frames become `Error::Remote`.
    pub fn decode_response(&self, wire: &WireConfig, response: CommandResponse) -> Result<Value> {
        match response {
            CommandResponse::Value(bytes) => Ok(cmdpack::decode_exact(wire, &bytes, &self.signature.ret)?),
            CommandResponse::Error(frame) => Err(RemoteError { code: frame.code, message: frame.message }.into()),
        }
    }
}

/// One binding per accepted entry, in table order.
pub fn generate(table: &CommandTable) -> Vec<Binding> {
    let bases: Vec<(u64, String, &Signature)> = table
        .accepted()
        .map(|(entry, signature)| {
            let bare = signature.name.strip_prefix(&table.prefix).unwrap_or(&signature.name);
            (entry.command_number, identifier(bare), signature)
        })
        .collect();

    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, base, _) in &bases {
        *totals.entry(base.as_str()).or_default() += 1;
    }

    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    let mut used: BTreeSet<String> = RESERVED_NAMES.iter().map(|n| n.to_string()).collect();
    let mut bindings = Vec::with_capacity(bases.len());
    for (command_number, base, signature) in &bases {
        let mut name = base.clone();
        if totals[base.as_str()] > 1 {
            let ordinal = seen.entry(base.as_str()).or_default();
            name = format!("{base}_{ordinal}");
            *ordinal += 1;
        }
        let name = claim(&mut used, name);
        bindings.push(Binding { command_number: *command_number, name, signature: (*signature).clone() });
    }
    bindings
}

/// Appends `_` to keywords and to names already in `used`, then records the result.
pub(crate) fn claim(used: &mut BTreeSet<String>, mut name: String) -> String {
    if PYTHON_KEYWORDS.contains(&name.as_str()) {
        name.push('_');
    }
    while used.contains(&name) {
        name.push('_');
    }
    used.insert(name.clone());
    name
}

/// A Python identifier for `raw`: other characters become `_`, a leading digit gets a `_`.
pub(crate) fn identifier(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
