use serde::Deserialize;
use serde::Serialize;

use crate::translate::ParamToken;

/// One line of a symbol table, whatever it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub address: u64,
    /// `nm`-style type character (`T`, `D`, `d`, ...).
    pub kind: char,
    /// Demangled name. For exports this is the signature string.
    pub name: String,
    /// The name exactly as the symbol table stores it.
    pub mangled: String,
}

impl SymbolRecord {
    pub fn new(address: u64, kind: char, raw: &str) -> Self {
        Self { address, kind, name: demangle(raw), mangled: raw.to_string() }
    }
}

/// A symbol that passed the prefix filter and sits inside the export region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedSymbol {
    pub address: u64,
    /// Distance from the region start.
    pub offset: u64,
    pub name: String,
    pub mangled: String,
    /// `None` when the signature has no `->`, or could not be split at all.
    pub return_token: Option<String>,
    pub param_tokens: Vec<ParamToken>,
}

/// Demangles Rust symbols; anything else is returned unchanged.
pub fn demangle(raw: &str) -> String {
    if raw.starts_with("_R") || raw.starts_with("_ZN") {
        if let Ok(demangled) = rustc_demangle::try_demangle(raw) {
            return format!("{demangled:#}");
        }
    }
    raw.to_string()
}
