//! `nm`-style symbol dumps: `address type signature...`, one symbol per line.

use crate::error::Error;
use crate::error::Result;
use crate::symbol::SymbolRecord;

/// Parses a dump into records.
///
/// Blank lines and lines with fewer than three fields (undefined symbols have no address)
/// are skipped. The signature is the rest of the line and may contain spaces.
pub fn parse_dump(text: &str) -> Result<Vec<SymbolRecord>> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        let Some((address, rest)) = split_field(line) else { continue };
        let Some((kind, signature)) = split_field(rest) else { continue };
        let signature = signature.trim();
        if signature.is_empty() {
            continue;
        }

        let digits = address.strip_prefix("0x").unwrap_or(address);
        let address = u64::from_str_radix(digits, 16).map_err(|_| Error::MalformedDumpLine {
            line: index + 1,
            reason: format!("`{address}` is not a hex address"),
        })?;
        let mut chars = kind.chars();
        let kind = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(Error::MalformedDumpLine {
                    line: index + 1,
                    reason: format!("`{kind}` is not a symbol type"),
                });
            }
        };

        records.push(SymbolRecord::new(address, kind, signature));
    }
    Ok(records)
}

fn split_field(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.find(char::is_whitespace) {
        Some(at) => Some((&text[..at], &text[at..])),
        None => Some((text, "")),
    }
}
