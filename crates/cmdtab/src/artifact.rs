//! Symbol records straight from a compiled artifact (ELF, Mach-O, PE), via `object`.

use std::path::Path;

use object::BinaryFormat;
use object::Object;
use object::ObjectSection;
use object::ObjectSymbol;
use object::SectionKind;
use object::SymbolSection;

use crate::error::Result;
use crate::symbol::SymbolRecord;

pub fn read_artifact(path: &Path) -> Result<Vec<SymbolRecord>> {
    let data = std::fs::read(path)?;
    parse_artifact(&data)
}

/// Reads the static symbol table, falling back to the dynamic one for stripped binaries.
pub fn parse_artifact(data: &[u8]) -> Result<Vec<SymbolRecord>> {
    let file = object::File::parse(data)?;
    let mut records = collect(&file, file.symbols());
    if records.is_empty() {
        records = collect(&file, file.dynamic_symbols());
    }
    tracing::debug!(format = ?file.format(), symbols = records.len(), "read artifact symbols");
    Ok(records)
}

fn collect<'data, 'file>(
    file: &'file object::File<'data>,
    symbols: impl Iterator<Item = object::Symbol<'data, 'file>>,
) -> Vec<SymbolRecord> {
    // Mach-O prepends `_` to every C-level name.
    let underscored = file.format() == BinaryFormat::MachO;
    let mut records = Vec::new();
    for symbol in symbols {
        if symbol.is_undefined() {
            continue;
        }
        let Ok(raw) = symbol.name() else { continue };
        let raw = if underscored { raw.strip_prefix('_').unwrap_or(raw) } else { raw };
        if raw.is_empty() {
            continue;
        }
        records.push(SymbolRecord::new(symbol.address(), kind_char(file, &symbol), raw));
    }
    records
}

fn kind_char(file: &object::File<'_>, symbol: &object::Symbol<'_, '_>) -> char {
    let kind = match symbol.section() {
        SymbolSection::Absolute => 'A',
        SymbolSection::Common => 'C',
        SymbolSection::Section(index) => match file.section_by_index(index).map(|s| s.kind()) {
            Ok(SectionKind::Text) => 'T',
            Ok(SectionKind::Data | SectionKind::Tls) => 'D',
            Ok(SectionKind::UninitializedData | SectionKind::UninitializedTls) => 'B',
            Ok(SectionKind::ReadOnlyData | SectionKind::ReadOnlyString) => 'R',
            _ => 'S',
        },
        _ => '?',
    };
    if symbol.is_local() { kind.to_ascii_lowercase() } else { kind }
}
