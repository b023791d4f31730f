//! # Command Table
//!
//! The ordered index from command number to export, built once per binary image and shared
//! read-only by the stub generator and every dispatch engine.
//!
//! ## Invariants
//! - **Dense**: Entry `i` sits at offset `i * slot_width` from the region start. Offsets are
//!   strictly increasing, so table order and address order agree.
//! - **Physical numbering**: A rejected entry keeps its command number. Later entries are
//!   never shifted down to close the gap.
//! - **Loaded tables are rechecked**: `from_json` verifies the layout before returning.

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use cmdexport::Slot;

use crate::dump::parse_dump;
use crate::error::Error;
use crate::error::Result;
use crate::region::region_records;
use crate::symbol::ExportedSymbol;
use crate::symbol::SymbolRecord;
use crate::translate::Signature;
use crate::translate::TranslateError;
use crate::translate::split_signature;
use crate::translate::translate_tokens;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Only symbols whose demangled name starts with this are exports.
    pub prefix: String,
    /// The symbol the linker places at the first byte of the region.
    pub start_marker: String,
    pub slot_width: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            prefix: cmdexport::DEFAULT_PREFIX.to_string(),
            start_marker: "__start_linkme_COMMANDS".to_string(),
            slot_width: std::mem::size_of::<usize>() as u64,
        }
    }
}

/// Whether an entry can be called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    Accepted { signature: Signature },
    Rejected { error: TranslateError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub command_number: u64,
    pub symbol: ExportedSymbol,
    pub status: EntryStatus,
}

impl TableEntry {
    pub fn signature(&self) -> Option<&Signature> {
        match &self.status {
            EntryStatus::Accepted { signature } => Some(signature),
            EntryStatus::Rejected { .. } => None,
        }
    }

    pub fn rejection(&self) -> Option<&TranslateError> {
        match &self.status {
            EntryStatus::Accepted { .. } => None,
            EntryStatus::Rejected { error } => Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTable {
    pub prefix: String,
    pub start_marker: String,
    pub region_start: u64,
    pub slot_width: u64,
    pub entries: Vec<TableEntry>,
}

impl CommandTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, command_number: u64) -> Option<&TableEntry> {
        usize::try_from(command_number).ok().and_then(|i| self.entries.get(i))
    }

    /// Callable entries, in table order.
    pub fn accepted(&self) -> impl Iterator<Item = (&TableEntry, &Signature)> {
        self.entries.iter().filter_map(|e| e.signature().map(|s| (e, s)))
    }

    pub fn rejected(&self) -> impl Iterator<Item = (&TableEntry, &TranslateError)> {
        self.entries.iter().filter_map(|e| e.rejection().map(|r| (e, r)))
    }

    /// Checks numbering and the dense layout.
    pub fn verify(&self) -> Result<()> {
        if self.slot_width == 0 {
            return Err(Error::InvalidSlotWidth);
        }
        let mut previous: Option<&ExportedSymbol> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            let index = index as u64;
            if entry.command_number != index {
                return Err(Error::Renumbered { index, found: entry.command_number });
            }
            check_slot(self.slot_width, index, &entry.symbol, previous)?;
            previous = Some(&entry.symbol);
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.verify()?;
        Ok(table)
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()? + "\n")?;
        Ok(())
    }
}

/// Duplicate, alignment and gap checks for the symbol at `index`.
fn check_slot(slot_width: u64, index: u64, symbol: &ExportedSymbol, previous: Option<&ExportedSymbol>) -> Result<()> {
    if let Some(previous) = previous {
        if previous.offset == symbol.offset {
            return Err(Error::DuplicateOffset {
                offset: symbol.offset,
                first: previous.name.clone(),
                second: symbol.name.clone(),
            });
        }
    }
    if symbol.offset % slot_width != 0 {
        return Err(Error::MisalignedSlot { symbol: symbol.name.clone(), offset: symbol.offset, slot_width });
    }
    let expected = index.saturating_mul(slot_width);
    if symbol.offset != expected {
        return Err(Error::SlotGap { index, symbol: symbol.name.clone(), offset: symbol.offset, expected });
    }
    Ok(())
}

/// Builds `CommandTable`s from symbol records.
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    config: BuildConfig,
}

impl TableBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn build_from_dump(&self, text: &str) -> Result<CommandTable> {
        self.build(&parse_dump(text)?)
    }

    pub fn build_from_artifact(&self, data: &[u8]) -> Result<CommandTable> {
        self.build(&crate::artifact::parse_artifact(data)?)
    }

    /// Builds the table of the running binary's own region.
    pub fn build_from_region(&self, slots: &[Slot]) -> Result<CommandTable> {
        let builder = TableBuilder::new(BuildConfig { slot_width: cmdexport::SLOT_WIDTH as u64, ..self.config.clone() });
        builder.build(&region_records(slots, &self.config.start_marker))
    }

    /// Locates the region, orders the exports by address, checks the layout and translates
    /// every signature.
    ///
    /// # Errors
    /// `SymbolNotFound` without the start marker. `OutsideRegion`, `DuplicateOffset`,
    /// `MisalignedSlot` or `SlotGap` if the exports do not form a dense region. A signature
    /// that cannot be translated is not an error; its entry is marked rejected.
    pub fn build(&self, records: &[SymbolRecord]) -> Result<CommandTable> {
        let config = &self.config;
        if config.slot_width == 0 {
            return Err(Error::InvalidSlotWidth);
        }
        let start = records
            .iter()
            .find(|r| r.name == config.start_marker || r.mangled == config.start_marker)
            .map(|r| r.address)
            .ok_or_else(|| Error::SymbolNotFound(config.start_marker.clone()))?;

        let mut exports: Vec<&SymbolRecord> = records
            .iter()
            .filter(|r| r.name.starts_with(&config.prefix) && r.name != config.start_marker)
            .collect();
        exports.sort_by(|a, b| a.address.cmp(&b.address).then_with(|| a.name.cmp(&b.name)));
        // The same symbol listed twice (e.g. by two tables of one file) is one export.
        exports.dedup_by(|a, b| a.address == b.address && a.name == b.name);

        let mut entries: Vec<TableEntry> = Vec::with_capacity(exports.len());
        for (index, record) in exports.into_iter().enumerate() {
            let command_number = index as u64;
            let offset = record.address.checked_sub(start).ok_or_else(|| Error::OutsideRegion {
                symbol: record.name.clone(),
                address: record.address,
                start,
            })?;

            let tokens = split_signature(&record.name);
            let (return_token, param_tokens) = match &tokens {
                Ok(tokens) => (tokens.ret.clone(), tokens.params.clone()),
                Err(_) => (None, Vec::new()),
            };
            let symbol = ExportedSymbol {
                address: record.address,
                offset,
                name: record.name.clone(),
                mangled: record.mangled.clone(),
                return_token,
                param_tokens,
            };
            check_slot(config.slot_width, command_number, &symbol, entries.last().map(|e| &e.symbol))?;

            let status = match tokens.and_then(|tokens| translate_tokens(&tokens)) {
                Ok(signature) => {
                    tracing::debug!(command_number, %signature, "accepted export");
                    EntryStatus::Accepted { signature }
                }
                Err(error) => {
                    tracing::warn!(command_number, symbol = %record.name, %error, "rejected export");
                    EntryStatus::Rejected { error }
                }
            };
            entries.push(TableEntry { command_number, symbol, status });
        }

        tracing::info!(entries = entries.len(), region_start = start, "built command table");
        Ok(CommandTable {
            prefix: config.prefix.clone(),
            start_marker: config.start_marker.clone(),
            region_start: start,
            slot_width: config.slot_width,
            entries,
        })
    }
}
