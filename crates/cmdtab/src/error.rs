/// Failures that stop a table from being built or loaded.
///
/// Per-symbol translation problems are not here: they are recorded on the entry as a
/// `TranslateError` and the build continues.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("start marker `{0}` not found in the symbol table")]
    SymbolNotFound(String),
    #[error("`{first}` and `{second}` resolve to the same offset {offset:#x}")]
    DuplicateOffset { offset: u64, first: String, second: String },
    #[error("`{symbol}` at {address:#x} lies before the region start {start:#x}")]
    OutsideRegion { symbol: String, address: u64, start: u64 },
    #[error("`{symbol}` at offset {offset:#x} is not a multiple of the slot width {slot_width}")]
    MisalignedSlot { symbol: String, offset: u64, slot_width: u64 },
    #[error("entry {index} (`{symbol}`) sits at offset {offset:#x}, expected {expected:#x}")]
    SlotGap { index: u64, symbol: String, offset: u64, expected: u64 },
    #[error("slot width must be non-zero")]
    InvalidSlotWidth,
    #[error("line {line}: {reason}")]
    MalformedDumpLine { line: usize, reason: String },
    #[error("table entry {index} has command number {found}")]
    Renumbered { index: u64, found: u64 },
    #[error("cannot read object file: {0}")]
    Object(#[from] object::read::Error),
    #[error("table file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
