//! Symbol records for the export region of the running binary.
//!
//! Produces the same records a symbol table would list for the region, so a server started
//! without a table file builds and validates its table through the same path as the generator.

use cmdexport::Slot;

use crate::symbol::SymbolRecord;

/// One record for the start marker, one per slot at its in-memory address.
pub fn region_records(slots: &[Slot], start_marker: &str) -> Vec<SymbolRecord> {
    let mut records = Vec::with_capacity(slots.len() + 1);
    records.push(SymbolRecord::new(slots.as_ptr() as u64, 'D', start_marker));
    for slot in slots {
        let address = slot as *const Slot as u64;
        records.push(SymbolRecord::new(address, 'D', slot.signature()));
    }
    records
}
