//! # Indexed Function Registry
//!
//! The one place that turns a command number into something callable.
//!
//! ## Invariants
//! - **Bound check first**: `resolve` rejects `command_number >= len` before computing any
//!   address, and the address computation itself is checked.
//! - **Verified once**: At construction every slot's signature is compared with the table
//!   entry at the same position. A registry that exists agrees with its table.
//! - **Unforgeable index**: `CommandIndex` can only come out of `resolve`.

use std::borrow::Cow;
use std::sync::Arc;

use cmdexport::Fault;
use cmdexport::SLOT_WIDTH;
use cmdexport::Slot;
use cmdpack::ArgFrame;
use cmdpack::WireConfig;
use cmdtab::CommandTable;
use cmdtab::TableEntry;

use crate::error::Error;
use crate::error::Result;

/// A resolved, in-bounds table position.
#[derive(Debug, Clone, Copy)]
pub struct CommandIndex {
    number: usize,
    address: usize,
    slot: Slot,
}

impl CommandIndex {
    pub fn command_number(&self) -> u64 {
        self.number as u64
    }

    /// In-memory address of the slot.
    pub fn address(&self) -> usize {
        self.address
    }
}

#[derive(Debug)]
pub struct Registry {
    table: Arc<CommandTable>,
    slots: Cow<'static, [Slot]>,
    base: usize,
}

impl Registry {
    /// Pairs `table` with `slots`, which must hold exactly the table's exports in table order.
    ///
    /// # Errors
    /// `TableMismatch` if the slot width, the count, or any signature disagrees.
    pub fn new(table: Arc<CommandTable>, slots: impl Into<Cow<'static, [Slot]>>) -> Result<Self> {
        let slots = slots.into();
        if table.slot_width != SLOT_WIDTH as u64 {
            return Err(Error::TableMismatch(format!(
                "table slot width is {}, this build uses {}",
                table.slot_width, SLOT_WIDTH
            )));
        }
        if slots.len() != table.len() {
            return Err(Error::TableMismatch(format!(
                "table has {} entries, region has {} slots",
                table.len(),
                slots.len()
            )));
        }
        for (entry, slot) in table.entries.iter().zip(slots.iter()) {
            if slot.signature() != entry.symbol.name {
                return Err(Error::TableMismatch(format!(
                    "entry {} is `{}` in the table but `{}` in the region",
                    entry.command_number,
                    entry.symbol.name,
                    slot.signature()
                )));
            }
        }

        let base = slots.as_ptr() as usize;
        tracing::debug!(entries = slots.len(), "registry verified");
        Ok(Self { table, slots, base })
    }

    /// The registry for this binary's own export region.
    pub fn from_region(table: Arc<CommandTable>) -> Result<Self> {
        Self::new(table, cmdexport::region())
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bound-checks `command_number`, then locates its slot.
    ///
    /// # Errors
    /// `OutOfRange` if `command_number >= len`.
    pub fn resolve(&self, command_number: u64) -> Result<CommandIndex> {
        let len = self.slots.len();
        let out_of_range = || Error::OutOfRange { command_number, len };
        let number = usize::try_from(command_number)
            .ok()
            .filter(|n| *n < len)
            .ok_or_else(out_of_range)?;
        let address = number
            .checked_mul(SLOT_WIDTH)
            .and_then(|offset| self.base.checked_add(offset))
            .ok_or_else(out_of_range)?;
        Ok(CommandIndex { number, address, slot: self.slots[number] })
    }

    /// The table entry behind a resolved index.
    pub fn entry(&self, index: &CommandIndex) -> &TableEntry {
        // Lengths were checked equal at construction.
        &self.table.entries[index.number]
    }

    pub fn invoke(&self, index: CommandIndex, wire: &WireConfig, args: &[ArgFrame]) -> std::result::Result<Vec<u8>, Fault> {
        invoke(index, wire, args)
    }
}

/// Calls a resolved slot. Free of the registry so it can run on a blocking thread.
pub(crate) fn invoke(index: CommandIndex, wire: &WireConfig, args: &[ArgFrame]) -> std::result::Result<Vec<u8>, Fault> {
    (index.slot.export().invoke)(wire, args)
}
