//! # Cmdexport
//!
//! Compile-time marking of functions that a remote caller may invoke by number.
//!
//! ## Philosophy
//!
//! - **Placed, not registered**: `#[export]` adds one pointer-sized `Slot` to the linker
//!   section behind `COMMANDS`. There is no hand-maintained list mapping numbers to functions;
//!   the section start plus an index is the whole addressing scheme.
//! - **Self-describing symbols**: Every slot is emitted under a symbol named after its
//!   signature (`ex_add(a: i32, b: i32) -> i32`), so the artifact's own symbol table is the
//!   interface description.
//! - **Ordering is observed, not promised**: Nothing here assumes slots land in declaration
//!   order. The table builder sorts by address and the registry checks every slot against
//!   the table before serving.
//!
//! ## Example
//!
//! ```ignore
//! #[cmdexport::export]
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//! ```

extern crate self as cmdexport;

mod native;
#[doc(hidden)]
pub mod shim;

#[cfg(test)]
mod tests;

use std::fmt;

pub use cmdexport_macros::export;
pub use cmdpack;
pub use linkme;
pub use native::NativeType;

use cmdpack::ArgFrame;
use cmdpack::ErrorCode;
use cmdpack::WireConfig;

/// Name prefix `#[export]` gives a symbol unless told otherwise.
pub const DEFAULT_PREFIX: &str = "ex_";

/// Byte width of one region entry.
pub const SLOT_WIDTH: usize = std::mem::size_of::<Slot>();

/// Decodes the argument frames, calls the function, encodes its return value.
pub type Invoker = fn(&WireConfig, &[ArgFrame]) -> Result<Vec<u8>, Fault>;

/// What a slot points at: the signature it was exported under and the call shim.
#[derive(Debug)]
pub struct Export {
    pub signature: &'static str,
    pub invoke: Invoker,
}

/// One entry of the export region. Exactly one function pointer wide.
#[repr(transparent)]
#[derive(Clone, Copy)]
pub struct Slot(pub fn() -> &'static Export);

impl Slot {
    pub fn export(&self) -> &'static Export {
        (self.0)()
    }

    pub fn signature(&self) -> &'static str {
        self.export().signature
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&self.signature()).finish()
    }
}

/// The export region. The linker emits `__start_linkme_COMMANDS` at its first byte.
#[linkme::distributed_slice]
pub static COMMANDS: [Slot] = [..];

/// The live export region of this binary, in memory order.
pub fn region() -> &'static [Slot] {
    &COMMANDS
}

/// A failure inside one invocation. None of these end the connection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Fault {
    /// The function returned `Err`, or panicked.
    #[error("{0}")]
    Application(String),
    #[error("expected {expected} arguments, found {found}")]
    BadArgumentCount { expected: usize, found: usize },
    #[error("argument {index}: {error}")]
    BadArgument { index: usize, error: cmdpack::Error },
    #[error("cannot encode return value: {0}")]
    Encode(cmdpack::Error),
}

impl Fault {
    /// The code this fault is reported under on the wire.
    pub fn code(&self) -> ErrorCode {
        match self {
            Fault::Application(_) => ErrorCode::Application,
            Fault::BadArgumentCount { .. } => ErrorCode::BadArgumentCount,
            Fault::BadArgument { .. } => ErrorCode::BadArgument,
            Fault::Encode(_) => ErrorCode::Internal,
        }
    }
}
