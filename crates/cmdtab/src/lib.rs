//! # Cmdtab
//!
//! Offline analysis of a compiled artifact: finds the export region, orders its slots into a
//! `CommandTable`, and translates every export's signature into the neutral type model.
//!
//! ## Philosophy
//!
//! - **Layout is ground truth**: Command numbers come from addresses, never from source or
//!   declaration order. A region that is not dense and strictly ordered is refused outright.
//! - **Isolated rejection**: One untranslatable signature marks one entry rejected. It never
//!   fails the build, and it never renumbers its neighbours.
//! - **One builder, many sources**: A symbol dump, an object file and the live region all
//!   become `SymbolRecord`s first and go through the same checks.

pub mod artifact;
pub mod dump;
pub mod error;
pub mod region;
pub mod symbol;
pub mod table;
pub mod translate;


pub use artifact::parse_artifact;
pub use artifact::read_artifact;
pub use dump::parse_dump;
pub use error::Error;
pub use error::Result;
pub use region::region_records;
pub use symbol::ExportedSymbol;
pub use symbol::SymbolRecord;
pub use symbol::demangle;
pub use table::BuildConfig;
pub use table::CommandTable;
pub use table::EntryStatus;
pub use table::TableBuilder;
pub use table::TableEntry;
pub use translate::Param;
pub use translate::ParamToken;
pub use translate::Signature;
pub use translate::SignatureTokens;
pub use translate::TranslateError;
pub use translate::parse_type;
pub use translate::split_signature;
pub use translate::translate;
