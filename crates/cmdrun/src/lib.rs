//! # Cmdrun
//!
//! The serving side of a command table.
//!
//! ## Philosophy
//!
//! - **Index, then call**: A command number is bound-checked against the table, turned into
//!   a slot address (`region_start + n * slot_width`), and the slot is called. There is no
//!   name lookup and no reflection at request time.
//! - **Trust is established once**: `Registry::new` compares every slot's signature with the
//!   loaded table. After that the hot path only checks bounds.
//! - **Connections are cheap and isolated**: Each connection runs its own sequential loop.
//!   Invoked functions run on the blocking pool so a slow call never stalls the accept loop.

pub mod engine;
pub mod error;
pub mod registry;
pub mod server;


pub use engine::Engine;
pub use engine::EngineConfig;
pub use engine::State;
pub use error::Error;
pub use error::Result;
pub use registry::CommandIndex;
pub use registry::Registry;
pub use server::Server;
