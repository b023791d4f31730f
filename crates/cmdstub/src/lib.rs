//! # Cmdstub
//!
//! The caller side of a command table.
//!
//! ## Philosophy
//!
//! - **Resolved at generation time**: Every binding carries its command number and the
//!   descriptors recorded at build time. Nothing is inspected at call time.
//! - **Deterministic output**: The same accepted table and wire config always render the
//!   same source, so generated files diff cleanly under version control.
//! - **Rejections are reported, not hidden**: Entries the translator refused never get a
//!   binding, and `render_rejections` says which and why.

pub mod binding;
pub mod client;
pub mod error;
pub mod python;
pub mod transport;

#[cfg(test)]
mod mock_transport;
#[cfg(test)]
mod tests;

pub use binding::Binding;
pub use binding::generate;
pub use client::Client;
pub use error::Error;
pub use error::RemoteError;
pub use error::Result;
pub use python::render_python;
pub use python::render_rejections;
pub use transport::StreamTransport;
pub use transport::Transport;
pub use transport::TransportError;
