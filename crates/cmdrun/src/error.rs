use std::time::Duration;

/// Errors that end a connection, or stop a registry from being built.
///
/// Faults inside an invoked function are not here: they become error frames and the
/// connection keeps serving.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("command {command_number} is out of range for a table of {len} entries")]
    OutOfRange { command_number: u64, len: usize },
    #[error("no complete request within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Wire(#[from] cmdpack::Error),
    #[error("table does not match the export region: {0}")]
    TableMismatch(String),
    #[error(transparent)]
    Table(#[from] cmdtab::Error),
    #[error("invocation task failed: {0}")]
    Join(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
