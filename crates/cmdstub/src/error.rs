use std::time::Duration;

use cmdpack::ErrorCode;

use crate::transport::TransportError;

/// An error frame returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("remote error {code:?}: {message}")]
pub struct RemoteError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{name}` takes {expected} arguments, {found} given")]
    ArgumentCount { name: String, expected: usize, found: usize },
    #[error("argument {index} of `{name}`: {source}")]
    Argument {
        name: String,
        index: usize,
        #[source]
        source: cmdpack::Error,
    },
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Wire(#[from] cmdpack::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
