//! # Transport Abstraction
//!
//! A minimal, async interface for delivering one request frame and collecting its reply.
//!
//! ## Philosophy
//!
//! - **Frame-Oriented**: The transport moves an already encoded request and hands back the
//!   response frame. It knows nothing about bindings or signatures.
//! - **Request-Response**: One request, one response. The server answers in order, so a
//!   connection needs no correlation ids.

use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;

use cmdpack::CommandResponse;
use cmdpack::WireConfig;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    #[error(transparent)]
    Wire(#[from] cmdpack::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Sends one encoded request and waits for its response.
///
/// Object-safe, so clients hold an `Arc<dyn Transport>`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn call(&self, request: &[u8]) -> Result<CommandResponse>;
}

/// A transport over one byte stream, for example a `TcpStream` or a `tokio::io::duplex` half.
///
/// Calls are serialized on the stream. A call that does not finish (a read or write error, or
/// the caller dropping it on timeout) closes the stream, since its reply may still be in flight.
/// Every later call fails with `ConnectionLost`.
pub struct StreamTransport<S> {
    stream: Mutex<Option<S>>,
    wire: WireConfig,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: S, wire: WireConfig) -> Self {
        Self { stream: Mutex::new(Some(stream)), wire }
    }
}

#[async_trait::async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn call(&self, request: &[u8]) -> Result<CommandResponse> {
        let mut slot = self.stream.lock().await;
        // Out of the slot for the whole exchange; it only goes back once the reply is read.
        let mut stream = slot
            .take()
            .ok_or_else(|| TransportError::ConnectionLost("an earlier call did not complete".into()))?;
        cmdpack::write_frame(&mut stream, request).await?;
        let response = cmdpack::read_response(&mut stream, &self.wire).await?;
        *slot = Some(stream);
        Ok(response)
    }
}
