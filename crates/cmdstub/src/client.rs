//! # Client
//!
//! Invokes bindings over a `Transport`: encodes the request, waits for the single response
//! within a deadline, and decodes it against the binding's return type.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::net::ToSocketAddrs;

use cmdpack::Value;
use cmdpack::WireConfig;

use crate::binding::Binding;
use crate::error::Error;
use crate::error::Result;
use crate::transport::StreamTransport;
use crate::transport::Transport;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    wire: WireConfig,
    timeout: Duration,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>, wire: WireConfig) -> Self {
        Self { transport, wire, timeout: DEFAULT_TIMEOUT }
    }

    /// Opens a TCP connection to a server speaking `wire`.
    pub async fn connect(addr: impl ToSocketAddrs, wire: WireConfig) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(cmdpack::Error::from)?;
        let transport = StreamTransport::new(stream, wire.clone());
        Ok(Self::new(Arc::new(transport), wire))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn wire(&self) -> &WireConfig {
        &self.wire
    }

    pub async fn call(&self, binding: &Binding, args: &[Value]) -> Result<Value> {
        let request = binding.encode_request(&self.wire, args)?.encode(&self.wire)?;
        tracing::debug!(binding = %binding.name, command_number = binding.command_number, "calling");

        let response = tokio::time::timeout(self.timeout, self.transport.call(&request))
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;
        binding.decode_response(&self.wire, response)
    }
}
