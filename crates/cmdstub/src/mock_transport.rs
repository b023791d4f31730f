//! Mock transports for testing.

use cmdpack::CommandResponse;

use crate::transport;
use crate::transport::Transport;

/// Answers every request through a closure, without any stream.
pub struct CallTransport<F>
where
    F: Fn(&[u8]) -> transport::Result<CommandResponse> + Send + Sync + 'static,
{
    handler: F,
}

impl<F> CallTransport<F>
where
    F: Fn(&[u8]) -> transport::Result<CommandResponse> + Send + Sync + 'static,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait::async_trait]
impl<F> Transport for CallTransport<F>
where
    F: Fn(&[u8]) -> transport::Result<CommandResponse> + Send + Sync + 'static,
{
    async fn call(&self, request: &[u8]) -> transport::Result<CommandResponse> {
        (self.handler)(request)
    }
}

/// A transport that never answers.
pub struct SilentTransport;

#[async_trait::async_trait]
impl Transport for SilentTransport {
    async fn call(&self, _request: &[u8]) -> transport::Result<CommandResponse> {
        std::future::pending().await
    }
}
