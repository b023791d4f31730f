//! # TCP Server
//!
//! Accepts connections and hands each one to its own task running `Engine::serve`.
//! A failed connection is logged and dropped; the listener keeps accepting.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::net::ToSocketAddrs;
use tracing::Instrument;

use crate::engine::Engine;
use crate::error::Result;

pub struct Server {
    listener: TcpListener,
    engine: Engine,
}

impl Server {
    pub async fn bind(addr: impl ToSocketAddrs, engine: Engine) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, engine })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts forever.
    pub async fn run(self) -> Result<()> {
        tracing::info!(addr = ?self.listener.local_addr().ok(), entries = self.engine.registry().len(), "serving");
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            };

            let engine = self.engine.clone();
            let span = tracing::info_span!("connection", %peer);
            tokio::spawn(
                async move {
                    tracing::debug!("accepted");
                    match engine.serve(stream).await {
                        Ok(()) => tracing::debug!("closed"),
                        Err(e) => tracing::error!(error = %e, "connection ended"),
                    }
                }
                .instrument(span),
            );
        }
    }
}
