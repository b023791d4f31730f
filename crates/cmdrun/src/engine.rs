//! # Dispatch Engine
//!
//! One sequential request/response loop per connection:
//! `Idle → Receiving → Resolving → Invoking → Responding → Idle`.
//!
//! ## Invariants
//! - **Complete frames only**: Nothing is resolved or invoked until a whole request has been
//!   read. End-of-stream inside a frame ends the connection with `TruncatedFrame`.
//! - **Nothing invoked out of range**: An out-of-range command number gets an `OutOfRange`
//!   error frame and the connection is closed.
//! - **Faults stay in the frame**: An invoked function that returns `Err` or panics produces
//!   an `Application` error frame; the connection keeps serving.
//! - **No per-connection state**: Requests share nothing but the immutable registry.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;

use cmdpack::CommandRequest;
use cmdpack::CommandResponse;
use cmdpack::ErrorCode;
use cmdpack::WireConfig;

use crate::error::Error;
use crate::error::Result;
use crate::registry::Registry;
use crate::registry::invoke;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub wire: WireConfig,
    /// How long Receiving waits for one complete request.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { wire: WireConfig::default(), request_timeout: Duration::from_secs(30) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Receiving,
    Resolving,
    Invoking,
    Responding,
}

/// Serves connections against one shared registry. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    config: Arc<EngineConfig>,
}

impl Engine {
    pub fn new(registry: Arc<Registry>, config: EngineConfig) -> Self {
        Self { registry, config: Arc::new(config) }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the request loop until the peer closes the stream or a connection error occurs.
    ///
    /// # Errors
    /// `Timeout`, `Wire` (including `TruncatedFrame`) and `OutOfRange` end the connection.
    /// A clean close between requests is `Ok(())`.
    pub async fn serve<S>(&self, mut stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let wire = &self.config.wire;
        loop {
            transition(State::Idle);
            transition(State::Receiving);
            let read = cmdpack::read_request(&mut stream, wire);
            let request = match tokio::time::timeout(self.config.request_timeout, read).await {
                Err(_) => return Err(Error::Timeout(self.config.request_timeout)),
                Ok(Ok(None)) => {
                    tracing::debug!("peer closed the connection");
                    return Ok(());
                }
                Ok(Ok(Some(request))) => request,
                Ok(Err(e)) => return Err(e.into()),
            };

            match self.dispatch(request).await {
                Ok(response) => self.respond(&mut stream, &response).await?,
                Err(err @ Error::OutOfRange { .. }) => {
                    let response = CommandResponse::error(ErrorCode::OutOfRange, err.to_string());
                    self.respond(&mut stream, &response).await?;
                    return Err(err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Resolves and invokes one request.
    ///
    /// # Errors
    /// `OutOfRange` for a command number past the table. Every per-call problem (rejected
    /// entry, wrong arity, bad argument, application fault, panic) is an `Ok` error frame.
    pub async fn dispatch(&self, request: CommandRequest) -> Result<CommandResponse> {
        transition(State::Resolving);
        let index = self.registry.resolve(request.command_number)?;
        let entry = self.registry.entry(&index);

        let Some(signature) = entry.signature() else {
            let reason = entry.rejection().map(ToString::to_string).unwrap_or_default();
            return Ok(CommandResponse::error(
                ErrorCode::Unsupported,
                format!("`{}` is not callable: {}", entry.symbol.name, reason),
            ));
        };
        if request.args.len() != signature.arity() {
            return Ok(CommandResponse::error(
                ErrorCode::BadArgumentCount,
                format!("`{}` takes {} arguments, {} given", signature.name, signature.arity(), request.args.len()),
            ));
        }

        transition(State::Invoking);
        tracing::debug!(
            command_number = index.command_number(),
            address = index.address(),
            signature = %signature,
            "invoking"
        );
        let wire = self.config.wire.clone();
        let args = request.args;
        let outcome = tokio::task::spawn_blocking(move || {
            std::panic::catch_unwind(AssertUnwindSafe(|| invoke(index, &wire, &args)))
        })
        .await
        .map_err(|e| Error::Join(e.to_string()))?;

        let response = match outcome {
            Ok(Ok(bytes)) => CommandResponse::value(bytes),
            Ok(Err(fault)) => {
                tracing::debug!(command_number = index.command_number(), %fault, "invocation fault");
                CommandResponse::error(fault.code(), fault.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::warn!(command_number = index.command_number(), %message, "invoked function panicked");
                CommandResponse::error(ErrorCode::Application, format!("panicked: {message}"))
            }
        };
        Ok(response)
    }

    async fn respond<S>(&self, stream: &mut S, response: &CommandResponse) -> Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        transition(State::Responding);
        let wire = &self.config.wire;
        let bytes = match response.encode(wire) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "cannot encode response");
                CommandResponse::error(ErrorCode::Internal, e.to_string()).encode(wire)?
            }
        };
        cmdpack::write_frame(stream, &bytes).await?;
        Ok(())
    }
}

fn transition(state: State) {
    tracing::debug!(?state, "engine state");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
