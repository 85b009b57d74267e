//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The accept loop: one task per incoming call.

use crate::channel::{CallId, Message, StreamReceiver, StreamSender};
use crate::config::{ConfigError, ServerConfig};
use crate::context::{CancelSignal, Deadline};
use crate::dispatch::{Dispatcher, MethodDescriptor};
use crate::error::ErrorOrigin;
use crate::observability::{CallMetrics, log_status};
use crate::status::Code;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info};

/// One call as it arrives at the server.
///
/// The caller creates both directions; the server reads `inbound` and
/// writes `outbound`.
#[derive(Debug)]
pub struct IncomingCall<M: Message> {
    /// Identifies the call in logs on both sides.
    pub call_id: CallId,
    /// Method name and the shape the caller used.
    pub method: MethodDescriptor,
    /// Absolute deadline computed by the caller, if any.
    pub deadline: Option<Deadline>,
    /// Fires when the caller goes away.
    pub cancel: CancelSignal,
    /// Caller to handler.
    pub inbound: StreamReceiver<M>,
    /// Handler to caller.
    pub outbound: StreamSender<M>,
}

/// Serves calls for one [`Dispatcher`].
///
/// # Example
///
/// ```rust,no_run
/// use quadrpc::server::Server;
/// use quadrpc::services::greet::{GreetService, greet_dispatcher};
/// use std::sync::Arc;
///
/// let server = Server::new(greet_dispatcher(Arc::new(GreetService::default())));
/// assert_eq!(server.metrics().total_calls_started(), 0);
/// ```
pub struct Server<M: Message> {
    dispatcher: Arc<Dispatcher<M>>,
    config: ServerConfig,
    metrics: Arc<CallMetrics>,
    limiter: Option<Arc<Semaphore>>,
}

impl<M: Message> std::fmt::Debug for Server<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .finish()
    }
}

impl<M: Message> Server<M> {
    /// Creates a server with the default configuration.
    #[must_use]
    pub fn new(dispatcher: Dispatcher<M>) -> Self {
        Self::build(dispatcher, ServerConfig::default())
    }

    /// Creates a server with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid.
    pub fn with_config(dispatcher: Dispatcher<M>, config: ServerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(dispatcher, config))
    }

    fn build(dispatcher: Dispatcher<M>, config: ServerConfig) -> Self {
        let limiter = config
            .max_concurrent_calls
            .map(|max| Arc::new(Semaphore::new(max)));
        Self {
            dispatcher: Arc::new(dispatcher),
            config,
            metrics: Arc::new(CallMetrics::new()),
            limiter,
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the handler-side metrics.
    #[must_use]
    pub const fn metrics(&self) -> &Arc<CallMetrics> {
        &self.metrics
    }

    /// Starts the accept loop on `calls`.
    ///
    /// The loop ends when every sender of `calls` is dropped or
    /// [`ServerHandle::shutdown`] is called. Calls already accepted run to
    /// completion either way.
    pub fn serve(self, mut calls: mpsc::Receiver<IncomingCall<M>>) -> ServerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let metrics = Arc::clone(&self.metrics);

        let task = tokio::spawn(async move {
            let mut in_flight = JoinSet::new();
            info!(methods = self.dispatcher.methods().count(), "server accepting calls");

            loop {
                tokio::select! {
                    Ok(()) = shutdown_rx.changed() => {
                        debug!("shutdown requested");
                        break;
                    }
                    call = calls.recv() => match call {
                        Some(call) => {
                            in_flight.spawn(run_call(
                                Arc::clone(&self.dispatcher),
                                Arc::clone(&self.metrics),
                                self.limiter.clone(),
                                call,
                            ));
                        }
                        None => {
                            debug!("connection closed");
                            break;
                        }
                    },
                    Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(join_error) = joined {
                            error!(error = %join_error, "call task failed");
                        }
                    }
                }
            }

            while let Some(joined) = in_flight.join_next().await {
                if let Err(join_error) = joined {
                    error!(error = %join_error, "call task failed");
                }
            }
            info!("server stopped");
        });

        ServerHandle {
            shutdown: shutdown_tx,
            task,
            metrics,
        }
    }
}

async fn run_call<M: Message>(
    dispatcher: Arc<Dispatcher<M>>,
    metrics: Arc<CallMetrics>,
    limiter: Option<Arc<Semaphore>>,
    call: IncomingCall<M>,
) {
    let call_id = call.call_id;
    let method = call.method;

    // Held until the call finishes.
    let _permit = match limiter {
        Some(limiter) => limiter.acquire_owned().await.ok(),
        None => None,
    };

    metrics.record_call_started();
    let started = Instant::now();
    info!(%call_id, method = method.name, shape = %method.shape, "call accepted");

    let outcome = dispatcher.handle(call).await;
    let code = outcome.as_ref().map_or_else(|status| status.code(), |_| Code::Ok);
    metrics.record_call_finished(code, started.elapsed());

    match &outcome {
        Ok(()) => info!(
            %call_id,
            method = method.name,
            origin = ErrorOrigin::Handler.as_str(),
            elapsed_ms = started.elapsed().as_millis(),
            "call completed"
        ),
        Err(status) => log_status(call_id, method.name, ErrorOrigin::Handler, status),
    }
}

/// Controls a running accept loop.
#[derive(Debug)]
pub struct ServerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    metrics: Arc<CallMetrics>,
}

impl ServerHandle {
    /// Returns the handler-side metrics.
    #[must_use]
    pub const fn metrics(&self) -> &Arc<CallMetrics> {
        &self.metrics
    }

    /// Returns `true` once the accept loop and every accepted call ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops accepting calls and waits for accepted calls to finish.
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        self.join().await;
    }

    /// Waits for the accept loop to end on its own.
    pub async fn join(self) {
        if let Err(join_error) = self.task.await {
            error!(error = %join_error, "server task failed");
        }
    }
}
