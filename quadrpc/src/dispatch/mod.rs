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

//! Method routing for incoming calls.
//!
//! A [`Dispatcher`] maps a fully qualified method name to a handler of one
//! of the four call shapes. For every incoming call it builds the
//! call-scoped [`CallContext`], runs the handler, and finishes the outbound
//! direction with either a clean end or an error trailer.
//!
//! # Example
//!
//! ```rust
//! use quadrpc::dispatch::{CallShape, Dispatcher};
//! use quadrpc::channel::Message;
//! use quadrpc::Status;
//!
//! #[derive(Debug, Clone)]
//! enum Echo { Request(String), Response(String) }
//!
//! impl Message for Echo {
//!     fn method_name(&self) -> &'static str { "echo.Echo/Say" }
//!     fn is_request(&self) -> bool { matches!(self, Self::Request(_)) }
//! }
//!
//! let dispatcher = Dispatcher::<Echo>::builder()
//!     .unary("echo.Echo/Say", |_ctx, request| async move {
//!         match request {
//!             Echo::Request(text) => Ok(Echo::Response(text)),
//!             other => Err(Status::invalid_argument(format!("unexpected {other:?}"))),
//!         }
//!     })
//!     .build();
//!
//! let method = dispatcher.descriptor("echo.Echo/Say").unwrap();
//! assert_eq!(method.shape, CallShape::Unary);
//! ```

mod handler;


use crate::channel::{Message, StreamReceiver, StreamSender};
use crate::context::CallContext;
use crate::server::IncomingCall;
use crate::status::Status;
use futures_util::future::BoxFuture;
use handler::MethodHandler;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use tracing::{debug, error, instrument, warn};

/// The four RPC interaction shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallShape {
    /// One request, one response.
    Unary,
    /// One request, a stream of responses.
    ServerStreaming,
    /// A stream of requests, one response.
    ClientStreaming,
    /// A stream of requests and a stream of responses.
    Bidirectional,
}

impl CallShape {
    /// Returns `true` if the caller sends more than one message.
    #[must_use]
    pub const fn client_streams(self) -> bool {
        matches!(self, Self::ClientStreaming | Self::Bidirectional)
    }

    /// Returns `true` if the handler sends more than one message.
    #[must_use]
    pub const fn server_streams(self) -> bool {
        matches!(self, Self::ServerStreaming | Self::Bidirectional)
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unary => "unary",
            Self::ServerStreaming => "server-streaming",
            Self::ClientStreaming => "client-streaming",
            Self::Bidirectional => "bidirectional",
        };
        f.write_str(name)
    }
}

/// Identity of a method: its fully qualified name and its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MethodDescriptor {
    /// Fully qualified name, e.g. `greet.GreetService/Greet`.
    pub name: &'static str,
    /// The interaction shape.
    pub shape: CallShape,
}

impl MethodDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub const fn new(name: &'static str, shape: CallShape) -> Self {
        Self { name, shape }
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.shape)
    }
}

/// Routes incoming calls to registered handlers.
pub struct Dispatcher<M: Message> {
    methods: HashMap<&'static str, MethodHandler<M>>,
}

impl<M: Message> fmt::Debug for Dispatcher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<M: Message> Dispatcher<M> {
    /// Starts building a dispatcher.
    #[must_use]
    pub fn builder() -> DispatcherBuilder<M> {
        DispatcherBuilder {
            methods: HashMap::new(),
        }
    }

    /// Returns the descriptor of a registered method.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<MethodDescriptor> {
        self.methods
            .get_key_value(name)
            .map(|(name, handler)| MethodDescriptor::new(*name, handler.shape()))
    }

    /// Returns every registered method.
    pub fn methods(&self) -> impl Iterator<Item = MethodDescriptor> + '_ {
        self.methods
            .iter()
            .map(|(name, handler)| MethodDescriptor::new(*name, handler.shape()))
    }

    /// Runs one call to completion.
    ///
    /// The outbound direction always ends with exactly one terminal signal.
    /// The returned result is the call's final outcome.
    ///
    /// # Errors
    ///
    /// - `UNIMPLEMENTED` for an unknown method or a shape mismatch.
    /// - `INVALID_ARGUMENT` when a single-request call has no request, or
    ///   the request belongs to another method.
    /// - `DEADLINE_EXCEEDED` or `CANCELLED` when a check failed.
    /// - Whatever status the handler returned.
    #[instrument(skip_all, fields(call_id = %call.call_id, method = call.method.name))]
    pub async fn handle(&self, call: IncomingCall<M>) -> Result<(), Status> {
        let IncomingCall {
            call_id,
            method,
            deadline,
            cancel,
            mut inbound,
            outbound,
        } = call;

        let closer = outbound.closer();
        let mut outbound = Some(outbound);
        let ctx = CallContext::new(call_id, method.name, deadline, cancel);

        let outcome = match self.methods.get(method.name) {
            None => Err(Status::unimplemented(format!(
                "unknown method {}",
                method.name
            ))),
            Some(handler) if handler.shape() != method.shape => Err(Status::unimplemented(
                format!(
                    "{} is {} but was called as {}",
                    method.name,
                    handler.shape(),
                    method.shape
                ),
            )),
            Some(MethodHandler::Unary(f)) => match first_request(&mut inbound, method.name).await {
                Ok(request) => run(&ctx, f(ctx.clone(), request)).await.map(Some),
                Err(status) => Err(status),
            },
            Some(MethodHandler::ServerStreaming(f)) => {
                match (first_request(&mut inbound, method.name).await, outbound.take()) {
                    (Ok(request), Some(sender)) => {
                        run(&ctx, f(ctx.clone(), request, sender)).await.map(|()| None)
                    }
                    (Err(status), _) => Err(status),
                    (Ok(_), None) => Err(sender_consumed()),
                }
            }
            Some(MethodHandler::ClientStreaming(f)) => run(&ctx, f(ctx.clone(), inbound)).await.map(Some),
            Some(MethodHandler::Bidirectional(f)) => match outbound.take() {
                Some(sender) => run(&ctx, f(ctx.clone(), inbound, sender)).await.map(|()| None),
                None => Err(sender_consumed()),
            },
        };

        // A result that arrives after a failed check does not count.
        let outcome = outcome.and_then(|response| ctx.complete().map(|()| response));

        let outcome = match outcome {
            Ok(Some(response)) => match outbound.take() {
                Some(mut sender) => sender.send(response).await.map_err(Status::from),
                None => Err(sender_consumed()),
            },
            Ok(None) => Ok(()),
            Err(status) => Err(status),
        };

        let finished = match &outcome {
            Ok(()) => closer.close().await,
            Err(status) => closer.abort(status.clone()).await,
        };
        if let Err(error) = finished {
            // The handler finished the direction itself, or the caller left.
            debug!(%error, "outbound direction not finished by dispatcher");
        }

        outcome
    }
}

async fn first_request<M: Message>(
    inbound: &mut StreamReceiver<M>,
    method: &'static str,
) -> Result<M, Status> {
    match inbound.recv().await? {
        Some(request) if request.is_request() && request.method_name() == method => Ok(request),
        Some(other) => {
            warn!(received = other.method_name(), "request does not belong to method");
            Err(Status::invalid_argument(format!(
                "{method} cannot accept {} message",
                other.method_name()
            )))
        }
        None => Err(Status::invalid_argument(format!(
            "{method} requires a request but the stream ended"
        ))),
    }
}

/// Runs a handler future on its own task so a panic becomes `INTERNAL`
/// instead of an abandoned call.
///
/// A handler still running when the deadline passes or the caller goes away
/// is aborted, and the call ends with the context's terminal status.
async fn run<T: Send + 'static>(
    ctx: &CallContext,
    future: BoxFuture<'static, Result<T, Status>>,
) -> Result<T, Status> {
    let mut task = tokio::spawn(future);
    tokio::select! {
        biased;
        joined = &mut task => joined.unwrap_or_else(|join_error| {
            error!(error = %join_error, "handler task failed");
            Err(Status::internal(format!("handler failed: {join_error}")))
        }),
        status = ctx.done() => {
            task.abort();
            warn!(code = %status.code(), "handler still running after the call ended, aborted");
            Err(status)
        }
    }
}

fn sender_consumed() -> Status {
    Status::internal("outbound sender already consumed")
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder<M: Message> {
    methods: HashMap<&'static str, MethodHandler<M>>,
}

impl<M: Message> DispatcherBuilder<M> {
    fn register(mut self, name: &'static str, handler: MethodHandler<M>) -> Self {
        if self.methods.insert(name, handler).is_some() {
            warn!(method = name, "replacing previously registered handler");
        }
        self
    }

    /// Registers a unary handler.
    #[must_use]
    pub fn unary<F, Fut>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(CallContext, M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M, Status>> + Send + 'static,
    {
        self.register(
            name,
            MethodHandler::Unary(Box::new(move |ctx, request| Box::pin(f(ctx, request)))),
        )
    }

    /// Registers a server-streaming handler.
    ///
    /// The handler owns the outbound sender. Returning `Ok(())` ends the
    /// stream cleanly; returning an error ends it with that trailer.
    #[must_use]
    pub fn server_streaming<F, Fut>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(CallContext, M, StreamSender<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Status>> + Send + 'static,
    {
        self.register(
            name,
            MethodHandler::ServerStreaming(Box::new(move |ctx, request, sender| {
                Box::pin(f(ctx, request, sender))
            })),
        )
    }

    /// Registers a client-streaming handler.
    #[must_use]
    pub fn client_streaming<F, Fut>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(CallContext, StreamReceiver<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M, Status>> + Send + 'static,
    {
        self.register(
            name,
            MethodHandler::ClientStreaming(Box::new(move |ctx, requests| {
                Box::pin(f(ctx, requests))
            })),
        )
    }

    /// Registers a bidirectional-streaming handler.
    #[must_use]
    pub fn bidi_streaming<F, Fut>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(CallContext, StreamReceiver<M>, StreamSender<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Status>> + Send + 'static,
    {
        self.register(
            name,
            MethodHandler::Bidirectional(Box::new(move |ctx, requests, sender| {
                Box::pin(f(ctx, requests, sender))
            })),
        )
    }

    /// Finishes the dispatcher.
    #[must_use]
    pub fn build(self) -> Dispatcher<M> {
        debug!(methods = self.methods.len(), "dispatcher built");
        Dispatcher {
            methods: self.methods,
        }
    }
}
