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

//! The caller side of a connection.
//!
//! A [`Client`] issues calls of all four shapes. Each call computes its
//! absolute deadline once, from [`CallOptions::with_timeout`] or the
//! client's default, and the caller tears down its own view when that
//! deadline passes, whatever the handler is doing. A local deadline is
//! reported as [`QuadrpcError::Timeout`], which is distinct from a handler
//! reporting `DEADLINE_EXCEEDED`.
//!
//! Dropping a [`ResponseStream`] (or a call handle that owns one) before the
//! call finished cancels the call on the handler side.

use crate::backpressure::BackpressurePolicy;
use crate::channel::{CallId, Channel, ChannelError, Message, StreamReceiver, StreamSender};
use crate::config::ClientConfig;
use crate::context::{CancelGuard, Deadline};
use crate::dispatch::{CallShape, MethodDescriptor};
use crate::error::QuadrpcError;
use crate::observability::{CallMetrics, log_error};
use crate::server::IncomingCall;
use crate::status::{Code, Status};
use futures_util::Stream;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Per-call options.
///
/// # Examples
///
/// ```rust
/// use quadrpc::client::CallOptions;
/// use std::time::Duration;
///
/// let options = CallOptions::new().with_timeout(Duration::from_secs(5));
/// assert_eq!(options.timeout(), Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    timeout: Option<Duration>,
}

impl CallOptions {
    /// Creates options that use the client defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Bounds the call by `timeout`, measured from the moment it starts.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the timeout, if one was set.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[derive(Debug, Clone, Copy)]
struct CallInfo {
    call_id: CallId,
    method: &'static str,
    deadline: Option<Deadline>,
    timeout: Option<Duration>,
}

impl CallInfo {
    async fn within<T, F>(&self, future: F) -> Result<T, QuadrpcError>
    where
        F: Future<Output = Result<T, QuadrpcError>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline.instant(), future)
                .await
                .unwrap_or_else(|_elapsed| Err(self.timed_out())),
            None => future.await,
        }
    }

    fn timed_out(&self) -> QuadrpcError {
        QuadrpcError::Timeout {
            call_id: self.call_id,
            method: self.method,
            timeout: self.timeout.unwrap_or_default(),
        }
    }
}

/// Issues calls over one connection.
///
/// Cheap to clone; clones share the connection and the metrics.
pub struct Client<M: Message> {
    calls: mpsc::Sender<IncomingCall<M>>,
    config: Arc<ClientConfig>,
    response_policy: BackpressurePolicy,
    metrics: Arc<CallMetrics>,
}

impl<M: Message> Clone for Client<M> {
    fn clone(&self) -> Self {
        Self {
            calls: self.calls.clone(),
            config: Arc::clone(&self.config),
            response_policy: self.response_policy,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<M: Message> std::fmt::Debug for Client<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("response_policy", &self.response_policy)
            .field("connected", &!self.calls.is_closed())
            .finish()
    }
}

impl<M: Message> Client<M> {
    pub(crate) fn new(
        calls: mpsc::Sender<IncomingCall<M>>,
        config: ClientConfig,
        response_policy: BackpressurePolicy,
    ) -> Self {
        Self {
            calls,
            config: Arc::new(config),
            response_policy,
            metrics: Arc::new(CallMetrics::new()),
        }
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the caller-side metrics.
    #[must_use]
    pub const fn metrics(&self) -> &Arc<CallMetrics> {
        &self.metrics
    }

    /// Sends one request and waits for exactly one response or one error.
    ///
    /// # Errors
    ///
    /// - [`QuadrpcError::Status`] with the handler's status.
    /// - [`QuadrpcError::Timeout`] if the caller's deadline elapsed first.
    /// - [`QuadrpcError::Channel`] if the connection is gone.
    #[instrument(level = "debug", skip(self, request, options))]
    pub async fn unary(
        &self,
        method: &'static str,
        request: M,
        options: CallOptions,
    ) -> Result<M, QuadrpcError> {
        let (requests, mut responses) = self.start(method, CallShape::Unary, options).await?;
        // A closed request direction means the handler already finished; the
        // outcome is on the response side.
        if let Err(error) = requests.send_one(request).await {
            if !error.is_closed() {
                return Err(responses.fail(error));
            }
        }
        responses.single().await
    }

    /// Sends one request and returns the stream of responses.
    ///
    /// # Errors
    ///
    /// Fails if the call could not be started or the request not delivered.
    /// Errors after that arrive through [`ResponseStream::recv`].
    #[instrument(level = "debug", skip(self, request, options))]
    pub async fn server_streaming(
        &self,
        method: &'static str,
        request: M,
        options: CallOptions,
    ) -> Result<ResponseStream<M>, QuadrpcError> {
        let (requests, mut responses) =
            self.start(method, CallShape::ServerStreaming, options).await?;
        if let Err(error) = requests.send_one(request).await {
            if !error.is_closed() {
                return Err(responses.fail(error));
            }
        }
        Ok(responses)
    }

    /// Starts a call that streams requests and receives one response.
    ///
    /// # Errors
    ///
    /// Fails if the call could not be started.
    #[instrument(level = "debug", skip(self, options))]
    pub async fn client_streaming(
        &self,
        method: &'static str,
        options: CallOptions,
    ) -> Result<ClientStreamingCall<M>, QuadrpcError> {
        let (requests, responses) = self.start(method, CallShape::ClientStreaming, options).await?;
        Ok(ClientStreamingCall {
            requests,
            responses,
        })
    }

    /// Starts a call with independent request and response streams.
    ///
    /// The two halves are separate owned values so they can be driven from
    /// different tasks.
    ///
    /// # Errors
    ///
    /// Fails if the call could not be started.
    #[instrument(level = "debug", skip(self, options))]
    pub async fn bidi_streaming(
        &self,
        method: &'static str,
        options: CallOptions,
    ) -> Result<(RequestSink<M>, ResponseStream<M>), QuadrpcError> {
        self.start(method, CallShape::Bidirectional, options).await
    }

    async fn start(
        &self,
        method: &'static str,
        shape: CallShape,
        options: CallOptions,
    ) -> Result<(RequestSink<M>, ResponseStream<M>), QuadrpcError> {
        let call_id = CallId::new();
        let timeout = options.timeout().or(self.config.default_timeout);
        let info = CallInfo {
            call_id,
            method,
            deadline: timeout.map(Deadline::after),
            timeout,
        };

        let (guard, cancel) = CancelGuard::pair();
        let (requests, inbound) = Channel::new_in_memory(call_id, self.config.backpressure);
        let (outbound, responses) = Channel::new_in_memory(call_id, self.response_policy);
        let call = IncomingCall {
            call_id,
            method: MethodDescriptor::new(method, shape),
            deadline: info.deadline,
            cancel,
            inbound,
            outbound,
        };

        let accepted = info
            .within(async {
                self.calls
                    .send(call)
                    .await
                    .map_err(|_| QuadrpcError::from(ChannelError::Closed { call_id }))
            })
            .await;
        if let Err(error) = accepted {
            if error.is_timeout() {
                self.metrics.record_local_timeout();
            }
            log_error(call_id, method, &error);
            return Err(error);
        }

        self.metrics.record_call_started();
        debug!(%call_id, method, %shape, ?timeout, "call started");

        Ok((
            RequestSink {
                info,
                requests,
                metrics: Arc::clone(&self.metrics),
            },
            ResponseStream {
                info,
                responses,
                metrics: Arc::clone(&self.metrics),
                started: Instant::now(),
                finished: false,
                _guard: guard,
            },
        ))
    }
}

/// Caller-side writer for a streaming call.
///
/// If the handler finished early, `send` fails with a closed-stream error;
/// the handler's status is then available from the response side.
pub struct RequestSink<M: Message> {
    info: CallInfo,
    requests: StreamSender<M>,
    metrics: Arc<CallMetrics>,
}

impl<M: Message> std::fmt::Debug for RequestSink<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSink")
            .field("call_id", &self.info.call_id)
            .field("method", &self.info.method)
            .finish()
    }
}

impl<M: Message> RequestSink<M> {
    /// Returns the call id.
    #[must_use]
    pub const fn call_id(&self) -> CallId {
        self.info.call_id
    }

    /// Sends one request, within the call deadline.
    ///
    /// # Errors
    ///
    /// - [`QuadrpcError::Timeout`] if the deadline elapsed while waiting for capacity.
    /// - [`QuadrpcError::Channel`] if the handler side is gone.
    pub async fn send(&mut self, request: M) -> Result<(), QuadrpcError> {
        let info = self.info;
        let requests = &mut self.requests;
        info.within(async move { requests.send(request).await.map_err(QuadrpcError::from) })
            .await?;
        self.metrics.record_message_sent();
        Ok(())
    }

    /// Signals that no more requests follow.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn close_send(self) -> Result<(), QuadrpcError> {
        let Self { info, requests, .. } = self;
        info.within(async move { requests.close().await.map_err(QuadrpcError::from) })
            .await
    }

    /// Ends the request stream with an error trailer instead of a clean end.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn abort(self, status: Status) -> Result<(), QuadrpcError> {
        let Self { info, requests, .. } = self;
        info.within(async move { requests.abort(status).await.map_err(QuadrpcError::from) })
            .await
    }

    async fn send_one(mut self, request: M) -> Result<(), QuadrpcError> {
        self.send(request).await?;
        self.close_send().await
    }
}

/// Caller-side reader for a call's responses.
///
/// Owns the call's cancellation guard: dropping it before the final
/// `Ok(None)` or error cancels the call.
pub struct ResponseStream<M: Message> {
    info: CallInfo,
    responses: StreamReceiver<M>,
    metrics: Arc<CallMetrics>,
    started: Instant,
    finished: bool,
    _guard: CancelGuard,
}

impl<M: Message> std::fmt::Debug for ResponseStream<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStream")
            .field("call_id", &self.info.call_id)
            .field("method", &self.info.method)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<M: Message> ResponseStream<M> {
    /// Returns the call id.
    #[must_use]
    pub const fn call_id(&self) -> CallId {
        self.info.call_id
    }

    /// Returns the call deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Deadline> {
        self.info.deadline
    }

    /// Receives the next response.
    ///
    /// `Ok(None)` is the clean end of the call.
    ///
    /// # Errors
    ///
    /// - [`QuadrpcError::Status`] if the handler ended the call with an error.
    /// - [`QuadrpcError::Timeout`] if the caller's deadline elapsed.
    pub async fn recv(&mut self) -> Result<Option<M>, QuadrpcError> {
        let result = self.next_raw().await;
        match &result {
            Ok(Some(_)) => self.metrics.record_message_received(),
            Ok(None) => self.finish(Ok(())),
            Err(error) => self.finish(Err(error)),
        }
        result
    }

    /// Turns the responses into a [`Stream`] that ends after the clean end
    /// or after yielding the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<M, QuadrpcError>> + Send + 'static {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut stream = state?;
            match stream.recv().await {
                Ok(Some(message)) => Some((Ok(message), Some(stream))),
                Ok(None) => None,
                Err(error) => Some((Err(error), None)),
            }
        })
    }

    async fn next_raw(&mut self) -> Result<Option<M>, QuadrpcError> {
        let info = self.info;
        let responses = &mut self.responses;
        info.within(async move { responses.recv().await.map_err(QuadrpcError::from) })
            .await
    }

    /// Reads exactly one response followed by the clean end.
    async fn single(mut self) -> Result<M, QuadrpcError> {
        let result = match self.next_raw().await {
            Ok(Some(response)) => {
                self.metrics.record_message_received();
                match self.next_raw().await {
                    Ok(None) => Ok(response),
                    Ok(Some(extra)) => Err(QuadrpcError::from(Status::internal(format!(
                        "{} sent more than one response (extra {})",
                        self.info.method,
                        extra.method_name()
                    )))),
                    Err(error) => Err(error),
                }
            }
            Ok(None) => Err(QuadrpcError::from(Status::internal(format!(
                "{} ended without a response",
                self.info.method
            )))),
            Err(error) => Err(error),
        };
        self.finish(result.as_ref().map(|_| ()));
        result
    }

    fn fail(&mut self, error: QuadrpcError) -> QuadrpcError {
        self.finish(Err(&error));
        error
    }

    fn finish(&mut self, outcome: Result<(), &QuadrpcError>) {
        if self.finished {
            return;
        }
        self.finished = true;
        let elapsed = self.started.elapsed();
        match outcome {
            Ok(()) => {
                self.metrics.record_call_finished(Code::Ok, elapsed);
                debug!(
                    call_id = %self.info.call_id,
                    method = self.info.method,
                    elapsed_ms = elapsed.as_millis(),
                    "call completed"
                );
            }
            Err(error) => {
                if error.is_timeout() {
                    self.metrics.record_local_timeout();
                }
                self.metrics.record_call_finished(error.code(), elapsed);
                log_error(self.info.call_id, self.info.method, error);
            }
        }
    }
}

impl<M: Message> Drop for ResponseStream<M> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                call_id = %self.info.call_id,
                method = self.info.method,
                "response stream dropped before the call finished, cancelling"
            );
            self.metrics
                .record_call_finished(Code::Cancelled, self.started.elapsed());
        }
    }
}

/// Handle for a client-streaming call.
pub struct ClientStreamingCall<M: Message> {
    requests: RequestSink<M>,
    responses: ResponseStream<M>,
}

impl<M: Message> std::fmt::Debug for ClientStreamingCall<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientStreamingCall")
            .field("call_id", &self.requests.info.call_id)
            .field("method", &self.requests.info.method)
            .finish()
    }
}

impl<M: Message> ClientStreamingCall<M> {
    /// Returns the call id.
    #[must_use]
    pub const fn call_id(&self) -> CallId {
        self.requests.call_id()
    }

    /// Sends one request.
    ///
    /// # Errors
    ///
    /// See [`RequestSink::send`].
    pub async fn send(&mut self, request: M) -> Result<(), QuadrpcError> {
        self.requests.send(request).await
    }

    /// Ends the request stream and waits for the single response.
    ///
    /// # Errors
    ///
    /// The handler's status, a caller-side timeout, or a connection failure.
    pub async fn close_and_recv(self) -> Result<M, QuadrpcError> {
        let Self {
            requests,
            mut responses,
        } = self;
        if let Err(error) = requests.close_send().await {
            if !error.is_closed() {
                return Err(responses.fail(error));
            }
        }
        responses.single().await
    }
}
