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

use super::{CallId, ChannelError, Frame, Message};
use crate::backpressure::BackpressurePolicy;
use crate::status::Status;
use futures_util::Stream;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// Factory for the two ends of one stream direction.
///
/// A direction is strictly single-producer, single-consumer and FIFO.
/// It ends with exactly one terminal signal: a clean end via
/// [`StreamSender::close`] or an error trailer via [`StreamSender::abort`].
///
/// # Example
///
/// ```rust
/// use quadrpc::backpressure::BackpressurePolicy;
/// use quadrpc::channel::{CallId, Channel, Message};
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum Echo { Ping(u32) }
///
/// impl Message for Echo {
///     fn method_name(&self) -> &'static str { "echo.Echo/Ping" }
///     fn is_request(&self) -> bool { true }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (mut tx, mut rx) = Channel::<Echo>::new_in_memory(CallId::new(), BackpressurePolicy::default());
/// tx.send(Echo::Ping(1)).await?;
/// tx.close().await?;
///
/// assert_eq!(rx.recv().await?, Some(Echo::Ping(1)));
/// assert_eq!(rx.recv().await?, None);
/// # Ok(())
/// # }
/// ```
pub struct Channel<M: Message> {
    _phantom: PhantomData<M>,
}

impl<M: Message> Channel<M> {
    /// Creates a connected sender/receiver pair for one direction of a call.
    #[must_use]
    pub fn new_in_memory(
        call_id: CallId,
        policy: BackpressurePolicy,
    ) -> (StreamSender<M>, StreamReceiver<M>) {
        let (tx, rx) = match policy {
            BackpressurePolicy::Bounded(capacity) => {
                let (tx, rx) = mpsc::channel(capacity.max(1));
                (FrameTx::Bounded(tx), FrameRx::Bounded(rx))
            }
            BackpressurePolicy::Unbounded => {
                let (tx, rx) = mpsc::unbounded_channel();
                (FrameTx::Unbounded(tx), FrameRx::Unbounded(rx))
            }
        };
        let state = Arc::new(DirectionState::default());

        let sender = StreamSender { call_id, tx, state };
        let receiver = StreamReceiver {
            call_id,
            rx,
            expected_sequence: 0,
            terminal: None,
        };
        (sender, receiver)
    }
}

#[derive(Debug, Default)]
struct DirectionState {
    finished: AtomicBool,
    send_sequence: AtomicU64,
}

enum FrameTx<M> {
    Bounded(mpsc::Sender<Frame<M>>),
    Unbounded(mpsc::UnboundedSender<Frame<M>>),
}

impl<M> Clone for FrameTx<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Bounded(tx) => Self::Bounded(tx.clone()),
            Self::Unbounded(tx) => Self::Unbounded(tx.clone()),
        }
    }
}

/// Capacity reserved for exactly one frame.
enum Slot<'a, M> {
    Bounded(mpsc::Permit<'a, Frame<M>>),
    Unbounded(&'a mpsc::UnboundedSender<Frame<M>>),
}

impl<M> Slot<'_, M> {
    fn send(self, frame: Frame<M>) -> bool {
        match self {
            Self::Bounded(permit) => {
                permit.send(frame);
                true
            }
            Self::Unbounded(tx) => tx.send(frame).is_ok(),
        }
    }
}

impl<M> FrameTx<M> {
    async fn reserve(&self) -> Option<Slot<'_, M>> {
        match self {
            Self::Bounded(tx) => tx.reserve().await.ok().map(Slot::Bounded),
            Self::Unbounded(tx) if tx.is_closed() => None,
            Self::Unbounded(tx) => Some(Slot::Unbounded(tx)),
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Self::Bounded(tx) => tx.is_closed(),
            Self::Unbounded(tx) => tx.is_closed(),
        }
    }
}

enum FrameRx<M> {
    Bounded(mpsc::Receiver<Frame<M>>),
    Unbounded(mpsc::UnboundedReceiver<Frame<M>>),
}

impl<M> FrameRx<M> {
    async fn recv(&mut self) -> Option<Frame<M>> {
        match self {
            Self::Bounded(rx) => rx.recv().await,
            Self::Unbounded(rx) => rx.recv().await,
        }
    }
}

async fn send_terminal<M>(
    call_id: CallId,
    tx: &FrameTx<M>,
    state: &DirectionState,
    frame: Frame<M>,
) -> Result<(), ChannelError> {
    if state.finished.swap(true, Ordering::AcqRel) {
        return Err(ChannelError::AlreadyFinished { call_id });
    }
    let slot = tx.reserve().await.ok_or(ChannelError::Closed { call_id })?;
    if slot.send(frame) {
        Ok(())
    } else {
        Err(ChannelError::Closed { call_id })
    }
}

/// Producer end of a stream direction.
///
/// There is exactly one producer per direction, so this type is not `Clone`.
/// Dropping it without calling [`close`](Self::close) or
/// [`abort`](Self::abort) is observed by the receiver as `CANCELLED`.
pub struct StreamSender<M: Message> {
    call_id: CallId,
    tx: FrameTx<M>,
    state: Arc<DirectionState>,
}

impl<M: Message> std::fmt::Debug for StreamSender<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSender")
            .field("call_id", &self.call_id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl<M: Message> StreamSender<M> {
    /// Returns the call this direction belongs to.
    #[must_use]
    pub const fn call_id(&self) -> CallId {
        self.call_id
    }

    /// Returns `true` once a terminal signal was sent.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    /// Returns `true` if the receiver was dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Sends one message, suspending while a bounded direction is full.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::AlreadyFinished`] if a terminal signal was sent.
    /// - [`ChannelError::Closed`] if the receiver is gone.
    #[instrument(level = "debug", skip(self, message), fields(call_id = %self.call_id, sequence, method = message.method_name()))]
    pub async fn send(&mut self, message: M) -> Result<(), ChannelError> {
        if self.is_finished() {
            return Err(ChannelError::AlreadyFinished {
                call_id: self.call_id,
            });
        }

        let Some(slot) = self.tx.reserve().await else {
            warn!("stream closed, cannot send message");
            return Err(ChannelError::Closed {
                call_id: self.call_id,
            });
        };

        // Sequence numbers are assigned only once capacity is held, so an
        // abandoned send never leaves a gap.
        let sequence = self.state.send_sequence.fetch_add(1, Ordering::SeqCst);
        tracing::Span::current().record("sequence", sequence);

        if !slot.send(Frame::Message {
            sequence,
            payload: message,
        }) {
            warn!("stream closed, cannot send message");
            return Err(ChannelError::Closed {
                call_id: self.call_id,
            });
        }
        debug!("sent message on stream");
        Ok(())
    }

    /// Sends one message, failing if capacity does not free up in time.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Timeout`] if the timeout expires first,
    /// otherwise the same errors as [`send`](Self::send).
    pub async fn send_timeout(&mut self, message: M, timeout: Duration) -> Result<(), ChannelError> {
        let call_id = self.call_id;
        match tokio::time::timeout(timeout, self.send(message)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%call_id, timeout_ms = timeout.as_millis(), "timed out waiting for stream capacity");
                Err(ChannelError::Timeout {
                    call_id,
                    operation: "send",
                })
            }
        }
    }

    /// Ends the direction cleanly.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::AlreadyFinished`] if a terminal signal was sent.
    /// - [`ChannelError::Closed`] if the receiver is gone.
    pub async fn close(self) -> Result<(), ChannelError> {
        debug!(call_id = %self.call_id, "closing stream");
        send_terminal(self.call_id, &self.tx, &self.state, Frame::End).await
    }

    /// Ends the direction with an error trailer.
    ///
    /// # Errors
    ///
    /// Same as [`close`](Self::close).
    pub async fn abort(self, status: Status) -> Result<(), ChannelError> {
        debug!(call_id = %self.call_id, %status, "aborting stream");
        send_terminal(self.call_id, &self.tx, &self.state, Frame::Abort(status)).await
    }

    /// Returns a handle that can only send the terminal signal.
    ///
    /// The call runtime keeps one of these so it can finish a direction
    /// after the handler returned, whether or not the handler kept its
    /// sender alive.
    #[must_use]
    pub fn closer(&self) -> StreamCloser<M> {
        StreamCloser {
            call_id: self.call_id,
            tx: self.tx.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

/// Terminal-only handle for a stream direction.
///
/// Whichever of the sender or the closer finishes the direction first wins;
/// the other gets [`ChannelError::AlreadyFinished`].
pub struct StreamCloser<M: Message> {
    call_id: CallId,
    tx: FrameTx<M>,
    state: Arc<DirectionState>,
}

impl<M: Message> std::fmt::Debug for StreamCloser<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCloser")
            .field("call_id", &self.call_id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl<M: Message> StreamCloser<M> {
    /// Returns `true` once a terminal signal was sent.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    /// Ends the direction cleanly.
    ///
    /// # Errors
    ///
    /// See [`StreamSender::close`].
    pub async fn close(self) -> Result<(), ChannelError> {
        send_terminal(self.call_id, &self.tx, &self.state, Frame::End).await
    }

    /// Ends the direction with an error trailer.
    ///
    /// # Errors
    ///
    /// See [`StreamSender::close`].
    pub async fn abort(self, status: Status) -> Result<(), ChannelError> {
        send_terminal(self.call_id, &self.tx, &self.state, Frame::Abort(status)).await
    }
}

/// Consumer end of a stream direction.
pub struct StreamReceiver<M: Message> {
    call_id: CallId,
    rx: FrameRx<M>,
    expected_sequence: u64,
    terminal: Option<Result<(), Status>>,
}

impl<M: Message> std::fmt::Debug for StreamReceiver<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReceiver")
            .field("call_id", &self.call_id)
            .field("expected_sequence", &self.expected_sequence)
            .field("terminal", &self.terminal)
            .finish()
    }
}

impl<M: Message> StreamReceiver<M> {
    /// Returns the call this direction belongs to.
    #[must_use]
    pub const fn call_id(&self) -> CallId {
        self.call_id
    }

    /// Returns `true` once a terminal signal was observed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.terminal.is_some()
    }

    /// Receives the next message.
    ///
    /// Returns `Ok(Some(_))` for a message, `Ok(None)` for a clean
    /// end-of-stream and `Err(status)` for an error trailer. A producer that
    /// went away without a terminal signal yields `CANCELLED`. Once a
    /// terminal state is reached every later call returns it again.
    ///
    /// # Errors
    ///
    /// Returns the trailer [`Status`] when the direction was aborted.
    pub async fn recv(&mut self) -> Result<Option<M>, Status> {
        if let Some(terminal) = &self.terminal {
            return terminal.clone().map(|()| None);
        }
        let frame = self.rx.recv().await;
        self.accept(frame)
    }

    /// Receives the next message with a timeout.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::Timeout`] if nothing arrives in time.
    /// - [`ChannelError::Aborted`] if the direction ended with a trailer.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<M>, ChannelError> {
        let call_id = self.call_id;
        if let Some(terminal) = &self.terminal {
            return terminal
                .clone()
                .map(|()| None)
                .map_err(|status| ChannelError::Aborted { call_id, status });
        }
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(frame) => self
                .accept(frame)
                .map_err(|status| ChannelError::Aborted { call_id, status }),
            Err(_) => {
                warn!(%call_id, timeout_ms = timeout.as_millis(), "timed out waiting for stream message");
                Err(ChannelError::Timeout {
                    call_id,
                    operation: "recv",
                })
            }
        }
    }

    /// Turns the receiver into a [`Stream`] of messages.
    ///
    /// The stream ends after a clean end-of-stream, or after yielding the
    /// error trailer once.
    pub fn into_stream(self) -> impl Stream<Item = Result<M, Status>> + Send + 'static {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut receiver = state?;
            match receiver.recv().await {
                Ok(Some(message)) => Some((Ok(message), Some(receiver))),
                Ok(None) => None,
                Err(status) => Some((Err(status), None)),
            }
        })
    }

    fn accept(&mut self, frame: Option<Frame<M>>) -> Result<Option<M>, Status> {
        match frame {
            Some(Frame::Message { sequence, payload }) => {
                debug_assert_eq!(
                    sequence, self.expected_sequence,
                    "message reordering detected on {}",
                    self.call_id
                );
                self.expected_sequence += 1;
                debug!(call_id = %self.call_id, sequence, "received message on stream");
                Ok(Some(payload))
            }
            Some(Frame::End) => {
                debug!(call_id = %self.call_id, "stream ended");
                self.terminal = Some(Ok(()));
                Ok(None)
            }
            Some(Frame::Abort(status)) => {
                debug!(call_id = %self.call_id, %status, "stream aborted");
                self.terminal = Some(Err(status.clone()));
                Err(status)
            }
            None => {
                let status = Status::cancelled(format!("stream abandoned on {}", self.call_id));
                warn!(call_id = %self.call_id, "producer dropped without a terminal signal");
                self.terminal = Some(Err(status.clone()));
                Err(status)
            }
        }
    }
}
