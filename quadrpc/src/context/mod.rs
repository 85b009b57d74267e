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

//! Deadline and cancellation propagation.
//!
//! A [`CallContext`] travels with every call on the handler side. It carries
//! the absolute [`Deadline`] computed by the caller and a [`CancelSignal`]
//! that fires when the caller goes away. Cancellation is cooperative: a
//! handler polls [`CallContext::check`] before each expensive step, or races
//! its work against [`CallContext::done`].
//!
//! # State machine
//!
//! ```text
//!            ┌──> Completed
//!  Active ───┼──> Expired
//!            └──> Cancelled
//! ```
//!
//! Transitions only leave `Active`, and only once. A handler that returns a
//! result after a failed check still has its call terminated with the
//! recorded status.
//!
//! # Example
//!
//! ```rust
//! use quadrpc::channel::CallId;
//! use quadrpc::context::{CallContext, CallState, CancelGuard, Deadline};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (guard, signal) = CancelGuard::pair();
//! let ctx = CallContext::new(
//!     CallId::new(),
//!     "greet.GreetService/GreetWithDeadline",
//!     Some(Deadline::after(Duration::from_secs(5))),
//!     signal,
//! );
//! assert!(ctx.check().is_ok());
//!
//! drop(guard);
//! assert!(ctx.check().is_err());
//! assert_eq!(ctx.state(), CallState::Cancelled);
//! # }
//! ```

mod deadline;

pub use deadline::Deadline;

use crate::channel::CallId;
use crate::status::Status;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Lifecycle state of a call on the handler side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CallState {
    /// The handler is running.
    Active = 0,
    /// The handler returned a result before any check failed.
    Completed = 1,
    /// The deadline passed at a checkpoint.
    Expired = 2,
    /// The caller went away, or the call was cancelled locally.
    Cancelled = 3,
}

impl CallState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Active,
            1 => Self::Completed,
            2 => Self::Expired,
            _ => Self::Cancelled,
        }
    }

    /// Returns `true` for every state other than [`CallState::Active`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Completed => f.write_str("completed"),
            Self::Expired => f.write_str("expired"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Caller-side half of the cancellation signal.
///
/// Dropping the guard, or calling [`cancel`](Self::cancel), tells the
/// handler that nobody is waiting for the result any more.
#[derive(Debug)]
pub struct CancelGuard {
    tx: watch::Sender<bool>,
}

impl CancelGuard {
    /// Creates a connected guard and signal.
    #[must_use]
    pub fn pair() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelSignal { rx })
    }

    /// Raises the cancellation signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

/// Handler-side half of the cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Returns `true` once the caller cancelled or went away.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the caller cancelled or went away.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // An error means the guard is gone, which is a cancellation too.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

struct ContextInner {
    call_id: CallId,
    method: &'static str,
    deadline: Option<Deadline>,
    state: AtomicU8,
    signal: CancelSignal,
}

/// Call-scoped view of deadline and cancellation for a handler.
///
/// Cheap to clone; all clones observe the same state.
#[derive(Clone)]
pub struct CallContext {
    inner: Arc<ContextInner>,
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("call_id", &self.inner.call_id)
            .field("method", &self.inner.method)
            .field("deadline", &self.inner.deadline)
            .field("state", &self.state())
            .finish()
    }
}

impl CallContext {
    /// Creates an active context.
    #[must_use]
    pub fn new(
        call_id: CallId,
        method: &'static str,
        deadline: Option<Deadline>,
        signal: CancelSignal,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                call_id,
                method,
                deadline,
                state: AtomicU8::new(CallState::Active as u8),
                signal,
            }),
        }
    }

    /// Returns the call id.
    #[must_use]
    pub fn call_id(&self) -> CallId {
        self.inner.call_id
    }

    /// Returns the fully qualified method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.inner.method
    }

    /// Returns the deadline, if the caller set one.
    #[must_use]
    pub fn deadline(&self) -> Option<Deadline> {
        self.inner.deadline
    }

    /// Returns the time left before the deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.inner.deadline.map(|deadline| deadline.remaining())
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CallState {
        CallState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Returns `true` if the deadline has passed, whether or not a check
    /// observed it yet.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state() == CallState::Expired
            || self.inner.deadline.is_some_and(|deadline| deadline.is_expired())
    }

    /// Returns `true` if the call was cancelled or the caller went away.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state() == CallState::Cancelled || self.inner.signal.is_cancelled()
    }

    /// Cooperative checkpoint.
    ///
    /// Returns `Ok(())` while the call may keep working. Once the deadline
    /// passed the call becomes [`CallState::Expired`] and `DEADLINE_EXCEEDED`
    /// is returned; once the caller went away it becomes
    /// [`CallState::Cancelled`] and `CANCELLED` is returned.
    ///
    /// # Errors
    ///
    /// Returns the terminal status once the call can no longer succeed.
    pub fn check(&self) -> Result<(), Status> {
        if self.state() == CallState::Active {
            if self.inner.deadline.is_some_and(|deadline| deadline.is_expired()) {
                self.transition(CallState::Expired);
            } else if self.inner.signal.is_cancelled() {
                self.transition(CallState::Cancelled);
            }
        }
        self.terminal_result()
    }

    /// Marks the call completed.
    ///
    /// # Errors
    ///
    /// If the call already reached `Expired` or `Cancelled` that status is
    /// returned and the state is left unchanged.
    pub fn complete(&self) -> Result<(), Status> {
        self.transition(CallState::Completed);
        self.terminal_result()
    }

    /// Cancels the call from the handler side.
    pub fn cancel(&self) {
        self.transition(CallState::Cancelled);
    }

    /// Resolves when the deadline passes or the caller goes away.
    ///
    /// Returns the status the call is terminated with. Meant for
    /// `tokio::select!` against long waits inside a handler.
    pub async fn done(&self) -> Status {
        let deadline = self.inner.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline.instant()).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            () = expired => {
                self.transition(CallState::Expired);
            }
            () = self.inner.signal.cancelled() => {
                self.transition(CallState::Cancelled);
            }
        }

        match self.terminal_result() {
            Err(status) => status,
            Ok(()) => Status::cancelled(format!("{} already completed", self.inner.call_id)),
        }
    }

    fn transition(&self, to: CallState) -> bool {
        let changed = self
            .inner
            .state
            .compare_exchange(
                CallState::Active as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if changed {
            debug!(call_id = %self.inner.call_id, method = self.inner.method, state = %to, "call state changed");
        }
        changed
    }

    fn terminal_result(&self) -> Result<(), Status> {
        match self.state() {
            CallState::Active | CallState::Completed => Ok(()),
            CallState::Expired => Err(Status::deadline_exceeded(format!(
                "deadline exceeded for {} on {}",
                self.inner.method, self.inner.call_id
            ))),
            CallState::Cancelled => Err(Status::cancelled(format!(
                "{} on {} was cancelled",
                self.inner.method, self.inner.call_id
            ))),
        }
    }
}
