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

//! Top-level error types for quadrpc.
//!
//! Errors are layered:
//!
//! 1. **Handler**: a [`Status`] returned by the remote handler
//! 2. **Substrate**: a [`ChannelError`] raised by a stream direction
//! 3. **Caller**: the caller's own deadline elapsing ([`QuadrpcError::Timeout`])
//!
//! Callers branch on [`QuadrpcError::code`], never on message text.
//!
//! # Examples
//!
//! ```rust
//! use quadrpc::{Code, QuadrpcError, Status};
//! use quadrpc::error::ErrorOrigin;
//!
//! let error: QuadrpcError = Status::not_found("no blog with that id").into();
//! assert_eq!(error.code(), Code::NotFound);
//! assert_eq!(error.origin(), ErrorOrigin::Handler);
//! ```

use crate::channel::{CallId, ChannelError};
use crate::config::ConfigError;
use crate::status::{Code, Status};
use std::fmt;
use std::time::Duration;

/// Where an error was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorOrigin {
    /// The caller gave up on its own deadline.
    Caller,
    /// The handler reported a status.
    Handler,
    /// The stream substrate or local configuration failed.
    Substrate,
}

impl ErrorOrigin {
    /// Returns the value used for the `origin` log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Caller => "caller",
            Self::Handler => "handler",
            Self::Substrate => "substrate",
        }
    }
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every [`Client`](crate::client::Client) operation.
#[derive(Debug, thiserror::Error)]
pub enum QuadrpcError {
    /// The handler terminated the call with a status.
    #[error(transparent)]
    Status(#[from] Status),

    /// A stream direction failed locally.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The caller's local deadline elapsed before a result arrived.
    ///
    /// The handler may still be running; it observes the deadline at its
    /// next checkpoint.
    #[error("{method} on {call_id} timed out after {timeout:?}")]
    Timeout {
        /// The call that timed out.
        call_id: CallId,
        /// The method that was called.
        method: &'static str,
        /// The caller's timeout.
        timeout: Duration,
    },

    /// The client or server configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl QuadrpcError {
    /// Returns the status code a caller should branch on.
    ///
    /// A caller-side timeout maps to [`Code::DeadlineExceeded`].
    #[must_use]
    pub fn code(&self) -> Code {
        match self {
            Self::Status(status) => status.code(),
            Self::Channel(error) => Status::from(error.clone()).code(),
            Self::Timeout { .. } => Code::DeadlineExceeded,
            Self::Config(_) => Code::InvalidArgument,
        }
    }

    /// Returns where the error was decided.
    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Status(_) => ErrorOrigin::Handler,
            Self::Timeout { .. } => ErrorOrigin::Caller,
            Self::Channel(_) | Self::Config(_) => ErrorOrigin::Substrate,
        }
    }

    /// Returns `true` if the caller's own deadline elapsed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the handler reported a status.
    #[must_use]
    pub const fn is_status(&self) -> bool {
        matches!(self, Self::Status(_))
    }

    /// Returns `true` if the other side of a stream direction is gone.
    ///
    /// When sending requests this means the handler already finished; its
    /// outcome is then available from the response side.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Channel(ChannelError::Closed { .. }))
    }

    /// Returns the handler status, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<&Status> {
        match self {
            Self::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Returns `true` if the call ended for a timing reason, on either side.
    #[must_use]
    pub fn is_timing(&self) -> bool {
        self.code().is_timing()
    }
}
