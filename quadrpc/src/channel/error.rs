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

//! Error types for the stream layer.

use super::CallId;
use crate::status::Status;

/// Errors raised by a stream direction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The other end of the direction is gone.
    ///
    /// For a sender this means the receiver was dropped, usually because
    /// the caller abandoned the call.
    #[error("stream for {call_id} is closed")]
    Closed {
        /// The call the direction belongs to.
        call_id: CallId,
    },

    /// A terminal signal was already sent on this direction.
    #[error("stream for {call_id} already finished")]
    AlreadyFinished {
        /// The call the direction belongs to.
        call_id: CallId,
    },

    /// The peer terminated the direction with an error trailer.
    #[error("stream for {call_id} aborted: {status}")]
    Aborted {
        /// The call the direction belongs to.
        call_id: CallId,
        /// The trailer carried by the abort.
        status: Status,
    },

    /// A send or receive did not complete in time.
    #[error("{operation} on stream for {call_id} timed out")]
    Timeout {
        /// The call the direction belongs to.
        call_id: CallId,
        /// The operation that timed out ("send" or "recv").
        operation: &'static str,
    },
}

impl ChannelError {
    /// Returns true if the other end of the direction is gone.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// Returns true if this error is a send or receive timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the call the direction belongs to.
    #[must_use]
    pub const fn call_id(&self) -> CallId {
        match self {
            Self::Closed { call_id }
            | Self::AlreadyFinished { call_id }
            | Self::Aborted { call_id, .. }
            | Self::Timeout { call_id, .. } => *call_id,
        }
    }
}

impl From<ChannelError> for Status {
    fn from(error: ChannelError) -> Self {
        match error {
            ChannelError::Closed { .. } => Status::cancelled(error.to_string()),
            ChannelError::Timeout { .. } => Status::deadline_exceeded(error.to_string()),
            ChannelError::Aborted { status, .. } => status,
            ChannelError::AlreadyFinished { .. } => Status::internal(error.to_string()),
        }
    }
}
