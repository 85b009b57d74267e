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

use crate::status::Status;

/// One unit on a stream direction.
///
/// A direction carries zero or more [`Frame::Message`] frames followed by
/// exactly one terminal frame. [`Frame::End`] and [`Frame::Abort`] are
/// mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Frame<M> {
    /// A payload with its per-direction sequence number.
    Message {
        /// Monotonic position within the direction, starting at 0.
        sequence: u64,
        /// The message itself.
        payload: M,
    },
    /// Clean end-of-stream.
    End,
    /// Error trailer.
    Abort(Status),
}

impl<M> Frame<M> {
    /// Returns `true` for [`Frame::End`] and [`Frame::Abort`].
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Message { .. })
    }

    /// Returns the sequence number of a message frame.
    #[must_use]
    pub const fn sequence(&self) -> Option<u64> {
        match self {
            Self::Message { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_frames() {
        let message = Frame::Message {
            sequence: 4,
            payload: "hi",
        };
        assert!(!message.is_terminal());
        assert_eq!(message.sequence(), Some(4));

        assert!(Frame::<&str>::End.is_terminal());
        assert!(Frame::<&str>::Abort(Status::internal("boom")).is_terminal());
        assert_eq!(Frame::<&str>::End.sequence(), None);
    }
}
