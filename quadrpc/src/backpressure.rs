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

//! Flow control for stream directions.
//!
//! Every stream direction is created with a [`BackpressurePolicy`]:
//!
//! - [`BackpressurePolicy::Bounded`]: at most `n` messages may be in flight.
//!   `send` suspends until the consumer frees capacity. This is the default.
//! - [`BackpressurePolicy::Unbounded`]: `send` never suspends. Memory grows
//!   without limit if the consumer falls behind.
//!
//! # Examples
//!
//! ```rust
//! use quadrpc::backpressure::BackpressurePolicy;
//!
//! let policy = BackpressurePolicy::default();
//! assert_eq!(policy.capacity(), Some(100));
//! assert!(BackpressurePolicy::Unbounded.capacity().is_none());
//! ```

use std::fmt;

/// Default number of in-flight messages per direction.
pub const DEFAULT_STREAM_CAPACITY: usize = 100;

/// How many unacknowledged messages a stream direction may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BackpressurePolicy {
    /// Bounded queue; senders suspend when it is full.
    Bounded(usize),
    /// Unbounded queue; senders never suspend.
    Unbounded,
}

impl BackpressurePolicy {
    /// Returns the queue capacity, or `None` when unbounded.
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        match self {
            Self::Bounded(capacity) => Some(*capacity),
            Self::Unbounded => None,
        }
    }

    /// Returns `true` if senders can be suspended by this policy.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        matches!(self, Self::Bounded(_))
    }

    /// Checks that a bounded policy has a non-zero capacity.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the capacity is zero.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Bounded(0) => Err("bounded backpressure capacity must be greater than 0".into()),
            _ => Ok(()),
        }
    }
}

impl Default for BackpressurePolicy {
    fn default() -> Self {
        Self::Bounded(DEFAULT_STREAM_CAPACITY)
    }
}

impl fmt::Display for BackpressurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(capacity) => write!(f, "Bounded({capacity})"),
            Self::Unbounded => f.write_str("Unbounded"),
        }
    }
}
