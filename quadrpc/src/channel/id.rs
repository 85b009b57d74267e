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

//! Call identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one RPC invocation on a connection.
///
/// Both directions of a call carry the same id, which is how log lines
/// from the caller and the handler are tied together.
///
/// # Example
///
/// ```rust
/// use quadrpc::channel::CallId;
///
/// let a = CallId::new();
/// let b = CallId::new();
/// assert_ne!(a, b);
/// assert_eq!(CallId::from(7).to_string(), "Call(7)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallId(u64);

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

impl CallId {
    /// Allocates a process-unique call id. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self(NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for CallId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<CallId> for u64 {
    fn from(id: CallId) -> Self {
        id.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Call({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_id_uniqueness_and_order() {
        let first = CallId::new();
        let second = CallId::new();
        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn test_call_id_conversion() {
        let id = CallId::from(100);
        let raw: u64 = id.into();
        assert_eq!(raw, 100);
        assert_eq!(id.as_u64(), 100);
    }

    #[test]
    fn test_call_id_default_is_nonzero() {
        assert!(CallId::default().as_u64() > 0);
    }
}
