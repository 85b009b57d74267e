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

use std::time::Duration;
use tokio::time::Instant;

/// Furthest a deadline is placed in the future, roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Absolute point in time by which a call must complete.
///
/// Computed once from the caller's timeout when the call starts, and carried
/// unchanged to the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline(Instant);

impl Deadline {
    /// Returns a deadline `timeout` from now.
    ///
    /// Timeouts longer than about 30 years are clamped, so
    /// `Duration::MAX` reads as "effectively unbounded".
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        let now = Instant::now();
        let limit = now + FAR_FUTURE;
        Self(now.checked_add(timeout).map_or(limit, |at| at.min(limit)))
    }

    /// Returns a deadline at the given instant.
    #[must_use]
    pub const fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// Returns the underlying instant.
    #[must_use]
    pub const fn instant(&self) -> Instant {
        self.0
    }

    /// Returns the time left, or zero once the deadline has passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    /// Returns `true` once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let deadline = Deadline::after(Duration::from_secs(2));
        assert!(!deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::from_secs(2));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(deadline.remaining(), Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_timeout_is_clamped() {
        let deadline = Deadline::after(Duration::MAX);
        assert!(!deadline.is_expired());
        assert_eq!(deadline.remaining(), FAR_FUTURE);

        tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
        assert!(!deadline.is_expired());
    }
}
