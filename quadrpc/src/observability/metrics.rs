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

//! Call lifecycle metrics.
//!
//! Counters are kept in atomics so they can be read back in tests and
//! dashboards. With the `observability` feature every event is also forwarded
//! to the `metrics` facade under the `quadrpc.call.*` names.

use crate::status::Code;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics for RPC calls on one side of a connection.
///
/// # Examples
///
/// ```rust
/// use quadrpc::observability::CallMetrics;
/// use quadrpc::Code;
/// use std::time::Duration;
///
/// let metrics = CallMetrics::new();
/// metrics.record_call_started();
/// metrics.record_message_sent();
/// metrics.record_call_finished(Code::Ok, Duration::from_millis(3));
///
/// assert_eq!(metrics.active_calls(), 0);
/// assert_eq!(metrics.total_calls_completed(), 1);
/// assert_eq!(metrics.total_messages_sent(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CallMetrics {
    calls_started: AtomicU64,
    calls_completed: AtomicU64,
    calls_failed: AtomicU64,
    calls_expired: AtomicU64,
    calls_cancelled: AtomicU64,
    /// Caller-side local deadline expirations.
    local_timeouts: AtomicU64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    /// Sum of all call latencies in microseconds
    total_latency_us: AtomicU64,
    latency_count: AtomicU64,
}

impl CallMetrics {
    /// Creates a new call metrics tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call being accepted or issued.
    pub fn record_call_started(&self) {
        self.calls_started.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::counter!("quadrpc.call.started").increment(1);
            metrics::gauge!("quadrpc.call.active").increment(1.0);
        }
    }

    /// Records the terminal outcome of a call and its latency.
    ///
    /// `Ok` counts as completed, `DeadlineExceeded` as expired, `Cancelled`
    /// as cancelled and every other code as failed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use quadrpc::observability::CallMetrics;
    /// use quadrpc::Code;
    /// use std::time::Duration;
    ///
    /// let metrics = CallMetrics::new();
    /// metrics.record_call_started();
    /// metrics.record_call_finished(Code::DeadlineExceeded, Duration::from_secs(1));
    /// assert_eq!(metrics.total_calls_expired(), 1);
    /// assert_eq!(metrics.total_calls_failed(), 0);
    /// ```
    pub fn record_call_finished(&self, code: Code, latency: Duration) {
        let counter = match code {
            Code::Ok => &self.calls_completed,
            Code::DeadlineExceeded => &self.calls_expired,
            Code::Cancelled => &self.calls_cancelled,
            _ => &self.calls_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);

        #[cfg(feature = "observability")]
        {
            metrics::counter!("quadrpc.call.finished", "code" => code.to_string()).increment(1);
            metrics::gauge!("quadrpc.call.active").decrement(1.0);
        }
    }

    /// Records a caller giving up on its own deadline.
    ///
    /// This is counted separately from [`record_call_finished`](Self::record_call_finished)
    /// because the handler may still be running.
    pub fn record_local_timeout(&self) {
        self.local_timeouts.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("quadrpc.call.local_timeouts").increment(1);
    }

    /// Records a message being sent on a stream direction.
    pub fn record_message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("quadrpc.call.messages.sent").increment(1);
    }

    /// Records a message being received on a stream direction.
    pub fn record_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("quadrpc.call.messages.received").increment(1);
    }

    fn record_latency(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.total_latency_us.fetch_add(micros, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::histogram!("quadrpc.call.latency_us").record(micros as f64);
    }

    /// Returns the number of calls started but not yet finished.
    #[must_use]
    pub fn active_calls(&self) -> u64 {
        let started = self.calls_started.load(Ordering::Relaxed);
        let finished = self.calls_completed.load(Ordering::Relaxed)
            + self.calls_failed.load(Ordering::Relaxed)
            + self.calls_expired.load(Ordering::Relaxed)
            + self.calls_cancelled.load(Ordering::Relaxed);
        started.saturating_sub(finished)
    }

    /// Returns the total number of calls started.
    #[must_use]
    pub fn total_calls_started(&self) -> u64 {
        self.calls_started.load(Ordering::Relaxed)
    }

    /// Returns the total number of calls that finished with `OK`.
    #[must_use]
    pub fn total_calls_completed(&self) -> u64 {
        self.calls_completed.load(Ordering::Relaxed)
    }

    /// Returns the total number of calls that failed with a non-timing code.
    #[must_use]
    pub fn total_calls_failed(&self) -> u64 {
        self.calls_failed.load(Ordering::Relaxed)
    }

    /// Returns the total number of calls that ended with `DEADLINE_EXCEEDED`.
    #[must_use]
    pub fn total_calls_expired(&self) -> u64 {
        self.calls_expired.load(Ordering::Relaxed)
    }

    /// Returns the total number of calls that ended with `CANCELLED`.
    #[must_use]
    pub fn total_calls_cancelled(&self) -> u64 {
        self.calls_cancelled.load(Ordering::Relaxed)
    }

    /// Returns the total number of caller-side local timeouts.
    #[must_use]
    pub fn total_local_timeouts(&self) -> u64 {
        self.local_timeouts.load(Ordering::Relaxed)
    }

    /// Returns the total number of messages sent.
    #[must_use]
    pub fn total_messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Returns the total number of messages received.
    #[must_use]
    pub fn total_messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Returns the average call latency, or `None` if nothing finished yet.
    #[must_use]
    pub fn average_latency(&self) -> Option<Duration> {
        let count = self.latency_count.load(Ordering::Relaxed);
        if count == 0 {
            return None;
        }
        let total = self.total_latency_us.load(Ordering::Relaxed);
        Some(Duration::from_micros(total / count))
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        for counter in [
            &self.calls_started,
            &self.calls_completed,
            &self.calls_failed,
            &self.calls_expired,
            &self.calls_cancelled,
            &self.local_timeouts,
            &self.messages_sent,
            &self.messages_received,
            &self.total_latency_us,
            &self.latency_count,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_buckets() {
        let metrics = CallMetrics::new();
        for _ in 0..4 {
            metrics.record_call_started();
        }
        metrics.record_call_finished(Code::Ok, Duration::from_millis(1));
        metrics.record_call_finished(Code::NotFound, Duration::from_millis(1));
        metrics.record_call_finished(Code::Cancelled, Duration::from_millis(1));

        assert_eq!(metrics.total_calls_completed(), 1);
        assert_eq!(metrics.total_calls_failed(), 1);
        assert_eq!(metrics.total_calls_cancelled(), 1);
        assert_eq!(metrics.active_calls(), 1);
    }

    #[test]
    fn test_average_latency() {
        let metrics = CallMetrics::new();
        assert!(metrics.average_latency().is_none());

        metrics.record_call_finished(Code::Ok, Duration::from_millis(10));
        metrics.record_call_finished(Code::Ok, Duration::from_millis(30));
        assert_eq!(metrics.average_latency(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_reset() {
        let metrics = CallMetrics::new();
        metrics.record_call_started();
        metrics.record_local_timeout();
        metrics.record_message_received();
        metrics.reset();

        assert_eq!(metrics.total_calls_started(), 0);
        assert_eq!(metrics.total_local_timeouts(), 0);
        assert_eq!(metrics.total_messages_received(), 0);
    }
}
