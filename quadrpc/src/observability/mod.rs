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

//! Observability support for quadrpc.
//!
//! - **[`CallMetrics`]**: call lifecycle and message counters, exported to
//!   the `metrics` facade when the `observability` feature is enabled
//! - **[`log_status`]** / **[`log_error`]**: structured `tracing` events for
//!   terminal call outcomes, tagged with the side that decided them
//!
//! Every terminal event carries an `origin` field (`caller`, `handler` or
//! `substrate`) so a caller-side timeout can be told apart from a handler
//! reporting `DEADLINE_EXCEEDED` when reading the logs.

mod metrics;

pub use metrics::CallMetrics;

use crate::channel::CallId;
use crate::error::{ErrorOrigin, QuadrpcError};
use crate::status::{Code, Status};

/// Logs a terminal call status decided at `origin`.
///
/// Timing codes log at WARN, internal failures at ERROR, and everything
/// else (a handler rejecting input, a missing record) at INFO.
pub fn log_status(call_id: CallId, method: &str, origin: ErrorOrigin, status: &Status) {
    let code = status.code();
    match code {
        Code::Ok => {}
        Code::DeadlineExceeded | Code::Cancelled => tracing::warn!(
            %call_id,
            method,
            origin = origin.as_str(),
            %code,
            message = status.message(),
            "call ended early"
        ),
        Code::Internal | Code::Unknown => tracing::error!(
            %call_id,
            method,
            origin = origin.as_str(),
            %code,
            message = status.message(),
            "call failed"
        ),
        _ => tracing::info!(
            %call_id,
            method,
            origin = origin.as_str(),
            %code,
            message = status.message(),
            "call rejected"
        ),
    }
}

/// Logs a caller-side error with its origin.
pub fn log_error(call_id: CallId, method: &str, error: &QuadrpcError) {
    match error {
        QuadrpcError::Status(status) => log_status(call_id, method, error.origin(), status),
        QuadrpcError::Timeout { timeout, .. } => tracing::warn!(
            %call_id,
            method,
            origin = error.origin().as_str(),
            timeout_ms = timeout.as_millis(),
            "caller deadline elapsed"
        ),
        QuadrpcError::Channel(channel_error) if channel_error.is_closed() => tracing::warn!(
            %call_id,
            method,
            origin = error.origin().as_str(),
            error = %channel_error,
            "call stream closed"
        ),
        QuadrpcError::Channel(_) | QuadrpcError::Config(_) => tracing::error!(
            %call_id,
            method,
            origin = error.origin().as_str(),
            %error,
            "call failed"
        ),
    }
}
