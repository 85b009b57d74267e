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

//! Independent read and write loops for bidirectional calls.

use super::{Channel, Message, StreamReceiver, StreamSender};
use crate::backpressure::BackpressurePolicy;
use crate::context::CallContext;
use crate::status::Status;
use std::future::Future;
use tokio::task::JoinError;
use tracing::{debug, error};

/// Maps every inbound message to exactly one outbound message, live.
///
/// The read side and the write side run as two spawned tasks connected by a
/// hand-off direction created with `policy`. Each response is forwarded as
/// soon as it is produced. The function returns when the inbound direction
/// reached end-of-stream and every queued response was written, or when
/// either side failed. The first failure is returned.
///
/// Both loops observe `ctx`: the reader checks it before mapping each
/// request, and neither side stays parked once the deadline passes or the
/// caller goes away.
///
/// The outbound direction is not closed here; the caller finishes it.
///
/// # Errors
///
/// - The inbound trailer, if the peer aborted its direction.
/// - The error returned by `f`.
/// - `DEADLINE_EXCEEDED` or `CANCELLED` once `ctx` ended.
/// - `CANCELLED` if the outbound receiver went away.
pub async fn map_duplex<M, F, Fut>(
    ctx: CallContext,
    mut inbound: StreamReceiver<M>,
    mut outbound: StreamSender<M>,
    policy: BackpressurePolicy,
    mut f: F,
) -> Result<(), Status>
where
    M: Message,
    F: FnMut(M) -> Fut + Send + 'static,
    Fut: Future<Output = Result<M, Status>> + Send + 'static,
{
    let call_id = inbound.call_id();
    let (mut handoff_tx, mut handoff_rx) = Channel::<M>::new_in_memory(call_id, policy);

    let reader_ctx = ctx.clone();
    let reader = tokio::spawn(async move {
        let ctx = reader_ctx;
        loop {
            let next = tokio::select! {
                next = inbound.recv() => next,
                status = ctx.done() => Err(status),
            };
            match next {
                Ok(Some(request)) => {
                    let mapped = match ctx.check() {
                        Ok(()) => f(request).await,
                        Err(status) => Err(status),
                    };
                    let response = match mapped {
                        Ok(response) => response,
                        Err(status) => {
                            let _ = handoff_tx.abort(status.clone()).await;
                            return Err(status);
                        }
                    };
                    if handoff_tx.send(response).await.is_err() {
                        // The writer stopped first and holds the real error.
                        debug!(%call_id, "writer gone, stopping reader");
                        return Ok(());
                    }
                }
                Ok(None) => {
                    let _ = handoff_tx.close().await;
                    return Ok(());
                }
                Err(status) => {
                    let _ = handoff_tx.abort(status.clone()).await;
                    return Err(status);
                }
            }
        }
    });

    let writer = tokio::spawn(async move {
        loop {
            match handoff_rx.recv().await {
                Ok(Some(response)) => tokio::select! {
                    sent = outbound.send(response) => sent.map_err(Status::from)?,
                    status = ctx.done() => return Err(status),
                },
                Ok(None) => return Ok(()),
                Err(status) => return Err(status),
            }
        }
    });

    let (read_result, write_result) = tokio::join!(reader, writer);
    let read_result = flatten(read_result);
    let write_result = flatten(write_result);
    read_result.and(write_result)
}

fn flatten(result: Result<Result<(), Status>, JoinError>) -> Result<(), Status> {
    result.unwrap_or_else(|join_error| {
        error!(error = %join_error, "duplex task failed");
        Err(Status::internal(format!("duplex task failed: {join_error}")))
    })
}
