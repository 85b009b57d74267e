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

//! Behavioural tests for stream directions.

use super::*;
use crate::backpressure::BackpressurePolicy;
use crate::context::{CallContext, CancelGuard, Deadline};
use crate::status::{Code, Status};
use futures_util::StreamExt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TestProtocol {
    Request(String),
    Response(i32),
}

impl Message for TestProtocol {
    fn method_name(&self) -> &'static str {
        match self {
            Self::Request(_) => "test.Test/Request",
            Self::Response(_) => "test.Test/Response",
        }
    }

    fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

fn pair() -> (StreamSender<TestProtocol>, StreamReceiver<TestProtocol>) {
    Channel::new_in_memory(CallId::new(), BackpressurePolicy::default())
}

fn context(call_id: CallId, deadline: Option<Deadline>) -> (CancelGuard, CallContext) {
    let (guard, signal) = CancelGuard::pair();
    (guard, CallContext::new(call_id, "test.Test/Duplex", deadline, signal))
}

#[tokio::test]
async fn test_fifo_then_end() {
    let (mut sender, mut receiver) = pair();

    let producer = tokio::spawn(async move {
        for i in 0..250 {
            sender.send(TestProtocol::Response(i)).await.unwrap();
        }
        sender.close().await.unwrap();
    });

    let mut received = Vec::new();
    while let Some(message) = receiver.recv().await.unwrap() {
        received.push(message);
    }
    producer.await.unwrap();

    let expected: Vec<_> = (0..250).map(TestProtocol::Response).collect();
    assert_eq!(received, expected);
    assert!(receiver.is_finished());
}

#[tokio::test]
async fn test_abort_is_distinct_from_end_and_sticky() {
    let (mut sender, mut receiver) = pair();
    sender.send(TestProtocol::Response(1)).await.unwrap();
    sender.abort(Status::internal("store unavailable")).await.unwrap();

    assert_eq!(receiver.recv().await.unwrap(), Some(TestProtocol::Response(1)));
    let status = receiver.recv().await.unwrap_err();
    assert_eq!(status.code(), Code::Internal);

    // Terminal state does not change on later reads.
    assert_eq!(receiver.recv().await.unwrap_err(), status);
}

#[tokio::test]
async fn test_end_is_sticky() {
    let (sender, mut receiver) = pair();
    sender.close().await.unwrap();
    assert_eq!(receiver.recv().await.unwrap(), None);
    assert_eq!(receiver.recv().await.unwrap(), None);
}

#[tokio::test]
async fn test_dropped_sender_is_cancelled_not_end() {
    let (mut sender, mut receiver) = pair();
    sender.send(TestProtocol::Request("Jack".into())).await.unwrap();
    drop(sender);

    assert!(receiver.recv().await.unwrap().is_some());
    let status = receiver.recv().await.unwrap_err();
    assert_eq!(status.code(), Code::Cancelled);
    assert!(status.message().contains("abandoned"));
}

#[tokio::test]
async fn test_closer_and_sender_share_one_terminal() {
    let (mut sender, mut receiver) = pair();
    let closer = sender.closer();

    closer.close().await.unwrap();
    let err = sender.send(TestProtocol::Response(1)).await.unwrap_err();
    assert!(matches!(err, ChannelError::AlreadyFinished { .. }));
    let err = sender.abort(Status::internal("late")).await.unwrap_err();
    assert!(matches!(err, ChannelError::AlreadyFinished { .. }));

    assert_eq!(receiver.recv().await.unwrap(), None);
}

#[tokio::test]
async fn test_closer_after_sender_close_is_noop() {
    let (sender, mut receiver) = pair();
    let closer = sender.closer();
    sender.close().await.unwrap();

    assert!(closer.is_finished());
    assert!(closer.abort(Status::internal("late")).await.is_err());
    assert_eq!(receiver.recv().await.unwrap(), None);
}

#[tokio::test]
async fn test_send_to_dropped_receiver_is_closed() {
    let (mut sender, receiver) = pair();
    drop(receiver);

    assert!(sender.is_closed());
    let err = sender.send(TestProtocol::Response(1)).await.unwrap_err();
    assert!(err.is_closed());
    assert_eq!(Status::from(err).code(), Code::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_bounded_direction_suspends_sender() {
    let (mut sender, mut receiver) =
        Channel::<TestProtocol>::new_in_memory(CallId::new(), BackpressurePolicy::Bounded(1));

    sender.send(TestProtocol::Response(0)).await.unwrap();
    let err = sender
        .send_timeout(TestProtocol::Response(1), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    // Draining frees capacity, and the timed-out send left no sequence gap.
    assert_eq!(receiver.recv().await.unwrap(), Some(TestProtocol::Response(0)));
    sender.send(TestProtocol::Response(2)).await.unwrap();
    assert_eq!(receiver.recv().await.unwrap(), Some(TestProtocol::Response(2)));
}

#[tokio::test]
async fn test_unbounded_direction_never_suspends() {
    let (mut sender, mut receiver) =
        Channel::<TestProtocol>::new_in_memory(CallId::new(), BackpressurePolicy::Unbounded);

    for i in 0..1_000 {
        sender.send(TestProtocol::Response(i)).await.unwrap();
    }
    sender.close().await.unwrap();

    let mut count = 0;
    while receiver.recv().await.unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 1_000);
}

#[tokio::test(start_paused = true)]
async fn test_recv_timeout() {
    let (sender, mut receiver) = pair();

    let err = receiver
        .recv_timeout(Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    sender.abort(Status::not_found("missing")).await.unwrap();
    let err = receiver
        .recv_timeout(Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, ChannelError::Aborted { ref status, .. } if status.code() == Code::NotFound));
}

#[tokio::test]
async fn test_into_stream_yields_trailer_once() {
    let (mut sender, receiver) = pair();
    sender.send(TestProtocol::Response(1)).await.unwrap();
    sender.abort(Status::internal("boom")).await.unwrap();

    let items: Vec<_> = receiver.into_stream().collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], Ok(TestProtocol::Response(1)));
    assert_eq!(items[1].as_ref().unwrap_err().code(), Code::Internal);
}

#[tokio::test]
async fn test_map_duplex_one_response_per_request() {
    let call_id = CallId::new();
    let (mut requests, inbound) =
        Channel::<TestProtocol>::new_in_memory(call_id, BackpressurePolicy::default());
    let (outbound, mut responses) =
        Channel::<TestProtocol>::new_in_memory(call_id, BackpressurePolicy::default());
    let closer = outbound.closer();
    let (_guard, ctx) = context(call_id, None);

    let duplex = tokio::spawn(map_duplex(
        ctx,
        inbound,
        outbound,
        BackpressurePolicy::Bounded(1),
        |message| async move {
            match message {
                TestProtocol::Request(name) => Ok(TestProtocol::Response(name.len() as i32)),
                other => Err(Status::invalid_argument(format!("unexpected {other:?}"))),
            }
        },
    ));

    // Interleave sends and reads to show responses are live.
    for name in ["Jack", "Rose", "Cal"] {
        requests.send(TestProtocol::Request(name.into())).await.unwrap();
        let response = responses.recv().await.unwrap();
        assert_eq!(response, Some(TestProtocol::Response(name.len() as i32)));
    }
    requests.close().await.unwrap();

    duplex.await.unwrap().unwrap();
    closer.close().await.unwrap();
    assert_eq!(responses.recv().await.unwrap(), None);
}

#[tokio::test]
async fn test_map_duplex_propagates_handler_error() {
    let call_id = CallId::new();
    let (mut requests, inbound) =
        Channel::<TestProtocol>::new_in_memory(call_id, BackpressurePolicy::default());
    let (outbound, _responses) =
        Channel::<TestProtocol>::new_in_memory(call_id, BackpressurePolicy::default());
    let (_guard, ctx) = context(call_id, None);

    let duplex = tokio::spawn(map_duplex(
        ctx,
        inbound,
        outbound,
        BackpressurePolicy::default(),
        |_message| async move { Err::<TestProtocol, _>(Status::invalid_argument("bad")) },
    ));

    requests.send(TestProtocol::Response(7)).await.unwrap();
    let status = duplex.await.unwrap().unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn test_map_duplex_propagates_inbound_trailer() {
    let call_id = CallId::new();
    let (requests, inbound) =
        Channel::<TestProtocol>::new_in_memory(call_id, BackpressurePolicy::default());
    let (outbound, _responses) =
        Channel::<TestProtocol>::new_in_memory(call_id, BackpressurePolicy::default());

    let (_guard, ctx) = context(call_id, None);

    drop(requests);
    let status = map_duplex(ctx, inbound, outbound, BackpressurePolicy::default(), |m| async move {
        Ok(m)
    })
    .await
    .unwrap_err();
    assert_eq!(status.code(), Code::Cancelled);
}

#[tokio::test]
async fn test_map_duplex_stops_when_caller_leaves_with_requests_open() {
    let call_id = CallId::new();
    let (mut requests, inbound) =
        Channel::<TestProtocol>::new_in_memory(call_id, BackpressurePolicy::default());
    let (outbound, mut responses) =
        Channel::<TestProtocol>::new_in_memory(call_id, BackpressurePolicy::default());
    let (guard, ctx) = context(call_id, None);

    let duplex = tokio::spawn(map_duplex(
        ctx,
        inbound,
        outbound,
        BackpressurePolicy::default(),
        |message| async move { Ok(message) },
    ));
    requests.send(TestProtocol::Request("Jack".into())).await.unwrap();
    assert!(responses.recv().await.unwrap().is_some());

    // The response half goes away; the request half stays open and idle.
    drop(responses);
    drop(guard);

    let status = tokio::time::timeout(Duration::from_secs(5), duplex)
        .await
        .expect("duplex loops stayed parked")
        .unwrap()
        .unwrap_err();
    assert_eq!(status.code(), Code::Cancelled);
    assert!(requests.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_map_duplex_ends_at_deadline() {
    let call_id = CallId::new();
    let (mut requests, inbound) =
        Channel::<TestProtocol>::new_in_memory(call_id, BackpressurePolicy::default());
    let (outbound, mut responses) =
        Channel::<TestProtocol>::new_in_memory(call_id, BackpressurePolicy::default());
    let (_guard, ctx) = context(call_id, Some(Deadline::after(Duration::from_secs(1))));

    let duplex = tokio::spawn(map_duplex(
        ctx,
        inbound,
        outbound,
        BackpressurePolicy::default(),
        |message| async move { Ok(message) },
    ));
    requests.send(TestProtocol::Request("Jack".into())).await.unwrap();
    assert!(responses.recv().await.unwrap().is_some());

    tokio::time::advance(Duration::from_secs(2)).await;
    let status = duplex.await.unwrap().unwrap_err();
    assert_eq!(status.code(), Code::DeadlineExceeded);
}
