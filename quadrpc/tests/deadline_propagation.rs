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

//! Deadline and cancellation propagation from caller to handler.
//!
//! Time is paused so the 3 x 1 s handler runs instantly and deterministically.

use quadrpc::services::greet::{
    GREET_WITH_DEADLINE, GreetClient, GreetProtocol, GreetService, Greeting, greet_dispatcher,
};
use quadrpc::{
    CallOptions, ClientConfig, Code, Connection, Dispatcher, ErrorOrigin, QuadrpcError, Server,
    ServerConfig, Status,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn connect(client_config: ClientConfig) -> (GreetClient, Connection<GreetProtocol>) {
    let server = Server::new(greet_dispatcher(Arc::new(GreetService::default())));
    let connection = Connection::open(server, client_config).unwrap();
    (GreetClient::new(connection.client().clone()), connection)
}

#[tokio::test(start_paused = true)]
async fn test_short_timeout_fails_with_timing_error() {
    let (greet, connection) = connect(ClientConfig::default());
    let (client, server) = connection.into_parts();
    let server_metrics = Arc::clone(server.metrics());

    let started = Instant::now();
    let error = greet
        .greet_with_deadline(Greeting::new("Jack", "Dawson"), Duration::from_millis(1500))
        .await
        .unwrap_err();

    assert!(error.is_timing(), "unexpected error {error:?}");
    assert!(matches!(
        error.code(),
        Code::DeadlineExceeded | Code::Cancelled
    ));
    assert!(started.elapsed() < Duration::from_secs(3));

    let client_metrics = Arc::clone(greet.inner().metrics());
    drop(greet);
    drop(client);
    server.join().await;

    // The call was torn down at the deadline instead of finishing.
    assert_eq!(server_metrics.total_calls_completed(), 0);
    assert_eq!(
        server_metrics.total_calls_expired() + server_metrics.total_calls_cancelled(),
        1
    );
    assert_eq!(client_metrics.total_calls_expired(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_long_timeout_completes() {
    let (greet, connection) = connect(ClientConfig::default());

    let started = Instant::now();
    let result = greet
        .greet_with_deadline(Greeting::new("Jack", "Dawson"), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(result, "Hello Jack");
    assert!(started.elapsed() >= Duration::from_secs(3));

    connection.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_caller_timeout_is_local_and_carries_duration() {
    let (greet, connection) = connect(
        ClientConfig::default().with_default_timeout(Some(Duration::from_millis(500))),
    );

    // No per-call timeout: the client default applies.
    let error = greet
        .inner()
        .unary(
            GREET_WITH_DEADLINE,
            GreetProtocol::GreetWithDeadlineRequest {
                greeting: Greeting::new("Rose", "DeWitt"),
            },
            CallOptions::new(),
        )
        .await
        .unwrap_err();

    match &error {
        QuadrpcError::Timeout {
            method, timeout, ..
        } => {
            assert_eq!(*method, GREET_WITH_DEADLINE);
            assert_eq!(*timeout, Duration::from_millis(500));
        }
        other => panic!("expected a caller timeout, got {other:?}"),
    }
    assert_eq!(error.origin(), ErrorOrigin::Caller);
    assert_eq!(greet.inner().metrics().total_local_timeouts(), 1);

    connection.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_handler_reported_deadline_is_distinct_from_caller_timeout() {
    const SLOW: &str = "greet.GreetService/GreetWithDeadline";

    // The handler treats half of its remaining budget as its own deadline and
    // reports DEADLINE_EXCEEDED well before the caller gives up.
    let dispatcher = Dispatcher::<GreetProtocol>::builder()
        .unary(SLOW, |ctx, _request| async move {
            let budget = ctx.remaining().unwrap_or_default() / 2;
            tokio::time::sleep(budget).await;
            Err::<GreetProtocol, _>(Status::deadline_exceeded("budget spent"))
        })
        .build();
    let connection = Connection::open(Server::new(dispatcher), ClientConfig::default()).unwrap();

    let error = connection
        .client()
        .unary(
            SLOW,
            GreetProtocol::GreetWithDeadlineRequest {
                greeting: Greeting::new("Cal", "Hockley"),
            },
            CallOptions::new().with_timeout(Duration::from_secs(4)),
        )
        .await
        .unwrap_err();

    assert!(error.is_status());
    assert!(!error.is_timeout());
    assert_eq!(error.code(), Code::DeadlineExceeded);
    assert_eq!(error.origin(), ErrorOrigin::Handler);

    connection.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_handler_sees_deadline_from_caller() {
    const REMAINING: &str = "greet.GreetService/Greet";

    let dispatcher = Dispatcher::<GreetProtocol>::builder()
        .unary(REMAINING, |ctx, _request| async move {
            let remaining = ctx.remaining().unwrap_or_default();
            Ok::<_, Status>(GreetProtocol::GreetResponse {
                result: remaining.as_millis().to_string(),
            })
        })
        .build();
    let connection = Connection::open(Server::new(dispatcher), ClientConfig::default()).unwrap();

    let response = connection
        .client()
        .unary(
            REMAINING,
            GreetProtocol::GreetRequest {
                greeting: Greeting::default(),
            },
            CallOptions::new().with_timeout(Duration::from_secs(2)),
        )
        .await
        .unwrap();
    let remaining_ms: u64 = response.into_result().unwrap().parse().unwrap();
    assert!(remaining_ms > 1_000 && remaining_ms <= 2_000, "remaining {remaining_ms}ms");

    connection.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_expired_call_is_torn_down_when_handler_ignores_context() {
    const STUCK: &str = "greet.GreetService/GreetWithDeadline";
    const QUICK: &str = "greet.GreetService/Greet";

    let dispatcher = Dispatcher::<GreetProtocol>::builder()
        .unary(STUCK, |_ctx, _request| async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, Status>(GreetProtocol::GreetWithDeadlineResponse {
                result: "too late".to_string(),
            })
        })
        .unary(QUICK, |_ctx, _request| async move {
            Ok::<_, Status>(GreetProtocol::GreetResponse {
                result: "Hello".to_string(),
            })
        })
        .build();
    let server = Server::with_config(
        dispatcher,
        ServerConfig::default().with_max_concurrent_calls(Some(1)),
    )
    .unwrap();
    let server_metrics = Arc::clone(server.metrics());
    let connection = Connection::open(server, ClientConfig::default()).unwrap();

    let error = connection
        .client()
        .unary(
            STUCK,
            GreetProtocol::GreetWithDeadlineRequest {
                greeting: Greeting::new("Jack", "Dawson"),
            },
            CallOptions::new().with_timeout(Duration::from_secs(1)),
        )
        .await
        .unwrap_err();
    assert!(error.is_timing(), "unexpected error {error:?}");

    // The only slot is free again, long before the handler would have woken.
    let started = Instant::now();
    let response = connection
        .client()
        .unary(
            QUICK,
            GreetProtocol::GreetRequest {
                greeting: Greeting::new("Rose", "DeWitt"),
            },
            CallOptions::new().with_timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap();
    assert_eq!(response.into_result().as_deref(), Some("Hello"));
    assert!(started.elapsed() < Duration::from_secs(5));

    connection.shutdown().await;
    assert_eq!(server_metrics.active_calls(), 0);
    assert_eq!(server_metrics.total_calls_completed(), 1);
    assert_eq!(
        server_metrics.total_calls_expired() + server_metrics.total_calls_cancelled(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_timeout_is_accepted() {
    let (greet, connection) = connect(ClientConfig::default());

    let result = greet
        .greet(
            Greeting::new("Jack", "Dawson"),
            CallOptions::new().with_timeout(Duration::MAX),
        )
        .await
        .unwrap();
    assert_eq!(result, "Hello Jack");

    let result = greet
        .greet_with_deadline(Greeting::new("Rose", "DeWitt"), Duration::MAX)
        .await
        .unwrap();
    assert_eq!(result, "Hello Rose");

    connection.shutdown().await;
}
