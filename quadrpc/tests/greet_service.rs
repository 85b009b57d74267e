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

//! End-to-end tests of the greet service over an in-process connection.
//!
//! These tests cover:
//! - All four call shapes and their result strings
//! - Routing failures (unknown method, shape mismatch)
//! - Cancellation when the caller drops a response stream, including a
//!   bidirectional call whose request half stays open
//! - Call metrics on both sides

use quadrpc::backpressure::BackpressurePolicy;
use quadrpc::services::greet::{
    GREET, GreetClient, GreetConfig, GreetProtocol, GreetService, Greeting,
    greet_dispatcher,
};
use quadrpc::{CallOptions, ClientConfig, Code, Connection, Server, ServerConfig};
use std::sync::Arc;

fn connect(config: GreetConfig, server_config: ServerConfig) -> (GreetClient, Connection<GreetProtocol>) {
    let service = GreetService::new(config).unwrap();
    let server = Server::with_config(greet_dispatcher(Arc::new(service)), server_config).unwrap();
    let connection = Connection::open(server, ClientConfig::default()).unwrap();
    (GreetClient::new(connection.client().clone()), connection)
}

fn connect_default() -> (GreetClient, Connection<GreetProtocol>) {
    connect(GreetConfig::default(), ServerConfig::default())
}

fn jack() -> Greeting {
    Greeting::new("Jack", "Dawson")
}

#[tokio::test]
async fn test_greet() {
    let (greet, connection) = connect_default();

    let result = greet.greet(jack(), CallOptions::new()).await.unwrap();
    assert_eq!(result, "Hello Jack");

    connection.shutdown().await;
}

#[tokio::test]
async fn test_greet_many_times_in_order_then_end() {
    let (greet, connection) = connect_default();

    let results = greet
        .greet_many_times(jack(), CallOptions::new())
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let expected: Vec<_> = (0..10).map(|i| format!("Hello Jack number {i}")).collect();
    assert_eq!(results, expected);

    connection.shutdown().await;
}

#[tokio::test]
async fn test_long_greet_concatenates_in_arrival_order() {
    let (greet, connection) = connect_default();

    let result = greet
        .long_greet(
            [Greeting::new("Jack", "Dawson"), Greeting::new("Rose", "DeWitt")],
            CallOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(result, "Hello Jack! Hello Rose! ");

    let empty = greet.long_greet([], CallOptions::new()).await.unwrap();
    assert_eq!(empty, "");

    connection.shutdown().await;
}

#[tokio::test]
async fn test_greet_everyone_answers_each_request_live() {
    let (greet, connection) = connect_default();
    let (mut sender, mut results) = greet.greet_everyone(CallOptions::new()).await.unwrap();

    for name in ["Jack", "Rose", "Cal"] {
        sender.send(Greeting::new(name, "")).await.unwrap();
        assert_eq!(results.recv().await.unwrap(), Some(format!("Hello {name}! ")));
    }
    sender.close().await.unwrap();
    assert_eq!(results.recv().await.unwrap(), None);

    connection.shutdown().await;
}

#[tokio::test]
async fn test_greet_everyone_halves_on_separate_tasks() {
    let (greet, connection) = connect(
        GreetConfig::default().with_backpressure(BackpressurePolicy::Bounded(1)),
        ServerConfig::default().with_backpressure(BackpressurePolicy::Bounded(1)),
    );
    let (mut sender, results) = greet.greet_everyone(CallOptions::new()).await.unwrap();

    let writer = tokio::spawn(async move {
        for i in 0..200 {
            sender.send(Greeting::new(format!("n{i}"), "")).await.unwrap();
        }
        sender.close().await.unwrap();
    });
    let reader = tokio::spawn(results.collect());

    writer.await.unwrap();
    let results = reader.await.unwrap().unwrap();
    assert_eq!(results.len(), 200);
    assert_eq!(results[0], "Hello n0! ");
    assert_eq!(results[199], "Hello n199! ");

    connection.shutdown().await;
}

#[tokio::test]
async fn test_unknown_method_is_unimplemented() {
    let (greet, connection) = connect_default();

    let error = greet
        .inner()
        .unary(
            "greet.GreetService/Farewell",
            GreetProtocol::GreetRequest { greeting: jack() },
            CallOptions::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(error.code(), Code::Unimplemented);
    assert!(error.is_status());

    connection.shutdown().await;
}

#[tokio::test]
async fn test_shape_mismatch_is_unimplemented() {
    let (greet, connection) = connect_default();

    let mut responses = greet
        .inner()
        .server_streaming(GREET, GreetProtocol::GreetRequest { greeting: jack() }, CallOptions::new())
        .await
        .unwrap();
    let error = responses.recv().await.unwrap_err();
    assert_eq!(error.code(), Code::Unimplemented);

    connection.shutdown().await;
}

#[tokio::test]
async fn test_dropping_response_stream_cancels_handler() {
    let (greet, connection) = connect(
        GreetConfig::default().with_many_times_count(10_000),
        ServerConfig::default().with_backpressure(BackpressurePolicy::Bounded(1)),
    );
    let (client, server) = connection.into_parts();
    let server_metrics = Arc::clone(server.metrics());

    let mut results = greet.greet_many_times(jack(), CallOptions::new()).await.unwrap();
    assert_eq!(results.recv().await.unwrap().as_deref(), Some("Hello Jack number 0"));
    drop(results);

    drop(greet);
    drop(client);
    server.join().await;

    assert_eq!(server_metrics.total_calls_cancelled(), 1);
    assert_eq!(server_metrics.total_calls_completed(), 0);
}

#[tokio::test]
async fn test_dropping_greet_everyone_results_ends_call_with_requests_open() {
    let (greet, connection) = connect_default();
    let (client, server) = connection.into_parts();
    let server_metrics = Arc::clone(server.metrics());

    let (mut sender, mut results) = greet.greet_everyone(CallOptions::new()).await.unwrap();
    sender.send(jack()).await.unwrap();
    assert_eq!(results.recv().await.unwrap().as_deref(), Some("Hello Jack! "));
    drop(results);

    drop(greet);
    drop(client);
    // The request half is still open and idle; the call must end anyway.
    tokio::time::timeout(std::time::Duration::from_secs(5), server.join())
        .await
        .expect("bidirectional call outlived its caller");

    assert_eq!(server_metrics.total_calls_cancelled(), 1);
    assert_eq!(server_metrics.active_calls(), 0);
    drop(sender);
}

#[tokio::test]
async fn test_metrics_on_both_sides() {
    let (greet, connection) = connect_default();
    let (client, server) = connection.into_parts();
    let server_metrics = Arc::clone(server.metrics());

    greet.greet(jack(), CallOptions::new()).await.unwrap();
    let results = greet
        .greet_many_times(jack(), CallOptions::new())
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(results.len(), 10);
    // A request variant of another method is read and rejected.
    let error = greet
        .inner()
        .unary(
            GREET,
            GreetProtocol::GreetManyTimesRequest { greeting: jack() },
            CallOptions::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(error.code(), Code::InvalidArgument);

    let client_metrics = greet.inner().metrics();
    assert_eq!(client_metrics.total_calls_started(), 3);
    assert_eq!(client_metrics.total_calls_completed(), 2);
    assert_eq!(client_metrics.total_calls_failed(), 1);
    assert_eq!(client_metrics.total_messages_sent(), 3);
    assert_eq!(client_metrics.total_messages_received(), 11);
    assert_eq!(client_metrics.active_calls(), 0);

    drop(greet);
    drop(client);
    server.join().await;

    assert_eq!(server_metrics.total_calls_started(), 3);
    assert_eq!(server_metrics.total_calls_completed(), 2);
    assert_eq!(server_metrics.total_calls_failed(), 1);
    assert_eq!(server_metrics.active_calls(), 0);
}
