//! Call latency benchmarks for quadrpc
//!
//! Measures complete round trips over an in-process connection:
//! - Unary call latency
//! - Server-streaming calls of various lengths
//! - Bidirectional exchanges under different backpressure policies

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quadrpc::backpressure::BackpressurePolicy;
use quadrpc::services::greet::{
    GreetClient, GreetConfig, GreetProtocol, GreetService, Greeting, greet_dispatcher,
};
use quadrpc::{CallOptions, ClientConfig, Connection, Server, ServerConfig};
use std::sync::Arc;

fn open(config: GreetConfig, policy: BackpressurePolicy) -> (GreetClient, Connection<GreetProtocol>) {
    let service = GreetService::new(config).unwrap();
    let server = Server::with_config(
        greet_dispatcher(Arc::new(service)),
        ServerConfig::default().with_backpressure(policy),
    )
    .unwrap();
    let connection =
        Connection::open(server, ClientConfig::default().with_backpressure(policy)).unwrap();
    (GreetClient::new(connection.client().clone()), connection)
}

/// Benchmark a single unary round trip
fn bench_unary(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (greet, _connection) =
        rt.block_on(async { open(GreetConfig::default(), BackpressurePolicy::default()) });

    let greet = &greet;
    c.bench_function("unary_greet", |b| {
        b.to_async(&rt).iter(|| async move {
            greet
                .greet(Greeting::new("Jack", "Dawson"), CallOptions::new())
                .await
                .unwrap()
        });
    });
}

/// Benchmark server-streaming calls of increasing length
fn bench_server_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("server_streaming");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for count in [10, 100, 1000] {
        let (greet, _connection) = rt.block_on(async {
            open(
                GreetConfig::default().with_many_times_count(count),
                BackpressurePolicy::default(),
            )
        });
        let greet = &greet;
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.to_async(&rt).iter(|| async move {
                let results = greet
                    .greet_many_times(Greeting::new("Jack", "Dawson"), CallOptions::new())
                    .await
                    .unwrap()
                    .collect()
                    .await
                    .unwrap();
                assert_eq!(results.len(), count);
            });
        });
    }

    group.finish();
}

/// Benchmark 100-message bidirectional exchanges
fn bench_bidirectional(c: &mut Criterion) {
    let mut group = c.benchmark_group("bidirectional_100");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for (name, policy) in [
        ("bounded_1", BackpressurePolicy::Bounded(1)),
        ("bounded_100", BackpressurePolicy::Bounded(100)),
        ("unbounded", BackpressurePolicy::Unbounded),
    ] {
        let (greet, _connection) = rt.block_on(async {
            open(GreetConfig::default().with_backpressure(policy), policy)
        });
        let greet = &greet;
        group.bench_function(name, |b| {
            b.to_async(&rt).iter(|| async move {
                let (mut sender, results) = greet.greet_everyone(CallOptions::new()).await.unwrap();
                let reader = tokio::spawn(results.collect());
                for i in 0..100 {
                    sender.send(Greeting::new(format!("n{i}"), "")).await.unwrap();
                }
                sender.close().await.unwrap();
                assert_eq!(reader.await.unwrap().unwrap().len(), 100);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_unary,
    bench_server_streaming,
    bench_bidirectional
);
criterion_main!(benches);
