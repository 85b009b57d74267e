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


//! # Greet Service Example
//!
//! Drives every call shape of the greet service over an in-process
//! connection:
//!
//! - `Greet` (unary)
//! - `GreetManyTimes` (server streaming)
//! - `LongGreet` (client streaming)
//! - `GreetEveryone` (bidirectional, both halves on separate tasks)
//! - `GreetWithDeadline` with a generous and a tight timeout
//!
//! ## Running This Example
//!
//! ```bash
//! cargo run --example greet
//! RUST_LOG=quadrpc=debug cargo run --example greet
//! ```

use quadrpc::services::greet::{GreetClient, GreetService, Greeting, greet_dispatcher};
use quadrpc::{CallOptions, ClientConfig, Connection, Server};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Greet Service Example ===\n");

    let server = Server::new(greet_dispatcher(Arc::new(GreetService::default())));
    let connection = Connection::open(server, ClientConfig::default())?;
    let greet = GreetClient::new(connection.client().clone());

    println!("1. Unary");
    let result = greet
        .greet(Greeting::new("Stephane", "Maarek"), CallOptions::new())
        .await?;
    println!("   {result}\n");

    println!("2. Server streaming");
    let mut results = greet
        .greet_many_times(Greeting::new("Stephane", "Maarek"), CallOptions::new())
        .await?;
    while let Some(result) = results.recv().await? {
        println!("   {result}");
    }
    println!();

    println!("3. Client streaming");
    let result = greet
        .long_greet(
            [Greeting::new("Jack", ""), Greeting::new("Rose", "")],
            CallOptions::new(),
        )
        .await?;
    println!("   {result}\n");

    println!("4. Bidirectional streaming");
    let (mut sender, mut results) = greet.greet_everyone(CallOptions::new()).await?;
    let writer = tokio::spawn(async move {
        for name in ["Jack", "Rose"] {
            sender.send(Greeting::new(name, "")).await?;
        }
        sender.close().await
    });
    while let Some(result) = results.recv().await? {
        println!("   {result}");
    }
    writer.await??;
    println!();

    println!("5. Unary with deadline");
    for timeout in [Duration::from_secs(5), Duration::from_secs(1)] {
        match greet
            .greet_with_deadline(Greeting::new("Stephane", "Maarek"), timeout)
            .await
        {
            Ok(result) => println!("   {timeout:?}: {result}"),
            Err(error) if error.is_timing() => {
                println!("   {timeout:?}: timeout was hit, deadline was exceeded ({error})");
            }
            Err(error) => return Err(error.into()),
        }
    }

    let metrics = connection.client().metrics();
    println!(
        "\nClient: {} started, {} completed, {} failed",
        metrics.total_calls_started(),
        metrics.total_calls_completed(),
        metrics.total_calls_failed()
    );

    connection.shutdown().await;
    println!("\n=== Example Complete ===");
    Ok(())
}
