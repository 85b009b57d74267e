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

//! In-process connection between a [`Client`] and a [`Server`].

use crate::channel::Message;
use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::QuadrpcError;
use crate::server::{Server, ServerHandle};
use tokio::sync::mpsc;
use tracing::info;

/// A running server and a client connected to it.
///
/// # Example
///
/// ```rust
/// use quadrpc::{CallOptions, ClientConfig, Connection, Server};
/// use quadrpc::services::greet::{GreetClient, GreetService, Greeting, greet_dispatcher};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), quadrpc::QuadrpcError> {
/// let server = Server::new(greet_dispatcher(Arc::new(GreetService::default())));
/// let connection = Connection::open(server, ClientConfig::default())?;
///
/// let greet = GreetClient::new(connection.client().clone());
/// let result = greet.greet(Greeting::new("Ada", "Lovelace"), CallOptions::new()).await?;
/// assert_eq!(result, "Hello Ada");
///
/// connection.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Connection<M: Message> {
    client: Client<M>,
    server: ServerHandle,
}

impl<M: Message> Connection<M> {
    /// Starts `server` and connects a client to it.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`QuadrpcError::Config`] if `client_config` is invalid.
    pub fn open(server: Server<M>, client_config: ClientConfig) -> Result<Self, QuadrpcError> {
        client_config.validate()?;

        let (calls_tx, calls_rx) = mpsc::channel(server.config().accept_queue_size);
        let response_policy = server.config().backpressure;
        info!(
            request_policy = %client_config.backpressure,
            response_policy = %response_policy,
            "connection opened"
        );

        let server = server.serve(calls_rx);
        let client = Client::new(calls_tx, client_config, response_policy);
        Ok(Self { client, server })
    }

    /// Returns the connected client.
    #[must_use]
    pub const fn client(&self) -> &Client<M> {
        &self.client
    }

    /// Returns the running server.
    #[must_use]
    pub const fn server(&self) -> &ServerHandle {
        &self.server
    }

    /// Splits the connection into its client and server.
    ///
    /// The server stops accepting once every clone of the client is dropped.
    #[must_use]
    pub fn into_parts(self) -> (Client<M>, ServerHandle) {
        (self.client, self.server)
    }

    /// Disconnects the client and waits for accepted calls to finish.
    pub async fn shutdown(self) {
        let Self { client, server } = self;
        drop(client);
        server.shutdown().await;
    }
}
