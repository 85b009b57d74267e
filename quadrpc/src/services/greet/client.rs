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

//! Typed caller for the greet service.

use super::messages::{
    GREET, GREET_EVERYONE, GREET_MANY_TIMES, GREET_WITH_DEADLINE, GreetProtocol, Greeting,
    LONG_GREET,
};
use crate::channel::Message;
use crate::client::{CallOptions, Client, RequestSink, ResponseStream};
use crate::error::QuadrpcError;
use crate::status::Status;
use futures_util::Stream;
use std::time::Duration;

/// Client stub for the greet service.
#[derive(Debug, Clone)]
pub struct GreetClient {
    client: Client<GreetProtocol>,
}

impl GreetClient {
    /// Wraps a connected client.
    #[must_use]
    pub const fn new(client: Client<GreetProtocol>) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn inner(&self) -> &Client<GreetProtocol> {
        &self.client
    }

    /// Calls `Greet`.
    ///
    /// # Errors
    ///
    /// See [`Client::unary`].
    pub async fn greet(&self, greeting: Greeting, options: CallOptions) -> Result<String, QuadrpcError> {
        let response = self
            .client
            .unary(GREET, GreetProtocol::GreetRequest { greeting }, options)
            .await?;
        expect_result(response, GREET)
    }

    /// Calls `GreetManyTimes` and returns the result stream.
    ///
    /// # Errors
    ///
    /// See [`Client::server_streaming`].
    pub async fn greet_many_times(
        &self,
        greeting: Greeting,
        options: CallOptions,
    ) -> Result<GreetResults, QuadrpcError> {
        let responses = self
            .client
            .server_streaming(
                GREET_MANY_TIMES,
                GreetProtocol::GreetManyTimesRequest { greeting },
                options,
            )
            .await?;
        Ok(GreetResults::new(GREET_MANY_TIMES, responses))
    }

    /// Streams every greeting to `LongGreet` and returns the combined result.
    ///
    /// # Errors
    ///
    /// The handler's status, a caller-side timeout, or a connection failure.
    pub async fn long_greet<I>(&self, greetings: I, options: CallOptions) -> Result<String, QuadrpcError>
    where
        I: IntoIterator<Item = Greeting>,
    {
        let mut call = self.client.client_streaming(LONG_GREET, options).await?;
        for greeting in greetings {
            if let Err(error) = call.send(GreetProtocol::LongGreetRequest { greeting }).await {
                if error.is_closed() {
                    break;
                }
                return Err(error);
            }
        }
        expect_result(call.close_and_recv().await?, LONG_GREET)
    }

    /// Starts `GreetEveryone`.
    ///
    /// The returned halves are independent and can be driven from separate
    /// tasks.
    ///
    /// # Errors
    ///
    /// See [`Client::bidi_streaming`].
    pub async fn greet_everyone(
        &self,
        options: CallOptions,
    ) -> Result<(GreetingSender, GreetResults), QuadrpcError> {
        let (requests, responses) = self.client.bidi_streaming(GREET_EVERYONE, options).await?;
        Ok((
            GreetingSender { requests },
            GreetResults::new(GREET_EVERYONE, responses),
        ))
    }

    /// Calls `GreetWithDeadline` with the given timeout.
    ///
    /// # Errors
    ///
    /// [`QuadrpcError::Timeout`] if `timeout` elapsed on the caller side, or a
    /// `DEADLINE_EXCEEDED`/`CANCELLED` status if the handler noticed first.
    pub async fn greet_with_deadline(
        &self,
        greeting: Greeting,
        timeout: Duration,
    ) -> Result<String, QuadrpcError> {
        let response = self
            .client
            .unary(
                GREET_WITH_DEADLINE,
                GreetProtocol::GreetWithDeadlineRequest { greeting },
                CallOptions::new().with_timeout(timeout),
            )
            .await?;
        expect_result(response, GREET_WITH_DEADLINE)
    }
}

/// Writer half of `GreetEveryone`.
#[derive(Debug)]
pub struct GreetingSender {
    requests: RequestSink<GreetProtocol>,
}

impl GreetingSender {
    /// Sends one greeting.
    ///
    /// # Errors
    ///
    /// See [`RequestSink::send`].
    pub async fn send(&mut self, greeting: Greeting) -> Result<(), QuadrpcError> {
        self.requests
            .send(GreetProtocol::GreetEveryoneRequest { greeting })
            .await
    }

    /// Signals that no more greetings follow.
    ///
    /// # Errors
    ///
    /// See [`RequestSink::close_send`].
    pub async fn close(self) -> Result<(), QuadrpcError> {
        self.requests.close_send().await
    }
}

/// Result strings of a streaming greet call.
#[derive(Debug)]
pub struct GreetResults {
    method: &'static str,
    responses: ResponseStream<GreetProtocol>,
}

impl GreetResults {
    const fn new(method: &'static str, responses: ResponseStream<GreetProtocol>) -> Self {
        Self { method, responses }
    }

    /// Receives the next result; `Ok(None)` is the clean end.
    ///
    /// # Errors
    ///
    /// See [`ResponseStream::recv`]. A response of another method is an
    /// `INTERNAL` protocol violation.
    pub async fn recv(&mut self) -> Result<Option<String>, QuadrpcError> {
        match self.responses.recv().await? {
            Some(response) => expect_result(response, self.method).map(Some),
            None => Ok(None),
        }
    }

    /// Reads every remaining result.
    ///
    /// # Errors
    ///
    /// The first error encountered; earlier results are discarded.
    pub async fn collect(mut self) -> Result<Vec<String>, QuadrpcError> {
        let mut results = Vec::new();
        while let Some(result) = self.recv().await? {
            results.push(result);
        }
        Ok(results)
    }

    /// Turns the results into a [`Stream`] that ends after the clean end or
    /// the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, QuadrpcError>> + Send + 'static {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut results = state?;
            match results.recv().await {
                Ok(Some(result)) => Some((Ok(result), Some(results))),
                Ok(None) => None,
                Err(error) => Some((Err(error), None)),
            }
        })
    }
}

fn expect_result(response: GreetProtocol, method: &'static str) -> Result<String, QuadrpcError> {
    let received = response.method_name();
    match response.into_result() {
        Some(result) if received == method => Ok(result),
        _ => Err(QuadrpcError::from(Status::internal(format!(
            "protocol violation: expected {method} response, got {received} message"
        )))),
    }
}
