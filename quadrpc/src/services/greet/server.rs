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

//! Greet service handlers.

use super::messages::{
    GREET, GREET_EVERYONE, GREET_MANY_TIMES, GREET_WITH_DEADLINE, GreetProtocol, Greeting,
    LONG_GREET,
};
use crate::backpressure::BackpressurePolicy;
use crate::channel::{Message, StreamReceiver, StreamSender, map_duplex};
use crate::config::ConfigError;
use crate::context::CallContext;
use crate::dispatch::Dispatcher;
use crate::status::Status;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Handler side of the greet service.
///
/// Streaming methods receive the raw stream directions; the dispatcher
/// finishes the outbound direction from the returned result.
#[async_trait]
pub trait GreetServer: Send + Sync + 'static {
    /// Returns `"Hello {first_name}"`.
    async fn greet(&self, ctx: CallContext, greeting: Greeting) -> Result<String, Status>;

    /// Sends `"Hello {first_name} number {i}"` for each `i` in order.
    async fn greet_many_times(
        &self,
        ctx: CallContext,
        greeting: Greeting,
        results: StreamSender<GreetProtocol>,
    ) -> Result<(), Status>;

    /// Greets every inbound person and returns the concatenation.
    async fn long_greet(
        &self,
        ctx: CallContext,
        requests: StreamReceiver<GreetProtocol>,
    ) -> Result<String, Status>;

    /// Answers each inbound greeting as it arrives.
    async fn greet_everyone(
        &self,
        ctx: CallContext,
        requests: StreamReceiver<GreetProtocol>,
        results: StreamSender<GreetProtocol>,
    ) -> Result<(), Status>;

    /// Does slow work in steps, checking the deadline before each step.
    async fn greet_with_deadline(
        &self,
        ctx: CallContext,
        greeting: Greeting,
    ) -> Result<String, Status>;
}

/// Tunables for [`GreetService`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GreetConfig {
    /// Number of responses sent by `GreetManyTimes`.
    ///
    /// Default: 10
    pub many_times_count: usize,

    /// Number of work steps in `GreetWithDeadline`.
    ///
    /// Default: 3
    pub deadline_steps: u32,

    /// Duration of each `GreetWithDeadline` step.
    ///
    /// Default: 1 second
    pub step_duration: Duration,

    /// Hand-off policy between the read and write loops of `GreetEveryone`.
    pub backpressure: BackpressurePolicy,
}

impl Default for GreetConfig {
    fn default() -> Self {
        Self {
            many_times_count: 10,
            deadline_steps: 3,
            step_duration: Duration::from_secs(1),
            backpressure: BackpressurePolicy::default(),
        }
    }
}

impl GreetConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `GreetManyTimes` response count.
    #[must_use]
    pub const fn with_many_times_count(mut self, count: usize) -> Self {
        self.many_times_count = count;
        self
    }

    /// Sets the `GreetWithDeadline` step count and duration.
    #[must_use]
    pub const fn with_deadline_steps(mut self, steps: u32, step_duration: Duration) -> Self {
        self.deadline_steps = steps;
        self.step_duration = step_duration;
        self
    }

    /// Sets the `GreetEveryone` hand-off policy.
    #[must_use]
    pub const fn with_backpressure(mut self, policy: BackpressurePolicy) -> Self {
        self.backpressure = policy;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the hand-off policy is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backpressure.validate().map_err(ConfigError::Backpressure)
    }
}

/// The stock greet implementation.
#[derive(Debug, Clone, Default)]
pub struct GreetService {
    config: GreetConfig,
}

impl GreetService {
    /// Creates a service with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid.
    pub fn new(config: GreetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GreetConfig {
        &self.config
    }
}

#[async_trait]
impl GreetServer for GreetService {
    async fn greet(&self, _ctx: CallContext, greeting: Greeting) -> Result<String, Status> {
        debug!(first_name = %greeting.first_name, "starting Greet");
        Ok(format!("Hello {}", greeting.first_name))
    }

    async fn greet_many_times(
        &self,
        ctx: CallContext,
        greeting: Greeting,
        mut results: StreamSender<GreetProtocol>,
    ) -> Result<(), Status> {
        debug!(first_name = %greeting.first_name, "starting GreetManyTimes");
        let count = self.config.many_times_count;
        let first_name = greeting.first_name;

        // The worker owns the sender; each result is sent before the next is built.
        let worker = tokio::spawn(async move {
            for index in 0..count {
                ctx.check()?;
                let result = format!("Hello {first_name} number {index}");
                results
                    .send(GreetProtocol::GreetManyTimesResponse { result })
                    .await?;
            }
            Ok::<_, Status>(())
        });

        worker
            .await
            .map_err(|join_error| Status::internal(format!("GreetManyTimes worker failed: {join_error}")))?
    }

    async fn long_greet(
        &self,
        ctx: CallContext,
        mut requests: StreamReceiver<GreetProtocol>,
    ) -> Result<String, Status> {
        debug!("starting LongGreet");
        let mut result = String::new();
        while let Some(request) = requests.recv().await? {
            ctx.check()?;
            let greeting = expect_greeting(request, LONG_GREET)?;
            result.push_str(&format!("Hello {}! ", greeting.first_name));
        }
        Ok(result)
    }

    async fn greet_everyone(
        &self,
        ctx: CallContext,
        requests: StreamReceiver<GreetProtocol>,
        results: StreamSender<GreetProtocol>,
    ) -> Result<(), Status> {
        debug!("starting GreetEveryone");
        map_duplex(ctx, requests, results, self.config.backpressure, |request| async move {
            let greeting = expect_greeting(request, GREET_EVERYONE)?;
            Ok::<_, Status>(GreetProtocol::GreetEveryoneResponse {
                result: format!("Hello {}! ", greeting.first_name),
            })
        })
        .await
    }

    async fn greet_with_deadline(
        &self,
        ctx: CallContext,
        greeting: Greeting,
    ) -> Result<String, Status> {
        debug!(first_name = %greeting.first_name, "starting GreetWithDeadline");
        for step in 0..self.config.deadline_steps {
            if let Err(status) = ctx.check() {
                warn!(step, code = %status.code(), "caller deadline passed, abandoning");
                return Err(status);
            }
            tokio::time::sleep(self.config.step_duration).await;
        }
        Ok(format!("Hello {}", greeting.first_name))
    }
}

/// Accepts `message` only if it is a request of `method`.
fn expect_greeting(message: GreetProtocol, method: &'static str) -> Result<Greeting, Status> {
    if message.method_name() != method {
        return Err(Status::invalid_argument(format!(
            "{method} cannot accept {} message",
            message.method_name()
        )));
    }
    message
        .into_greeting()
        .ok_or_else(|| Status::invalid_argument(format!("{method} expects a request message")))
}

fn respond(method: &'static str, result: String) -> Result<GreetProtocol, Status> {
    GreetProtocol::response(method, result)
        .ok_or_else(|| Status::internal(format!("{method} has no response variant")))
}

/// Builds a dispatcher that routes every greet method to `service`.
pub fn greet_dispatcher<S>(service: Arc<S>) -> Dispatcher<GreetProtocol>
where
    S: GreetServer + ?Sized,
{
    let greet = Arc::clone(&service);
    let many_times = Arc::clone(&service);
    let long = Arc::clone(&service);
    let everyone = Arc::clone(&service);
    let with_deadline = service;

    Dispatcher::builder()
        .unary(GREET, move |ctx, request| {
            let service = Arc::clone(&greet);
            async move {
                let greeting = expect_greeting(request, GREET)?;
                respond(GREET, service.greet(ctx, greeting).await?)
            }
        })
        .server_streaming(GREET_MANY_TIMES, move |ctx, request, results| {
            let service = Arc::clone(&many_times);
            async move {
                let greeting = expect_greeting(request, GREET_MANY_TIMES)?;
                service.greet_many_times(ctx, greeting, results).await
            }
        })
        .client_streaming(LONG_GREET, move |ctx, requests| {
            let service = Arc::clone(&long);
            async move { respond(LONG_GREET, service.long_greet(ctx, requests).await?) }
        })
        .bidi_streaming(GREET_EVERYONE, move |ctx, requests, results| {
            let service = Arc::clone(&everyone);
            async move { service.greet_everyone(ctx, requests, results).await }
        })
        .unary(GREET_WITH_DEADLINE, move |ctx, request| {
            let service = Arc::clone(&with_deadline);
            async move {
                let greeting = expect_greeting(request, GREET_WITH_DEADLINE)?;
                respond(
                    GREET_WITH_DEADLINE,
                    service.greet_with_deadline(ctx, greeting).await?,
                )
            }
        })
        .build()
}
