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

#![doc = include_str!("../../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! ## Architecture
//!
//! - **[`channel`]**: typed stream directions with a single terminal signal
//! - **[`context`]**: per-call deadline, cancellation and state
//! - **[`dispatch`]**: method routing for the four call shapes
//! - **[`server`]**: accept loop, one task per call
//! - **[`client`]**: caller API with caller-side deadlines
//! - **[`connection`]**: wires a client to a running server in process
//! - **[`backpressure`]**: per-direction buffering policy
//! - **[`observability`]**: call metrics and structured logging
//! - **[`services`]**: the greet and blog services built on the core

pub mod backpressure;
pub mod channel;
pub mod client;
pub mod config;
pub mod connection;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod observability;
pub mod server;
pub mod services;
pub mod status;

pub use backpressure::BackpressurePolicy;
pub use channel::{CallId, ChannelError, Message, StreamReceiver, StreamSender};
pub use client::{CallOptions, Client, ClientStreamingCall, RequestSink, ResponseStream};
pub use config::{ClientConfig, ConfigError, ServerConfig};
pub use connection::Connection;
pub use context::{CallContext, CallState, Deadline};
pub use dispatch::{CallShape, Dispatcher, DispatcherBuilder, MethodDescriptor};
pub use error::{ErrorOrigin, QuadrpcError};
pub use observability::CallMetrics;
pub use server::{IncomingCall, Server, ServerHandle};
pub use status::{Code, Status};
