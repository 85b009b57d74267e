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

//! Stream directions for RPC calls.
//!
//! Every call owns two directions: inbound (caller to handler) and outbound
//! (handler to caller). A direction is a typed, single-producer,
//! single-consumer FIFO queue that ends with exactly one terminal signal.
//!
//! # Key Features
//!
//! - **Type Safety**: each direction is typed to a [`Message`] family
//! - **FIFO Ordering**: sequence numbers are assigned on send and verified on receive
//! - **Distinct Terminals**: a clean end ([`Frame::End`]) and an error trailer
//!   ([`Frame::Abort`]) are mutually exclusive, and a producer that disappears
//!   without either is reported as `CANCELLED`
//! - **Backpressure**: bounded directions suspend the sender while full
//!
//! # Architecture
//!
//! - [`Channel`]: factory for one direction
//! - [`StreamSender`]: the single producer (not `Clone`)
//! - [`StreamReceiver`]: the single consumer
//! - [`StreamCloser`]: terminal-only handle held by the call runtime
//! - [`map_duplex`]: independent read and write loops for bidirectional calls
//! - [`CallId`]: identifies the call both directions belong to
//!
//! # The Message Trait
//!
//! ```rust
//! use quadrpc::channel::Message;
//!
//! #[derive(Debug, Clone)]
//! enum CounterProtocol {
//!     AddRequest { amount: i64 },
//!     AddResponse { total: i64 },
//! }
//!
//! impl Message for CounterProtocol {
//!     fn method_name(&self) -> &'static str {
//!         "counter.Counter/Add"
//!     }
//!
//!     fn is_request(&self) -> bool {
//!         matches!(self, Self::AddRequest { .. })
//!     }
//! }
//! ```

mod duplex;
mod error;
mod frame;
mod id;
mod stream;

#[cfg(test)]
mod tests;

pub use duplex::map_duplex;
pub use error::ChannelError;
pub use frame::Frame;
pub use id::CallId;
pub use stream::{Channel, StreamCloser, StreamReceiver, StreamSender};

/// A family of request and response messages exchanged by one service.
///
/// Messages are immutable values moved between tasks; nothing is shared
/// between two messages.
pub trait Message: Send + std::fmt::Debug + 'static {
    /// Returns the fully qualified method this message belongs to.
    fn method_name(&self) -> &'static str;

    /// Returns `true` if the message travels from caller to handler.
    fn is_request(&self) -> bool;

    /// Returns `true` if the message travels from handler to caller.
    fn is_response(&self) -> bool {
        !self.is_request()
    }
}
