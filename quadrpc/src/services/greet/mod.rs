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

//! The greet service: one method for each call shape.
//!
//! | Method | Shape | Result |
//! |---|---|---|
//! | `Greet` | unary | `"Hello {first}"` |
//! | `GreetManyTimes` | server streaming | `"Hello {first} number {i}"`, i in `0..10` |
//! | `LongGreet` | client streaming | `"Hello {first}! "` for each request, concatenated |
//! | `GreetEveryone` | bidirectional | `"Hello {first}! "` per request, live |
//! | `GreetWithDeadline` | unary | `"Hello {first}"` after three one-second steps |
//!
//! `GreetWithDeadline` checks the call deadline before every step and gives
//! up with `DEADLINE_EXCEEDED` once it has passed.

mod client;
mod messages;
mod server;

pub use client::{GreetClient, GreetResults, GreetingSender};
pub use messages::{
    GREET, GREET_EVERYONE, GREET_MANY_TIMES, GREET_WITH_DEADLINE, GreetProtocol, Greeting,
    LONG_GREET,
};
pub use server::{GreetConfig, GreetServer, GreetService, greet_dispatcher};
