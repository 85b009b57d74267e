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

//! Greet service messages.

use crate::channel::Message;

/// `greet.GreetService/Greet` (unary).
pub const GREET: &str = "greet.GreetService/Greet";
/// `greet.GreetService/GreetManyTimes` (server streaming).
pub const GREET_MANY_TIMES: &str = "greet.GreetService/GreetManyTimes";
/// `greet.GreetService/LongGreet` (client streaming).
pub const LONG_GREET: &str = "greet.GreetService/LongGreet";
/// `greet.GreetService/GreetEveryone` (bidirectional).
pub const GREET_EVERYONE: &str = "greet.GreetService/GreetEveryone";
/// `greet.GreetService/GreetWithDeadline` (unary, deadline bounded).
pub const GREET_WITH_DEADLINE: &str = "greet.GreetService/GreetWithDeadline";

/// The person being greeted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Greeting {
    /// Given name; the only part used in results.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl Greeting {
    /// Creates a greeting.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Every message exchanged by the greet service.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GreetProtocol {
    /// Request to call `Greet`.
    GreetRequest {
        /// Who to greet.
        greeting: Greeting,
    },
    /// Response from `Greet`.
    GreetResponse {
        /// The greeting text.
        result: String,
    },
    /// Request to call `GreetManyTimes`.
    GreetManyTimesRequest {
        /// Who to greet.
        greeting: Greeting,
    },
    /// One response from `GreetManyTimes`.
    GreetManyTimesResponse {
        /// The greeting text.
        result: String,
    },
    /// One request to `LongGreet`.
    LongGreetRequest {
        /// Who to greet.
        greeting: Greeting,
    },
    /// Response from `LongGreet`.
    LongGreetResponse {
        /// The greeting text.
        result: String,
    },
    /// One request to `GreetEveryone`.
    GreetEveryoneRequest {
        /// Who to greet.
        greeting: Greeting,
    },
    /// One response from `GreetEveryone`.
    GreetEveryoneResponse {
        /// The greeting text.
        result: String,
    },
    /// Request to call `GreetWithDeadline`.
    GreetWithDeadlineRequest {
        /// Who to greet.
        greeting: Greeting,
    },
    /// Response from `GreetWithDeadline`.
    GreetWithDeadlineResponse {
        /// The greeting text.
        result: String,
    },
}

impl GreetProtocol {
    /// Builds the request variant of `method`.
    ///
    /// Returns `None` for a method this service does not have.
    #[must_use]
    pub fn request(method: &str, greeting: Greeting) -> Option<Self> {
        let request = match method {
            GREET => Self::GreetRequest { greeting },
            GREET_MANY_TIMES => Self::GreetManyTimesRequest { greeting },
            LONG_GREET => Self::LongGreetRequest { greeting },
            GREET_EVERYONE => Self::GreetEveryoneRequest { greeting },
            GREET_WITH_DEADLINE => Self::GreetWithDeadlineRequest { greeting },
            _ => return None,
        };
        Some(request)
    }

    /// Builds the response variant of `method`.
    #[must_use]
    pub fn response(method: &str, result: String) -> Option<Self> {
        let response = match method {
            GREET => Self::GreetResponse { result },
            GREET_MANY_TIMES => Self::GreetManyTimesResponse { result },
            LONG_GREET => Self::LongGreetResponse { result },
            GREET_EVERYONE => Self::GreetEveryoneResponse { result },
            GREET_WITH_DEADLINE => Self::GreetWithDeadlineResponse { result },
            _ => return None,
        };
        Some(response)
    }

    /// Extracts the greeting from a request.
    #[must_use]
    pub fn into_greeting(self) -> Option<Greeting> {
        match self {
            Self::GreetRequest { greeting }
            | Self::GreetManyTimesRequest { greeting }
            | Self::LongGreetRequest { greeting }
            | Self::GreetEveryoneRequest { greeting }
            | Self::GreetWithDeadlineRequest { greeting } => Some(greeting),
            _ => None,
        }
    }

    /// Extracts the result from a response.
    #[must_use]
    pub fn into_result(self) -> Option<String> {
        match self {
            Self::GreetResponse { result }
            | Self::GreetManyTimesResponse { result }
            | Self::LongGreetResponse { result }
            | Self::GreetEveryoneResponse { result }
            | Self::GreetWithDeadlineResponse { result } => Some(result),
            _ => None,
        }
    }
}

impl Message for GreetProtocol {
    fn method_name(&self) -> &'static str {
        match self {
            Self::GreetRequest { .. } | Self::GreetResponse { .. } => GREET,
            Self::GreetManyTimesRequest { .. } | Self::GreetManyTimesResponse { .. } => {
                GREET_MANY_TIMES
            }
            Self::LongGreetRequest { .. } | Self::LongGreetResponse { .. } => LONG_GREET,
            Self::GreetEveryoneRequest { .. } | Self::GreetEveryoneResponse { .. } => {
                GREET_EVERYONE
            }
            Self::GreetWithDeadlineRequest { .. } | Self::GreetWithDeadlineResponse { .. } => {
                GREET_WITH_DEADLINE
            }
        }
    }

    fn is_request(&self) -> bool {
        matches!(
            self,
            Self::GreetRequest { .. }
                | Self::GreetManyTimesRequest { .. }
                | Self::LongGreetRequest { .. }
                | Self::GreetEveryoneRequest { .. }
                | Self::GreetWithDeadlineRequest { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_match_methods() {
        for method in [GREET, GREET_MANY_TIMES, LONG_GREET, GREET_EVERYONE, GREET_WITH_DEADLINE] {
            let request = GreetProtocol::request(method, Greeting::new("Jack", "Dawson")).unwrap();
            assert_eq!(request.method_name(), method);
            assert!(request.is_request());
            assert_eq!(request.into_greeting().unwrap().first_name, "Jack");

            let response = GreetProtocol::response(method, "Hello Jack".into()).unwrap();
            assert_eq!(response.method_name(), method);
            assert!(response.is_response());
            assert_eq!(response.clone().into_greeting(), None);
            assert_eq!(response.into_result().as_deref(), Some("Hello Jack"));
        }
        assert_eq!(GreetProtocol::request("greet.GreetService/Nope", Greeting::default()), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_shape() {
        let request = GreetProtocol::GreetRequest {
            greeting: Greeting::new("Rose", "DeWitt"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["GreetRequest"]["greeting"]["first_name"], "Rose");
        let back: GreetProtocol = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }
}
