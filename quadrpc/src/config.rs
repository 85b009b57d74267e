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

//! Configuration types for servers and clients.

use crate::backpressure::BackpressurePolicy;
use std::time::Duration;

/// Configuration rejected by `validate()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A field that must be non-zero was zero.
    #[error("{field} must be greater than 0")]
    Zero {
        /// The offending field.
        field: &'static str,
    },
    /// The backpressure policy is unusable.
    #[error("invalid backpressure policy: {0}")]
    Backpressure(String),
}

/// Configuration for a [`Server`](crate::server::Server).
///
/// # Examples
///
/// ```rust
/// use quadrpc::config::ServerConfig;
/// use quadrpc::backpressure::BackpressurePolicy;
///
/// let config = ServerConfig::new()
///     .with_backpressure(BackpressurePolicy::Bounded(16))
///     .with_max_concurrent_calls(Some(64));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    /// Flow control for the outbound direction of every call.
    ///
    /// Default: `Bounded(100)`
    pub backpressure: BackpressurePolicy,

    /// Number of incoming calls buffered before the connection applies
    /// backpressure to callers.
    ///
    /// Default: 128
    pub accept_queue_size: usize,

    /// Maximum number of calls handled at the same time. Calls beyond the
    /// limit wait for a slot. `None` means unlimited.
    ///
    /// Default: None
    pub max_concurrent_calls: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backpressure: BackpressurePolicy::default(),
            accept_queue_size: 128,
            max_concurrent_calls: None,
        }
    }
}

impl ServerConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outbound backpressure policy.
    #[must_use]
    pub fn with_backpressure(mut self, policy: BackpressurePolicy) -> Self {
        self.backpressure = policy;
        self
    }

    /// Sets the accept queue size.
    #[must_use]
    pub fn with_accept_queue_size(mut self, size: usize) -> Self {
        self.accept_queue_size = size;
        self
    }

    /// Sets the concurrent call limit.
    #[must_use]
    pub fn with_max_concurrent_calls(mut self, max: Option<usize>) -> Self {
        self.max_concurrent_calls = max;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backpressure.validate().map_err(ConfigError::Backpressure)?;
        if self.accept_queue_size == 0 {
            return Err(ConfigError::Zero {
                field: "accept_queue_size",
            });
        }
        if self.max_concurrent_calls == Some(0) {
            return Err(ConfigError::Zero {
                field: "max_concurrent_calls",
            });
        }
        Ok(())
    }
}

/// Configuration for a [`Client`](crate::client::Client).
///
/// # Examples
///
/// ```rust
/// use quadrpc::config::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new().with_default_timeout(Some(Duration::from_secs(3)));
/// assert_eq!(config.default_timeout, Some(Duration::from_secs(3)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientConfig {
    /// Timeout applied to calls that do not set one in their
    /// [`CallOptions`](crate::client::CallOptions). `None` means calls
    /// carry no deadline.
    ///
    /// Default: None
    pub default_timeout: Option<Duration>,

    /// Flow control for the inbound direction of every call.
    ///
    /// Default: `Bounded(100)`
    pub backpressure: BackpressurePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: None,
            backpressure: BackpressurePolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default call timeout.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Sets the inbound backpressure policy.
    #[must_use]
    pub fn with_backpressure(mut self, policy: BackpressurePolicy) -> Self {
        self.backpressure = policy;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backpressure.validate().map_err(ConfigError::Backpressure)?;
        if self.default_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ConfigError::Zero {
                field: "default_timeout",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.backpressure, BackpressurePolicy::Bounded(100));
        assert_eq!(config.accept_queue_size, 128);
        assert_eq!(config.max_concurrent_calls, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_config_validation() {
        let config = ServerConfig::new().with_accept_queue_size(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero {
                field: "accept_queue_size"
            })
        );

        let config = ServerConfig::new().with_max_concurrent_calls(Some(0));
        assert!(config.validate().is_err());

        let config = ServerConfig::new().with_backpressure(BackpressurePolicy::Bounded(0));
        assert!(matches!(config.validate(), Err(ConfigError::Backpressure(_))));
    }

    #[test]
    fn test_client_config_validation() {
        assert!(ClientConfig::default().validate().is_ok());

        let config = ClientConfig::new().with_default_timeout(Some(Duration::ZERO));
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "default_timeout must be greater than 0"
        );

        let config = ClientConfig::new().with_backpressure(BackpressurePolicy::Unbounded);
        assert!(config.validate().is_ok());
    }
}
