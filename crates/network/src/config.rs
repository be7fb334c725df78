//! # Network Configuration
//!
//! Options for the channel listener and its connection tasks.
//!
//! # Example
//!
//! ```rust
//! use mserver_network::NetworkConfig;
//! use std::time::Duration;
//!
//! let config = NetworkConfig {
//!     bind_address: "127.0.0.1:7575".parse().unwrap(),
//!     ping_interval: Duration::from_secs(15),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Largest frame the 2-byte length prefix can describe
pub const MAX_FRAME_LENGTH: usize = u16::MAX as usize;

/// Network configuration options
///
/// # Purpose
/// Everything the accept loop and the per-connection loop need to know.
///
/// # Default Values
/// - Port 7575 on all interfaces
/// - 1000 max connections
/// - Ping every 30 seconds, drop after 90 seconds without a pong
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Address and port to bind the TCP listener to
    ///
    /// # Default
    /// `0.0.0.0:7575`
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    ///
    /// # Purpose
    /// Caps the number of players one channel carries. Connections over the
    /// limit are accepted and closed immediately.
    ///
    /// # Default
    /// 1000 connections
    pub max_connections: usize,

    /// How often the server pings each client
    ///
    /// # Default
    /// 30 seconds
    pub ping_interval: Duration,

    /// Connections without a pong for this long are closed
    ///
    /// # Default
    /// 90 seconds
    ///
    /// # Notes
    /// - Checked on each ping tick, so the effective limit is rounded up to
    ///   the next tick
    /// - Must be longer than `ping_interval`
    pub connection_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 7575)),
            max_connections: 1000,
            ping_interval: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(90),
        }
    }
}

impl NetworkConfig {
    /// Validate the configuration
    ///
    /// # Returns
    /// `Ok(())` if configuration is valid, `Err(String)` otherwise
    ///
    /// # Checks
    /// - `max_connections` must be > 0
    /// - `ping_interval` must be non-zero
    /// - `connection_timeout` must be > `ping_interval`
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }

        if self.ping_interval.is_zero() {
            return Err("ping_interval must be > 0".to_string());
        }

        if self.connection_timeout <= self.ping_interval {
            return Err("connection_timeout must be > ping_interval".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NetworkConfig::default();
        assert_eq!(config.bind_address.port(), 7575);
        assert_eq!(config.max_connections, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_max_connections() {
        let config = NetworkConfig {
            max_connections: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_must_exceed_ping_interval() {
        let config = NetworkConfig {
            ping_interval: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(30),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NetworkConfig {
            ping_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
