//! Process configuration
//!
//! Configuration is read once at startup (CLI flags with environment
//! fallbacks, plus an optional `.env` file) and is immutable afterwards.
//! Nothing process-wide is mutable: each pipeline invocation constructs its
//! own crawler instances and only reads the proxy setting from here.

use std::net::SocketAddr;

use crate::ConfigError;

/// Immutable process-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the API server binds to
    pub bind_addr: SocketAddr,

    /// Optional outbound proxy URL (http, https or socks5 scheme)
    pub proxy: Option<String>,
}

impl Config {
    /// Builds a validated configuration from raw startup values
    ///
    /// # Arguments
    ///
    /// * `bind` - Bind address string, e.g. "0.0.0.0:8000"
    /// * `proxy` - Optional outbound proxy URL
    pub fn new(bind: &str, proxy: Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = bind
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                addr: bind.to_string(),
                source,
            })?;

        Ok(Self { bind_addr, proxy })
    }
}
