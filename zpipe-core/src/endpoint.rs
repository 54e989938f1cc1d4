//! Endpoint addressing for the PUSH/PULL transport.
//!
//! Only the TCP transport is supported: `tcp://host:port`.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Transport endpoint address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// TCP transport: `tcp://host:port`
    Tcp(SocketAddr),
}

impl Endpoint {
    /// Build a TCP endpoint from an address and a port.
    #[must_use]
    pub const fn tcp(ip: IpAddr, port: u16) -> Self {
        Self::Tcp(SocketAddr::new(ip, port))
    }

    /// Parse an endpoint from a string.
    ///
    /// Supported formats:
    /// - `tcp://127.0.0.1:9999`
    /// - `tcp://[::1]:9999` (IPv6)
    ///
    /// # Examples
    ///
    /// ```
    /// use zpipe_core::endpoint::Endpoint;
    ///
    /// let endpoint = Endpoint::parse("tcp://127.0.0.1:9999").unwrap();
    /// assert_eq!(endpoint.socket_addr().port(), 9999);
    /// ```
    pub fn parse(s: &str) -> Result<Self, EndpointError> {
        s.parse()
    }

    /// The socket address to bind or connect to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        match self {
            Self::Tcp(addr) => *addr,
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::Tcp(addr)
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr = s
            .strip_prefix("tcp://")
            .ok_or_else(|| EndpointError::InvalidScheme(s.to_string()))?;
        let socket_addr = addr
            .parse::<SocketAddr>()
            .map_err(|_| EndpointError::InvalidTcpAddress(addr.to_string()))?;
        Ok(Self::Tcp(socket_addr))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

/// Errors that can occur when parsing endpoints.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Invalid scheme in endpoint: {0} (expected tcp://)")]
    InvalidScheme(String),

    #[error("Invalid TCP address: {0}")]
    InvalidTcpAddress(String),
}
