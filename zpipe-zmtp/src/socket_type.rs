use std::fmt;

use crate::codec::ZmtpError;

/// ZMQ socket types as announced in the READY `Socket-Type` property.
///
/// Only PUSH and PULL are implemented locally; the others are recognised so
/// an incompatible peer can be rejected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketType {
    Pair,
    Dealer,
    Router,
    Pub,
    Sub,
    XPub,
    XSub,
    Req,
    Rep,
    Push,
    Pull,
}

impl SocketType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "PAIR",
            Self::Dealer => "DEALER",
            Self::Router => "ROUTER",
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::XPub => "XPUB",
            Self::XSub => "XSUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::Push => "PUSH",
            Self::Pull => "PULL",
        }
    }

    /// Parse the wire name of a socket type.
    pub fn from_wire(value: &[u8]) -> Result<Self, ZmtpError> {
        match value {
            b"PAIR" => Ok(Self::Pair),
            b"DEALER" => Ok(Self::Dealer),
            b"ROUTER" => Ok(Self::Router),
            b"PUB" => Ok(Self::Pub),
            b"SUB" => Ok(Self::Sub),
            b"XPUB" => Ok(Self::XPub),
            b"XSUB" => Ok(Self::XSub),
            b"REQ" => Ok(Self::Req),
            b"REP" => Ok(Self::Rep),
            b"PUSH" => Ok(Self::Push),
            b"PULL" => Ok(Self::Pull),
            _ => Err(ZmtpError::Command("unknown Socket-Type")),
        }
    }

    /// Whether a peer of type `peer` may connect to this socket type
    /// (ZMTP 3.x compatibility table, pipeline pattern only).
    #[must_use]
    pub const fn accepts(&self, peer: Self) -> bool {
        matches!((self, peer), (Self::Push, Self::Pull) | (Self::Pull, Self::Push))
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
