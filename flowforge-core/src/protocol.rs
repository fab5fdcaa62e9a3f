//! Transport protocol selector for services and firewall rules

use crate::error::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Protocol of a service port item or firewall rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    /// Both TCP and UDP; expands to one rule per protocol
    TcpUdp,
    /// Any protocol, no port match
    Any,
}

impl Protocol {
    /// Concrete protocols a rule set must be generated for
    pub const fn expand(self) -> &'static [Protocol] {
        match self {
            Protocol::Tcp => &[Protocol::Tcp],
            Protocol::Udp => &[Protocol::Udp],
            Protocol::TcpUdp => &[Protocol::Tcp, Protocol::Udp],
            Protocol::Any => &[Protocol::Any],
        }
    }

    /// Lowercase name as used in generated rules and persisted records
    pub const fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::TcpUdp => "tcp/udp",
            Protocol::Any => "any",
        }
    }

    /// Uppercase name as stored on service port items
    pub const fn display_name(self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::TcpUdp => "TCP/UDP",
            Protocol::Any => "ANY",
        }
    }

    /// Whether rules for this protocol can carry a destination port match
    pub const fn has_ports(self) -> bool {
        matches!(self, Protocol::Tcp | Protocol::Udp)
    }

    pub fn serialize_upper<S: Serializer>(proto: &Protocol, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(proto.display_name())
    }
}

impl FromStr for Protocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "tcp/udp" | "udp/tcp" | "tcpudp" => Ok(Protocol::TcpUdp),
            "any" | "all" => Ok(Protocol::Any),
            _ => Err(ValidationError::InvalidProtocol {
                proto: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Protocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
