//! Channel layer: identities, endpoints and port allocation.

pub mod identity;
pub mod port;

pub use identity::{LogicalChannel, PhysicalChannel};
pub use port::{DEFAULT_PORT_BASE, PortAllocator};

use serde::Serialize;
use std::fmt;

/// Endpoint role: bind owns the listening address, connect dials out to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMethod {
    Bind,
    Connect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Pub,
    Sub,
}

impl fmt::Display for ChannelMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelMethod::Bind => "bind",
            ChannelMethod::Connect => "connect",
        })
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelType::Pub => "pub",
            ChannelType::Sub => "sub",
        })
    }
}

/// A concrete endpoint owned by exactly one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSpec {
    pub name: String,
    pub method: ChannelMethod,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub port: u16,
}

impl ChannelSpec {
    /// Publishing endpoint for a physical channel.
    pub fn publisher(physical: &PhysicalChannel, port: u16) -> Self {
        Self {
            name: physical.id(),
            method: ChannelMethod::Bind,
            kind: ChannelType::Pub,
            port,
        }
    }

    /// Subscribing endpoint dialing the publisher of `physical`.
    pub fn subscriber(physical: &PhysicalChannel, port: u16) -> Self {
        Self {
            name: format!("in_{}", physical.id()),
            method: ChannelMethod::Connect,
            kind: ChannelType::Sub,
            port,
        }
    }

    pub fn is_bind(&self) -> bool {
        self.method == ChannelMethod::Bind
    }
}
