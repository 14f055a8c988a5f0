//! Cables between devices.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::ids::{LinkId, NodeId};

/// Default bandwidth for a new cable.
pub const DEFAULT_BANDWIDTH_MBPS: u32 = 1000;

/// Network assigned to a link by `assign_subnet_to_link`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub network: Ipv4Addr,
    pub cidr: u8,
}

impl Subnet {
    /// Host address `network + offset`.
    pub fn host(&self, offset: u32) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network).wrapping_add(offset))
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.cidr)
    }
}

/// An undirected cable. `port_a` / `port_b` name the port each endpoint
/// is plugged into; the store fills them when they are left empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    pub a: NodeId,
    pub b: NodeId,
    #[serde(default = "default_up")]
    pub up: bool,
    #[serde(default = "default_bandwidth")]
    pub bandwidth_mbps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Subnet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_b: Option<String>,
}

fn default_up() -> bool {
    true
}

fn default_bandwidth() -> u32 {
    DEFAULT_BANDWIDTH_MBPS
}

impl Link {
    pub fn new(id: impl Into<LinkId>, a: impl Into<NodeId>, b: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            a: a.into(),
            b: b.into(),
            up: true,
            bandwidth_mbps: DEFAULT_BANDWIDTH_MBPS,
            subnet: None,
            port_a: None,
            port_b: None,
        }
    }

    /// Pin both endpoint ports instead of letting the store choose.
    pub fn with_ports(mut self, port_a: impl Into<String>, port_b: impl Into<String>) -> Self {
        self.port_a = Some(port_a.into());
        self.port_b = Some(port_b.into());
        self
    }

    pub fn touches(&self, node: &str) -> bool {
        self.a.as_str() == node || self.b.as_str() == node
    }

    /// The endpoint opposite `node`.
    pub fn other_end(&self, node: &str) -> Option<&NodeId> {
        if self.a.as_str() == node {
            Some(&self.b)
        } else if self.b.as_str() == node {
            Some(&self.a)
        } else {
            None
        }
    }

    /// Port `node` is plugged into on this link.
    pub fn port_for(&self, node: &str) -> Option<&str> {
        if self.a.as_str() == node {
            self.port_a.as_deref()
        } else if self.b.as_str() == node {
            self.port_b.as_deref()
        } else {
            None
        }
    }

    pub fn key(&self) -> LinkKey {
        LinkKey::new(&self.a, &self.b)
    }
}

/// Direction-free link identity: the sorted endpoint pair, `a-b`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkKey(String);

impl LinkKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{}-{}", lo, hi))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
