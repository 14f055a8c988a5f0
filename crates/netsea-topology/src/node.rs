//! Devices placed in the sandbox.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

const HOST_PORTS: &[&str] = &["eth0", "eth1"];
const ROUTER_PORTS: &[&str] = &["Gig0/0", "Gig0/1", "Gig0/2", "Gig0/3"];
const SWITCH_PORTS: &[&str] = &[
    "Fa0/1", "Fa0/2", "Fa0/3", "Fa0/4", "Fa0/5", "Fa0/6", "Fa0/7", "Fa0/8",
];

/// Kind of device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeKind {
    Pc,
    Router,
    Switch,
    Server,
}

impl NodeKind {
    /// Physical ports the device ships with, in cabling order.
    /// Switch SVIs are not included; they come from the switch config.
    pub fn port_catalog(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Pc | NodeKind::Server => HOST_PORTS,
            NodeKind::Router => ROUTER_PORTS,
            NodeKind::Switch => SWITCH_PORTS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Pc => "PC",
            NodeKind::Router => "ROUTER",
            NodeKind::Switch => "SWITCH",
            NodeKind::Server => "SERVER",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device in the topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    /// Scene position; carried for the renderer, never read by core logic.
    #[serde(default)]
    pub position: [f32; 3],
    /// Legacy single-homed VLAN tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vlans: Vec<u16>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            position: [0.0; 3],
            vlans: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn is_switch(&self) -> bool {
        self.kind == NodeKind::Switch
    }

    pub fn is_router(&self) -> bool {
        self.kind == NodeKind::Router
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_per_kind() {
        assert_eq!(NodeKind::Pc.port_catalog(), &["eth0", "eth1"]);
        assert_eq!(NodeKind::Server.port_catalog().len(), 2);
        assert_eq!(NodeKind::Router.port_catalog()[3], "Gig0/3");
        assert_eq!(NodeKind::Switch.port_catalog().len(), 8);
        assert_eq!(NodeKind::Switch.port_catalog()[0], "Fa0/1");
    }

    #[test]
    fn kind_serializes_uppercase() {
        let node = Node::new("r1", NodeKind::Router, "R1");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "ROUTER");
        assert!(json.get("vlans").is_none());
    }

    #[test]
    fn missing_position_defaults_to_origin() {
        let node: Node =
            serde_json::from_str(r#"{"id":"pc1","kind":"PC","name":"PC1"}"#).unwrap();
        assert_eq!(node.position, [0.0; 3]);
        assert!(node.vlans.is_empty());
    }
}
