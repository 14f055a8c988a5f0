//! Topology events for the UI timeline.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::flow::Protocol;
use crate::ids::{FlowId, LinkId, NodeId};
use crate::link::{LinkKey, Subnet};
use crate::node::NodeKind;
use crate::port::PortConfig;

/// Something that changed in the store. Every mutation appends one or
/// more of these to the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NetEvent {
    /// A device was placed (or its record replaced)
    NodeAdded { node: NodeId, kind: NodeKind },

    /// A device and everything hanging off it went away
    NodeRemoved { node: NodeId, links: Vec<LinkId> },

    LinkAdded {
        link: LinkId,
        a: NodeId,
        b: NodeId,
        port_a: Option<String>,
        port_b: Option<String>,
    },

    LinkRemoved { link: LinkId },

    LinkStatusChanged { link: LinkId, up: bool },

    /// A port's IP settings changed
    PortChanged {
        node: NodeId,
        port: String,
        config: PortConfig,
    },

    SubnetAssigned {
        link: LinkId,
        subnet: Subnet,
        ip_a: Option<Ipv4Addr>,
        ip_b: Option<Ipv4Addr>,
    },

    /// A switch configuration mutation committed
    SwitchConfigChanged { node: NodeId },

    /// A VTP client adopted a server's VLAN database
    VtpSynced {
        server: NodeId,
        client: NodeId,
        domain: String,
    },

    VlanAdded { name: String },

    FlowStarted {
        flow: FlowId,
        from: NodeId,
        to: NodeId,
        proto: Protocol,
    },

    /// The flow reached its destination and was removed
    FlowArrived {
        flow: FlowId,
        from: NodeId,
        to: NodeId,
    },

    PulseEmitted { key: LinkKey, color: String },

    RoutingRecomputed { nodes: usize, routes: usize },

    Cleared,

    SnapshotLoaded { nodes: usize, links: usize },
}

impl NetEvent {
    /// The node this event is about, when there is exactly one.
    pub fn node(&self) -> Option<&NodeId> {
        match self {
            NetEvent::NodeAdded { node, .. }
            | NetEvent::NodeRemoved { node, .. }
            | NetEvent::PortChanged { node, .. }
            | NetEvent::SwitchConfigChanged { node } => Some(node),
            NetEvent::VtpSynced { client, .. } => Some(client),
            _ => None,
        }
    }

    /// Whether the event changes the topology graph.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            NetEvent::NodeAdded { .. }
                | NetEvent::NodeRemoved { .. }
                | NetEvent::LinkAdded { .. }
                | NetEvent::LinkRemoved { .. }
                | NetEvent::LinkStatusChanged { .. }
                | NetEvent::Cleared
                | NetEvent::SnapshotLoaded { .. }
        )
    }
}
