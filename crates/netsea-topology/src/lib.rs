//! Network Sea topology
//!
//! The in-memory network model of the sandbox: devices, cables, port
//! addressing, per-switch VLAN configuration and simulated packet flows.
//!
//! # Architecture
//!
//! - **store**: `NetStore`, the single owner of all state and the only
//!   place mutations happen
//! - **path**: BFS shortest paths (optionally VLAN-isolated) and the
//!   derived routing table
//! - **addressing**: per-segment `192.168.X.Y` allocation and link subnets
//! - **flow**: packet flows, link pulses and the pulse scheduler
//! - **events**: the `NetEvent` journal consumed by the UI
//! - **snapshot**: camelCase JSON image of the persistent state
//!
//! # Usage
//!
//! ```
//! use netsea_topology::{Link, NetStore, Node, NodeKind, Protocol};
//!
//! let mut store = NetStore::new();
//! store.add_node(Node::new("pc1", NodeKind::Pc, "PC1"));
//! store.add_node(Node::new("sw1", NodeKind::Switch, "SW1"));
//! store.add_node(Node::new("pc2", NodeKind::Pc, "PC2"));
//! store.add_link(Link::new("l1", "pc1", "sw1")).unwrap();
//! store.add_link(Link::new("l2", "sw1", "pc2")).unwrap();
//!
//! assert_eq!(store.path("pc1", "pc2").len(), 3);
//! let flow = store.spawn_flow("pc1", "pc2", Protocol::Icmp);
//! assert!(flow.is_some());
//! ```

mod colors;
mod error;
mod events;
mod ids;
mod link;
mod node;
mod port;
mod snapshot;
mod store;

pub mod addressing;
pub mod flow;
pub mod path;

pub use colors::{ensure_vlan_color_map, hsl_to_hex, pick_vlan_color, FALLBACK_COLOR};
pub use error::{Error, Result};
pub use events::NetEvent;
pub use flow::{FlowConfig, LinkPulse, PacketFlow, Protocol};
pub use ids::{FlowId, LinkId, NodeId};
pub use link::{Link, LinkKey, Subnet, DEFAULT_BANDWIDTH_MBPS};
pub use node::{Node, NodeKind};
pub use path::{find_shortest_path, compute_routing_table, Route, RoutingTable, Topology};
pub use port::{cidr_to_mask, mask_to_cidr, PortConfig, PortMode};
pub use snapshot::Snapshot;
pub use store::{NetStore, Selection, SelectionMode};
