//! Whole-store snapshots.

use std::collections::BTreeMap;

use netsea_switch::SwitchVlanConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::addressing::PortTable;
use crate::error::Result;
use crate::events::NetEvent;
use crate::ids::NodeId;
use crate::path::{Links, Nodes, SwitchConfigs};
use crate::store::NetStore;

/// Serializable image of the persistent part of a `NetStore`. Routing,
/// flows and pulses are derived or transient and are not included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Nodes,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub ports: PortTable,
    #[serde(default)]
    pub vlans: Vec<String>,
    #[serde(default)]
    pub node_vlans: BTreeMap<NodeId, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_vlan_name: Option<String>,
    #[serde(default)]
    pub vlan_colors: BTreeMap<String, String>,
    #[serde(default)]
    pub switch_configs: SwitchConfigs,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl NetStore {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.nodes.clone(),
            links: self.links.clone(),
            ports: self.ports.clone(),
            vlans: self.vlans.clone(),
            node_vlans: self.node_vlans.clone(),
            active_vlan_name: self.active_vlan.clone(),
            vlan_colors: self.vlan_colors.clone(),
            switch_configs: self.switch_configs.clone(),
        }
    }

    /// Replace the store contents with `snapshot`. Flows and pulses are
    /// dropped, routing is recomputed and the subnet cursors resume past
    /// the highest subnet already in use.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) {
        let focus = self.cli_focus().cloned();
        let config = self.flow_config().clone();
        *self = NetStore::with_flow_config(config);

        self.nodes = snapshot.nodes;
        self.links = snapshot.links;
        self.ports = snapshot.ports;
        self.vlans = snapshot.vlans;
        self.node_vlans = snapshot.node_vlans;
        self.active_vlan = snapshot.active_vlan_name;
        self.vlan_colors = snapshot.vlan_colors;
        self.switch_configs = snapshot.switch_configs;

        let missing: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.is_switch() && !self.switch_configs.contains_key(&n.id))
            .map(|n| n.id.clone())
            .collect();
        for id in missing {
            self.switch_configs.insert(id, SwitchVlanConfig::default());
        }

        for link in self.links.values() {
            let Some(subnet) = link.subnet else { continue };
            let [_, second, third, _] = subnet.network.octets();
            if subnet.cidr == 24 {
                self.subnet_cursor_24 = self.subnet_cursor_24.max(u32::from(second) + 1);
            } else {
                let index = (u32::from(second) * 256 + u32::from(third)) / 4;
                self.subnet_cursor_30 = self.subnet_cursor_30.max(index + 1);
            }
        }

        let focus = focus
            .filter(|id| self.nodes.contains_key(id))
            .or_else(|| self.nodes.keys().next().cloned());
        self.set_cli_focus(focus.as_deref());

        info!(nodes = self.nodes.len(), links = self.links.len(), "snapshot loaded");
        let event = NetEvent::SnapshotLoaded {
            nodes: self.nodes.len(),
            links: self.links.len(),
        };
        self.emit(event);
        self.recompute_routing();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Link;
    use crate::node::{Node, NodeKind};
    use crate::port::PortMode;
    use netsea_switch::VlanId;
    use std::net::Ipv4Addr;

    fn populated() -> NetStore {
        let mut store = NetStore::new();
        for (id, kind) in [
            ("pc1", NodeKind::Pc),
            ("sw1", NodeKind::Switch),
            ("r1", NodeKind::Router),
            ("srv", NodeKind::Server),
        ] {
            store.add_node(Node::new(id, kind, id));
        }
        for (id, a, b) in [("l1", "pc1", "sw1"), ("l2", "sw1", "r1"), ("l3", "r1", "srv")] {
            store.add_link(Link::new(id, a, b)).unwrap();
        }
        store.set_port_ip("pc1", "eth0", Some(Ipv4Addr::new(192, 168, 3, 4)));
        store.set_port_mode("r1", "Gig0/1", PortMode::Dhcp);
        store.assign_subnet_to_link("l3", 30);
        store.assign_subnet_to_link("l3", 30);
        store.add_vlan("VLAN 10");
        store.assign_vlan_to_node("pc1", "VLAN 10");
        store
            .update_switch_config("sw1", |cfg| {
                cfg.set_access_vlan("Fa0/1", VlanId::new(10)?);
                Ok(())
            })
            .unwrap();
        store
    }

    #[test]
    fn json_uses_camel_case() {
        let json = populated().snapshot().to_json().unwrap();
        assert!(json.contains("\"switchConfigs\""));
        assert!(json.contains("\"nodeVlans\""));
        assert!(json.contains("\"vlanColors\""));
        assert!(json.contains("\"accessVlan\""));
    }

    #[test]
    fn round_trip_restores_routing() {
        let original = populated();
        let json = original.snapshot().to_json().unwrap();

        let mut restored = NetStore::new();
        restored.load_snapshot(Snapshot::from_json(&json).unwrap());

        assert_eq!(restored.snapshot(), original.snapshot());
        assert_eq!(restored.routing_table(), original.routing_table());
        assert_eq!(restored.vlan_path("pc1", "srv"), original.vlan_path("pc1", "srv"));
    }

    #[test]
    fn loading_resumes_subnet_cursors() {
        let original = populated();
        let mut restored = NetStore::new();
        restored.load_snapshot(original.snapshot());
        let next = restored.assign_subnet_to_link("l2", 30).unwrap();
        assert_eq!(next.to_string(), "10.0.8.0/30");
    }

    #[test]
    fn loading_drops_flows_and_keeps_valid_focus() {
        let mut store = populated();
        store.spawn_flow("r1", "srv", crate::flow::Protocol::Tcp).unwrap();
        store.set_cli_focus(Some("sw1"));
        let snapshot = store.snapshot();
        store.load_snapshot(snapshot);
        assert_eq!(store.flows().count(), 0);
        assert_eq!(store.cli_focus().map(NodeId::as_str), Some("sw1"));
    }

    #[test]
    fn empty_object_loads() {
        let snapshot = Snapshot::from_json("{}").unwrap();
        let mut store = NetStore::new();
        store.load_snapshot(snapshot);
        assert!(store.nodes().is_empty());
        assert!(Snapshot::from_json("not json").is_err());
    }
}
