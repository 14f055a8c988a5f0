//! The topology store.
//!
//! `NetStore` exclusively owns every piece of simulation state: devices,
//! cables, port addressing, switch configurations, the VLAN catalog and the
//! flow simulation. All mutation goes through its methods; each one keeps
//! the derived routing table current before returning and appends to the
//! event journal.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use netsea_switch::SwitchVlanConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::addressing::{allocate_ip, subnet_for_cursor, PortTable};
use crate::colors::ensure_vlan_color_map;
use crate::error::{Error, Result};
use crate::events::NetEvent;
use crate::flow::{FlowConfig, FlowSimulation, LinkPulse, PacketFlow, Protocol};
use crate::ids::{FlowId, LinkId, NodeId};
use crate::link::{Link, LinkKey, Subnet};
use crate::node::Node;
use crate::path::{
    compute_routing_table, find_shortest_path, Links, Nodes, Route, RoutingTable, SwitchConfigs,
    Topology,
};
use crate::port::{PortConfig, PortMode};

/// What the pointer is currently doing in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Idle,
    Moving,
    Linking,
}

/// Current UI selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkId>,
    #[serde(default)]
    pub mode: SelectionMode,
}

/// In-memory network model.
#[derive(Debug, Clone, Default)]
pub struct NetStore {
    pub(crate) nodes: Nodes,
    pub(crate) links: Links,
    pub(crate) ports: PortTable,
    pub(crate) switch_configs: SwitchConfigs,
    pub(crate) vlans: Vec<String>,
    pub(crate) active_vlan: Option<String>,
    pub(crate) node_vlans: BTreeMap<NodeId, Vec<String>>,
    pub(crate) vlan_colors: BTreeMap<String, String>,
    pub(crate) subnet_cursor_24: u32,
    pub(crate) subnet_cursor_30: u32,
    routing: RoutingTable,
    sim: FlowSimulation,
    selection: Selection,
    cli_focus: Option<NodeId>,
    events: Vec<NetEvent>,
}

impl NetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flow_config(config: FlowConfig) -> Self {
        Self {
            sim: FlowSimulation::new(config),
            ..Self::default()
        }
    }

    // ---- read access ----

    pub fn topology(&self) -> Topology<'_> {
        Topology::new(&self.nodes, &self.links)
    }

    pub fn nodes(&self) -> &Nodes {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn ports(&self) -> &PortTable {
        &self.ports
    }

    /// IP settings of a port; ports without an entry read as DHCP.
    pub fn port(&self, node: &str, port: &str) -> PortConfig {
        self.ports
            .get(node)
            .and_then(|m| m.get(port))
            .copied()
            .unwrap_or_default()
    }

    /// Physical catalog ports plus, for switches, configured SVIs.
    pub fn available_ports(&self, node: &str) -> Vec<String> {
        let Some(n) = self.nodes.get(node) else {
            return Vec::new();
        };
        let mut ports: Vec<String> = n.kind.port_catalog().iter().map(|p| p.to_string()).collect();
        if let Some(cfg) = self.switch_configs.get(node) {
            ports.extend(cfg.vlan_interface_names());
        }
        ports
    }

    /// The up or down link plugged into `node`'s `port`.
    pub fn link_on_port(&self, node: &str, port: &str) -> Option<&Link> {
        self.links
            .values()
            .find(|l| l.port_for(node) == Some(port))
    }

    pub fn switch_configs(&self) -> &SwitchConfigs {
        &self.switch_configs
    }

    pub fn switch_config(&self, node: &str) -> Option<&SwitchVlanConfig> {
        self.switch_configs.get(node)
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn routes(&self, node: &str) -> &[Route] {
        self.routing.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn vlans(&self) -> &[String] {
        &self.vlans
    }

    pub fn active_vlan(&self) -> Option<&str> {
        self.active_vlan.as_deref()
    }

    pub fn node_vlans(&self, node: &str) -> &[String] {
        self.node_vlans.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn vlan_colors(&self) -> &BTreeMap<String, String> {
        &self.vlan_colors
    }

    pub fn flows(&self) -> impl Iterator<Item = &PacketFlow> {
        self.sim.flows()
    }

    pub fn flow(&self, id: &str) -> Option<&PacketFlow> {
        self.sim.flow(id)
    }

    pub fn pulses(&self) -> &BTreeMap<LinkKey, Vec<LinkPulse>> {
        self.sim.pulses()
    }

    pub fn flow_config(&self) -> &FlowConfig {
        self.sim.config()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn cli_focus(&self) -> Option<&NodeId> {
        self.cli_focus.as_ref()
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<NetEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: NetEvent) {
        self.events.push(event);
    }

    // ---- paths ----

    /// VLAN-unaware shortest path.
    pub fn path(&self, from: &str, to: &str) -> Vec<NodeId> {
        find_shortest_path(self.topology(), from, to, None)
    }

    /// Shortest path honoring switchport VLAN membership.
    pub fn vlan_path(&self, from: &str, to: &str) -> Vec<NodeId> {
        find_shortest_path(self.topology(), from, to, Some(&self.switch_configs))
    }

    /// Resolve a user-typed target: node id, then node name (any case),
    /// then an address assigned to some port.
    pub fn resolve_target(&self, query: &str) -> Option<NodeId> {
        if let Some((id, _)) = self.nodes.get_key_value(query) {
            return Some(id.clone());
        }
        if let Some(node) = self
            .nodes
            .values()
            .find(|n| n.name.eq_ignore_ascii_case(query))
        {
            return Some(node.id.clone());
        }
        let ip: Ipv4Addr = query.parse().ok()?;
        self.ports
            .iter()
            .find(|(_, ports)| ports.values().any(|p| p.ip == Some(ip)))
            .map(|(id, _)| id.clone())
    }

    pub(crate) fn recompute_routing(&mut self) {
        self.routing = compute_routing_table(self.topology());
        let routes = self.routing.values().map(Vec::len).sum();
        self.emit(NetEvent::RoutingRecomputed {
            nodes: self.routing.len(),
            routes,
        });
    }

    // ---- devices and cables ----

    /// Insert a device. An existing id is overwritten; a switch keeps its
    /// config, any other kind drops it. The first device placed takes CLI
    /// focus.
    pub fn add_node(&mut self, node: Node) {
        debug!(node = %node.id, kind = %node.kind, "add node");
        let id = node.id.clone();
        let kind = node.kind;
        if !node.is_switch() {
            self.switch_configs.remove(&id);
        } else if !self.switch_configs.contains_key(&id) {
            self.switch_configs.insert(id.clone(), SwitchVlanConfig::default());
        }
        self.nodes.insert(id.clone(), node);
        if self.cli_focus.is_none() {
            self.cli_focus = Some(id.clone());
        }
        self.emit(NetEvent::NodeAdded { node: id, kind });
        self.recompute_routing();
    }

    /// Insert or replace a cable. Unset endpoint ports are bound to the
    /// first catalog port not already used by another cable.
    pub fn add_link(&mut self, mut link: Link) -> Result<()> {
        for end in [&link.a, &link.b] {
            if !self.nodes.contains_key(end) {
                return Err(Error::UnknownNode(end.to_string()));
            }
        }
        if link.port_a.is_none() {
            link.port_a = self.free_port(&link.a, &link.id);
        }
        if link.port_b.is_none() {
            link.port_b = self.free_port(&link.b, &link.id);
        }
        debug!(link = %link.id, a = %link.a, b = %link.b, "add link");
        self.emit(NetEvent::LinkAdded {
            link: link.id.clone(),
            a: link.a.clone(),
            b: link.b.clone(),
            port_a: link.port_a.clone(),
            port_b: link.port_b.clone(),
        });
        self.links.insert(link.id.clone(), link);
        self.recompute_routing();
        Ok(())
    }

    fn free_port(&self, node: &str, except: &LinkId) -> Option<String> {
        let kind = self.nodes.get(node)?.kind;
        kind.port_catalog()
            .iter()
            .find(|port| {
                !self
                    .links
                    .values()
                    .filter(|l| &l.id != except)
                    .any(|l| l.port_for(node) == Some(**port))
            })
            .map(|p| p.to_string())
    }

    /// Remove a device and everything that references it.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some((node_id, _)) = self.nodes.shift_remove_entry(id) else {
            return false;
        };
        let removed: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.touches(id))
            .map(|l| l.id.clone())
            .collect();
        self.links.retain(|_, l| !l.touches(id));
        let flows = self.sim.remove_touching(id);
        self.ports.remove(id);
        self.switch_configs.remove(id);
        self.node_vlans.remove(id);

        if self.cli_focus.as_deref() == Some(id) {
            self.cli_focus = None;
        }
        if self.selection.node.as_deref() == Some(id) {
            self.selection = Selection::default();
        }
        if let Some(link) = &self.selection.link {
            if removed.contains(link) {
                self.selection.link = None;
            }
        }

        debug!(node = %node_id, links = removed.len(), flows, "remove node");
        self.emit(NetEvent::NodeRemoved {
            node: node_id,
            links: removed,
        });
        self.recompute_routing();
        true
    }

    pub fn remove_link(&mut self, id: &str) -> bool {
        let Some((link_id, _)) = self.links.shift_remove_entry(id) else {
            return false;
        };
        if self.selection.link.as_ref() == Some(&link_id) {
            self.selection.link = None;
        }
        debug!(link = %link_id, "remove link");
        self.emit(NetEvent::LinkRemoved { link: link_id });
        self.recompute_routing();
        true
    }

    /// Remove every cable touching `node`. Returns how many went.
    pub fn remove_links_for_node(&mut self, node: &str) -> usize {
        let doomed: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.touches(node))
            .map(|l| l.id.clone())
            .collect();
        if doomed.is_empty() {
            return 0;
        }
        self.links.retain(|_, l| !l.touches(node));
        debug!(node, links = doomed.len(), "remove links for node");
        for link in &doomed {
            self.emit(NetEvent::LinkRemoved { link: link.clone() });
        }
        self.recompute_routing();
        doomed.len()
    }

    pub fn set_link_status(&mut self, id: &str, up: bool) -> bool {
        let Some(link) = self.links.get_mut(id) else {
            return false;
        };
        link.up = up;
        let link = link.id.clone();
        debug!(%link, up, "link status");
        self.emit(NetEvent::LinkStatusChanged { link, up });
        self.recompute_routing();
        true
    }

    // ---- port addressing ----

    fn write_port(&mut self, node: &str, port: &str, default: PortConfig, f: impl FnOnce(&mut PortConfig)) -> bool {
        let Some((id, _)) = self.nodes.get_key_value(node) else {
            return false;
        };
        let id = id.clone();
        let entry = self
            .ports
            .entry(id.clone())
            .or_default()
            .entry(port.to_string())
            .or_insert(default);
        let before = *entry;
        f(entry);
        let config = *entry;
        if config != before {
            debug!(node = %id, port, ?config, "port changed");
            self.emit(NetEvent::PortChanged {
                node: id,
                port: port.to_string(),
                config,
            });
        }
        true
    }

    fn static_default() -> PortConfig {
        PortConfig {
            mode: PortMode::Static,
            ..PortConfig::default()
        }
    }

    /// Switching to DHCP drops the address and keeps the mask.
    pub fn set_port_mode(&mut self, node: &str, port: &str, mode: PortMode) -> bool {
        self.write_port(node, port, PortConfig::default(), |cfg| {
            cfg.mode = mode;
            if mode == PortMode::Dhcp {
                cfg.ip = None;
            }
        })
    }

    pub fn set_port_ip(&mut self, node: &str, port: &str, ip: Option<Ipv4Addr>) -> bool {
        self.write_port(node, port, Self::static_default(), |cfg| cfg.ip = ip)
    }

    pub fn set_port_mask(&mut self, node: &str, port: &str, cidr: Option<u8>) -> bool {
        let cidr = cidr.map(|c| c.min(32));
        self.write_port(node, port, Self::static_default(), |cfg| cfg.mask_cidr = cidr)
    }

    /// Give `port` the next free address of the node's segment and make
    /// it static.
    pub fn auto_assign_ip(&mut self, node: &str, port: &str) -> Option<Ipv4Addr> {
        let ip = allocate_ip(self.topology(), &self.ports, node)?;
        self.write_port(node, port, Self::static_default(), |cfg| {
            cfg.mode = PortMode::Static;
            cfg.ip = Some(ip);
        });
        Some(ip)
    }

    /// Number a link from the next `/30` (or `/24`) block and hand `.1` and
    /// `.2` to free DHCP ports on its endpoints.
    pub fn assign_subnet_to_link(&mut self, id: &str, cidr: u8) -> Option<Subnet> {
        let link = self.links.get(id)?;
        let (a, b) = (link.a.clone(), link.b.clone());
        let (port_a, port_b) = (link.port_a.clone(), link.port_b.clone());

        let subnet = if cidr == 24 {
            let s = subnet_for_cursor(24, self.subnet_cursor_24);
            self.subnet_cursor_24 += 1;
            s
        } else {
            let s = subnet_for_cursor(30, self.subnet_cursor_30);
            self.subnet_cursor_30 += 1;
            s
        };
        if let Some(link) = self.links.get_mut(id) {
            link.subnet = Some(subnet);
        }

        let ip_a = self.assign_dhcp_address(&a, port_a.as_deref(), subnet.host(1), subnet.cidr);
        let ip_b = self.assign_dhcp_address(&b, port_b.as_deref(), subnet.host(2), subnet.cidr);

        debug!(link = id, %subnet, "subnet assigned");
        self.emit(NetEvent::SubnetAssigned {
            link: LinkId::from(id),
            subnet,
            ip_a,
            ip_b,
        });
        Some(subnet)
    }

    fn assign_dhcp_address(&mut self, node: &str, bound: Option<&str>, ip: Ipv4Addr, cidr: u8) -> Option<Ipv4Addr> {
        let port = bound
            .filter(|p| self.port(node, p).is_free_dhcp())
            .map(str::to_string)
            .or_else(|| {
                self.ports
                    .get(node)?
                    .iter()
                    .find(|(_, cfg)| cfg.is_free_dhcp())
                    .map(|(name, _)| name.clone())
            })?;
        self.write_port(node, &port, PortConfig::default(), |cfg| {
            cfg.ip = Some(ip);
            cfg.mask_cidr = Some(cidr);
        })
        .then_some(ip)
    }

    // ---- switch configuration ----

    /// Run a fallible mutation against a copy of `node`'s switch config and
    /// commit the copy only if it succeeds. VTP advertisements are
    /// propagated after every commit.
    pub fn update_switch_config<R>(
        &mut self,
        node: &str,
        f: impl FnOnce(&mut SwitchVlanConfig) -> netsea_switch::Result<R>,
    ) -> Result<R> {
        let target = self
            .nodes
            .get(node)
            .ok_or_else(|| Error::UnknownNode(node.to_string()))?;
        if !target.is_switch() {
            return Err(Error::NotASwitch(node.to_string()));
        }
        let id = target.id.clone();
        let mut next = self.switch_configs.get(node).cloned().unwrap_or_default();
        let out = f(&mut next)?;
        next.vtp.interfaces = next.trunk_ports();
        self.switch_configs.insert(id.clone(), next);
        debug!(node = %id, "switch config committed");
        self.emit(NetEvent::SwitchConfigChanged { node: id.clone() });
        self.propagate_vtp(&id);
        Ok(out)
    }

    fn display_name(&self, id: &NodeId) -> String {
        self.nodes
            .get(id)
            .map(|n| n.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| id.to_string())
    }

    fn propagate_vtp(&mut self, origin: &NodeId) {
        let Some(cfg) = self.switch_configs.get(origin) else {
            return;
        };
        let Some(domain) = cfg.vtp.domain.clone() else {
            return;
        };
        let pairs: Vec<(NodeId, NodeId)> = if cfg.vtp.publishes() {
            self.switch_configs
                .iter()
                .filter(|(id, c)| *id != origin && c.vtp.accepts(&domain))
                .map(|(id, _)| (origin.clone(), id.clone()))
                .collect()
        } else if cfg.vtp.accepts(&domain) {
            self.switch_configs
                .iter()
                .find(|(id, c)| *id != origin && c.vtp.publishes() && c.vtp.domain.as_deref() == Some(domain.as_str()))
                .map(|(id, _)| (id.clone(), origin.clone()))
                .into_iter()
                .collect()
        } else {
            return;
        };
        for (server, client) in pairs {
            self.vtp_sync(&server, &client, &domain);
        }
    }

    fn vtp_sync(&mut self, server: &NodeId, client: &NodeId, domain: &str) {
        let server_name = self.display_name(server);
        let client_name = self.display_name(client);
        let Some(database) = self.switch_configs.get(server).map(|c| c.vlan_database.clone()) else {
            return;
        };
        let Some(cfg) = self.switch_configs.get_mut(client) else {
            return;
        };
        let joined = !cfg.vtp.devices.contains(&server_name);
        if !joined && cfg.vlan_database == database {
            return;
        }
        cfg.vlan_database = database;
        cfg.vtp.counters.summary += 1;
        if joined {
            cfg.vtp.counters.join += 1;
            cfg.vtp.learn_device(&server_name);
        }
        cfg.vtp.interfaces = cfg.trunk_ports();
        if let Some(server_cfg) = self.switch_configs.get_mut(server) {
            server_cfg.vtp.learn_device(&client_name);
        }
        debug!(%server, %client, domain, "vtp sync");
        self.emit(NetEvent::VtpSynced {
            server: server.clone(),
            client: client.clone(),
            domain: domain.to_string(),
        });
    }

    // ---- VLAN catalog ----

    /// Add a named VLAN to the catalog. Blank and duplicate names are
    /// ignored.
    pub fn add_vlan(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.vlans.iter().any(|v| v == name) {
            return false;
        }
        self.vlans.push(name.to_string());
        self.vlan_colors = ensure_vlan_color_map(&self.vlans, &self.vlan_colors);
        debug!(name, "vlan added");
        self.emit(NetEvent::VlanAdded {
            name: name.to_string(),
        });
        true
    }

    pub fn set_active_vlan(&mut self, name: Option<&str>) {
        self.active_vlan = name.map(str::to_string);
    }

    /// Tag a device with a catalog VLAN name. The first run of digits in
    /// the name, if any, is also recorded as a numeric tag on the node.
    pub fn assign_vlan_to_node(&mut self, node: &str, name: &str) -> bool {
        let name = name.trim();
        let Some(target) = self.nodes.get_mut(node) else {
            return false;
        };
        if name.is_empty() {
            return false;
        }
        let names = self.node_vlans.entry(target.id.clone()).or_default();
        if names.iter().any(|n| n == name) {
            return false;
        }
        names.push(name.to_string());

        let digits: String = name
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        if let Ok(tag) = digits.parse::<u16>() {
            if !target.vlans.contains(&tag) {
                target.vlans.push(tag);
            }
        }
        debug!(node, name, "vlan assigned");
        true
    }

    // ---- flows ----

    /// Insert a flow. A known id is replaced; a single-hop request is
    /// expanded into the hops of the shortest path when one exists.
    pub fn add_flow(&mut self, mut flow: PacketFlow) -> FlowId {
        let known = self.sim.flow(&flow.id).is_some();
        if !known && flow.path.len() == 1 {
            let (from, to) = &flow.path[0];
            let nodes = self.path(from, to);
            if nodes.len() >= 2 {
                flow.path = PacketFlow::hops(&nodes);
            }
        }
        let id = flow.id.clone();
        if let (Some(from), Some(to)) = (flow.source().cloned(), flow.destination().cloned()) {
            self.emit(NetEvent::FlowStarted {
                flow: id.clone(),
                from,
                to,
                proto: flow.proto,
            });
        }
        debug!(flow = %id, hops = flow.path.len(), "add flow");
        self.sim.insert(flow);
        id
    }

    /// Start a flow along the VLAN-aware path. `None` when `to` is not
    /// reachable from `from`.
    pub fn spawn_flow(&mut self, from: &str, to: &str, proto: Protocol) -> Option<FlowId> {
        let nodes = self.vlan_path(from, to);
        if nodes.len() < 2 {
            return None;
        }
        let id = self.sim.next_flow_id();
        Some(self.add_flow(PacketFlow::new(id, PacketFlow::hops(&nodes), proto)))
    }

    pub fn trigger_link_pulse(&mut self, a: &str, b: &str, position: f32, color: Option<&str>) -> LinkKey {
        self.sim.trigger_pulse(a, b, position, color)
    }

    /// Advance flows and pulses. Returns the flows that arrived.
    pub fn tick(&mut self, dt: f32) -> Vec<PacketFlow> {
        let outcome = self.sim.tick(dt);
        for pulse in outcome.pulses {
            self.emit(NetEvent::PulseEmitted {
                key: pulse.key,
                color: pulse.color,
            });
        }
        for flow in &outcome.arrived {
            if let (Some(from), Some(to)) = (flow.source(), flow.destination()) {
                debug!(flow = %flow.id, %from, %to, "flow arrived");
                let event = NetEvent::FlowArrived {
                    flow: flow.id.clone(),
                    from: from.clone(),
                    to: to.clone(),
                };
                self.emit(event);
            }
        }
        outcome.arrived
    }

    // ---- UI state ----

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Focus the CLI on a device. Unknown ids clear the focus.
    pub fn set_cli_focus(&mut self, node: Option<&str>) {
        self.cli_focus = node.and_then(|id| self.nodes.get_key_value(id)).map(|(id, _)| id.clone());
    }

    /// Forget everything except the flow constants.
    pub fn clear(&mut self) {
        let config = self.sim.config().clone();
        *self = Self::with_flow_config(config);
        debug!("store cleared");
        self.emit(NetEvent::Cleared);
    }
}
