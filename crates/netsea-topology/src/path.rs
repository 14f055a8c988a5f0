//! Shortest paths and routing tables over the link graph.
//!
//! Paths are breadth-first over links that are up. Neighbors are expanded
//! in link insertion order, so among equally short paths the one through
//! earlier links wins.
//!
//! With switch configurations supplied, traffic is confined to the VLAN
//! of the source host:
//!
//! - the source VLAN is the access VLAN of the switch port the source is
//!   cabled to (first up link to a switch whose port declares one), else 1
//! - an access port carries only its access VLAN
//! - a trunk carries the VLANs in its allowed list (no list means all)
//! - a private VLAN port carries its mapping's primary and secondaries
//! - an unconfigured port facing another switch passes everything, one
//!   facing a host behaves as an access port in VLAN 1

use std::collections::{BTreeMap, HashMap, VecDeque};

use indexmap::IndexMap;
use netsea_switch::{SwitchVlanConfig, VlanId};
use serde::{Deserialize, Serialize};

use crate::ids::{LinkId, NodeId};
use crate::link::Link;
use crate::node::Node;

pub type Nodes = IndexMap<NodeId, Node>;
pub type Links = IndexMap<LinkId, Link>;
pub type SwitchConfigs = BTreeMap<NodeId, SwitchVlanConfig>;

/// One routing table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub dest: NodeId,
    pub next_hop: NodeId,
}

/// Derived per-node routes; never persisted.
pub type RoutingTable = IndexMap<NodeId, Vec<Route>>;

/// Borrowed view of the graph the resolver walks.
#[derive(Debug, Clone, Copy)]
pub struct Topology<'a> {
    pub nodes: &'a Nodes,
    pub links: &'a Links,
}

impl<'a> Topology<'a> {
    pub fn new(nodes: &'a Nodes, links: &'a Links) -> Self {
        Self { nodes, links }
    }
}

type Adjacency<'a> = IndexMap<&'a str, Vec<&'a str>>;

fn adjacency<'a>(topology: Topology<'a>, filter: Option<(&SwitchConfigs, VlanId)>) -> Adjacency<'a> {
    let mut adj: Adjacency<'a> = topology
        .nodes
        .keys()
        .map(|id| (id.as_str(), Vec::new()))
        .collect();

    for link in topology.links.values().filter(|l| l.up) {
        if !adj.contains_key(link.a.as_str()) || !adj.contains_key(link.b.as_str()) {
            continue;
        }
        if let Some((configs, vlan)) = filter {
            if !link_carries(topology, configs, link, vlan) {
                continue;
            }
        }
        if let Some(list) = adj.get_mut(link.a.as_str()) {
            list.push(link.b.as_str());
        }
        if let Some(list) = adj.get_mut(link.b.as_str()) {
            list.push(link.a.as_str());
        }
    }
    adj
}

/// Whether both switch-side ends of `link` let `vlan` through.
fn link_carries(topology: Topology<'_>, configs: &SwitchConfigs, link: &Link, vlan: VlanId) -> bool {
    [(&link.a, &link.b), (&link.b, &link.a)]
        .into_iter()
        .all(|(side, facing)| {
            let Some(node) = topology.nodes.get(side.as_str()) else {
                return true;
            };
            if !node.is_switch() {
                return true;
            }
            let facing_switch = topology
                .nodes
                .get(facing.as_str())
                .is_some_and(Node::is_switch);
            let port = link
                .port_for(side)
                .and_then(|name| configs.get(side.as_str())?.switchport(name));
            match port.and_then(|p| p.admits(vlan)) {
                Some(admitted) => admitted,
                None => facing_switch || vlan == VlanId::DEFAULT,
            }
        })
}

/// VLAN a host's traffic enters the switched network on.
pub fn source_vlan(topology: Topology<'_>, from: &str, configs: &SwitchConfigs) -> VlanId {
    topology
        .links
        .values()
        .filter(|l| l.up)
        .filter_map(|link| {
            let neighbor = link.other_end(from)?;
            if !topology.nodes.get(neighbor.as_str())?.is_switch() {
                return None;
            }
            let port = link.port_for(neighbor)?;
            configs.get(neighbor.as_str())?.switchport(port)?.ingress_vlan()
        })
        .next()
        .unwrap_or(VlanId::DEFAULT)
}

/// Breadth-first parent pointers from `from`, stopping early at `stop_at`.
fn bfs_parents<'a>(
    adj: &Adjacency<'a>,
    from: &'a str,
    stop_at: Option<&str>,
) -> HashMap<&'a str, &'a str> {
    let mut parents = HashMap::new();
    let mut queue = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        if Some(current) == stop_at {
            break;
        }
        for &next in adj.get(current).map(Vec::as_slice).unwrap_or_default() {
            if next != from && !parents.contains_key(next) {
                parents.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    parents
}

fn unwind<'a>(parents: &HashMap<&'a str, &'a str>, from: &'a str, to: &'a str) -> Vec<&'a str> {
    let mut path = vec![to];
    let mut cursor = to;
    while cursor != from {
        match parents.get(cursor) {
            Some(&parent) => {
                path.push(parent);
                cursor = parent;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

/// Shortest path `from` → `to` as node ids, inclusive of both ends.
///
/// Empty when either node is unknown or no path exists; `[from]` when
/// `from == to`. Passing `switch_configs` enables VLAN isolation.
pub fn find_shortest_path(
    topology: Topology<'_>,
    from: &str,
    to: &str,
    switch_configs: Option<&SwitchConfigs>,
) -> Vec<NodeId> {
    let (Some((from_key, _)), Some((to_key, _))) = (
        topology.nodes.get_key_value(from),
        topology.nodes.get_key_value(to),
    ) else {
        return Vec::new();
    };
    if from_key == to_key {
        return vec![from_key.clone()];
    }

    let filter = switch_configs.map(|configs| (configs, source_vlan(topology, from, configs)));
    let adj = adjacency(topology, filter);
    let parents = bfs_parents(&adj, from_key.as_str(), Some(to_key.as_str()));
    unwind(&parents, from_key.as_str(), to_key.as_str())
        .into_iter()
        .map(NodeId::from)
        .collect()
}

/// Next hop from every node to every node it can reach, VLAN-unaware.
pub fn compute_routing_table(topology: Topology<'_>) -> RoutingTable {
    let adj = adjacency(topology, None);
    let mut table = RoutingTable::new();

    for src in topology.nodes.keys() {
        let parents = bfs_parents(&adj, src.as_str(), None);
        let routes = topology
            .nodes
            .keys()
            .filter(|dst| *dst != src)
            .filter_map(|dst| {
                let path = unwind(&parents, src.as_str(), dst.as_str());
                let next_hop = *path.get(1)?;
                Some(Route {
                    dest: dst.clone(),
                    next_hop: NodeId::from(next_hop),
                })
            })
            .collect();
        table.insert(src.clone(), routes);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use netsea_switch::{PrivateRole, SwitchportMode};
    use proptest::prelude::*;

    fn graph(nodes: &[(&str, NodeKind)], links: &[(&str, &str, &str)]) -> (Nodes, Links) {
        let nodes = nodes
            .iter()
            .map(|(id, kind)| (NodeId::from(*id), Node::new(*id, *kind, id.to_uppercase())))
            .collect();
        let links = links
            .iter()
            .map(|(id, a, b)| (LinkId::from(*id), Link::new(*id, *a, *b)))
            .collect();
        (nodes, links)
    }

    fn ids(path: &[NodeId]) -> Vec<&str> {
        path.iter().map(|n| n.as_str()).collect()
    }

    fn vlan(id: u16) -> VlanId {
        VlanId::new(id).unwrap()
    }

    /// h1 - sw - h2, cabled to Fa0/1 and Fa0/2.
    fn two_hosts_one_switch() -> (Nodes, Links) {
        let (nodes, mut links) = graph(
            &[("h1", NodeKind::Pc), ("sw", NodeKind::Switch), ("h2", NodeKind::Pc)],
            &[],
        );
        links.insert("l1".into(), Link::new("l1", "h1", "sw").with_ports("eth0", "Fa0/1"));
        links.insert("l2".into(), Link::new("l2", "sw", "h2").with_ports("Fa0/2", "eth0"));
        (nodes, links)
    }

    #[test]
    fn same_node_is_single_element() {
        let (nodes, links) = graph(&[("a", NodeKind::Pc)], &[]);
        let path = find_shortest_path(Topology::new(&nodes, &links), "a", "a", None);
        assert_eq!(ids(&path), vec!["a"]);
    }

    #[test]
    fn unknown_endpoint_is_empty() {
        let (nodes, links) = graph(&[("a", NodeKind::Pc)], &[]);
        assert!(find_shortest_path(Topology::new(&nodes, &links), "a", "zz", None).is_empty());
        assert!(find_shortest_path(Topology::new(&nodes, &links), "zz", "zz", None).is_empty());
    }

    #[test]
    fn down_links_are_ignored() {
        let (nodes, mut links) = graph(
            &[("a", NodeKind::Pc), ("b", NodeKind::Switch), ("c", NodeKind::Pc)],
            &[("l1", "a", "b"), ("l2", "b", "c")],
        );
        let topo = Topology::new(&nodes, &links);
        assert_eq!(ids(&find_shortest_path(topo, "a", "c", None)), vec!["a", "b", "c"]);
        links.get_mut("l2").unwrap().up = false;
        assert!(find_shortest_path(Topology::new(&nodes, &links), "a", "c", None).is_empty());
    }

    #[test]
    fn ties_follow_link_order() {
        let (nodes, links) = graph(
            &[
                ("s", NodeKind::Pc),
                ("x", NodeKind::Switch),
                ("y", NodeKind::Switch),
                ("t", NodeKind::Pc),
            ],
            &[("l1", "s", "y"), ("l2", "s", "x"), ("l3", "x", "t"), ("l4", "y", "t")],
        );
        let path = find_shortest_path(Topology::new(&nodes, &links), "s", "t", None);
        assert_eq!(ids(&path), vec!["s", "y", "t"]);
    }

    #[test]
    fn access_vlans_isolate_hosts() {
        let (nodes, links) = two_hosts_one_switch();
        let topo = Topology::new(&nodes, &links);

        let mut configs = SwitchConfigs::new();
        let mut cfg = SwitchVlanConfig::default();
        cfg.set_access_vlan("Fa0/1", vlan(10));
        cfg.set_access_vlan("Fa0/2", vlan(20));
        configs.insert("sw".into(), cfg.clone());
        assert!(find_shortest_path(topo, "h1", "h2", Some(&configs)).is_empty());

        cfg.set_access_vlan("Fa0/2", vlan(10));
        configs.insert("sw".into(), cfg);
        let path = find_shortest_path(topo, "h1", "h2", Some(&configs));
        assert_eq!(ids(&path), vec!["h1", "sw", "h2"]);
    }

    #[test]
    fn unconfigured_host_port_is_vlan_one() {
        let (nodes, links) = two_hosts_one_switch();
        let topo = Topology::new(&nodes, &links);
        let mut configs = SwitchConfigs::new();
        configs.insert("sw".into(), SwitchVlanConfig::default());
        assert_eq!(find_shortest_path(topo, "h1", "h2", Some(&configs)).len(), 3);

        let mut cfg = SwitchVlanConfig::default();
        cfg.set_access_vlan("Fa0/1", vlan(10));
        configs.insert("sw".into(), cfg);
        assert!(find_shortest_path(topo, "h1", "h2", Some(&configs)).is_empty());
    }

    #[test]
    fn source_vlan_comes_from_access_port() {
        let (nodes, links) = two_hosts_one_switch();
        let topo = Topology::new(&nodes, &links);
        let mut configs = SwitchConfigs::new();
        assert_eq!(source_vlan(topo, "h1", &configs), VlanId::DEFAULT);
        let mut cfg = SwitchVlanConfig::default();
        cfg.set_access_vlan("Fa0/1", vlan(30));
        configs.insert("sw".into(), cfg);
        assert_eq!(source_vlan(topo, "h1", &configs), vlan(30));
        assert_eq!(source_vlan(topo, "h2", &configs), VlanId::DEFAULT);
    }

    /// h1 and h2 on private-vlan host ports of `sw`, mapped 100 -> 101.
    fn private_hosts() -> (Nodes, Links, SwitchConfigs) {
        let (nodes, links) = two_hosts_one_switch();
        let mut cfg = SwitchVlanConfig::default();
        for port in ["Fa0/1", "Fa0/2"] {
            cfg.switchport_mut(port).set_private_role(PrivateRole::Host);
            cfg.map_private_vlan(Some(port), vlan(100), vec![vlan(101)]);
        }
        let mut configs = SwitchConfigs::new();
        configs.insert("sw".into(), cfg);
        (nodes, links, configs)
    }

    #[test]
    fn private_hosts_sharing_a_mapping_reach_each_other() {
        let (nodes, links, configs) = private_hosts();
        let topo = Topology::new(&nodes, &links);
        assert_eq!(source_vlan(topo, "h1", &configs), vlan(101));
        let path = find_shortest_path(topo, "h1", "h2", Some(&configs));
        assert_eq!(ids(&path), vec!["h1", "sw", "h2"]);
    }

    #[test]
    fn host_outside_the_mapping_is_cut_off() {
        let (nodes, links, mut configs) = private_hosts();
        if let Some(cfg) = configs.get_mut("sw") {
            cfg.switchports.remove("Fa0/1");
            cfg.set_access_vlan("Fa0/1", vlan(30));
        }
        let topo = Topology::new(&nodes, &links);
        assert_eq!(source_vlan(topo, "h1", &configs), vlan(30));
        assert!(find_shortest_path(topo, "h1", "h2", Some(&configs)).is_empty());
    }

    #[test]
    fn private_port_without_mapping_lets_traffic_through() {
        let (nodes, links, mut configs) = private_hosts();
        if let Some(cfg) = configs.get_mut("sw") {
            cfg.switchport_mut("Fa0/2").private_mapping = None;
            cfg.switchport_mut("Fa0/1").private_mapping = None;
        }
        let topo = Topology::new(&nodes, &links);
        assert_eq!(source_vlan(topo, "h1", &configs), VlanId::DEFAULT);
        assert_eq!(find_shortest_path(topo, "h1", "h2", Some(&configs)).len(), 3);
    }

    /// h1 - sw1 =trunk= sw2 - h2, both hosts in VLAN 10.
    fn trunked_pair(allowed: Option<Vec<VlanId>>) -> (Nodes, Links, SwitchConfigs) {
        let (nodes, _) = graph(
            &[
                ("h1", NodeKind::Pc),
                ("sw1", NodeKind::Switch),
                ("sw2", NodeKind::Switch),
                ("h2", NodeKind::Pc),
            ],
            &[],
        );
        let mut links = Links::new();
        links.insert("l1".into(), Link::new("l1", "h1", "sw1").with_ports("eth0", "Fa0/1"));
        links.insert("l2".into(), Link::new("l2", "sw1", "sw2").with_ports("Fa0/8", "Fa0/8"));
        links.insert("l3".into(), Link::new("l3", "sw2", "h2").with_ports("Fa0/1", "eth0"));

        let mut configs = SwitchConfigs::new();
        for sw in ["sw1", "sw2"] {
            let mut cfg = SwitchVlanConfig::default();
            cfg.set_access_vlan("Fa0/1", vlan(10));
            cfg.set_switchport_mode("Fa0/8", SwitchportMode::Trunk);
            cfg.set_trunk_allowed("Fa0/8", allowed.clone());
            configs.insert(sw.into(), cfg);
        }
        (nodes, links, configs)
    }

    #[test]
    fn trunk_allowing_all_carries_vlan() {
        let (nodes, links, configs) = trunked_pair(None);
        let path = find_shortest_path(Topology::new(&nodes, &links), "h1", "h2", Some(&configs));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn trunk_allowed_list_blocks_other_vlans() {
        let (nodes, links, configs) = trunked_pair(Some(vec![vlan(20), vlan(30)]));
        let topo = Topology::new(&nodes, &links);
        assert!(find_shortest_path(topo, "h1", "h2", Some(&configs)).is_empty());

        let (nodes, links, configs) = trunked_pair(Some(vec![vlan(10)]));
        let topo = Topology::new(&nodes, &links);
        assert_eq!(find_shortest_path(topo, "h1", "h2", Some(&configs)).len(), 4);
    }

    #[test]
    fn unconfigured_inter_switch_ports_pass_through() {
        let (nodes, links, mut configs) = trunked_pair(None);
        for cfg in configs.values_mut() {
            cfg.switchports.remove("Fa0/8");
        }
        let path = find_shortest_path(Topology::new(&nodes, &links), "h1", "h2", Some(&configs));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn routing_table_records_next_hops() {
        let (nodes, links) = graph(
            &[("a", NodeKind::Pc), ("b", NodeKind::Router), ("c", NodeKind::Pc), ("d", NodeKind::Pc)],
            &[("l1", "a", "b"), ("l2", "b", "c")],
        );
        let table = compute_routing_table(Topology::new(&nodes, &links));
        let a_routes = &table["a"];
        assert_eq!(a_routes.len(), 2);
        assert!(a_routes.iter().all(|r| r.next_hop.as_str() == "b"));
        assert!(table["d"].is_empty());
    }

    fn arb_graph() -> impl Strategy<Value = (Nodes, Links)> {
        (2usize..9).prop_flat_map(|n| {
            let edges = proptest::collection::vec((0..n, 0..n, any::<bool>()), 0..20);
            (Just(n), edges)
        })
        .prop_map(|(n, edges)| {
            let nodes: Nodes = (0..n)
                .map(|i| {
                    let id = format!("n{}", i);
                    (NodeId::from(id.as_str()), Node::new(id.as_str(), NodeKind::Router, id.as_str()))
                })
                .collect();
            let links: Links = edges
                .into_iter()
                .enumerate()
                .filter(|(_, (a, b, _))| a != b)
                .map(|(i, (a, b, up))| {
                    let id = format!("l{}", i);
                    let mut link = Link::new(id.as_str(), format!("n{}", a), format!("n{}", b));
                    link.up = up;
                    (LinkId::from(id), link)
                })
                .collect();
            (nodes, links)
        })
    }

    /// Hop distances by repeated relaxation, independent of the BFS code.
    fn reference_distances(nodes: &Nodes, links: &Links, from: &str) -> HashMap<String, usize> {
        let mut dist = HashMap::from([(from.to_string(), 0usize)]);
        for _ in 0..nodes.len() {
            for link in links.values().filter(|l| l.up) {
                for (x, y) in [(&link.a, &link.b), (&link.b, &link.a)] {
                    if let Some(&dx) = dist.get(x.as_str()) {
                        let entry = dist.entry(y.to_string()).or_insert(usize::MAX);
                        *entry = (*entry).min(dx + 1);
                    }
                }
            }
        }
        dist
    }

    proptest! {
        #[test]
        fn bfs_paths_are_minimal_and_valid((nodes, links) in arb_graph()) {
            let topo = Topology::new(&nodes, &links);
            for from in nodes.keys() {
                let dist = reference_distances(&nodes, &links, from);
                for to in nodes.keys() {
                    let path = find_shortest_path(topo, from, to, None);
                    match dist.get(to.as_str()) {
                        Some(&d) => {
                            prop_assert_eq!(path.len(), d + 1);
                            prop_assert_eq!(path.first(), Some(from));
                            prop_assert_eq!(path.last(), Some(to));
                            for hop in path.windows(2) {
                                prop_assert!(links.values().any(|l| l.up
                                    && l.touches(&hop[0]) && l.touches(&hop[1])));
                            }
                        }
                        None => prop_assert!(path.is_empty()),
                    }
                }
            }
        }

        #[test]
        fn routing_matches_shortest_paths((nodes, links) in arb_graph()) {
            let topo = Topology::new(&nodes, &links);
            let table = compute_routing_table(topo);
            for (src, routes) in &table {
                for route in routes {
                    let path = find_shortest_path(topo, src, &route.dest, None);
                    prop_assert_eq!(path.get(1), Some(&route.next_hop));
                }
                let reachable = nodes
                    .keys()
                    .filter(|dst| *dst != src)
                    .filter(|dst| find_shortest_path(topo, src, dst, None).len() >= 2)
                    .count();
                prop_assert_eq!(routes.len(), reachable);
            }
        }
    }
}
