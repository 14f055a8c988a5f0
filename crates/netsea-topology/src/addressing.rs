//! Automatic IPv4 address allocation.
//!
//! Hosts draw from `192.168.X.0/24`, one third octet per LAN segment. A
//! segment is the connected component of a node over links that do not
//! touch a router. Routers bridge segments, so they allocate from the whole
//! `192.168.0.0/16` range instead.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::net::Ipv4Addr;

use crate::ids::NodeId;
use crate::link::Subnet;
use crate::path::Topology;
use crate::port::PortConfig;

pub type PortTable = BTreeMap<NodeId, BTreeMap<String, PortConfig>>;

/// Number of third octets available to segments (1..=SEGMENT_OCTETS).
pub const SEGMENT_OCTETS: u8 = 200;

/// Sorted member ids of `node`'s segment, or `None` for routers and
/// unknown nodes.
pub fn segment_members(topology: Topology<'_>, node: &str) -> Option<Vec<NodeId>> {
    let origin = topology.nodes.get(node)?;
    if origin.is_router() {
        return None;
    }
    let is_host_side = |id: &str| topology.nodes.get(id).is_some_and(|n| !n.is_router());

    let mut members = BTreeSet::from([origin.id.clone()]);
    let mut queue = VecDeque::from([origin.id.clone()]);
    while let Some(current) = queue.pop_front() {
        for link in topology.links.values() {
            let Some(next) = link.other_end(&current) else {
                continue;
            };
            if !is_host_side(link.a.as_str()) || !is_host_side(link.b.as_str()) {
                continue;
            }
            if members.insert(next.clone()) {
                queue.push_back(next.clone());
            }
        }
    }
    Some(members.into_iter().collect())
}

/// Stable seed octet (1..=200) for a segment key.
pub fn segment_seed(members: &[NodeId]) -> u8 {
    let key = members
        .iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(",");
    let digest = blake3::hash(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    let bucket = u64::from_le_bytes(prefix) % u64::from(SEGMENT_OCTETS);
    // bucket < 200, so the cast cannot truncate
    bucket as u8 + 1
}

fn private_octets(ip: Ipv4Addr) -> Option<(u8, u8)> {
    let [a, b, c, d] = ip.octets();
    (a == 192 && b == 168).then_some((c, d))
}

fn node_ips<'a>(ports: &'a PortTable, node: &'a str) -> impl Iterator<Item = Ipv4Addr> + 'a {
    ports
        .get(node)
        .into_iter()
        .flat_map(|m| m.values())
        .filter_map(|p| p.ip)
}

fn all_ips(ports: &PortTable) -> BTreeSet<Ipv4Addr> {
    ports
        .values()
        .flat_map(|m| m.values())
        .filter_map(|p| p.ip)
        .collect()
}

/// Third octet a segment allocates from.
///
/// A segment that already holds `192.168.X.*` addresses keeps the smallest
/// such X. Otherwise the seed octet is probed forward past octets already
/// used by nodes outside the segment, so two segments never share a pool
/// while free octets remain.
pub fn segment_octet(members: &[NodeId], ports: &PortTable) -> u8 {
    let member_set: BTreeSet<&str> = members.iter().map(NodeId::as_str).collect();

    let existing = members
        .iter()
        .flat_map(|m| node_ips(ports, m))
        .filter_map(private_octets)
        .map(|(c, _)| c)
        .min();
    if let Some(octet) = existing {
        return octet;
    }

    let taken: BTreeSet<u8> = ports
        .iter()
        .filter(|(id, _)| !member_set.contains(id.as_str()))
        .flat_map(|(id, _)| node_ips(ports, id))
        .filter_map(private_octets)
        .map(|(c, _)| c)
        .collect();

    let seed = segment_seed(members);
    let span = u16::from(SEGMENT_OCTETS);
    (0..span)
        .map(|step| ((u16::from(seed) - 1 + step) % span + 1) as u8)
        .find(|octet| !taken.contains(octet))
        .unwrap_or(seed)
}

/// Next unused address for `node`, or `None` when the pool is exhausted
/// or the node is unknown.
pub fn allocate_ip(topology: Topology<'_>, ports: &PortTable, node: &str) -> Option<Ipv4Addr> {
    let origin = topology.nodes.get(node)?;
    let used = all_ips(ports);

    if origin.is_router() {
        return (0..=255u8)
            .flat_map(|c| (1..=254u8).map(move |d| Ipv4Addr::new(192, 168, c, d)))
            .find(|ip| !used.contains(ip));
    }

    let members = segment_members(topology, node)?;
    let octet = segment_octet(&members, ports);
    (1..=254u8)
        .map(|host| Ipv4Addr::new(192, 168, octet, host))
        .find(|ip| !used.contains(ip))
}

/// Network for the `cursor`-th subnet of the given size. Anything other
/// than /24 is treated as /30.
pub fn subnet_for_cursor(cidr: u8, cursor: u32) -> Subnet {
    if cidr == 24 {
        let second = (cursor % 256) as u8;
        Subnet {
            network: Ipv4Addr::new(10, second, 0, 0),
            cidr: 24,
        }
    } else {
        let offset = cursor.wrapping_mul(4);
        let third = (offset % 256) as u8;
        let second = ((offset / 256) % 256) as u8;
        Subnet {
            network: Ipv4Addr::new(10, second, third, 0),
            cidr: 30,
        }
    }
}
