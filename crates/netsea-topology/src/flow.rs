//! Packet flow and link pulse simulation.
//!
//! Flows advance along resolved hop paths at a per-protocol speed. Each
//! flow also drives a small pulse scheduler that lights up the link it is
//! currently crossing:
//!
//! advance -> arrive-check -> wait-for-clear -> cooldown -> emit
//!
//! A flow moving onto a new hop holds its pulse until the previous link
//! has no live pulses, then waits a fixed cooldown before emitting.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::{FlowId, NodeId};
use crate::link::LinkKey;

/// Transport protocol of a simulated flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Icmp,
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Icmp => "ICMP",
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ICMP" => Ok(Protocol::Icmp),
            "TCP" => Ok(Protocol::Tcp),
            "UDP" => Ok(Protocol::Udp),
            _ => Err(format!("unknown protocol: {}", s)),
        }
    }
}

/// A packet in flight along `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketFlow {
    pub id: FlowId,
    /// Ordered `(from, to)` hops.
    pub path: Vec<(NodeId, NodeId)>,
    /// Fraction of the whole path covered, in `[0, 1)` while alive.
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub proto: Protocol,
}

impl PacketFlow {
    pub fn new(id: impl Into<FlowId>, path: Vec<(NodeId, NodeId)>, proto: Protocol) -> Self {
        Self {
            id: id.into(),
            path,
            progress: 0.0,
            proto,
        }
    }

    /// Hop pairs for a node sequence: `[a, b, c]` -> `[(a, b), (b, c)]`.
    pub fn hops(nodes: &[NodeId]) -> Vec<(NodeId, NodeId)> {
        nodes
            .windows(2)
            .map(|w| (w[0].clone(), w[1].clone()))
            .collect()
    }

    pub fn source(&self) -> Option<&NodeId> {
        self.path.first().map(|(from, _)| from)
    }

    pub fn destination(&self) -> Option<&NodeId> {
        self.path.last().map(|(_, to)| to)
    }

    pub fn touches(&self, node: &str) -> bool {
        self.path
            .iter()
            .any(|(a, b)| a.as_str() == node || b.as_str() == node)
    }
}

/// Visual pulse travelling along a link, `head` in link-relative units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPulse {
    pub head: f32,
    pub strength: f32,
    /// `1` travels from the lower-sorted endpoint to the higher, `-1` back.
    pub dir: i8,
    pub color: String,
}

/// Simulation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Path fraction per second for ICMP.
    pub icmp_speed: f32,
    pub tcp_speed: f32,
    pub udp_speed: f32,
    /// Pulse head travel per second.
    pub pulse_speed: f32,
    /// Pulse strength lost per second.
    pub pulse_decay: f32,
    /// Pulses at or below this strength are dropped.
    pub pulse_floor: f32,
    pub head_min: f32,
    pub head_max: f32,
    /// Seconds to wait after the previous hop's pulses clear.
    pub cooldown: f32,
    /// Re-emit on the same hop once local progress moved this far.
    pub reemit_threshold: f32,
    pub default_pulse_color: String,
    pub icmp_color: String,
    pub tcp_color: String,
    pub udp_color: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            icmp_speed: 0.4,
            tcp_speed: 0.55,
            udp_speed: 0.7,
            pulse_speed: 1.4,
            pulse_decay: 1.6,
            pulse_floor: 0.05,
            head_min: -0.2,
            head_max: 1.2,
            cooldown: 0.45,
            reemit_threshold: 0.08,
            default_pulse_color: "#00ffff".to_string(),
            icmp_color: "#00ffcc".to_string(),
            tcp_color: "#ffd166".to_string(),
            udp_color: "#ef476f".to_string(),
        }
    }
}

impl FlowConfig {
    pub fn speed(&self, proto: Protocol) -> f32 {
        match proto {
            Protocol::Icmp => self.icmp_speed,
            Protocol::Tcp => self.tcp_speed,
            Protocol::Udp => self.udp_speed,
        }
    }

    pub fn color(&self, proto: Protocol) -> &str {
        match proto {
            Protocol::Icmp => &self.icmp_color,
            Protocol::Tcp => &self.tcp_color,
            Protocol::Udp => &self.udp_color,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PulseScheduler {
    last_segment: Option<usize>,
    last_progress: f32,
    waiting: Option<LinkKey>,
    cooldown: f32,
}

/// A pulse emitted by a flow during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedPulse {
    pub flow: FlowId,
    pub key: LinkKey,
    pub color: String,
}

/// What happened during one `tick`.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Flows that reached their destination and were removed.
    pub arrived: Vec<PacketFlow>,
    pub pulses: Vec<EmittedPulse>,
}

/// Active flows plus the pulses they leave on links.
#[derive(Debug, Clone, Default)]
pub struct FlowSimulation {
    config: FlowConfig,
    flows: IndexMap<FlowId, PacketFlow>,
    schedulers: HashMap<FlowId, PulseScheduler>,
    pulses: BTreeMap<LinkKey, Vec<LinkPulse>>,
    next_id: u64,
}

impl FlowSimulation {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn flows(&self) -> impl Iterator<Item = &PacketFlow> {
        self.flows.values()
    }

    pub fn flow(&self, id: &str) -> Option<&PacketFlow> {
        self.flows.get(id)
    }

    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    pub fn pulses(&self) -> &BTreeMap<LinkKey, Vec<LinkPulse>> {
        &self.pulses
    }

    pub fn pulses_on(&self, key: &LinkKey) -> &[LinkPulse] {
        self.pulses.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Fresh id of the form `flow-N`, skipping ids already in use.
    pub fn next_flow_id(&mut self) -> FlowId {
        loop {
            self.next_id += 1;
            let id = FlowId::new(format!("flow-{}", self.next_id));
            if !self.flows.contains_key(&id) {
                return id;
            }
        }
    }

    /// Insert a flow; an existing id is replaced in place and keeps its
    /// pulse scheduler.
    pub fn insert(&mut self, flow: PacketFlow) {
        self.flows.insert(flow.id.clone(), flow);
    }

    /// Drop every flow whose path touches `node`. Returns how many went.
    pub fn remove_touching(&mut self, node: &str) -> usize {
        let before = self.flows.len();
        self.flows.retain(|_, flow| !flow.touches(node));
        let flows = &self.flows;
        self.schedulers.retain(|id, _| flows.contains_key(id));
        before - self.flows.len()
    }

    pub fn clear(&mut self) {
        self.flows.clear();
        self.schedulers.clear();
        self.pulses.clear();
    }

    /// Start a pulse on link `a`-`b` at `position` (0 at `a`, 1 at `b`).
    pub fn trigger_pulse(&mut self, a: &str, b: &str, position: f32, color: Option<&str>) -> LinkKey {
        let key = LinkKey::new(a, b);
        let clamped = position.clamp(0.0, 1.0);
        let forward = a <= b;
        let pulse = LinkPulse {
            head: if forward { clamped } else { 1.0 - clamped },
            strength: 1.0,
            dir: if forward { 1 } else { -1 },
            color: color.unwrap_or(&self.config.default_pulse_color).to_string(),
        };
        let floor = self.config.pulse_floor;
        let entry = self.pulses.entry(key.clone()).or_default();
        entry.retain(|p| p.strength > floor);
        entry.push(pulse);
        key
    }

    /// Advance the simulation by `dt` seconds. Negative deltas count as 0;
    /// repeated zero-delta ticks leave the state unchanged.
    pub fn tick(&mut self, dt: f32) -> TickOutcome {
        let dt = dt.max(0.0);
        let mut outcome = TickOutcome::default();

        self.advance_pulses(dt);

        let mut arrived = Vec::new();
        for flow in self.flows.values_mut() {
            flow.progress += dt * self.config.speed(flow.proto);
            if flow.progress >= 1.0 {
                arrived.push(flow.id.clone());
            }
        }
        for id in arrived {
            self.schedulers.remove(&id);
            if let Some(flow) = self.flows.shift_remove(&id) {
                outcome.arrived.push(flow);
            }
        }

        let ids: Vec<FlowId> = self.flows.keys().cloned().collect();
        for id in ids {
            if let Some((a, b, local, color)) = self.schedule(&id, dt) {
                let key = self.trigger_pulse(&a, &b, local, Some(&color));
                outcome.pulses.push(EmittedPulse {
                    flow: id,
                    key,
                    color,
                });
            }
        }
        outcome
    }

    fn advance_pulses(&mut self, dt: f32) {
        let cfg = &self.config;
        for pulses in self.pulses.values_mut() {
            for pulse in pulses.iter_mut() {
                pulse.head += dt * cfg.pulse_speed * f32::from(pulse.dir);
                pulse.strength = (pulse.strength - dt * cfg.pulse_decay).max(0.0);
            }
            pulses.retain(|p| {
                p.strength > cfg.pulse_floor && p.head >= cfg.head_min && p.head <= cfg.head_max
            });
        }
        self.pulses.retain(|_, pulses| !pulses.is_empty());
    }

    /// Decide whether flow `id` emits a pulse this tick.
    fn schedule(&mut self, id: &FlowId, dt: f32) -> Option<(NodeId, NodeId, f32, String)> {
        let flow = self.flows.get(id)?;
        let len = flow.path.len();
        if len == 0 {
            return None;
        }
        let total = flow.progress * len as f32;
        let segment = (total.floor().max(0.0) as usize).min(len - 1);
        let local = total - segment as f32;
        let sched = self.schedulers.entry(id.clone()).or_default();

        if let Some(key) = &sched.waiting {
            if self.pulses.get(key).is_some_and(|p| !p.is_empty()) {
                return None;
            }
            sched.waiting = None;
            sched.cooldown = self.config.cooldown;
        }

        if sched.cooldown > 0.0 {
            sched.cooldown = (sched.cooldown - dt).max(0.0);
            if sched.cooldown > 0.0 {
                return None;
            }
        }

        if let Some(last) = sched.last_segment.filter(|&last| last != segment) {
            if let Some((a, b)) = flow.path.get(last) {
                let previous = LinkKey::new(a, b);
                if self.pulses.get(&previous).is_some_and(|p| !p.is_empty()) {
                    sched.waiting = Some(previous);
                    return None;
                }
            }
        }

        let (a, b) = flow.path.get(segment)?;
        let moved = (local - sched.last_progress).abs() > self.config.reemit_threshold;
        if sched.last_segment != Some(segment) || moved {
            sched.last_segment = Some(segment);
            sched.last_progress = local;
            return Some((a.clone(), b.clone(), local, self.config.color(flow.proto).to_string()));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hop_path(nodes: &[&str]) -> Vec<(NodeId, NodeId)> {
        let ids: Vec<NodeId> = nodes.iter().map(|n| NodeId::from(*n)).collect();
        PacketFlow::hops(&ids)
    }

    fn ticks_until_arrival(sim: &mut FlowSimulation, dt: f32) -> usize {
        for n in 1..10_000 {
            if !sim.tick(dt).arrived.is_empty() {
                return n;
            }
        }
        panic!("flow never arrived");
    }

    #[test]
    fn hops_pair_up_nodes() {
        let hops = hop_path(&["a", "b", "c"]);
        assert_eq!(hops.len(), 2);
        assert_eq!(hops[1].0.as_str(), "b");
        assert_eq!(hops[1].1.as_str(), "c");
    }

    #[test]
    fn arrival_takes_ceil_ticks() {
        for (proto, dt) in [(Protocol::Icmp, 0.3f32), (Protocol::Tcp, 0.5), (Protocol::Udp, 0.4)] {
            let mut sim = FlowSimulation::default();
            sim.insert(PacketFlow::new("f", hop_path(&["a", "b"]), proto));
            let speed = sim.config().speed(proto);
            let expected = (1.0 / (dt * speed)).ceil() as usize;
            assert_eq!(ticks_until_arrival(&mut sim, dt), expected, "{}", proto);
            assert_eq!(sim.flow_count(), 0);
        }
    }

    #[test]
    fn arrival_is_reported_once() {
        let mut sim = FlowSimulation::default();
        sim.insert(PacketFlow::new("f", hop_path(&["a", "b"]), Protocol::Udp));
        let mut arrivals = 0;
        for _ in 0..20 {
            arrivals += sim.tick(0.25).arrived.len();
        }
        assert_eq!(arrivals, 1);
    }

    #[test]
    fn first_tick_emits_on_first_hop() {
        let mut sim = FlowSimulation::default();
        sim.insert(PacketFlow::new("f", hop_path(&["a", "b", "c"]), Protocol::Icmp));
        let outcome = sim.tick(0.0);
        assert_eq!(outcome.pulses.len(), 1);
        assert_eq!(outcome.pulses[0].key, LinkKey::new("a", "b"));
        assert_eq!(outcome.pulses[0].color, sim.config().icmp_color);
    }

    #[test]
    fn repeated_zero_ticks_are_idempotent() {
        let mut sim = FlowSimulation::default();
        sim.insert(PacketFlow::new("f", hop_path(&["a", "b", "c"]), Protocol::Icmp));
        sim.tick(0.1);
        let flows: Vec<PacketFlow> = sim.flows().cloned().collect();
        let pulses = sim.pulses().clone();
        sim.tick(0.0);
        sim.tick(0.0);
        assert_eq!(sim.flows().cloned().collect::<Vec<_>>(), flows);
        assert_eq!(sim.pulses(), &pulses);
    }

    #[test]
    fn pulses_decay_and_disappear() {
        let mut sim = FlowSimulation::default();
        let key = sim.trigger_pulse("a", "b", 0.0, None);
        assert_eq!(sim.pulses_on(&key).len(), 1);
        assert_eq!(sim.pulses_on(&key)[0].color, "#00ffff");
        sim.tick(0.25);
        let pulse = &sim.pulses_on(&key)[0];
        assert!((pulse.head - 0.35).abs() < 1e-5);
        assert!((pulse.strength - 0.6).abs() < 1e-5);
        sim.tick(0.5);
        assert!(sim.pulses_on(&key).is_empty());
        assert!(sim.pulses().is_empty());
    }

    #[test]
    fn reverse_pulses_run_backwards() {
        let mut sim = FlowSimulation::default();
        let key = sim.trigger_pulse("b", "a", 0.25, Some("#123456"));
        let pulse = &sim.pulses_on(&key)[0];
        assert_eq!(pulse.dir, -1);
        assert!((pulse.head - 0.75).abs() < 1e-6);
        assert_eq!(pulse.color, "#123456");
    }

    #[test]
    fn next_hop_waits_for_previous_link_to_clear() {
        let mut sim = FlowSimulation::default();
        sim.insert(PacketFlow::new("f", hop_path(&["a", "b", "c"]), Protocol::Icmp));
        let first = LinkKey::new("a", "b");
        let second = LinkKey::new("b", "c");

        sim.tick(0.0);
        assert_eq!(sim.pulses_on(&first).len(), 1);

        // Jump the flow onto the second hop while the first pulse is alive.
        sim.flows.get_mut("f").unwrap().progress = 0.55;
        let outcome = sim.tick(0.01);
        assert!(outcome.pulses.is_empty());
        assert!(sim.pulses_on(&second).is_empty());

        // Let the first pulse decay; the cooldown then delays emission.
        let mut emitted_at = None;
        for step in 0..200 {
            sim.flows.get_mut("f").unwrap().progress = 0.55;
            if !sim.tick(0.05).pulses.is_empty() {
                emitted_at = Some(step);
                break;
            }
        }
        let step = emitted_at.expect("second hop never pulsed");
        assert!(sim.pulses_on(&second).len() == 1);
        // ~0.6s for the first pulse to decay plus the 0.45s cooldown
        assert!(step >= 15, "emitted too early at step {}", step);
    }

    #[test]
    fn removing_a_node_drops_its_flows() {
        let mut sim = FlowSimulation::default();
        sim.insert(PacketFlow::new("f1", hop_path(&["a", "b"]), Protocol::Icmp));
        sim.insert(PacketFlow::new("f2", hop_path(&["c", "d"]), Protocol::Icmp));
        assert_eq!(sim.remove_touching("b"), 1);
        assert!(sim.flow("f1").is_none());
        assert!(sim.flow("f2").is_some());
    }

    #[test]
    fn flow_ids_are_unique() {
        let mut sim = FlowSimulation::default();
        sim.insert(PacketFlow::new("flow-1", hop_path(&["a", "b"]), Protocol::Icmp));
        assert_eq!(sim.next_flow_id().as_str(), "flow-2");
    }

    #[test]
    fn protocol_parsing() {
        assert_eq!("tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert!("sctp".parse::<Protocol>().is_err());
        assert_eq!(serde_json::to_string(&Protocol::Udp).unwrap(), "\"UDP\"");
    }
}
