//! The device console: sessions, submission, completion and backend
//! events, all over one owned `NetStore`.

use std::collections::{BTreeMap, BTreeSet};

use netsea_topology::{NetStore, Node, NodeId};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{BackendEvent, ForwardedCommand};
use crate::completion::{self, Completion, Context};
use crate::error::{CliError, Result};
use crate::interpreter::{self, Outcome};
use crate::session::Session;

/// Result of submitting one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub node: NodeId,
    /// Prompt the line was typed at.
    pub prompt: String,
    pub lines: Vec<String>,
    /// Set when the line was not a console command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarded: Option<ForwardedCommand>,
}

/// A line appended to some device's console log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleLine {
    pub node: NodeId,
    pub line: String,
}

/// Mission goal and the flags recorded so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissionState {
    pub goal: Option<String>,
    pub flags: BTreeSet<String>,
}

/// Every device console of one sandbox.
#[derive(Debug, Default)]
pub struct Console {
    store: NetStore,
    sessions: BTreeMap<NodeId, Session>,
    mission: MissionState,
}

fn display_name(node: &Node) -> &str {
    if node.name.is_empty() {
        node.id.as_str()
    } else {
        &node.name
    }
}

impl Console {
    pub fn new(store: NetStore) -> Self {
        Self {
            store,
            sessions: BTreeMap::new(),
            mission: MissionState::default(),
        }
    }

    pub fn store(&self) -> &NetStore {
        &self.store
    }

    /// Direct store access for editing the topology. Sessions of devices
    /// removed this way linger until [`Console::prune_sessions`].
    pub fn store_mut(&mut self) -> &mut NetStore {
        &mut self.store
    }

    pub fn session(&self, node: &str) -> Option<&Session> {
        self.sessions.get(node)
    }

    pub fn mission(&self) -> &MissionState {
        &self.mission
    }

    /// Drop sessions whose device no longer exists.
    pub fn prune_sessions(&mut self) {
        let store = &self.store;
        self.sessions.retain(|id, _| store.node(id).is_some());
    }

    fn device(&self, query: &str) -> Result<Node> {
        self.store
            .resolve_target(query)
            .and_then(|id| self.store.node(&id).cloned())
            .ok_or_else(|| CliError::UnknownDevice(query.to_string()))
    }

    pub fn prompt(&self, node: &str) -> Result<String> {
        let device = self.device(node)?;
        let name = display_name(&device);
        Ok(self
            .sessions
            .get(device.id.as_str())
            .map_or_else(|| Session::default().prompt(name), |s| s.prompt(name)))
    }

    /// Run one line on `node` (id, name or address). The line and its
    /// output are appended to that device's log; unrecognised lines come
    /// back as `forwarded`.
    pub fn submit(&mut self, node: &str, line: &str) -> Result<Submission> {
        let device = self.device(node)?;
        let session = self.sessions.entry(device.id.clone()).or_default();
        let prompt = session.prompt(display_name(&device));
        session.tab_armed = None;

        let command = line.trim();
        if command.is_empty() {
            return Ok(Submission {
                node: device.id,
                prompt,
                lines: Vec::new(),
                forwarded: None,
            });
        }
        session.push_log(format!("{} {}", prompt, command));
        session.push_history(command);

        let (lines, forwarded) = match interpreter::execute(&mut self.store, session, &device, command) {
            Outcome::Handled(lines) => {
                for line in &lines {
                    session.push_log(line.clone());
                }
                (lines, None)
            }
            Outcome::Forward => {
                debug!(node = %device.id, command, "forwarding to backend");
                let forwarded = ForwardedCommand {
                    command: command.to_string(),
                    node: device.id.clone(),
                };
                (Vec::new(), Some(forwarded))
            }
        };
        Ok(Submission {
            node: device.id,
            prompt,
            lines,
            forwarded,
        })
    }

    /// Tab completion for `node`. A second request on an input the
    /// previous request left unchanged lists the candidates.
    pub fn complete(&mut self, node: &str, line: &str, cursor: usize) -> Result<Completion> {
        let device = self.device(node)?;
        let ports = self.store.available_ports(&device.id);
        let session = self.sessions.entry(device.id.clone()).or_default();
        let force_list = session.tab_armed.as_deref() == Some(line);
        let ctx = Context {
            mode: session.mode,
            kind: device.kind,
            ports: &ports,
        };

        let out = completion::complete(line, cursor, ctx, force_list);
        session.tab_armed = Some(match &out {
            Completion::Replace { line, .. } => line.clone(),
            _ => line.to_string(),
        });
        if let Completion::Candidates { items } = &out {
            session.push_log("Candidates:");
            for item in items {
                session.push_log(format!("  {}", item));
            }
        }
        Ok(out)
    }

    fn append(&mut self, node: &NodeId, line: String) -> ConsoleLine {
        self.sessions.entry(node.clone()).or_default().push_log(line.clone());
        ConsoleLine {
            node: node.clone(),
            line,
        }
    }

    fn broadcast(&mut self, line: &str) -> Vec<ConsoleLine> {
        let ids: Vec<NodeId> = self.store.nodes().keys().cloned().collect();
        ids.iter().map(|id| self.append(id, line.to_string())).collect()
    }

    /// Fold a backend payload into the consoles and the store. Returns
    /// the console lines it produced.
    pub fn apply_backend_event(&mut self, event: BackendEvent) -> Vec<ConsoleLine> {
        match event {
            BackendEvent::Log { message, origin } => {
                match origin.as_deref().and_then(|o| self.store.resolve_target(o)) {
                    Some(id) => vec![self.append(&id, message)],
                    None => self.broadcast(&message),
                }
            }
            BackendEvent::Flow { from, to, proto } => {
                let (Some(src), Some(dst)) = (self.store.resolve_target(&from), self.store.resolve_target(&to)) else {
                    warn!(%from, %to, "flow between unknown devices ignored");
                    return Vec::new();
                };
                let proto = proto.unwrap_or_default();
                match self.store.spawn_flow(&src, &dst, proto) {
                    Some(flow) => {
                        debug!(%flow, %src, %dst, %proto, "backend flow started");
                        Vec::new()
                    }
                    None => vec![self.append(&src, format!("{} is unreachable from {}", to, from))],
                }
            }
            BackendEvent::MissionUpdate { goal, flag } => {
                let completed = flag.as_deref().is_some_and(|f| f.contains("complete"));
                let mut lines = Vec::new();
                if let Some(goal) = goal {
                    if !completed {
                        lines = self.broadcast(&format!("MISSION: {}", goal));
                    }
                    self.mission.goal = Some(goal);
                }
                if let Some(flag) = flag {
                    self.set_flag(flag);
                }
                lines
            }
        }
    }

    /// Parse and apply a raw backend message; malformed payloads are
    /// logged and dropped.
    pub fn apply_backend_json(&mut self, json: &str) -> Vec<ConsoleLine> {
        match serde_json::from_str::<BackendEvent>(json) {
            Ok(event) => self.apply_backend_event(event),
            Err(err) => {
                warn!(%err, "rejected backend payload");
                Vec::new()
            }
        }
    }

    fn set_flag(&mut self, flag: String) -> bool {
        let fresh = self.mission.flags.insert(flag.clone());
        if fresh {
            info!(%flag, "mission flag set");
        }
        fresh
    }

    /// Advance the simulation. Each arrival sets
    /// `connectivity:{from}->{to}`; returns the flags set for the first
    /// time.
    pub fn tick(&mut self, dt: f32) -> Vec<String> {
        let mut fresh = Vec::new();
        for flow in self.store.tick(dt) {
            let (Some(from), Some(to)) = (flow.source(), flow.destination()) else {
                continue;
            };
            let flag = format!("connectivity:{}->{}", from, to);
            if self.set_flag(flag.clone()) {
                fresh.push(flag);
            }
        }
        fresh
    }
}
