//! Loopback simulation backend.
//!
//! Stands in for the external command processor: every command the
//! console forwards is turned into a short script of timed
//! [`BackendEvent`]s that the server replays into the console.

use std::time::Duration;

use netsea_cli::{BackendEvent, Console, ForwardedCommand};
use netsea_topology::Protocol;

use crate::config::BackendConfig;

/// One scripted event, `at` after the command arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub at: Duration,
    pub event: BackendEvent,
}

#[derive(Debug, Clone, Default)]
pub struct LoopbackBackend {
    config: BackendConfig,
}

impl LoopbackBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Script the answer to `cmd` against the current topology.
    pub fn plan(&self, cmd: &ForwardedCommand, console: &Console) -> Vec<Step> {
        let origin = Some(cmd.node.as_str());
        let mut words = cmd.command.split_whitespace();
        let verb = words.next().unwrap_or_default().to_lowercase();

        if verb != "ping" {
            return vec![Step {
                at: Duration::ZERO,
                event: BackendEvent::log(format!("Unknown command: {}", cmd.command.trim()), origin),
            }];
        }

        let target = words.next().unwrap_or(self.config.default_target.as_str());
        let store = console.store();
        let Some(dst) = store.resolve_target(target) else {
            return vec![Step {
                at: Duration::ZERO,
                event: BackendEvent::log(
                    format!("Ping request could not find host {}", target),
                    origin,
                ),
            }];
        };

        let mut steps = vec![Step {
            at: Duration::ZERO,
            event: BackendEvent::log(format!("Pinging {}...", target), origin),
        }];

        let path = store.vlan_path(&cmd.node, &dst);
        if path.is_empty() {
            steps.push(Step {
                at: self.config.reply_delay,
                event: BackendEvent::log("Request timed out", origin),
            });
            return steps;
        }

        if path.len() > 1 {
            steps.push(Step {
                at: self.config.flow_delay,
                event: BackendEvent::Flow {
                    from: cmd.node.to_string(),
                    to: dst.to_string(),
                    proto: Some(Protocol::Icmp),
                },
            });
        }
        steps.push(Step {
            at: self.config.reply_delay,
            event: BackendEvent::log(format!("Reply received from {}", target), origin),
        });
        steps
    }
}
