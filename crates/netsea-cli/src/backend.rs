//! Messages exchanged with the simulation backend.
//!
//! Lines the console does not recognise leave as a [`ForwardedCommand`];
//! the backend answers asynchronously with [`BackendEvent`]s.

use netsea_topology::{NodeId, Protocol};
use serde::{Deserialize, Serialize};

/// A console line handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedCommand {
    pub command: String,
    pub node: NodeId,
}

/// Backend payload, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BackendEvent {
    /// Text for one console, or every console when `origin` is absent.
    Log {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
    },

    /// Start a packet flow between two devices.
    Flow {
        from: String,
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        proto: Option<Protocol>,
    },

    MissionUpdate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        goal: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flag: Option<String>,
    },
}

impl BackendEvent {
    pub fn log(message: impl Into<String>, origin: Option<&str>) -> Self {
        BackendEvent::Log {
            message: message.into(),
            origin: origin.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_shapes() {
        let log: BackendEvent =
            serde_json::from_str(r#"{"event":"log","message":"hi","origin":"PC1"}"#).unwrap();
        assert_eq!(log, BackendEvent::log("hi", Some("PC1")));

        let flow: BackendEvent =
            serde_json::from_str(r#"{"event":"flow","from":"PC1","to":"R1","proto":"ICMP"}"#).unwrap();
        assert_eq!(
            flow,
            BackendEvent::Flow {
                from: "PC1".into(),
                to: "R1".into(),
                proto: Some(Protocol::Icmp),
            }
        );

        let mission: BackendEvent =
            serde_json::from_str(r#"{"event":"mission_update","goal":"Ping R1"}"#).unwrap();
        assert!(matches!(mission, BackendEvent::MissionUpdate { flag: None, .. }));
    }

    #[test]
    fn rejects_unknown_events() {
        assert!(serde_json::from_str::<BackendEvent>(r#"{"event":"reboot"}"#).is_err());
        assert!(serde_json::from_str::<BackendEvent>(r#"{"message":"no tag"}"#).is_err());
    }

    #[test]
    fn forwarded_command_shape() {
        let cmd = ForwardedCommand {
            command: "ping R1".into(),
            node: NodeId::from("pc1"),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], "ping R1");
        assert_eq!(json["node"], "pc1");
    }
}
