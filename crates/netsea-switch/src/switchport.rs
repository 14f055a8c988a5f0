//! Per-interface switchport configuration.
//!
//! The `mode` field decides which of the other fields are meaningful:
//! access ports read `access_vlan`, trunks read the `trunk_*` lists and
//! private VLAN ports read `private_role` / `private_mapping`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchError};
use crate::vlan::VlanId;
use crate::vtp::PortVtpOverride;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchportMode {
    Access,
    Trunk,
    PrivateHost,
    PrivatePromiscuous,
}

impl SwitchportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchportMode::Access => "access",
            SwitchportMode::Trunk => "trunk",
            SwitchportMode::PrivateHost => "private-host",
            SwitchportMode::PrivatePromiscuous => "private-promiscuous",
        }
    }
}

impl fmt::Display for SwitchportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivateRole {
    Host,
    Promiscuous,
}

impl PrivateRole {
    pub fn mode(self) -> SwitchportMode {
        match self {
            PrivateRole::Host => SwitchportMode::PrivateHost,
            PrivateRole::Promiscuous => SwitchportMode::PrivatePromiscuous,
        }
    }
}

/// Primary VLAN plus the secondaries it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateVlanMapping {
    pub primary: VlanId,
    #[serde(default)]
    pub secondaries: Vec<VlanId>,
}

impl PrivateVlanMapping {
    pub fn covers(&self, vlan: VlanId) -> bool {
        self.primary == vlan || self.secondaries.contains(&vlan)
    }
}

/// Class-of-service value, 0 through 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Cos(u8);

impl Cos {
    pub fn new(value: u8) -> Result<Self> {
        if value <= 7 {
            Ok(Self(value))
        } else {
            Err(SwitchError::InvalidCos(value.to_string()))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Cos {
    type Error = SwitchError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Cos> for u8 {
    fn from(cos: Cos) -> Self {
        cos.0
    }
}

impl std::str::FromStr for Cos {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self> {
        let raw: u8 = s
            .parse()
            .map_err(|_| SwitchError::InvalidCos(s.to_string()))?;
        Self::new(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriorityExtend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos: Option<Cos>,
    #[serde(default)]
    pub trust: bool,
}

/// Settings for one switch interface. Every field is optional; an empty
/// entry behaves like a factory-default port.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SwitchportMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_vlan: Option<VlanId>,
    /// `None` allows every VLAN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trunk_allowed_vlans: Option<Vec<VlanId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trunk_native_vlan: Option<VlanId>,
    /// `None` makes every VLAN prune-eligible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trunk_pruning_vlans: Option<Vec<VlanId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot1q_native_vlan: Option<VlanId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_extend: Option<PriorityExtend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_role: Option<PrivateRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_mapping: Option<PrivateVlanMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vtp: Option<PortVtpOverride>,
}

impl SwitchportConfig {
    /// Mode the port actually runs in. Setting an access VLAN without an
    /// explicit mode makes the port an access port.
    pub fn effective_mode(&self) -> Option<SwitchportMode> {
        self.mode
            .or_else(|| self.access_vlan.map(|_| SwitchportMode::Access))
    }

    /// Whether frames of `vlan` may cross this port.
    ///
    /// Returns `None` for an unconfigured port so the caller can decide
    /// based on what sits on the other side of the cable.
    pub fn admits(&self, vlan: VlanId) -> Option<bool> {
        let admitted = match self.effective_mode()? {
            SwitchportMode::Access => self.access_vlan.unwrap_or(VlanId::DEFAULT) == vlan,
            SwitchportMode::Trunk => self.trunk_allows(vlan),
            SwitchportMode::PrivateHost | SwitchportMode::PrivatePromiscuous => self
                .private_mapping
                .as_ref()
                .map_or(true, |mapping| mapping.covers(vlan)),
        };
        Some(admitted)
    }

    /// VLAN that untagged frames from an attached host are placed in.
    /// Private host ports use their first secondary, promiscuous ports the
    /// primary; otherwise the access VLAN.
    pub fn ingress_vlan(&self) -> Option<VlanId> {
        let mapped = match (self.effective_mode(), &self.private_mapping) {
            (Some(SwitchportMode::PrivateHost), Some(mapping)) => {
                Some(mapping.secondaries.first().copied().unwrap_or(mapping.primary))
            }
            (Some(SwitchportMode::PrivatePromiscuous), Some(mapping)) => Some(mapping.primary),
            _ => None,
        };
        mapped.or(self.access_vlan)
    }

    pub fn trunk_allows(&self, vlan: VlanId) -> bool {
        self.trunk_allowed_vlans
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&vlan))
    }

    pub fn set_private_role(&mut self, role: PrivateRole) {
        self.mode = Some(role.mode());
        self.private_role = Some(role);
    }

    pub fn vtp_mut(&mut self) -> &mut PortVtpOverride {
        self.vtp.get_or_insert_with(PortVtpOverride::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlan(id: u16) -> VlanId {
        VlanId::new(id).unwrap()
    }

    #[test]
    fn ingress_vlan_follows_private_role() {
        let mapping = PrivateVlanMapping {
            primary: vlan(100),
            secondaries: vec![vlan(101), vlan(102)],
        };
        let mut host = SwitchportConfig {
            private_mapping: Some(mapping.clone()),
            ..SwitchportConfig::default()
        };
        host.set_private_role(PrivateRole::Host);
        assert_eq!(host.ingress_vlan(), Some(vlan(101)));
        assert_eq!(host.admits(vlan(101)), Some(true));

        let mut promiscuous = SwitchportConfig {
            private_mapping: Some(mapping),
            ..SwitchportConfig::default()
        };
        promiscuous.set_private_role(PrivateRole::Promiscuous);
        assert_eq!(promiscuous.ingress_vlan(), Some(vlan(100)));

        let access = SwitchportConfig {
            access_vlan: Some(vlan(30)),
            ..SwitchportConfig::default()
        };
        assert_eq!(access.ingress_vlan(), Some(vlan(30)));
        assert_eq!(SwitchportConfig::default().ingress_vlan(), None);
    }

    #[test]
    fn unconfigured_port_defers_decision() {
        assert_eq!(SwitchportConfig::default().admits(vlan(1)), None);
    }

    #[test]
    fn access_vlan_implies_access_mode() {
        let port = SwitchportConfig {
            access_vlan: Some(vlan(10)),
            ..Default::default()
        };
        assert_eq!(port.effective_mode(), Some(SwitchportMode::Access));
        assert_eq!(port.admits(vlan(10)), Some(true));
        assert_eq!(port.admits(vlan(20)), Some(false));
    }

    #[test]
    fn explicit_access_without_vlan_is_vlan_one() {
        let port = SwitchportConfig {
            mode: Some(SwitchportMode::Access),
            ..Default::default()
        };
        assert_eq!(port.admits(vlan(1)), Some(true));
        assert_eq!(port.admits(vlan(2)), Some(false));
    }

    #[test]
    fn trunk_filters_on_allowed_list() {
        let mut port = SwitchportConfig {
            mode: Some(SwitchportMode::Trunk),
            ..Default::default()
        };
        assert_eq!(port.admits(vlan(300)), Some(true));
        port.trunk_allowed_vlans = Some(vec![vlan(10), vlan(20)]);
        assert_eq!(port.admits(vlan(20)), Some(true));
        assert_eq!(port.admits(vlan(30)), Some(false));
    }

    #[test]
    fn private_ports_follow_mapping() {
        let mut port = SwitchportConfig::default();
        port.set_private_role(PrivateRole::Host);
        assert_eq!(port.effective_mode(), Some(SwitchportMode::PrivateHost));
        assert_eq!(port.admits(vlan(7)), Some(true));

        port.private_mapping = Some(PrivateVlanMapping {
            primary: vlan(100),
            secondaries: vec![vlan(101)],
        });
        assert_eq!(port.admits(vlan(100)), Some(true));
        assert_eq!(port.admits(vlan(101)), Some(true));
        assert_eq!(port.admits(vlan(102)), Some(false));
    }

    #[test]
    fn cos_bounds() {
        assert!("7".parse::<Cos>().is_ok());
        assert!("8".parse::<Cos>().is_err());
        assert!("-1".parse::<Cos>().is_err());
    }

    #[test]
    fn serializes_kebab_modes_and_camel_fields() {
        let port = SwitchportConfig {
            mode: Some(SwitchportMode::PrivatePromiscuous),
            access_vlan: Some(vlan(5)),
            ..Default::default()
        };
        let json = serde_json::to_value(&port).unwrap();
        assert_eq!(json["mode"], "private-promiscuous");
        assert_eq!(json["accessVlan"], 5);
        assert!(json.get("trunkAllowedVlans").is_none());
    }
}
