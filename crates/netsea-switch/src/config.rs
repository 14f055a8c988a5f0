//! Per-switch VLAN configuration and its mutation helpers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::switchport::{PrivateVlanMapping, SwitchportConfig, SwitchportMode};
use crate::vlan::{vlan_interface_name, VlanEntry, VlanId, VlanInterface, VlanType};
use crate::vtp::VtpState;

/// Modules accepted by `debug sw-vlan`.
pub const DEBUG_MODULES: [&str; 10] = [
    "badpmcookies",
    "cfg-vlan",
    "events",
    "ifs",
    "mapping",
    "notification",
    "packets",
    "redundancy",
    "registries",
    "vtp",
];

/// Everything a switch knows about VLANs.
///
/// Invariant: VLANs referenced as an access or native VLAN exist in
/// `vlan_database`; the helpers below create them on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchVlanConfig {
    pub vlan_database: BTreeMap<VlanId, VlanEntry>,
    #[serde(default)]
    pub vlan_interfaces: BTreeMap<VlanId, VlanInterface>,
    #[serde(default)]
    pub private_vlan_associations: Vec<PrivateVlanMapping>,
    #[serde(default)]
    pub switchports: BTreeMap<String, SwitchportConfig>,
    #[serde(default)]
    pub vtp: VtpState,
    #[serde(default)]
    pub debug_modules: BTreeSet<String>,
    #[serde(default)]
    pub dot1q_tag_native: bool,
}

impl Default for SwitchVlanConfig {
    fn default() -> Self {
        let mut vlan_database = BTreeMap::new();
        vlan_database.insert(
            VlanId::DEFAULT,
            VlanEntry {
                id: VlanId::DEFAULT,
                name: Some("default".to_string()),
                kind: VlanType::Normal,
            },
        );
        Self {
            vlan_database,
            vlan_interfaces: BTreeMap::new(),
            private_vlan_associations: Vec::new(),
            switchports: BTreeMap::new(),
            vtp: VtpState::default(),
            debug_modules: BTreeSet::new(),
            dot1q_tag_native: false,
        }
    }
}

impl SwitchVlanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a VLAN, creating a normal one if it does not exist yet.
    pub fn ensure_vlan(&mut self, id: VlanId) -> &mut VlanEntry {
        self.vlan_database
            .entry(id)
            .or_insert_with(|| VlanEntry::new(id))
    }

    /// `vlan <list> [name <NAME>]`.
    pub fn define_vlans(&mut self, ids: &[VlanId], name: Option<&str>) {
        for &id in ids {
            let entry = self.ensure_vlan(id);
            if let Some(name) = name {
                entry.name = Some(name.to_string());
            }
        }
    }

    pub fn set_vlan_type(&mut self, id: VlanId, kind: VlanType) {
        self.ensure_vlan(id).kind = kind;
    }

    /// Replace (or add) the secondaries associated with `primary`.
    pub fn associate(&mut self, primary: VlanId, secondaries: Vec<VlanId>) {
        let secondaries = dedupe(secondaries);
        match self
            .private_vlan_associations
            .iter_mut()
            .find(|assoc| assoc.primary == primary)
        {
            Some(existing) => existing.secondaries = secondaries,
            None => self.private_vlan_associations.push(PrivateVlanMapping {
                primary,
                secondaries,
            }),
        }
    }

    /// `private-vlan mapping`: records the association and, when an
    /// interface is given, the interface's own mapping.
    pub fn map_private_vlan(
        &mut self,
        iface: Option<&str>,
        primary: VlanId,
        secondaries: Vec<VlanId>,
    ) {
        let secondaries = dedupe(secondaries);
        if let Some(iface) = iface {
            self.switchport_mut(iface).private_mapping = Some(PrivateVlanMapping {
                primary,
                secondaries: secondaries.clone(),
            });
        }
        self.associate(primary, secondaries);
    }

    /// `interface vlan <id>`: VLAN, SVI and switchport entry in one go.
    /// Returns the SVI interface name.
    pub fn create_vlan_interface(&mut self, id: VlanId) -> String {
        self.ensure_vlan(id);
        self.vlan_interfaces.insert(
            id,
            VlanInterface {
                id,
                name: Some(format!("VLAN{}", id)),
            },
        );
        let iface = vlan_interface_name(id);
        self.switchport_mut(&iface);
        iface
    }

    pub fn switchport(&self, iface: &str) -> Option<&SwitchportConfig> {
        self.switchports.get(iface)
    }

    pub fn switchport_mut(&mut self, iface: &str) -> &mut SwitchportConfig {
        self.switchports.entry(iface.to_string()).or_default()
    }

    pub fn set_switchport_mode(&mut self, iface: &str, mode: SwitchportMode) {
        self.switchport_mut(iface).mode = Some(mode);
    }

    /// `switchport access vlan <id>`.
    pub fn set_access_vlan(&mut self, iface: &str, id: VlanId) {
        self.ensure_vlan(id);
        let port = self.switchport_mut(iface);
        port.mode = Some(SwitchportMode::Access);
        port.access_vlan = Some(id);
    }

    pub fn clear_access_vlan(&mut self, iface: &str) {
        if let Some(port) = self.switchports.get_mut(iface) {
            port.access_vlan = None;
        }
    }

    /// `None` restores "all VLANs".
    pub fn set_trunk_allowed(&mut self, iface: &str, vlans: Option<Vec<VlanId>>) {
        self.switchport_mut(iface).trunk_allowed_vlans = vlans.map(dedupe);
    }

    pub fn set_trunk_native(&mut self, iface: &str, id: VlanId) {
        self.ensure_vlan(id);
        self.switchport_mut(iface).trunk_native_vlan = Some(id);
    }

    pub fn set_trunk_pruning(&mut self, iface: &str, vlans: Option<Vec<VlanId>>) {
        self.switchport_mut(iface).trunk_pruning_vlans = vlans.map(dedupe);
    }

    pub fn set_dot1q_native(&mut self, iface: &str, id: VlanId) {
        self.ensure_vlan(id);
        self.switchport_mut(iface).dot1q_native_vlan = Some(id);
    }

    /// Enable the given debug modules, ignoring unknown names.
    /// Returns the accepted modules in input order.
    pub fn enable_debug<'a>(&mut self, modules: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut accepted = Vec::new();
        for module in modules {
            let module = module.to_ascii_lowercase();
            if DEBUG_MODULES.contains(&module.as_str()) && !accepted.contains(&module) {
                self.debug_modules.insert(module.clone());
                accepted.push(module);
            }
        }
        accepted
    }

    /// SVI names, ordered by VLAN id.
    pub fn vlan_interface_names(&self) -> Vec<String> {
        self.vlan_interfaces.keys().map(|&id| vlan_interface_name(id)).collect()
    }

    /// Interfaces currently running as trunks.
    pub fn trunk_ports(&self) -> Vec<String> {
        self.switchports
            .iter()
            .filter(|(_, port)| port.effective_mode() == Some(SwitchportMode::Trunk))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Private VLAN role of a VLAN, if it has one.
    pub fn private_vlan_type(&self, id: VlanId) -> Option<VlanType> {
        self.vlan_database
            .get(&id)
            .map(|entry| entry.kind)
            .filter(|kind| *kind != VlanType::Normal)
    }
}

fn dedupe(ids: Vec<VlanId>) -> Vec<VlanId> {
    let set: BTreeSet<VlanId> = ids.into_iter().collect();
    set.into_iter().collect()
}
