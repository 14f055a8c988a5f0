//! Network Sea switch configuration model
//!
//! Per-switch VLAN state for the simulator: the VLAN database, switched
//! virtual interfaces, switchport settings, private VLANs and VTP.
//!
//! # Architecture
//!
//! - **vlan**: `VlanId` (1-4094), database entries, VLAN list expressions
//! - **switchport**: per-interface mode and the VLANs it admits
//! - **vtp**: VTP mode/domain/version state and per-port overrides
//! - **config**: `SwitchVlanConfig`, the unit of copy-on-write mutation
//! - **views**: the text tables printed by `show vlan` / `show vtp`
//!
//! # Usage
//!
//! ```
//! use netsea_switch::{parse_vlan_list, SwitchVlanConfig};
//!
//! let mut cfg = SwitchVlanConfig::default();
//! let ids = parse_vlan_list("10,20-22").unwrap();
//! cfg.define_vlans(&ids, Some("LAB"));
//! assert_eq!(cfg.vlan_database.len(), 5);
//! ```

mod config;
mod error;
mod switchport;
mod vlan;
mod vtp;

pub mod views;

pub use config::{SwitchVlanConfig, DEBUG_MODULES};
pub use error::{Result, SwitchError};
pub use switchport::{
    Cos, PriorityExtend, PrivateRole, PrivateVlanMapping, SwitchportConfig, SwitchportMode,
};
pub use vlan::{
    format_vlan_list, parse_vlan_list, vlan_from_interface, vlan_interface_name, VlanEntry,
    VlanId, VlanInterface, VlanType,
};
pub use vtp::{PortVtpOverride, VtpCounters, VtpMode, VtpSetting, VtpState, VtpVersion};
