//! Per-port IP configuration.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortMode {
    #[default]
    Dhcp,
    Static,
}

/// IP settings of one `(node, port)`. A port with no entry behaves like
/// `PortConfig::default()`: DHCP with no address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConfig {
    pub mode: PortMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_cidr: Option<u8>,
}

impl PortConfig {
    /// DHCP port that has not been handed an address yet.
    pub fn is_free_dhcp(&self) -> bool {
        self.mode == PortMode::Dhcp && self.ip.is_none()
    }
}

/// Dotted mask for a prefix length; lengths above 32 saturate.
pub fn cidr_to_mask(cidr: u8) -> Ipv4Addr {
    let bits = u32::from(cidr.min(32));
    let mask = if bits == 0 { 0 } else { u32::MAX << (32 - bits) };
    Ipv4Addr::from(mask)
}

/// Prefix length of a dotted mask, or `None` if the ones are not contiguous.
pub fn mask_to_cidr(mask: Ipv4Addr) -> Option<u8> {
    let raw = u32::from(mask);
    let ones = raw.leading_ones();
    if raw.checked_shl(ones).unwrap_or(0) != 0 {
        return None;
    }
    u8::try_from(ones).ok()
}
