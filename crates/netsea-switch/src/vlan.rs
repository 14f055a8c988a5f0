//! VLAN identifiers, VLAN database entries and VLAN list expressions.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchError};

/// An 802.1Q VLAN id, always within 1-4094.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// Lowest usable VLAN id.
    pub const MIN: u16 = 1;

    /// Highest usable VLAN id.
    pub const MAX: u16 = 4094;

    /// VLAN 1, present on every switch.
    pub const DEFAULT: VlanId = VlanId(1);

    /// Validate and wrap a raw id.
    pub fn new(id: u16) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&id) {
            Ok(Self(id))
        } else {
            Err(SwitchError::InvalidVlanId(id.to_string()))
        }
    }

    /// The raw numeric id.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for VlanId {
    type Error = SwitchError;

    fn try_from(value: u16) -> Result<Self> {
        Self::new(value)
    }
}

impl From<VlanId> for u16 {
    fn from(id: VlanId) -> Self {
        id.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VlanId {
    type Err = SwitchError;

    /// Digits only: signs, whitespace and hex prefixes are rejected.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SwitchError::InvalidVlanId(s.to_string()));
        }
        let value: u32 = s
            .parse()
            .map_err(|_| SwitchError::InvalidVlanId(s.to_string()))?;
        u16::try_from(value)
            .ok()
            .and_then(|v| Self::new(v).ok())
            .ok_or_else(|| SwitchError::InvalidVlanId(s.to_string()))
    }
}

/// Role of a VLAN in the database. Private VLAN roles are exclusive per id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VlanType {
    #[default]
    Normal,
    Primary,
    Community,
    Isolated,
}

impl VlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VlanType::Normal => "normal",
            VlanType::Primary => "primary",
            VlanType::Community => "community",
            VlanType::Isolated => "isolated",
        }
    }

    /// Community and isolated VLANs are secondaries of a primary.
    pub fn is_secondary(&self) -> bool {
        matches!(self, VlanType::Community | VlanType::Isolated)
    }
}

impl fmt::Display for VlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a switch's VLAN database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanEntry {
    pub id: VlanId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: VlanType,
}

impl VlanEntry {
    pub fn new(id: VlanId) -> Self {
        Self {
            id,
            name: None,
            kind: VlanType::Normal,
        }
    }

    /// Name shown in `show vlan` output; unnamed VLANs render as `VLAN<id>`.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("VLAN{}", self.id))
    }
}

/// Switched virtual interface for a VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanInterface {
    pub id: VlanId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Interface name of the SVI for a VLAN, e.g. `Vlan10`.
pub fn vlan_interface_name(id: VlanId) -> String {
    format!("Vlan{}", id)
}

/// VLAN id encoded in an SVI name (`vlan10`, `Vlan10`).
pub fn vlan_from_interface(name: &str) -> Option<VlanId> {
    let lower = name.to_ascii_lowercase();
    lower.strip_prefix("vlan")?.parse().ok()
}

/// Parse a VLAN list such as `10,20-22`.
///
/// Whitespace is ignored, duplicates collapse and the result is sorted.
/// A malformed segment, a reversed range or an id outside 1-4094 fails the
/// whole expression; nothing is partially accepted.
pub fn parse_vlan_list(expr: &str) -> Result<Vec<VlanId>> {
    let cleaned: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
    let invalid = || SwitchError::InvalidVlanList(expr.to_string());

    let mut collected = BTreeSet::new();
    for segment in cleaned.split(',').filter(|s| !s.is_empty()) {
        match segment.split_once('-') {
            Some((start, end)) => {
                let start: VlanId = start.parse().map_err(|_| invalid())?;
                let end: VlanId = end.parse().map_err(|_| invalid())?;
                if end < start {
                    return Err(invalid());
                }
                for raw in start.get()..=end.get() {
                    collected.insert(VlanId(raw));
                }
            }
            None => {
                collected.insert(segment.parse::<VlanId>().map_err(|_| invalid())?);
            }
        }
    }

    if collected.is_empty() {
        return Err(invalid());
    }
    Ok(collected.into_iter().collect())
}

/// Comma-join a list of ids for display.
pub fn format_vlan_list(ids: &[VlanId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(raw: &[u16]) -> Vec<VlanId> {
        raw.iter().map(|&v| VlanId::new(v).unwrap()).collect()
    }

    #[test]
    fn vlan_id_bounds() {
        assert!(VlanId::new(0).is_err());
        assert!(VlanId::new(1).is_ok());
        assert!(VlanId::new(4094).is_ok());
        assert!(VlanId::new(4095).is_err());
    }

    #[test]
    fn vlan_id_rejects_non_digits() {
        assert!("".parse::<VlanId>().is_err());
        assert!("+5".parse::<VlanId>().is_err());
        assert!("1e3".parse::<VlanId>().is_err());
        assert!("99999999999".parse::<VlanId>().is_err());
        assert_eq!("0010".parse::<VlanId>().unwrap().get(), 10);
    }

    #[test]
    fn list_with_range() {
        assert_eq!(parse_vlan_list("10,20-22").unwrap(), ids(&[10, 20, 21, 22]));
    }

    #[test]
    fn list_dedupes_and_sorts() {
        assert_eq!(parse_vlan_list("30, 10,10-11").unwrap(), ids(&[10, 11, 30]));
    }

    #[test]
    fn reversed_range_fails() {
        assert!(parse_vlan_list("5-3").is_err());
    }

    #[test]
    fn out_of_range_fails_whole_expression() {
        assert!(parse_vlan_list("10,4095").is_err());
        assert!(parse_vlan_list("0-3").is_err());
    }

    #[test]
    fn malformed_segments_fail() {
        assert!(parse_vlan_list("10-").is_err());
        assert!(parse_vlan_list("a,b").is_err());
        assert!(parse_vlan_list("1-2-3").is_err());
        assert!(parse_vlan_list("").is_err());
        assert!(parse_vlan_list(",,").is_err());
    }

    #[test]
    fn svi_names_round_trip() {
        let id = VlanId::new(10).unwrap();
        assert_eq!(vlan_interface_name(id), "Vlan10");
        assert_eq!(vlan_from_interface("vlan10"), Some(id));
        assert_eq!(vlan_from_interface("Fa0/1"), None);
        assert_eq!(vlan_from_interface("Vlan0"), None);
    }

    #[test]
    fn vlan_id_serializes_as_number() {
        let json = serde_json::to_string(&VlanId::new(42).unwrap()).unwrap();
        assert_eq!(json, "42");
        assert!(serde_json::from_str::<VlanId>("0").is_err());
    }

    proptest! {
        #[test]
        fn parsed_lists_are_sorted_unique_and_in_range(
            parts in proptest::collection::vec((1u16..=4094, 0u16..5), 1..8)
        ) {
            let expr = parts
                .iter()
                .map(|(start, span)| {
                    let end = start.saturating_add(*span).min(4094);
                    if *span == 0 { start.to_string() } else { format!("{}-{}", start, end) }
                })
                .collect::<Vec<_>>()
                .join(",");
            let parsed = parse_vlan_list(&expr).unwrap();
            prop_assert!(parsed.windows(2).all(|w| w[0] < w[1]));
            for (start, _) in &parts {
                prop_assert!(parsed.contains(&VlanId::new(*start).unwrap()));
            }
        }

        #[test]
        fn single_ids_parse_iff_in_range(raw in 0u32..5000) {
            let ok = (1..=4094).contains(&raw);
            prop_assert_eq!(parse_vlan_list(&raw.to_string()).is_ok(), ok);
        }
    }
}
