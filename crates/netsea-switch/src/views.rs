//! Text views of switch state, one function per `show` variant.

use crate::config::SwitchVlanConfig;
use crate::vlan::{format_vlan_list, VlanEntry, VlanId, VlanType};

const VLAN_HEADER: &str = "VLAN  Name               Type";

/// Selector for `show vlan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlanFilter<'a> {
    Brief,
    Summary,
    PrivateVlan,
    Id(VlanId),
    Name(&'a str),
}

fn vlan_row(entry: &VlanEntry) -> String {
    format!(
        "{:<5} {:<18} {}",
        entry.id.to_string(),
        entry.display_name(),
        entry.kind
    )
}

pub fn vlan_table(cfg: &SwitchVlanConfig, filter: VlanFilter<'_>) -> Vec<String> {
    match filter {
        VlanFilter::Summary => {
            let total = cfg.vlan_database.len();
            let primary = cfg
                .vlan_database
                .values()
                .filter(|e| e.kind == VlanType::Primary)
                .count();
            let secondary = cfg
                .vlan_database
                .values()
                .filter(|e| e.kind.is_secondary())
                .count();
            vec![
                format!(
                    "VLAN summary: total={} primary={} secondary={}",
                    total, primary, secondary
                ),
                format!(
                    "Dot1Q native tagging: {}",
                    if cfg.dot1q_tag_native { "enabled" } else { "disabled" }
                ),
            ]
        }
        VlanFilter::PrivateVlan => {
            let mut lines = vec!["Primary  Type        Secondary VLANs".to_string()];
            for assoc in &cfg.private_vlan_associations {
                let kind = cfg
                    .vlan_database
                    .get(&assoc.primary)
                    .map_or(VlanType::Primary, |e| e.kind);
                let secondaries = if assoc.secondaries.is_empty() {
                    "-".to_string()
                } else {
                    format_vlan_list(&assoc.secondaries)
                };
                lines.push(format!(
                    "{:<8} {:<10} {}",
                    assoc.primary.to_string(),
                    kind.as_str(),
                    secondaries
                ));
            }
            if lines.len() == 1 {
                lines.push("(no private VLAN associations configured)".to_string());
            }
            lines
        }
        VlanFilter::Name(needle) => {
            let needle_lower = needle.to_lowercase();
            let rows: Vec<String> = cfg
                .vlan_database
                .values()
                .filter(|e| e.display_name().to_lowercase().contains(&needle_lower))
                .map(vlan_row)
                .collect();
            if rows.is_empty() {
                return vec![format!("No VLAN name contains '{}'", needle)];
            }
            std::iter::once(VLAN_HEADER.to_string()).chain(rows).collect()
        }
        VlanFilter::Brief | VlanFilter::Id(_) => {
            let mut lines = vec![VLAN_HEADER.to_string()];
            lines.extend(
                cfg.vlan_database
                    .values()
                    .filter(|e| match filter {
                        VlanFilter::Id(id) => e.id == id,
                        _ => true,
                    })
                    .map(vlan_row),
            );
            if lines.len() == 1 {
                lines.push("No VLANs defined".to_string());
            }
            lines
        }
    }
}

/// `show interfaces private-vlan mapping`.
pub fn private_vlan_mapping_table(cfg: &SwitchVlanConfig) -> Vec<String> {
    let mut lines = vec!["Interface        Primary  Mapping".to_string()];
    for (iface, port) in &cfg.switchports {
        let Some(mapping) = &port.private_mapping else {
            continue;
        };
        let secondaries = if mapping.secondaries.is_empty() {
            "-".to_string()
        } else {
            format_vlan_list(&mapping.secondaries)
        };
        lines.push(format!(
            "{:<16} {:<8} {}",
            iface,
            mapping.primary.to_string(),
            secondaries
        ));
    }
    if lines.len() == 1 {
        lines.push("(no interface private VLAN mappings configured)".to_string());
    }
    lines
}

pub fn vtp_status(cfg: &SwitchVlanConfig) -> Vec<String> {
    let vtp = &cfg.vtp;
    let mut lines = vec![
        format!("VTP Version                     : {}", vtp.version),
        format!("Configuration Revision          : {}", vtp.revision()),
        format!("Maximum VLANs supported locally : {}", VlanId::MAX),
        format!("Number of existing VLANs        : {}", cfg.vlan_database.len()),
        format!("VTP Operating Mode              : {}", vtp.mode),
        format!(
            "VTP Domain Name                 : {}",
            vtp.domain.as_deref().unwrap_or("(not set)")
        ),
        format!(
            "VTP Pruning Mode                : {}",
            if vtp.pruning { "enabled" } else { "disabled" }
        ),
        format!(
            "VTP Password                    : {}",
            if vtp.password.is_some() { "(set)" } else { "(not set)" }
        ),
        format!(
            "Primary Server                  : {}",
            if vtp.primary { "yes" } else { "no" }
        ),
    ];
    if let Some(stamp) = &vtp.last_cleared {
        lines.push(format!("Counters Last Cleared           : {}", stamp));
    }
    lines
}

pub fn vtp_counters(cfg: &SwitchVlanConfig) -> Vec<String> {
    let counters = &cfg.vtp.counters;
    let mut lines = vec![
        format!("Summary advertisements : {}", counters.summary),
        format!("Subset advertisements  : {}", counters.subset),
        format!("Request advertisements : {}", counters.req),
        format!("Join messages          : {}", counters.join),
    ];
    if let Some(stamp) = &cfg.vtp.last_cleared {
        lines.push(format!("Last cleared           : {}", stamp));
    }
    lines
}

/// The password is never shown; at most eight `*` stand in for it.
pub fn vtp_password(cfg: &SwitchVlanConfig) -> Vec<String> {
    let shown = match &cfg.vtp.password {
        Some(pwd) if !pwd.is_empty() => "*".repeat(pwd.chars().count().min(8)),
        _ => "(not set)".to_string(),
    };
    vec![format!("VTP password: {}", shown)]
}

pub fn vtp_devices(cfg: &SwitchVlanConfig) -> Vec<String> {
    if cfg.vtp.devices.is_empty() {
        return vec!["VTP devices: (none learned)".to_string()];
    }
    std::iter::once("VTP devices:".to_string())
        .chain(cfg.vtp.devices.iter().map(|d| format!(" {}", d)))
        .collect()
}

pub fn vtp_interfaces(cfg: &SwitchVlanConfig) -> Vec<String> {
    if cfg.vtp.interfaces.is_empty() {
        return vec!["VTP aware interfaces: none".to_string()];
    }
    std::iter::once("VTP aware interfaces:".to_string())
        .chain(cfg.vtp.interfaces.iter().map(|i| format!(" {}", i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vtp::VtpSetting;

    fn vlan(id: u16) -> VlanId {
        VlanId::new(id).unwrap()
    }

    #[test]
    fn brief_lists_default_vlan() {
        let cfg = SwitchVlanConfig::default();
        let lines = vlan_table(&cfg, VlanFilter::Brief);
        assert_eq!(lines[0], VLAN_HEADER);
        assert_eq!(lines[1], "1     default            normal");
    }

    #[test]
    fn unnamed_vlans_render_generated_name() {
        let mut cfg = SwitchVlanConfig::default();
        cfg.ensure_vlan(vlan(30));
        let lines = vlan_table(&cfg, VlanFilter::Id(vlan(30)));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("30    VLAN30"));
    }

    #[test]
    fn id_filter_without_match_says_so() {
        let cfg = SwitchVlanConfig::default();
        let lines = vlan_table(&cfg, VlanFilter::Id(vlan(99)));
        assert_eq!(lines[1], "No VLANs defined");
    }

    #[test]
    fn summary_counts_roles() {
        let mut cfg = SwitchVlanConfig::default();
        cfg.set_vlan_type(vlan(100), VlanType::Primary);
        cfg.set_vlan_type(vlan(101), VlanType::Community);
        cfg.set_vlan_type(vlan(102), VlanType::Isolated);
        let lines = vlan_table(&cfg, VlanFilter::Summary);
        assert_eq!(lines[0], "VLAN summary: total=4 primary=1 secondary=2");
        assert_eq!(lines[1], "Dot1Q native tagging: disabled");
    }

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        let mut cfg = SwitchVlanConfig::default();
        cfg.define_vlans(&[vlan(10)], Some("Sales"));
        let lines = vlan_table(&cfg, VlanFilter::Name("SAL"));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("Sales"));
        let none = vlan_table(&cfg, VlanFilter::Name("hr"));
        assert_eq!(none, vec!["No VLAN name contains 'hr'".to_string()]);
    }

    #[test]
    fn private_vlan_tables() {
        let mut cfg = SwitchVlanConfig::default();
        assert_eq!(vlan_table(&cfg, VlanFilter::PrivateVlan).len(), 2);
        cfg.set_vlan_type(vlan(100), VlanType::Primary);
        cfg.map_private_vlan(Some("Fa0/2"), vlan(100), vec![vlan(101), vlan(102)]);
        let assoc = vlan_table(&cfg, VlanFilter::PrivateVlan);
        assert_eq!(assoc[1], "100      primary    101,102");
        let mapping = private_vlan_mapping_table(&cfg);
        assert_eq!(mapping[1], "Fa0/2            100      101,102");
    }

    #[test]
    fn status_reflects_primary_and_password() {
        let mut cfg = SwitchVlanConfig::default();
        cfg.vtp.apply(VtpSetting::Password("secret-password".into()));
        cfg.vtp.promote_primary();
        let lines = vtp_status(&cfg);
        assert!(lines.contains(&"Configuration Revision          : 1".to_string()));
        assert!(lines.contains(&"Maximum VLANs supported locally : 4094".to_string()));
        assert!(lines.contains(&"VTP Password                    : (set)".to_string()));
        assert_eq!(vtp_password(&cfg), vec!["VTP password: ********".to_string()]);
    }

    #[test]
    fn short_password_mask_matches_length() {
        let mut cfg = SwitchVlanConfig::default();
        assert_eq!(vtp_password(&cfg), vec!["VTP password: (not set)".to_string()]);
        cfg.vtp.apply(VtpSetting::Password("abc".into()));
        assert_eq!(vtp_password(&cfg), vec!["VTP password: ***".to_string()]);
    }

    #[test]
    fn counters_show_last_cleared() {
        let mut cfg = SwitchVlanConfig::default();
        assert_eq!(vtp_counters(&cfg).len(), 4);
        cfg.vtp.clear_counters("yesterday");
        let lines = vtp_counters(&cfg);
        assert_eq!(lines[4], "Last cleared           : yesterday");
    }

    #[test]
    fn device_and_interface_lists() {
        let mut cfg = SwitchVlanConfig::default();
        assert_eq!(vtp_devices(&cfg), vec!["VTP devices: (none learned)".to_string()]);
        cfg.vtp.learn_device("SW2");
        cfg.vtp.interfaces.push("Fa0/8".into());
        assert_eq!(vtp_devices(&cfg), vec!["VTP devices:".to_string(), " SW2".to_string()]);
        assert_eq!(vtp_interfaces(&cfg)[1], " Fa0/8");
    }
}
