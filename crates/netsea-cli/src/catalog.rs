//! Declarative command catalog and the token-prefix matcher.
//!
//! Each typed token must be a prefix of the corresponding pattern token,
//! so `sh ip int br` matches `show ip interface brief`. Definitions are
//! tried in declaration order and the first one whose pattern matches
//! and whose mode set contains the current mode wins. Longer patterns
//! that share a head with a shorter one (`interface vlan` / `interface`)
//! are declared first.

use netsea_topology::NodeKind;
use serde::Serialize;

use crate::mode::CliMode;

/// Stable identifier of a catalog entry; the interpreter dispatches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandId {
    Enable,
    Disable,
    ConfigureTerminal,
    InterfaceVlan,
    Interface,
    Exit,
    End,
    Show,
    ShowIp,
    ShowIpInterfaceBrief,
    IpAddress,
    NoIpAddress,
    Shutdown,
    NoShutdown,
    Help,
    ClearVtpCounters,
    DebugSwVlan,
    ShowInterfacesPvlanMapping,
    ShowVlan,
    ShowVtp,
    VtpPrimary,
    Vtp,
    NoVtpPruning,
    VlanDot1qTagNative,
    NoVlanDot1qTagNative,
    VlanDefine,
    PrivateVlanPrimary,
    PrivateVlanCommunity,
    PrivateVlanIsolated,
    PrivateVlanAssociation,
    PrivateVlanMapping,
    SwitchportModePrivateVlan,
    SwitchportMode,
    SwitchportAccessVlan,
    NoSwitchportAccessVlan,
    SwitchportPriorityExtend,
    NoSwitchportPriorityExtend,
    SwitchportTrunkAllowed,
    SwitchportTrunkNative,
    SwitchportTrunkPruning,
    Dot1qVlanNative,
}

/// Which devices offer a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every device.
    Any,
    /// Everything but PCs; on a PC the command is refused rather than
    /// forwarded.
    Device,
    /// Switches only; elsewhere the line falls through to forwarding.
    Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Group {
    Common,
    Switch,
}

/// One entry of the command catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CommandDef {
    pub id: CommandId,
    pub usage: &'static str,
    pub description: &'static str,
    pub patterns: &'static [&'static [&'static str]],
    pub modes: &'static [CliMode],
    pub scope: Scope,
    pub group: Group,
    pub section: &'static str,
    /// Match only when nothing follows the pattern.
    pub exact: bool,
}

impl CommandDef {
    pub fn allows(&self, mode: CliMode) -> bool {
        self.modes.contains(&mode)
    }

    pub fn offered_on(&self, kind: NodeKind) -> bool {
        match self.scope {
            Scope::Any | Scope::Device => true,
            Scope::Switch => kind == NodeKind::Switch,
        }
    }

    /// Pattern length consumed when `tokens` match one of the patterns.
    pub fn match_tokens(&self, tokens: &[String]) -> Option<usize> {
        self.patterns
            .iter()
            .find(|pattern| pattern_matches(tokens, pattern, self.exact))
            .map(|pattern| pattern.len())
    }

    /// Explanation printed when the command is typed in the wrong mode.
    pub fn mode_hint(&self, current: CliMode) -> String {
        if current == CliMode::User && !self.allows(CliMode::User) {
            return format!("{}: run enable first", self.usage);
        }
        if self.modes == CliMode::INTERFACE {
            return format!("{}: run this command in interface mode", self.usage);
        }
        if self.modes == CliMode::CONFIG {
            return format!("{}: run configure terminal first", self.usage);
        }
        let modes: Vec<&str> = self.modes.iter().map(CliMode::as_str).collect();
        format!("{}: available in {} mode", self.usage, modes.join("/"))
    }
}

/// Whether `tokens` start with `pattern`, token by token, by prefix.
pub fn pattern_matches(tokens: &[String], pattern: &[&str], exact: bool) -> bool {
    if tokens.len() < pattern.len() || (exact && tokens.len() != pattern.len()) {
        return false;
    }
    pattern
        .iter()
        .zip(tokens)
        .all(|(word, typed)| !typed.is_empty() && word.starts_with(typed.as_str()))
}

/// Result of looking a tokenized line up in the catalog.
#[derive(Debug, Clone, Copy)]
pub enum Lookup {
    Found {
        def: &'static CommandDef,
        consumed: usize,
    },
    /// Matched, but only by commands that need another mode.
    WrongMode(&'static CommandDef),
    /// Nothing in the catalog; the line goes to the backend.
    Unknown,
}

/// Look up lower-cased `tokens` for a device of `kind` in `mode`.
pub fn lookup(tokens: &[String], mode: CliMode, kind: NodeKind) -> Lookup {
    let mut wrong_mode = None;
    for def in COMMANDS.iter().filter(|d| d.offered_on(kind)) {
        let Some(consumed) = def.match_tokens(tokens) else {
            continue;
        };
        if def.allows(mode) {
            return Lookup::Found { def, consumed };
        }
        wrong_mode.get_or_insert(def);
    }
    match wrong_mode {
        Some(def) => Lookup::WrongMode(def),
        None => Lookup::Unknown,
    }
}

pub fn find(id: CommandId) -> Option<&'static CommandDef> {
    COMMANDS.iter().find(|d| d.id == id)
}

/// Commands usable on `kind` in `mode`, in catalog order.
pub fn available(mode: CliMode, kind: NodeKind) -> impl Iterator<Item = &'static CommandDef> {
    COMMANDS
        .iter()
        .filter(move |d| d.offered_on(kind) && d.allows(mode))
}

macro_rules! command {
    (
        $id:ident, $usage:literal, $desc:literal,
        [$($pattern:expr),+ $(,)?],
        $modes:expr, $scope:ident, $group:ident, $section:literal
        $(, exact = $exact:literal)?
    ) => {
        CommandDef {
            id: CommandId::$id,
            usage: $usage,
            description: $desc,
            patterns: &[$($pattern),+],
            modes: $modes,
            scope: Scope::$scope,
            group: Group::$group,
            section: $section,
            exact: command!(@exact $($exact)?),
        }
    };
    (@exact $exact:literal) => { $exact };
    (@exact) => { false };
}

pub static COMMANDS: &[CommandDef] = &[
    command!(Enable, "enable", "Enter privileged EXEC mode",
        [&["enable"]], CliMode::ALL, Any, Common, "Basics"),
    command!(Disable, "disable", "Return to user EXEC mode",
        [&["disable"]], CliMode::ENABLED, Any, Common, "Basics"),
    command!(ConfigureTerminal, "configure terminal", "Enter global configuration mode",
        [&["configure", "terminal"], &["conf", "t"]], CliMode::ENABLED, Device, Common, "Basics"),
    command!(InterfaceVlan, "interface vlan <ID>", "Create and configure a VLAN interface",
        [&["interface", "vlan"]], CliMode::CONFIG, Device, Common, "Interface"),
    command!(Interface, "interface <PORT>", "Configure a physical port",
        [&["interface"]], CliMode::CONFIG, Device, Common, "Interface"),
    command!(Exit, "exit", "Leave the current mode",
        [&["exit"]], CliMode::ALL, Any, Common, "Basics"),
    command!(End, "end", "Return to privileged EXEC mode",
        [&["end"]], CliMode::CONFIG, Any, Common, "Basics"),
    command!(Show, "show", "List show commands",
        [&["show"]], CliMode::ALL, Any, Common, "Monitoring", exact = true),
    command!(ShowIp, "show ip", "List show ip subcommands",
        [&["show", "ip"]], CliMode::ALL, Any, Common, "Monitoring", exact = true),
    command!(ShowIpInterfaceBrief, "show ip interface brief", "Port addressing and status",
        [&["show", "ip", "interface", "brief"], &["show", "ip", "int", "brief"]],
        CliMode::ALL, Any, Common, "Monitoring"),
    command!(IpAddress, "ip address <IP> <MASK>", "Assign a static address (dotted mask or prefix length)",
        [&["ip", "address"]], CliMode::INTERFACE, Any, Common, "Interface"),
    command!(NoIpAddress, "no ip address", "Remove the port address",
        [&["no", "ip", "address"]], CliMode::INTERFACE, Any, Common, "Interface"),
    command!(Shutdown, "shutdown", "Administratively disable the port's link",
        [&["shutdown"]], CliMode::INTERFACE, Any, Common, "Interface"),
    command!(NoShutdown, "no shutdown", "Bring the port's link back up",
        [&["no", "shutdown"]], CliMode::INTERFACE, Any, Common, "Interface"),
    command!(Help, "help", "List available commands",
        [&["help"], &["?"]], CliMode::ALL, Any, Common, "Basics"),
    command!(ClearVtpCounters, "clear vtp counters", "Reset VTP advertisement counters",
        [&["clear", "vtp", "counters"]], CliMode::ENABLED, Switch, Switch, "VTP"),
    command!(DebugSwVlan, "debug sw-vlan [MODULE...]", "Enable sw-vlan debug modules",
        [&["debug", "sw-vlan"]], CliMode::ENABLED, Switch, Switch, "VLAN/Debug"),
    command!(ShowInterfacesPvlanMapping, "show interfaces private-vlan mapping", "Per-port private VLAN mappings",
        [&["show", "interfaces", "private-vlan", "mapping"]], CliMode::ENABLED, Switch, Switch, "Private VLAN"),
    command!(ShowVlan, "show vlan [brief|summary|private-vlan|id <ID>|name <NAME>]", "VLAN database",
        [&["show", "vlan"]], CliMode::ENABLED, Switch, Switch, "VLAN basics"),
    command!(ShowVtp, "show vtp [status|counters|password|devices|interfaces]", "VTP state",
        [&["show", "vtp"]], CliMode::ENABLED, Switch, Switch, "VTP"),
    command!(VtpPrimary, "vtp primary", "Become the VTP primary server",
        [&["vtp", "primary"]], CliMode::ENABLED, Switch, Switch, "VTP"),
    command!(Vtp, "vtp <mode|domain|password|pruning|version> ...", "Set a VTP parameter",
        [&["vtp"]], CliMode::ENABLED, Switch, Switch, "VTP"),
    command!(NoVtpPruning, "no vtp pruning", "Disable VTP pruning",
        [&["no", "vtp", "pruning"]], CliMode::ENABLED, Switch, Switch, "VTP"),
    command!(VlanDot1qTagNative, "vlan dot1q tag native", "Tag native VLAN frames on trunks",
        [&["vlan", "dot1q", "tag", "native"]], CliMode::ENABLED, Switch, Switch, "VLAN extensions"),
    command!(NoVlanDot1qTagNative, "no vlan dot1q tag native", "Stop tagging native VLAN frames",
        [&["no", "vlan", "dot1q", "tag", "native"]], CliMode::ENABLED, Switch, Switch, "VLAN extensions"),
    command!(VlanDefine, "vlan <ID[,ID2]|ID-Range> [name <NAME>]", "Define VLANs",
        [&["vlan"]], CliMode::ENABLED, Switch, Switch, "VLAN basics"),
    command!(PrivateVlanPrimary, "private-vlan primary <ID>", "Mark a VLAN as private primary",
        [&["private-vlan", "primary"]], CliMode::ENABLED, Switch, Switch, "Private VLAN"),
    command!(PrivateVlanCommunity, "private-vlan community <ID>", "Mark a VLAN as community secondary",
        [&["private-vlan", "community"]], CliMode::ENABLED, Switch, Switch, "Private VLAN"),
    command!(PrivateVlanIsolated, "private-vlan isolated <ID>", "Mark a VLAN as isolated secondary",
        [&["private-vlan", "isolated"]], CliMode::ENABLED, Switch, Switch, "Private VLAN"),
    command!(PrivateVlanAssociation, "private-vlan association <PRIMARY> <LIST>", "Associate secondaries with a primary",
        [&["private-vlan", "association"]], CliMode::ENABLED, Switch, Switch, "Private VLAN"),
    command!(PrivateVlanMapping, "private-vlan mapping [<PRIMARY>] <LIST>", "Map secondaries on this interface",
        [&["private-vlan", "mapping"]], CliMode::ENABLED, Switch, Switch, "Private VLAN"),
    command!(SwitchportModePrivateVlan, "switchport mode private-vlan <host|promiscuous>", "Private VLAN port role",
        [&["switchport", "mode", "private-vlan"]], CliMode::INTERFACE, Switch, Switch, "Private VLAN"),
    command!(SwitchportMode, "switchport mode <access|trunk>", "Access or trunk port",
        [&["switchport", "mode"]], CliMode::INTERFACE, Switch, Switch, "Switchport/Trunk"),
    command!(SwitchportAccessVlan, "switchport access vlan <ID>", "Access VLAN of the port",
        [&["switchport", "access", "vlan"]], CliMode::INTERFACE, Switch, Switch, "Switchport/Trunk"),
    command!(NoSwitchportAccessVlan, "no switchport access vlan", "Remove the access VLAN",
        [&["no", "switchport", "access", "vlan"]], CliMode::INTERFACE, Switch, Switch, "Switchport/Trunk"),
    command!(SwitchportPriorityExtend, "switchport priority extend [cos <0-7>|trust]", "CoS handling for attached devices",
        [&["switchport", "priority", "extend"]], CliMode::INTERFACE, Switch, Switch, "Switchport/Trunk"),
    command!(NoSwitchportPriorityExtend, "no switchport priority extend", "Remove priority extend",
        [&["no", "switchport", "priority", "extend"]], CliMode::INTERFACE, Switch, Switch, "Switchport/Trunk"),
    command!(SwitchportTrunkAllowed, "switchport trunk allowed vlan <LIST|all>", "VLANs carried by the trunk",
        [&["switchport", "trunk", "allowed", "vlan"]], CliMode::INTERFACE, Switch, Switch, "Switchport/Trunk"),
    command!(SwitchportTrunkNative, "switchport trunk native vlan <ID>", "Native VLAN of the trunk",
        [&["switchport", "trunk", "native", "vlan"]], CliMode::INTERFACE, Switch, Switch, "Switchport/Trunk"),
    command!(SwitchportTrunkPruning, "switchport trunk pruning vlan <LIST|all>", "VLANs eligible for pruning",
        [&["switchport", "trunk", "pruning", "vlan"]], CliMode::INTERFACE, Switch, Switch, "Switchport/Trunk"),
    command!(Dot1qVlanNative, "dot1q vlan native <ID>", "802.1Q native VLAN of the interface",
        [&["dot1q", "vlan", "native"]], CliMode::INTERFACE, Switch, Switch, "Switchport/Trunk"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_lowercase).collect()
    }

    fn found(line: &str, mode: CliMode, kind: NodeKind) -> Option<CommandId> {
        match lookup(&tokens(line), mode, kind) {
            Lookup::Found { def, .. } => Some(def.id),
            _ => None,
        }
    }

    #[test]
    fn abbreviations_match() {
        let id = found("sh ip int br", CliMode::User, NodeKind::Router);
        assert_eq!(id, Some(CommandId::ShowIpInterfaceBrief));
        let id = found("conf t", CliMode::Privileged, NodeKind::Router);
        assert_eq!(id, Some(CommandId::ConfigureTerminal));
        let id = found("en", CliMode::User, NodeKind::Pc);
        assert_eq!(id, Some(CommandId::Enable));
    }

    #[test]
    fn longer_patterns_win_over_shared_heads() {
        let id = found("interface vlan 10", CliMode::Config, NodeKind::Switch);
        assert_eq!(id, Some(CommandId::InterfaceVlan));
        let id = found("int Fa0/1", CliMode::Config, NodeKind::Switch);
        assert_eq!(id, Some(CommandId::Interface));
        let id = found("vlan dot1q tag native", CliMode::Config, NodeKind::Switch);
        assert_eq!(id, Some(CommandId::VlanDot1qTagNative));
        let id = found("vlan 10,20 name LAB", CliMode::Config, NodeKind::Switch);
        assert_eq!(id, Some(CommandId::VlanDefine));
    }

    #[test]
    fn bare_show_requires_exact_length() {
        assert_eq!(found("show", CliMode::User, NodeKind::Pc), Some(CommandId::Show));
        assert_eq!(found("show ip", CliMode::User, NodeKind::Pc), Some(CommandId::ShowIp));
        let id = found("show vlan brief", CliMode::Privileged, NodeKind::Switch);
        assert_eq!(id, Some(CommandId::ShowVlan));
    }

    #[test]
    fn wrong_mode_is_reported_not_forwarded() {
        match lookup(&tokens("configure terminal"), CliMode::User, NodeKind::Router) {
            Lookup::WrongMode(def) => {
                assert_eq!(def.id, CommandId::ConfigureTerminal);
                assert!(def.mode_hint(CliMode::User).contains("enable"));
            }
            other => panic!("unexpected {:?}", other),
        }
        match lookup(&tokens("shutdown"), CliMode::Config, NodeKind::Router) {
            Lookup::WrongMode(def) => {
                assert!(def.mode_hint(CliMode::Config).contains("interface mode"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn switch_commands_fall_through_elsewhere() {
        assert!(matches!(
            lookup(&tokens("show vlan"), CliMode::Privileged, NodeKind::Router),
            Lookup::Unknown
        ));
        assert!(matches!(
            lookup(&tokens("ping 10.0.0.1"), CliMode::User, NodeKind::Pc),
            Lookup::Unknown
        ));
    }

    #[test]
    fn every_id_is_declared_once() {
        for def in COMMANDS {
            let count = COMMANDS.iter().filter(|d| d.id == def.id).count();
            assert_eq!(count, 1, "{:?}", def.id);
            assert!(find(def.id).is_some());
            assert!(!def.modes.is_empty());
        }
    }

    #[test]
    fn help_listing_respects_device_and_mode() {
        let user_pc: Vec<CommandId> = available(CliMode::User, NodeKind::Pc).map(|d| d.id).collect();
        assert!(user_pc.contains(&CommandId::Enable));
        assert!(!user_pc.contains(&CommandId::ShowVlan));
        let sw: Vec<CommandId> = available(CliMode::Interface, NodeKind::Switch).map(|d| d.id).collect();
        assert!(sw.contains(&CommandId::SwitchportTrunkAllowed));
    }

    proptest! {
        #[test]
        fn any_prefix_of_a_pattern_matches(cut in 1usize..9) {
            let pattern: &[&str] = &["configure", "terminal"];
            let typed: Vec<String> = pattern
                .iter()
                .map(|w| w[..cut.min(w.len())].to_string())
                .collect();
            prop_assert!(pattern_matches(&typed, pattern, false));
        }

        #[test]
        fn non_prefixes_never_match(word in "[a-z]{1,8}") {
            let typed = vec![format!("{}x", "enable"), word];
            prop_assert!(!pattern_matches(&typed, &["enable"], false));
        }
    }
}
