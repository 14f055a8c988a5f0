//! Executes catalog commands against the store.
//!
//! Every handler validates its arguments before touching the store, so a
//! line that prints a `Usage:` or `Invalid ...` message changes nothing.

use std::net::Ipv4Addr;

use netsea_switch::views::{self, VlanFilter};
use netsea_switch::{
    format_vlan_list, parse_vlan_list, vlan_from_interface, Cos, PriorityExtend, PrivateRole,
    SwitchVlanConfig, SwitchportMode, VlanId, VlanType, VtpMode, VtpSetting, VtpVersion,
    DEBUG_MODULES,
};
use netsea_topology::{cidr_to_mask, mask_to_cidr, NetStore, Node, NodeKind, PortMode};
use tracing::{debug, info};

use crate::catalog::{self, CommandDef, CommandId, Lookup};
use crate::error::{CliError, Result};
use crate::mode::CliMode;
use crate::session::Session;

const VLAN_USAGE: &str = "vlan <ID[,ID2]|ID-Range> [name <NAME>]";

/// What became of one submitted line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    Handled(Vec<String>),
    /// Not a console command; hand it to the backend.
    Forward,
}

/// Arguments following the matched pattern, raw and lower-cased.
#[derive(Clone, Copy)]
struct Args<'a> {
    raw: &'a [&'a str],
    lower: &'a [String],
}

impl<'a> Args<'a> {
    fn get(&self, index: usize) -> Option<&'a str> {
        self.raw.get(index).copied()
    }

    fn word(&self, index: usize) -> Option<&'a str> {
        self.lower.get(index).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.raw.len()
    }

    fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    fn skip(&self, count: usize) -> Args<'a> {
        Args {
            raw: self.raw.get(count..).unwrap_or(&[]),
            lower: self.lower.get(count..).unwrap_or(&[]),
        }
    }

    /// Tokens glued back together without separators, for VLAN lists
    /// typed with stray spaces (`10, 20`).
    fn concat(&self) -> String {
        self.raw.concat()
    }

    fn vlan(&self, index: usize) -> Option<VlanId> {
        self.get(index).and_then(|s| s.parse().ok())
    }
}

/// Run `line` on `node`'s console.
pub(crate) fn execute(store: &mut NetStore, session: &mut Session, node: &Node, line: &str) -> Outcome {
    let raw: Vec<&str> = line.split_whitespace().collect();
    let lower: Vec<String> = raw.iter().map(|t| t.to_lowercase()).collect();

    let (def, consumed) = match catalog::lookup(&lower, session.mode, node.kind) {
        Lookup::Found { def, consumed } => (def, consumed),
        Lookup::WrongMode(def) => {
            debug!(node = %node.id, command = ?def.id, mode = %session.mode, "command needs another mode");
            let err = CliError::WrongMode(def.mode_hint(session.mode));
            return Outcome::Handled(vec![err.to_string()]);
        }
        Lookup::Unknown => return Outcome::Forward,
    };

    let args = Args {
        raw: &raw[consumed..],
        lower: &lower[consumed..],
    };
    let mut exec = Exec { store, session, node };
    match exec.run(def, args) {
        Ok(lines) => Outcome::Handled(lines),
        Err(err) => {
            debug!(node = %node.id, command = ?def.id, %err, "command failed");
            Outcome::Handled(vec![err.to_string()])
        }
    }
}

/// Dotted mask or prefix length.
fn parse_mask(raw: &str) -> Result<u8> {
    let cidr = if raw.contains('.') {
        raw.parse::<Ipv4Addr>().ok().and_then(mask_to_cidr)
    } else {
        raw.parse::<u8>().ok().filter(|c| *c <= 32)
    };
    cidr.ok_or_else(|| CliError::InvalidMask(raw.to_string()))
}

/// `None` means "all VLANs".
fn vlan_list_or_all(args: Args<'_>, usage: &'static str) -> Result<Option<Vec<VlanId>>> {
    let expr = args.concat();
    if expr.is_empty() || expr.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    parse_vlan_list(&expr)
        .map(Some)
        .map_err(|_| CliError::Usage(usage))
}

fn describe_list(list: &Option<Vec<VlanId>>) -> String {
    match list {
        Some(ids) => format_vlan_list(ids),
        None => "ALL".to_string(),
    }
}

struct Exec<'a> {
    store: &'a mut NetStore,
    session: &'a mut Session,
    node: &'a Node,
}

impl Exec<'_> {
    fn run(&mut self, def: &CommandDef, args: Args<'_>) -> Result<Vec<String>> {
        match def.id {
            CommandId::Enable => Ok(self.enter(CliMode::Privileged, None, "Entered privileged EXEC mode")),
            CommandId::Disable => Ok(self.enter(CliMode::User, None, "Returned to user EXEC mode")),
            CommandId::ConfigureTerminal => self.configure_terminal(),
            CommandId::InterfaceVlan => self.interface_vlan(args),
            CommandId::Interface => self.interface(args),
            CommandId::Exit => Ok(self.exit()),
            CommandId::End => Ok(self.enter(CliMode::Privileged, None, "Returned to privileged EXEC mode")),
            CommandId::Show => Ok(self.show()),
            CommandId::ShowIp => Ok(vec!["show ip subcommands:".into(), " interface brief".into()]),
            CommandId::ShowIpInterfaceBrief => Ok(self.show_ip_interface_brief()),
            CommandId::IpAddress => self.ip_address(args),
            CommandId::NoIpAddress => self.no_ip_address(),
            CommandId::Shutdown => self.set_link(false),
            CommandId::NoShutdown => self.set_link(true),
            CommandId::Help => Ok(self.help()),
            CommandId::ClearVtpCounters => self.clear_vtp_counters(),
            CommandId::DebugSwVlan => self.debug_sw_vlan(args),
            CommandId::ShowInterfacesPvlanMapping => {
                Ok(views::private_vlan_mapping_table(self.config()?))
            }
            CommandId::ShowVlan => self.show_vlan(args),
            CommandId::ShowVtp => self.show_vtp(args),
            CommandId::VtpPrimary => {
                self.update_switch(|cfg| {
                    cfg.vtp.promote_primary();
                    Ok(())
                })?;
                Ok(vec!["This switch is now the VTP primary server".into()])
            }
            CommandId::Vtp => self.vtp(args),
            CommandId::NoVtpPruning => {
                self.update_switch(|cfg| {
                    cfg.vtp.apply(VtpSetting::Pruning(false));
                    Ok(())
                })?;
                Ok(vec!["VTP pruning disabled (global)".into()])
            }
            CommandId::VlanDot1qTagNative => self.dot1q_tag_native(true),
            CommandId::NoVlanDot1qTagNative => self.dot1q_tag_native(false),
            CommandId::VlanDefine => self.vlan_define(args),
            CommandId::PrivateVlanPrimary => {
                self.private_vlan_type(args, VlanType::Primary, "private-vlan primary <ID>")
            }
            CommandId::PrivateVlanCommunity => {
                self.private_vlan_type(args, VlanType::Community, "private-vlan community <ID>")
            }
            CommandId::PrivateVlanIsolated => {
                self.private_vlan_type(args, VlanType::Isolated, "private-vlan isolated <ID>")
            }
            CommandId::PrivateVlanAssociation => self.private_vlan_association(args),
            CommandId::PrivateVlanMapping => self.private_vlan_mapping(args),
            CommandId::SwitchportModePrivateVlan => self.switchport_private_role(args),
            CommandId::SwitchportMode => self.switchport_mode(args),
            CommandId::SwitchportAccessVlan => self.switchport_access_vlan(args),
            CommandId::NoSwitchportAccessVlan => {
                let iface = self.active_interface()?;
                self.update_switch(|cfg| {
                    cfg.clear_access_vlan(&iface);
                    Ok(())
                })?;
                Ok(vec![format!("Access VLAN removed from {}", iface)])
            }
            CommandId::SwitchportPriorityExtend => self.priority_extend(args),
            CommandId::NoSwitchportPriorityExtend => {
                let iface = self.active_interface()?;
                self.update_switch(|cfg| {
                    cfg.switchport_mut(&iface).priority_extend = None;
                    Ok(())
                })?;
                Ok(vec![format!("Priority extend removed from {}", iface)])
            }
            CommandId::SwitchportTrunkAllowed => self.trunk_allowed(args),
            CommandId::SwitchportTrunkNative => self.trunk_native(args),
            CommandId::SwitchportTrunkPruning => self.trunk_pruning(args),
            CommandId::Dot1qVlanNative => self.dot1q_vlan_native(args),
        }
    }

    // ---- modes ----

    fn enter(&mut self, mode: CliMode, interface: Option<String>, message: &str) -> Vec<String> {
        let from = self.session.mode;
        self.session.enter(mode, interface);
        info!(node = %self.node.id, %from, to = %mode, "mode change");
        vec![message.to_string()]
    }

    fn configure_terminal(&mut self) -> Result<Vec<String>> {
        if self.node.kind == NodeKind::Pc {
            return Err(CliError::NotOnPc("configure terminal"));
        }
        Ok(self.enter(CliMode::Config, None, "Entered configuration mode"))
    }

    fn interface_vlan(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        match self.node.kind {
            NodeKind::Pc => return Err(CliError::NotOnPc("interface")),
            NodeKind::Switch => {}
            _ => return Err(CliError::SwitchOnly),
        }
        let id = args.vlan(0).ok_or(CliError::Usage("interface vlan <ID>"))?;
        let iface = self.update_switch(|cfg| Ok(cfg.create_vlan_interface(id)))?;
        let message = format!("Editing interface {}", iface);
        Ok(self.enter(CliMode::Interface, Some(iface), &message))
    }

    fn interface(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        if self.node.kind == NodeKind::Pc {
            return Err(CliError::NotOnPc("interface"));
        }
        let requested = args.get(0).ok_or(CliError::Usage("interface <PORT>"))?;
        let port = self
            .store
            .available_ports(&self.node.id)
            .into_iter()
            .find(|p| p.eq_ignore_ascii_case(requested))
            .ok_or_else(|| CliError::PortUnavailable(requested.to_string()))?;
        let message = format!("Editing interface {}", port);
        Ok(self.enter(CliMode::Interface, Some(port), &message))
    }

    fn exit(&mut self) -> Vec<String> {
        if self.session.mode == CliMode::User {
            return Vec::new();
        }
        let parent = self.session.mode.parent();
        let message = match parent {
            CliMode::Config => "Returned to configuration mode",
            CliMode::Privileged => "Returned to privileged EXEC mode",
            _ => "Returned to user EXEC mode",
        };
        self.enter(parent, None, message)
    }

    fn active_interface(&self) -> Result<String> {
        self.session
            .interface
            .clone()
            .ok_or_else(|| CliError::WrongMode("Run this command in interface mode".into()))
    }

    // ---- monitoring ----

    fn show(&self) -> Vec<String> {
        let mut lines = vec![
            "Available show commands:".to_string(),
            " show ip interface brief  (sh ip int br)".to_string(),
        ];
        if self.node.kind == NodeKind::Switch {
            lines.push(" show vlan [brief|summary|private-vlan|id <ID>|name <NAME>]".into());
            lines.push(" show vtp [status|counters|password|devices|interfaces]".into());
            lines.push(" show interfaces private-vlan mapping".into());
        }
        lines
    }

    fn show_ip_interface_brief(&self) -> Vec<String> {
        let node = &self.node.id;
        let mut lines = vec![format!(
            "{:<12} {:<16} {:<16} {}",
            "Interface", "IP-Address", "Mask", "Status"
        )];
        for port in self.store.available_ports(node) {
            let cfg = self.store.port(node, &port);
            let ip = cfg.ip.map_or_else(|| "unassigned".to_string(), |ip| ip.to_string());
            let mask = cfg
                .mask_cidr
                .map_or_else(|| "-".to_string(), |c| cidr_to_mask(c).to_string());
            let status = match self.store.link_on_port(node, &port) {
                Some(link) if link.up => "up",
                Some(_) => "administratively down",
                None => "down",
            };
            lines.push(format!("{:<12} {:<16} {:<16} {}", port, ip, mask, status));
        }
        lines
    }

    fn help(&self) -> Vec<String> {
        let mut lines = vec![format!("Commands available in {} mode:", self.session.mode)];
        let mut section = "";
        for def in catalog::available(self.session.mode, self.node.kind) {
            if def.section != section {
                section = def.section;
                lines.push(format!("[{}]", section));
            }
            lines.push(format!("  {:<52} {}", def.usage, def.description));
        }
        lines
    }

    // ---- addressing and links ----

    fn ip_address(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        let (Some(ip_raw), Some(mask_raw)) = (args.get(0), args.get(1)) else {
            return Err(CliError::Usage("ip address <IP> <MASK>"));
        };
        let ip: Ipv4Addr = ip_raw
            .parse()
            .map_err(|_| CliError::InvalidIp(ip_raw.to_string()))?;
        let cidr = parse_mask(mask_raw)?;

        let node = &self.node.id;
        self.store.set_port_mode(node, &iface, PortMode::Static);
        self.store.set_port_ip(node, &iface, Some(ip));
        self.store.set_port_mask(node, &iface, Some(cidr));
        Ok(vec![format!("{} configured with {} {}", iface, ip, cidr_to_mask(cidr))])
    }

    fn no_ip_address(&mut self) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        let node = &self.node.id;
        self.store.set_port_mode(node, &iface, PortMode::Static);
        self.store.set_port_ip(node, &iface, None);
        self.store.set_port_mask(node, &iface, None);
        Ok(vec![format!("IP address removed from {}", iface)])
    }

    fn set_link(&mut self, up: bool) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        let link = self
            .store
            .link_on_port(&self.node.id, &iface)
            .map(|l| l.id.clone())
            .ok_or_else(|| CliError::NotLinked(iface.clone()))?;
        self.store.set_link_status(&link, up);
        Ok(vec![if up {
            format!("{} is up", iface)
        } else {
            format!("{} is administratively down", iface)
        }])
    }

    // ---- switch configuration ----

    fn config(&self) -> Result<&SwitchVlanConfig> {
        self.store
            .switch_config(&self.node.id)
            .ok_or_else(|| netsea_topology::Error::NotASwitch(self.node.id.to_string()).into())
    }

    fn update_switch<R>(
        &mut self,
        f: impl FnOnce(&mut SwitchVlanConfig) -> netsea_switch::Result<R>,
    ) -> Result<R> {
        Ok(self.store.update_switch_config(&self.node.id, f)?)
    }

    /// Interface VTP and mapping commands apply to the edited interface
    /// when there is one.
    fn scope(&self) -> Option<String> {
        match self.session.mode {
            CliMode::Interface => self.session.interface.clone(),
            _ => None,
        }
    }

    fn clear_vtp_counters(&mut self) -> Result<Vec<String>> {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.update_switch(|cfg| {
            cfg.vtp.clear_counters(stamp);
            Ok(())
        })?;
        Ok(vec!["VTP counters cleared".into()])
    }

    fn debug_sw_vlan(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        if args.is_empty() {
            let active = &self.config()?.debug_modules;
            let list = if active.is_empty() {
                "none".to_string()
            } else {
                active.iter().cloned().collect::<Vec<_>>().join(", ")
            };
            return Ok(vec![format!("sw-vlan debugging: {}", list)]);
        }
        let known: Vec<&str> = args
            .lower
            .iter()
            .map(String::as_str)
            .filter(|m| DEBUG_MODULES.contains(m))
            .collect();
        if known.is_empty() {
            let mut lines = vec!["Available debug sw-vlan modules:".to_string()];
            lines.extend(DEBUG_MODULES.iter().map(|m| format!(" {}", m)));
            return Ok(lines);
        }
        let accepted = self.update_switch(|cfg| Ok(cfg.enable_debug(known)))?;
        Ok(vec![format!("sw-vlan debugging enabled: {}", accepted.join(", "))])
    }

    fn show_vlan(&self, args: Args<'_>) -> Result<Vec<String>> {
        let name = args.skip(1).raw.join(" ");
        let filter = match args.word(0) {
            None | Some("brief") => VlanFilter::Brief,
            Some("summary") => VlanFilter::Summary,
            Some("private-vlan") => VlanFilter::PrivateVlan,
            Some("id") => VlanFilter::Id(args.vlan(1).ok_or(CliError::Usage("show vlan id <ID>"))?),
            Some("name") if name.is_empty() => return Err(CliError::Usage("show vlan name <NAME>")),
            Some("name") => VlanFilter::Name(&name),
            Some(_) => {
                return Err(CliError::Usage(
                    "show vlan [brief|summary|private-vlan|id <ID>|name <NAME>]",
                ))
            }
        };
        Ok(views::vlan_table(self.config()?, filter))
    }

    fn show_vtp(&self, args: Args<'_>) -> Result<Vec<String>> {
        let cfg = self.config()?;
        Ok(match args.word(0) {
            Some("counters") => views::vtp_counters(cfg),
            Some("password") => views::vtp_password(cfg),
            Some("devices") => views::vtp_devices(cfg),
            Some("interface" | "interfaces") => views::vtp_interfaces(cfg),
            _ => views::vtp_status(cfg),
        })
    }

    fn vtp(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let Some(action) = args.word(0) else {
            return Ok(vec![
                "Available vtp subcommands:".into(),
                " vtp mode <server|client|transparent|off>".into(),
                " vtp domain <NAME>".into(),
                " vtp password <PASSWORD>".into(),
                " vtp pruning / no vtp pruning".into(),
                " vtp version <1-3>".into(),
            ]);
        };
        let rest = args.skip(1).raw.join(" ");
        let (setting, summary) = match action {
            "mode" => {
                let mode: VtpMode = args
                    .get(1)
                    .and_then(|m| m.parse().ok())
                    .ok_or(CliError::Usage("vtp mode <server|client|transparent|off>"))?;
                (VtpSetting::Mode(mode), format!("VTP mode set to {}", mode.as_str()))
            }
            "domain" if !rest.is_empty() => {
                (VtpSetting::Domain(rest.clone()), format!("VTP domain set to {}", rest))
            }
            "domain" => return Err(CliError::Usage("vtp domain <NAME>")),
            "password" if !rest.is_empty() => {
                (VtpSetting::Password(rest), "VTP password set".to_string())
            }
            "password" => return Err(CliError::Usage("vtp password <PASSWORD>")),
            "pruning" => (VtpSetting::Pruning(true), "VTP pruning enabled".to_string()),
            "version" => {
                let version: VtpVersion = args
                    .get(1)
                    .and_then(|v| v.parse().ok())
                    .ok_or(CliError::Usage("vtp version <1-3>"))?;
                let raw = args.get(1).unwrap_or_default();
                (VtpSetting::Version(version), format!("VTP version set to {}", raw))
            }
            _ => return Err(CliError::UnsupportedVtp),
        };

        let scope = self.scope();
        let label = scope
            .as_deref()
            .map_or_else(|| "global".to_string(), |i| format!("interface {}", i));
        self.update_switch(|cfg| {
            match &scope {
                Some(iface) => cfg.switchport_mut(iface).vtp_mut().apply(setting),
                None => cfg.vtp.apply(setting),
            }
            Ok(())
        })?;
        Ok(vec![format!("{} ({})", summary, label)])
    }

    fn dot1q_tag_native(&mut self, enabled: bool) -> Result<Vec<String>> {
        self.update_switch(|cfg| {
            cfg.dot1q_tag_native = enabled;
            Ok(())
        })?;
        let state = if enabled { "enabled" } else { "disabled" };
        Ok(vec![format!("Native VLAN tagging {}", state)])
    }

    fn vlan_define(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let split = args.lower.iter().position(|t| t == "name").unwrap_or(args.len());
        let expr = args.raw[..split].concat();
        if expr.is_empty() {
            return Err(CliError::Usage(VLAN_USAGE));
        }
        let name = args
            .raw
            .get(split + 1..)
            .map(|rest| rest.join(" "))
            .filter(|n| !n.is_empty());
        let ids = parse_vlan_list(&expr).map_err(|_| CliError::Usage(VLAN_USAGE))?;

        self.update_switch(|cfg| {
            cfg.define_vlans(&ids, name.as_deref());
            Ok(())
        })?;
        for id in &ids {
            self.store.add_vlan(&format!("VLAN {}", id));
        }
        let list = format_vlan_list(&ids);
        Ok(vec![match name {
            Some(name) => format!("VLAN {} defined with name {}", list, name),
            None => format!("VLAN {} defined", list),
        }])
    }

    fn private_vlan_type(
        &mut self,
        args: Args<'_>,
        kind: VlanType,
        usage: &'static str,
    ) -> Result<Vec<String>> {
        let id = args.vlan(0).ok_or(CliError::Usage(usage))?;
        self.update_switch(|cfg| {
            cfg.set_vlan_type(id, kind);
            Ok(())
        })?;
        Ok(vec![format!("VLAN {} set as {} VLAN", id, kind)])
    }

    fn private_vlan_association(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        const USAGE: &str = "private-vlan association <PRIMARY> <LIST>";
        let primary = args.vlan(0).ok_or(CliError::Usage(USAGE))?;
        let expr = args.skip(1).concat();
        if expr.is_empty() {
            return Err(CliError::Usage(USAGE));
        }
        let secondaries = parse_vlan_list(&expr).map_err(|_| CliError::InvalidSecondaries)?;
        let list = format_vlan_list(&secondaries);
        self.update_switch(|cfg| {
            cfg.associate(primary, secondaries);
            Ok(())
        })?;
        Ok(vec![format!("Private VLAN {} associated with {}", primary, list)])
    }

    fn private_vlan_mapping(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        const USAGE: &str = "private-vlan mapping [<PRIMARY>] <LIST>";
        let scope = self.scope();
        let (primary, expr) = match args.len() {
            0 => return Err(CliError::Usage(USAGE)),
            1 => (
                scope.as_deref().and_then(vlan_from_interface),
                args.concat(),
            ),
            _ => (args.vlan(0), args.skip(1).concat()),
        };
        let primary = primary.ok_or(CliError::Usage(USAGE))?;
        let secondaries = parse_vlan_list(&expr).map_err(|_| CliError::InvalidSecondaries)?;
        let list = format_vlan_list(&secondaries);
        let label = scope
            .as_deref()
            .map_or_else(|| "global".to_string(), |i| format!("interface {}", i));
        self.update_switch(|cfg| {
            cfg.map_private_vlan(scope.as_deref(), primary, secondaries);
            Ok(())
        })?;
        Ok(vec![format!("Private VLAN mapping ({}): {} -> {}", label, primary, list)])
    }

    // ---- switchports ----

    fn switchport_private_role(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        let role = match args.word(0) {
            Some("host") => PrivateRole::Host,
            Some("promiscuous") => PrivateRole::Promiscuous,
            _ => return Err(CliError::Usage("switchport mode private-vlan <host|promiscuous>")),
        };
        self.update_switch(|cfg| {
            cfg.switchport_mut(&iface).set_private_role(role);
            Ok(())
        })?;
        Ok(vec![format!("{} set to {} mode", iface, role.mode())])
    }

    fn switchport_mode(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        let mode = match args.word(0) {
            Some("access") => SwitchportMode::Access,
            Some("trunk") => SwitchportMode::Trunk,
            _ => return Err(CliError::Usage("switchport mode <access|trunk|private-vlan>")),
        };
        self.update_switch(|cfg| {
            cfg.set_switchport_mode(&iface, mode);
            Ok(())
        })?;
        Ok(vec![format!("{} set to {} mode", iface, mode)])
    }

    fn switchport_access_vlan(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        let id = args
            .vlan(0)
            .ok_or(CliError::Usage("switchport access vlan <ID>"))?;
        self.update_switch(|cfg| {
            cfg.set_access_vlan(&iface, id);
            Ok(())
        })?;
        Ok(vec![format!("{} access VLAN set to {}", iface, id)])
    }

    fn priority_extend(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        match args.word(0) {
            Some("cos") => {
                let cos: Cos = args
                    .get(1)
                    .and_then(|c| c.parse().ok())
                    .ok_or(CliError::Usage("switchport priority extend cos <0-7>"))?;
                self.update_switch(|cfg| {
                    let extend = cfg
                        .switchport_mut(&iface)
                        .priority_extend
                        .get_or_insert_with(PriorityExtend::default);
                    extend.cos = Some(cos);
                    Ok(())
                })?;
                Ok(vec![format!("{} priority extend cos {}", iface, cos.get())])
            }
            Some("trust") => {
                self.update_switch(|cfg| {
                    cfg.switchport_mut(&iface)
                        .priority_extend
                        .get_or_insert_with(PriorityExtend::default)
                        .trust = true;
                    Ok(())
                })?;
                Ok(vec![format!("{} priority extend trust", iface)])
            }
            _ => Err(CliError::Usage("switchport priority extend [cos <0-7>|trust]")),
        }
    }

    fn trunk_allowed(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        let vlans = vlan_list_or_all(args, "switchport trunk allowed vlan <LIST|all>")?;
        let shown = describe_list(&vlans);
        self.update_switch(|cfg| {
            cfg.set_trunk_allowed(&iface, vlans);
            Ok(())
        })?;
        Ok(vec![format!("{} trunk allowed VLANs: {}", iface, shown)])
    }

    fn trunk_pruning(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        let vlans = vlan_list_or_all(args, "switchport trunk pruning vlan <LIST|all>")?;
        let shown = describe_list(&vlans);
        self.update_switch(|cfg| {
            cfg.set_trunk_pruning(&iface, vlans);
            Ok(())
        })?;
        Ok(vec![format!("{} trunk pruning VLANs: {}", iface, shown)])
    }

    fn trunk_native(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        let id = args
            .vlan(0)
            .ok_or(CliError::Usage("switchport trunk native vlan <ID>"))?;
        self.update_switch(|cfg| {
            cfg.set_trunk_native(&iface, id);
            Ok(())
        })?;
        Ok(vec![format!("{} trunk native VLAN set to {}", iface, id)])
    }

    fn dot1q_vlan_native(&mut self, args: Args<'_>) -> Result<Vec<String>> {
        let iface = self.active_interface()?;
        let id = args.vlan(0).ok_or(CliError::Usage("dot1q vlan native <ID>"))?;
        self.update_switch(|cfg| {
            cfg.set_dot1q_native(&iface, id);
            Ok(())
        })?;
        Ok(vec![format!("{} dot1q native VLAN set to {}", iface, id)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_accept_dotted_and_prefix_forms() {
        assert_eq!(parse_mask("255.255.255.0").unwrap(), 24);
        assert_eq!(parse_mask("30").unwrap(), 30);
        assert_eq!(parse_mask("0").unwrap(), 0);
        assert!(matches!(parse_mask("33"), Err(CliError::InvalidMask(_))));
        assert!(matches!(parse_mask("255.0.255.0"), Err(CliError::InvalidMask(_))));
        assert!(matches!(parse_mask("abc"), Err(CliError::InvalidMask(_))));
    }

    #[test]
    fn all_means_every_vlan() {
        let raw = ["all"];
        let lower = ["all".to_string()];
        let args = Args { raw: &raw, lower: &lower };
        assert_eq!(vlan_list_or_all(args, "x").unwrap(), None);

        let raw = ["10,", "20-21"];
        let lower = ["10,".to_string(), "20-21".to_string()];
        let args = Args { raw: &raw, lower: &lower };
        let ids = vlan_list_or_all(args, "x").unwrap().unwrap();
        assert_eq!(format_vlan_list(&ids), "10,20,21");
    }
}
