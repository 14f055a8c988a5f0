//! VLAN Trunking Protocol state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchError};

/// VTP operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VtpMode {
    #[default]
    Server,
    Client,
    Transparent,
    Off,
}

impl VtpMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VtpMode::Server => "server",
            VtpMode::Client => "client",
            VtpMode::Transparent => "transparent",
            VtpMode::Off => "off",
        }
    }
}

impl fmt::Display for VtpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VtpMode {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "server" => Ok(VtpMode::Server),
            "client" => Ok(VtpMode::Client),
            "transparent" => Ok(VtpMode::Transparent),
            "off" => Ok(VtpMode::Off),
            _ => Err(SwitchError::InvalidVtpMode(s.to_string())),
        }
    }
}

/// VTP protocol version, 1 through 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct VtpVersion(u8);

impl VtpVersion {
    pub fn new(version: u8) -> Result<Self> {
        if (1..=3).contains(&version) {
            Ok(Self(version))
        } else {
            Err(SwitchError::InvalidVtpVersion(version.to_string()))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for VtpVersion {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for VtpVersion {
    type Error = SwitchError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<VtpVersion> for u8 {
    fn from(v: VtpVersion) -> Self {
        v.0
    }
}

impl fmt::Display for VtpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VtpVersion {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self> {
        let raw: u8 = s
            .parse()
            .map_err(|_| SwitchError::InvalidVtpVersion(s.to_string()))?;
        Self::new(raw)
    }
}

/// Advertisement counters shown by `show vtp counters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VtpCounters {
    pub summary: u64,
    pub subset: u64,
    pub req: u64,
    pub join: u64,
}

/// A single VTP setting, applied either globally or to one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VtpSetting {
    Mode(VtpMode),
    Domain(String),
    Password(String),
    Pruning(bool),
    Version(VtpVersion),
}

/// Switch-wide VTP state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtpState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub mode: VtpMode,
    #[serde(default)]
    pub pruning: bool,
    #[serde(default)]
    pub version: VtpVersion,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub counters: VtpCounters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cleared: Option<String>,
}

impl Default for VtpState {
    fn default() -> Self {
        Self {
            domain: None,
            password: None,
            mode: VtpMode::Server,
            pruning: false,
            version: VtpVersion::default(),
            primary: false,
            devices: Vec::new(),
            interfaces: Vec::new(),
            counters: VtpCounters::default(),
            last_cleared: None,
        }
    }
}

impl VtpState {
    /// Configuration revision reported by `show vtp status`.
    pub fn revision(&self) -> u32 {
        u32::from(self.primary)
    }

    pub fn apply(&mut self, setting: VtpSetting) {
        match setting {
            VtpSetting::Mode(mode) => self.mode = mode,
            VtpSetting::Domain(domain) => self.domain = Some(domain),
            VtpSetting::Password(password) => self.password = Some(password),
            VtpSetting::Pruning(enabled) => self.pruning = enabled,
            VtpSetting::Version(version) => self.version = version,
        }
    }

    /// `vtp primary`: become the primary server of the domain.
    pub fn promote_primary(&mut self) {
        self.primary = true;
        self.mode = VtpMode::Server;
    }

    pub fn clear_counters(&mut self, stamp: impl Into<String>) {
        self.counters = VtpCounters::default();
        self.last_cleared = Some(stamp.into());
    }

    /// Whether this switch advertises its VLAN database to the domain.
    pub fn publishes(&self) -> bool {
        self.mode == VtpMode::Server && self.domain.is_some()
    }

    /// Whether this switch adopts advertisements for `domain`.
    pub fn accepts(&self, domain: &str) -> bool {
        self.mode == VtpMode::Client && self.domain.as_deref() == Some(domain)
    }

    /// Record a device seen in the domain, keeping the list unique.
    pub fn learn_device(&mut self, name: &str) {
        if !self.devices.iter().any(|d| d == name) {
            self.devices.push(name.to_string());
        }
    }
}

/// Interface-scoped VTP override; unset fields inherit the global state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortVtpOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<VtpMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pruning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VtpVersion>,
}

impl PortVtpOverride {
    pub fn apply(&mut self, setting: VtpSetting) {
        match setting {
            VtpSetting::Mode(mode) => self.mode = Some(mode),
            VtpSetting::Domain(domain) => self.domain = Some(domain),
            VtpSetting::Password(password) => self.password = Some(password),
            VtpSetting::Pruning(enabled) => self.pruning = Some(enabled),
            VtpSetting::Version(version) => self.version = Some(version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_factory_state() {
        let vtp = VtpState::default();
        assert_eq!(vtp.mode, VtpMode::Server);
        assert_eq!(vtp.version.get(), 3);
        assert!(!vtp.pruning);
        assert!(!vtp.primary);
        assert_eq!(vtp.revision(), 0);
    }

    #[test]
    fn primary_forces_server_and_revision() {
        let mut vtp = VtpState::default();
        vtp.apply(VtpSetting::Mode(VtpMode::Client));
        vtp.promote_primary();
        assert_eq!(vtp.mode, VtpMode::Server);
        assert_eq!(vtp.revision(), 1);
    }

    #[test]
    fn version_bounds() {
        assert!("0".parse::<VtpVersion>().is_err());
        assert!("4".parse::<VtpVersion>().is_err());
        assert_eq!("2".parse::<VtpVersion>().unwrap().get(), 2);
    }

    #[test]
    fn mode_parsing_is_case_insensitive() {
        assert_eq!("Client".parse::<VtpMode>().unwrap(), VtpMode::Client);
        assert!("bogus".parse::<VtpMode>().is_err());
    }

    #[test]
    fn clearing_counters_records_stamp() {
        let mut vtp = VtpState::default();
        vtp.counters.summary = 4;
        vtp.clear_counters("t0");
        assert_eq!(vtp.counters, VtpCounters::default());
        assert_eq!(vtp.last_cleared.as_deref(), Some("t0"));
    }

    #[test]
    fn publish_and_accept_rules() {
        let mut server = VtpState::default();
        assert!(!server.publishes());
        server.apply(VtpSetting::Domain("LAB".into()));
        assert!(server.publishes());

        let mut client = VtpState::default();
        client.apply(VtpSetting::Mode(VtpMode::Client));
        client.apply(VtpSetting::Domain("LAB".into()));
        assert!(client.accepts("LAB"));
        assert!(!client.accepts("OTHER"));

        client.apply(VtpSetting::Mode(VtpMode::Transparent));
        assert!(!client.accepts("LAB"));
    }

    #[test]
    fn port_override_only_touches_its_field() {
        let mut port = PortVtpOverride::default();
        port.apply(VtpSetting::Pruning(true));
        assert_eq!(port.pruning, Some(true));
        assert!(port.mode.is_none());
        assert!(port.domain.is_none());
    }
}
