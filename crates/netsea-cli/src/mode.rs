//! Console modes and prompts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a device console sits in the `enable` / `configure terminal` /
/// `interface` hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliMode {
    #[default]
    User,
    Privileged,
    Config,
    Interface,
}

impl CliMode {
    pub const ALL: &'static [CliMode] = &[
        CliMode::User,
        CliMode::Privileged,
        CliMode::Config,
        CliMode::Interface,
    ];

    /// Everything past `enable`.
    pub const ENABLED: &'static [CliMode] =
        &[CliMode::Privileged, CliMode::Config, CliMode::Interface];

    pub const CONFIG: &'static [CliMode] = &[CliMode::Config, CliMode::Interface];

    pub const INTERFACE: &'static [CliMode] = &[CliMode::Interface];

    pub fn as_str(&self) -> &'static str {
        match self {
            CliMode::User => "user",
            CliMode::Privileged => "privileged",
            CliMode::Config => "config",
            CliMode::Interface => "interface",
        }
    }

    /// Mode that `exit` returns to.
    pub fn parent(self) -> CliMode {
        match self {
            CliMode::Interface => CliMode::Config,
            CliMode::Config => CliMode::Privileged,
            CliMode::Privileged | CliMode::User => CliMode::User,
        }
    }
}

impl fmt::Display for CliMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prompt for `name` in `mode`, e.g. `SW1(config-if-Fa0/1)#`.
pub fn prompt(name: &str, mode: CliMode, interface: Option<&str>) -> String {
    match mode {
        CliMode::User => format!("{}>", name),
        CliMode::Privileged => format!("{}#", name),
        CliMode::Config => format!("{}(config)#", name),
        CliMode::Interface => format!("{}(config-if-{})#", name, interface.unwrap_or("")),
    }
}
