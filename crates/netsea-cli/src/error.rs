//! Error types for netsea-cli.
//!
//! Every variant renders as the single console line shown to the user.

use netsea_switch::SwitchError;
use thiserror::Error;

/// Result type for console operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Input or state problems reported back on the console.
#[derive(Debug, Error)]
pub enum CliError {
    /// Arguments missing or malformed for a known command.
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid IP: {0}")]
    InvalidIp(String),

    #[error("Invalid mask: {0}")]
    InvalidMask(String),

    /// `interface <port>` named a port the device does not have.
    #[error("Port {0} is unavailable")]
    PortUnavailable(String),

    /// `shutdown` on a port with no cable plugged in.
    #[error("{0} is not connected to a link")]
    NotLinked(String),

    /// The command exists but not in the current mode.
    #[error("{0}")]
    WrongMode(String),

    /// Configuration commands are not offered on end hosts.
    #[error("{0} is not available on a PC")]
    NotOnPc(&'static str),

    #[error("VLAN interfaces can only be configured on a switch")]
    SwitchOnly,

    #[error("Specify valid secondary VLANs")]
    InvalidSecondaries,

    #[error("Unsupported vtp subcommand")]
    UnsupportedVtp,

    /// No device with this id or name.
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("{0}")]
    Topology(#[from] netsea_topology::Error),

    #[error("{0}")]
    Switch(#[from] SwitchError),
}
