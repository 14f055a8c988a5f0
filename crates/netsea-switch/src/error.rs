//! Error types for netsea-switch.

use thiserror::Error;

/// Result type for switch configuration operations.
pub type Result<T> = std::result::Result<T, SwitchError>;

/// Errors raised while parsing or validating switch configuration input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    /// A VLAN id was not a number in 1-4094.
    #[error("invalid VLAN id: {0}")]
    InvalidVlanId(String),

    /// A VLAN list expression was malformed, reversed or out of range.
    #[error("invalid VLAN list: {0}")]
    InvalidVlanList(String),

    /// Unknown VTP operating mode.
    #[error("invalid VTP mode: {0}")]
    InvalidVtpMode(String),

    /// VTP version outside 1-3.
    #[error("invalid VTP version: {0}")]
    InvalidVtpVersion(String),

    /// CoS value outside 0-7.
    #[error("invalid CoS value: {0}")]
    InvalidCos(String),
}
