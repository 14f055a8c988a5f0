//! Error types for netsea-topology.

use netsea_switch::SwitchError;
use thiserror::Error;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while mutating or loading a topology.
#[derive(Debug, Error)]
pub enum Error {
    /// No node with this id.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// No link with this id.
    #[error("unknown link: {0}")]
    UnknownLink(String),

    /// The node exists but is not a switch.
    #[error("{0} is not a switch")]
    NotASwitch(String),

    /// A switch configuration mutation was rejected.
    #[error("switch configuration error: {0}")]
    Switch(#[from] SwitchError),

    /// Snapshot (de)serialization failed.
    #[error("snapshot error: {0}")]
    Serialization(#[from] serde_json::Error),
}
