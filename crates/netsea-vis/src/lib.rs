//! Network Sea sandbox server
//!
//! Serves the topology, the device consoles and the live event stream to
//! the 3D frontend.
//!
//! # Architecture
//!
//! - **server**: axum router over one shared `Console`; every write drains
//!   the store journal onto a broadcast channel consumed by `/ws`
//! - **backend**: loopback stand-in for the external command processor,
//!   answering forwarded `ping`s with timed logs and packet flows
//! - **config**: port, tick period, static assets and backend delays
//!
//! # Usage
//!
//! ```no_run
//! use netsea_cli::Console;
//! use netsea_vis::{ServerConfig, VisServer};
//!
//! # async fn run() -> netsea_vis::Result<()> {
//! let server = VisServer::new(Console::default(), ServerConfig::default());
//! server.serve().await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
mod error;
pub mod server;

pub use backend::{LoopbackBackend, Step};
pub use config::{BackendConfig, ServerConfig, DEFAULT_PORT};
pub use error::{Error, Result};
pub use server::{AppState, ClientMessage, StreamMessage, VisServer};
