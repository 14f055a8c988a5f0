//! Network Sea device console
//!
//! The simulated command line of every device in the sandbox.
//!
//! # Architecture
//!
//! - **mode**: user → privileged → config → interface, and the prompts
//! - **catalog**: static `CommandDef` table and the token-prefix matcher
//! - **interpreter**: one handler per command, validate then commit
//! - **completion**: tab completion over the catalog and live port names
//! - **console**: per-device sessions over an owned `NetStore`, backend
//!   events and mission flags
//! - **backend**: `ForwardedCommand` / `BackendEvent` wire shapes
//!
//! # Usage
//!
//! ```
//! use netsea_cli::Console;
//! use netsea_topology::{NetStore, Node, NodeKind};
//!
//! let mut store = NetStore::new();
//! store.add_node(Node::new("r1", NodeKind::Router, "R1"));
//! let mut console = Console::new(store);
//!
//! console.submit("R1", "enable").unwrap();
//! let out = console.submit("R1", "conf t").unwrap();
//! assert_eq!(out.prompt, "R1#");
//! assert_eq!(console.prompt("R1").unwrap(), "R1(config)#");
//!
//! let out = console.submit("R1", "ping 10.0.0.1").unwrap();
//! assert!(out.forwarded.is_some());
//! ```

mod backend;
mod console;
mod error;
mod interpreter;
mod mode;
mod session;

pub mod catalog;
pub mod completion;

pub use backend::{BackendEvent, ForwardedCommand};
pub use catalog::{CommandDef, CommandId, Group, Scope, COMMANDS};
pub use completion::Completion;
pub use console::{Console, ConsoleLine, MissionState, Submission};
pub use error::{CliError, Result};
pub use mode::{prompt, CliMode};
pub use session::Session;
