//! Per-device console state.

use std::collections::VecDeque;

use serde::Serialize;

use crate::mode::{prompt, CliMode};

/// Lines of console scrollback kept per device.
pub const LOG_LIMIT: usize = 1000;
/// Submitted commands kept per device.
pub const HISTORY_LIMIT: usize = 200;

fn push_capped(buf: &mut VecDeque<String>, line: String, limit: usize) {
    if buf.len() == limit {
        buf.pop_front();
    }
    buf.push_back(line);
}

/// Mode, active interface and scrollback of one device console.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub(crate) mode: CliMode,
    pub(crate) interface: Option<String>,
    pub(crate) history: VecDeque<String>,
    pub(crate) log: VecDeque<String>,
    /// Input left behind by the last completion that could not extend it.
    #[serde(skip)]
    pub(crate) tab_armed: Option<String>,
}

impl Session {
    pub fn mode(&self) -> CliMode {
        self.mode
    }

    /// Interface being edited; only set in interface mode.
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Most recent commands, oldest first.
    pub fn history(&self) -> &VecDeque<String> {
        &self.history
    }

    pub fn log(&self) -> &VecDeque<String> {
        &self.log
    }

    pub fn prompt(&self, name: &str) -> String {
        prompt(name, self.mode, self.interface())
    }

    pub(crate) fn enter(&mut self, mode: CliMode, interface: Option<String>) {
        self.mode = mode;
        self.interface = if mode == CliMode::Interface {
            interface
        } else {
            None
        };
    }

    pub(crate) fn push_log(&mut self, line: impl Into<String>) {
        push_capped(&mut self.log, line.into(), LOG_LIMIT);
    }

    pub(crate) fn push_history(&mut self, command: impl Into<String>) {
        push_capped(&mut self.history, command.into(), HISTORY_LIMIT);
    }
}
