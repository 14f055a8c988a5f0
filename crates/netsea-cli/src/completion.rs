//! Tab completion over the command catalog.

use std::collections::BTreeMap;

use netsea_topology::NodeKind;
use serde::Serialize;

use crate::catalog::{self, CommandId};
use crate::mode::CliMode;

/// Result of one completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Completion {
    /// No candidate, or several with nothing in common beyond the typed
    /// fragment.
    None,
    /// New input line and caret position.
    Replace { line: String, cursor: usize },
    /// Second consecutive request on an ambiguous fragment.
    Candidates { items: Vec<String> },
}

/// Completion context: what the console knows about the device.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub mode: CliMode,
    pub kind: NodeKind,
    /// Ports and SVIs offered after `interface`.
    pub ports: &'a [String],
}

/// Complete the word under `cursor` (a byte offset into `line`).
/// `force_list` asks for the candidate list instead of silence when the
/// fragment cannot be extended.
pub fn complete(line: &str, cursor: usize, ctx: Context<'_>, force_list: bool) -> Completion {
    let mut cursor = cursor.min(line.len());
    while !line.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let (before, after) = line.split_at(cursor);
    let start = before
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let fragment = &before[start..];
    let typed: Vec<String> = before[..start]
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let candidates = candidates(&typed, &fragment.to_lowercase(), ctx);
    let head = &before[..start];

    match candidates.len() {
        0 => Completion::None,
        1 => {
            let Some((text, more)) = candidates.into_iter().next() else {
                return Completion::None;
            };
            let spacer = if more { " " } else { "" };
            let line = format!("{}{}{}{}", head, text, spacer, after);
            Completion::Replace {
                cursor: head.len() + text.len() + spacer.len(),
                line,
            }
        }
        _ => {
            let items: Vec<String> = candidates.into_keys().collect();
            if force_list {
                return Completion::Candidates { items };
            }
            let prefix = common_prefix(&items);
            if prefix.len() > fragment.len() {
                Completion::Replace {
                    line: format!("{}{}{}", head, prefix, after),
                    cursor: head.len() + prefix.len(),
                }
            } else {
                Completion::None
            }
        }
    }
}

/// Candidate words for the next token, each flagged with whether more
/// tokens follow it in some pattern.
fn candidates(typed: &[String], fragment: &str, ctx: Context<'_>) -> BTreeMap<String, bool> {
    let index = typed.len();
    let mut found: BTreeMap<String, bool> = BTreeMap::new();

    // Only the canonical spelling is offered; aliases such as `conf t`
    // exist for matching.
    for pattern in catalog::available(ctx.mode, ctx.kind).filter_map(|d| d.patterns.first()) {
        let Some(word) = pattern.get(index) else {
            continue;
        };
        if *word == "?" || !word.starts_with(fragment) {
            continue;
        }
        let head_matches = pattern
            .iter()
            .zip(typed)
            .all(|(p, t)| p.starts_with(t.as_str()));
        if head_matches {
            *found.entry(word.to_string()).or_default() |= pattern.len() > index + 1;
        }
    }

    let interface_offered = catalog::available(ctx.mode, ctx.kind).any(|d| d.id == CommandId::Interface);
    if index == 1 && interface_offered && "interface".starts_with(typed[0].as_str()) {
        for port in ctx.ports {
            if port.to_lowercase().starts_with(fragment) {
                found.entry(port.clone()).or_default();
            }
        }
    }
    found
}

/// Longest case-insensitive common prefix, spelled as in the first item.
fn common_prefix(items: &[String]) -> String {
    let Some(first) = items.first() else {
        return String::new();
    };
    let mut end = first.len();
    for other in &items[1..] {
        let shared = first
            .char_indices()
            .zip(other.chars())
            .find(|((_, a), b)| !a.eq_ignore_ascii_case(b))
            .map_or_else(|| first.len().min(other.len()), |((i, _), _)| i);
        end = end.min(shared);
    }
    while !first.is_char_boundary(end) {
        end -= 1;
    }
    first[..end].to_string()
}
