//! Deterministic VLAN display colors.

use std::collections::{BTreeMap, BTreeSet};

/// Colors the renderer already uses for device kinds.
const RESERVED: [&str; 4] = ["#ffb703", "#8ecae6", "#adb5bd", "#90be6d"];

/// Used when every probed hue is taken.
pub const FALLBACK_COLOR: &str = "#ff4f8b";

const ATTEMPTS: u32 = 24;
const HUE_STEP: u32 = 73;
const SATURATION: f32 = 0.78;
const LIGHTNESS: f32 = 0.48;

/// `#rrggbb` for an HSL triple, hue in degrees.
pub fn hsl_to_hex(hue: f32, saturation: f32, lightness: f32) -> String {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    format!("#{}", hex::encode([channel(r), channel(g), channel(b)]))
}

fn name_hash(name: &str) -> u32 {
    let digest = blake3::hash(name.as_bytes());
    let mut prefix = [0u8; 4];
    prefix.copy_from_slice(&digest.as_bytes()[..4]);
    u32::from_le_bytes(prefix).max(1)
}

fn is_reserved(color: &str) -> bool {
    RESERVED.contains(&color)
}

/// Pick a color for `name` that is neither reserved nor in `taken`, and
/// record it as taken.
pub fn pick_vlan_color(name: &str, taken: &mut BTreeSet<String>) -> String {
    let base = name_hash(name);
    for attempt in 0..ATTEMPTS {
        let hue = (base % 360 + attempt * HUE_STEP) % 360;
        let color = hsl_to_hex(hue as f32, SATURATION, LIGHTNESS);
        if !taken.contains(&color) && !is_reserved(&color) {
            taken.insert(color.clone());
            return color;
        }
    }
    FALLBACK_COLOR.to_string()
}

/// Color map covering every name in `vlans`.
///
/// Entries of `existing` survive unless their color is reserved or a
/// duplicate of an earlier entry; missing names get a fresh color.
pub fn ensure_vlan_color_map(
    vlans: &[String],
    existing: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    let mut taken = BTreeSet::new();
    for (name, color) in existing {
        if name.is_empty() || color.is_empty() {
            continue;
        }
        let normalized = color.to_ascii_lowercase();
        if is_reserved(&normalized) || !taken.insert(normalized) {
            continue;
        }
        result.insert(name.clone(), color.clone());
    }
    for name in vlans.iter().filter(|n| !n.is_empty()) {
        if !result.contains_key(name) {
            let color = pick_vlan_color(name, &mut taken);
            result.insert(name.clone(), color);
        }
    }
    result
}
