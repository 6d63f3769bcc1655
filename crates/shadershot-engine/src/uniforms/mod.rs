//! Sidecar shader parameters.
//!
//! A shader file may carry a JSON sidecar next to it (same stem, `.json`
//! extension) holding named uniform values. The file is parsed and logged so
//! runs are reproducible from their logs, but nothing is bound to the
//! pipeline yet; `injectionSwitch` is recognized specially as a two-float
//! vector.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Parsed sidecar contents.
///
/// A missing or unreadable sidecar yields the default (empty) value; the run
/// proceeds without parameters rather than failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidecarParams {
    /// The `injectionSwitch` vector, when present and well-formed.
    pub injection_switch: Option<[f32; 2]>,

    /// Every top-level entry, raw. Ordered so log output is stable.
    pub values: BTreeMap<String, serde_json::Value>,
}

impl SidecarParams {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The sidecar path for a given shader file: same location, `.json` suffix.
pub fn sidecar_path(shader: &Path) -> PathBuf {
    shader.with_extension("json")
}

/// Loads the sidecar next to `shader`, if any.
///
/// Absence is the common case and is silent; a present-but-unparseable file
/// is logged and otherwise treated as absent.
pub fn load_sidecar(shader: &Path) -> SidecarParams {
    let path = sidecar_path(shader);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => return SidecarParams::default(),
    };

    log::debug!("reading shader parameters from {}", path.display());
    match parse_sidecar(&text) {
        Ok(params) => params,
        Err(err) => {
            log::warn!("ignoring malformed sidecar {}: {err}", path.display());
            SidecarParams::default()
        }
    }
}

/// Parses sidecar text. The document must be a JSON object; entries keep
/// their raw values, and `injectionSwitch` is additionally decoded.
pub fn parse_sidecar(text: &str) -> serde_json::Result<SidecarParams> {
    let values: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)?;

    let injection_switch = values.get("injectionSwitch").and_then(|value| {
        let decoded = decode_vec2(value);
        if decoded.is_none() {
            log::warn!("injectionSwitch should be an array of two floats, got {value}");
        }
        decoded
    });

    Ok(SidecarParams {
        injection_switch,
        values,
    })
}

fn decode_vec2(value: &serde_json::Value) -> Option<[f32; 2]> {
    let array = value.as_array()?;
    if array.len() != 2 {
        return None;
    }
    let x = array[0].as_f64()?;
    let y = array[1].as_f64()?;
    Some([x as f32, y as f32])
}
