// Wire types for the Tasker HTTP API
//
// Response models use `#[serde(default)]` liberally because the remote is
// inconsistent about field presence across Tasker releases. Request bodies
// skip absent optionals -- for toggles the remote treats an explicit null
// as "flip the current state".

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Aggregate statistics ─────────────────────────────────────────────

/// Counters and version from `GET /api/stats`.
///
/// Fetched on every poll cycle regardless of subscriptions; doubles as
/// the liveness probe for the remote connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub active_profiles: u32,
    pub total_profiles: u32,
    pub total_tasks: u32,
    pub total_scenes: u32,
    pub total_globals: u32,
    pub version: String,
}

// ── Profiles ─────────────────────────────────────────────────────────

/// A Tasker profile: an automation trigger that can be enabled and may
/// currently be active (its conditions met).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub active: bool,
}

/// Body for `POST /api/profiles`. `enabled: None` toggles.
#[derive(Debug, Clone, Serialize)]
pub struct SetProfile<'a> {
    pub name: &'a str,
    pub enabled: Option<bool>,
}

// ── Tasks ────────────────────────────────────────────────────────────

/// A Tasker task (a named macro that can be invoked).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub running: bool,
}

/// Body for `POST /api/tasks` (task invocation).
#[derive(Debug, Clone, Serialize)]
pub struct RunTask<'a> {
    pub name: &'a str,
    pub structure_output: bool,
    pub variables: &'a serde_json::Map<String, Value>,
}

// ── Scenes ───────────────────────────────────────────────────────────

/// Display state of a scene as reported by the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    Uncreated,
    Hidden,
    Visible,
    Background,
}

/// Display action accepted by `POST /api/scenes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneAction {
    Create,
    Destroy,
    Hide,
    Show,
}

/// A Tasker scene (a user-defined window/overlay).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    pub status: SceneStatus,
    #[serde(default)]
    pub display_as: String,
    #[serde(default)]
    pub position: Vec<f64>,
    #[serde(default)]
    pub size: Vec<f64>,
}

impl Scene {
    /// Screen position as an `(x, y)` pair; extra coordinates are ignored.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self.position.as_slice() {
            [x, y, ..] => Some((*x, *y)),
            _ => None,
        }
    }

    /// Scene dimensions as a `(width, height)` pair.
    pub fn size(&self) -> Option<(f64, f64)> {
        match self.size.as_slice() {
            [w, h, ..] => Some((*w, *h)),
            _ => None,
        }
    }
}

/// Body for `POST /api/scenes`.
#[derive(Debug, Clone, Serialize)]
pub struct SetScene<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<SceneAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_as: Option<&'a str>,
}

// ── Global variables ─────────────────────────────────────────────────

/// A Tasker global variable.
///
/// `value` is the decoded plain-text value (the wire carries base64, see
/// [`decode_global_value`]). `structured` is populated when the caller
/// asked for structured output: the decoded value run through the output
/// normalizer cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<Value>,
}

/// Body for `POST /api/globals`; `value` is already wire-encoded.
#[derive(Debug, Clone, Serialize)]
pub struct SetGlobal<'a> {
    pub name: &'a str,
    pub value: String,
}

/// Decode a global's wire value (base64 of the plain text).
///
/// An empty wire value decodes to the empty string. Returns `None` when
/// the payload is not valid base64-wrapped UTF-8.
pub fn decode_global_value(wire: &str) -> Option<String> {
    if wire.is_empty() {
        return Some(String::new());
    }
    let bytes = BASE64.decode(wire.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Encode a value for the globals wire format.
///
/// Canonical encode contract: strings go through untouched, every other
/// scalar is narrowed to its lowercase string form first (`True` becomes
/// `"true"`, `3.5` becomes `"3.5"`), and null/empty encodes to the empty
/// string rather than base64 of nothing.
pub fn encode_global_value(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string().to_lowercase(),
    };
    if text.is_empty() {
        return String::new();
    }
    BASE64.encode(text.as_bytes())
}

// ── Commands ─────────────────────────────────────────────────────────

/// Reply to `POST /api/commands`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandCount {
    #[serde(default)]
    pub count: u64,
}

// ── Auth ─────────────────────────────────────────────────────────────

/// Reply to `GET /api/auth[/refresh]`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthReply {
    #[serde(default)]
    pub key: Option<String>,
}

// ── Device identity ──────────────────────────────────────────────────

/// Stable identity of the Android device running Tasker, resolved by
/// running the bundled "Device Info" task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub android_id: String,
    pub manufacturer: String,
    pub model: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sw_version: Option<String>,
}

impl DeviceInfo {
    /// Parse device identity from the normalized Device Info task output.
    ///
    /// Accepts both payload shapes the task has shipped with: flat
    /// `{android_id, mac_address, ...}` and the registry-style
    /// `{identifiers: [id], connections: [["mac", addr]], ...}`.
    pub fn from_output(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let android_id = obj
            .get("android_id")
            .and_then(Value::as_str)
            .or_else(|| {
                obj.get("identifiers")?
                    .as_array()?
                    .first()?
                    .as_str()
            })?
            .to_owned();

        let mac_address = obj
            .get("mac_address")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or_else(|| {
                obj.get("connections")?.as_array()?.iter().find_map(|pair| {
                    let pair = pair.as_array()?;
                    if pair.first()?.as_str()? != "mac" {
                        return None;
                    }
                    pair.get(1)?.as_str().map(str::to_owned)
                })
            });

        Some(Self {
            android_id,
            manufacturer: obj.get("manufacturer")?.as_str()?.to_owned(),
            model: obj.get("model")?.as_str()?.to_owned(),
            mac_address,
            name: obj.get("name").and_then(Value::as_str).map(str::to_owned),
            sw_version: obj
                .get("sw_version")
                .and_then(Value::as_str)
                .map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{DeviceInfo, decode_global_value, encode_global_value};

    #[test]
    fn global_value_round_trip() {
        for text in ["hello", "multi\nline", "", "%BATT"] {
            let wire = encode_global_value(&json!(text));
            assert_eq!(decode_global_value(&wire).as_deref(), Some(text));
        }
    }

    #[test]
    fn global_encode_narrows_scalars_to_lowercase() {
        assert_eq!(
            decode_global_value(&encode_global_value(&json!(true))).as_deref(),
            Some("true")
        );
        assert_eq!(
            decode_global_value(&encode_global_value(&json!(42))).as_deref(),
            Some("42")
        );
        assert_eq!(encode_global_value(&json!(null)), "");
    }

    #[test]
    fn global_decode_rejects_garbage() {
        assert_eq!(decode_global_value("not base64!!!"), None);
    }

    #[test]
    fn device_info_flat_shape() {
        let value = json!({
            "android_id": "abc123",
            "manufacturer": "Google",
            "model": "Pixel 8",
            "sw_version": "14",
        });
        let info = DeviceInfo::from_output(&value).expect("parses");
        assert_eq!(info.android_id, "abc123");
        assert_eq!(info.sw_version.as_deref(), Some("14"));
        assert_eq!(info.mac_address, None);
    }

    #[test]
    fn device_info_registry_shape() {
        let value = json!({
            "identifiers": ["abc123"],
            "connections": [["mac", "aa:bb:cc:dd:ee:ff"]],
            "manufacturer": "Google",
            "model": "Pixel 8",
        });
        let info = DeviceInfo::from_output(&value).expect("parses");
        assert_eq!(info.android_id, "abc123");
        assert_eq!(info.mac_address.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn device_info_rejects_non_object() {
        assert_eq!(DeviceInfo::from_output(&json!("nope")), None);
    }
}
