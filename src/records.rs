use crate::signals::NetworkInfo;
use serde::{Deserialize, Serialize};

/// CPU architecture inferred from the identification signals.
///
/// The token groups are mutually exclusive and checked in a fixed order by
/// the parser; anything outside them stays `Unknown` rather than guessing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 64-bit x86 (WOW64, Win64, x64, amd64 markers).
    X64,
    /// 64-bit ARM (arm64, aarch64 markers).
    Arm64,
    /// Legacy 32-bit x86 (i686, x86 markers).
    X86,
    #[default]
    /// No architecture marker found.
    Unknown,
}

impl Architecture {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X64 => "x64",
            Architecture::Arm64 => "arm64",
            Architecture::X86 => "x86",
            Architecture::Unknown => "unknown",
        }
    }
}

/// Device form factor classification.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    /// The fallback when no mobile or tablet signal matches.
    Desktop,
    /// Phones and compact form factors.
    Mobile,
    /// Tablets, including Android builds without the mobile qualifier.
    Tablet,
}

impl DeviceType {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
        }
    }
}

/// Browser and platform fields extracted from the identification string.
///
/// Immutable once computed. `browser`/`operating_system` fall back to
/// `"Unknown"` and the version fields to `""` when nothing matches; the
/// enricher may fill those gaps but never contradicts a resolved value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedUa {
    /// Canonical browser name (e.g. "Chrome", "Samsung Internet").
    pub browser: String,
    /// Browser version with dotted separators (e.g. "114.0.0.0").
    pub browser_version: String,
    /// Operating system name (e.g. "Windows", "iPadOS").
    pub operating_system: String,
    /// OS version, underscores normalized to dots, NT numbers mapped to
    /// marketing names where the mapping is stable.
    pub os_version: String,
    /// Inferred CPU architecture.
    pub architecture: Architecture,
}

impl Default for ParsedUa {
    fn default() -> Self {
        Self {
            browser: "Unknown".into(),
            browser_version: String::new(),
            operating_system: "Unknown".into(),
            os_version: String::new(),
            architecture: Architecture::Unknown,
        }
    }
}

/// The environment half of the final record: parsed identification fields,
/// classification results, and the raw signal pass-throughs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvRecord {
    /// Raw identification string, if one was supplied.
    pub ua: Option<String>,
    pub browser: String,
    pub browser_version: String,
    pub operating_system: String,
    pub os_version: String,
    pub architecture: Architecture,
    pub device_type: DeviceType,
    /// Free-text device model, empty when unknown.
    pub device_model: String,
    pub touch_points: u32,
    pub is_bot: bool,
    /// Matched crawler token, "GenericBot" for keyword-only matches, empty otherwise.
    pub bot_name: String,
    pub language: Option<String>,
    pub languages: Vec<String>,
    pub platform: Option<String>,
    pub online: Option<bool>,
    pub time_zone: Option<String>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub dpr: Option<f64>,
    pub referrer: Option<String>,
    pub page: Option<String>,
    pub connection: Option<NetworkInfo>,
}

/// A single coordinate fix. Created by a successful acquisition or recalled
/// from the cache, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRecord {
    pub lat: f64,
    pub lon: f64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    /// Capture timestamp, epoch milliseconds.
    pub ts: i64,
    /// Resolved place name. Reverse geocoding is disabled, so this is
    /// always `None`; the field is kept for wire compatibility.
    pub city: Option<String>,
}

impl GeoRecord {
    /// Projects a platform fix into the record shape. `place` feeds the
    /// `city` field; with reverse geocoding disabled callers pass `None`.
    pub fn from_position(position: &crate::geolocate::Position, place: Option<String>) -> Self {
        Self {
            lat: position.latitude,
            lon: position.longitude,
            accuracy: position.accuracy,
            altitude: position.altitude,
            altitude_accuracy: position.altitude_accuracy,
            speed: position.speed,
            heading: position.heading,
            ts: if position.timestamp != 0 {
                position.timestamp
            } else {
                crate::geo_cache::now_ms()
            },
            city: place,
        }
    }
}

/// The merged environment + geolocation artifact, produced once per
/// collection run. This is the only type crossing the output boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRecord {
    pub env: EnvRecord,
    pub geo: Option<GeoRecord>,
    /// Failure reason when geolocation was not available. The environment
    /// half is populated regardless.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
