use serde::{Deserialize, Serialize};

/// Snapshot of the network-information capability.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    /// Effective connection type (e.g. "4g", "3g").
    pub effective_type: Option<String>,
    /// Estimated downlink bandwidth in megabits per second.
    pub downlink: Option<f64>,
    /// Estimated round-trip time in milliseconds.
    pub rtt: Option<u32>,
    /// Reduced-data preference flag.
    pub save_data: Option<bool>,
}

/// Raw inputs gathered from the host environment before any enrichment.
///
/// Every field is optional: an absent capability stays absent here and is
/// resolved to an explicit "Unknown"/empty downstream, never to a guess.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvSignals {
    /// Raw identification string.
    pub user_agent: Option<String>,
    /// Primary locale (e.g. "pt-BR").
    pub language: Option<String>,
    /// Full preferred-locale list.
    pub languages: Vec<String>,
    /// Low-fidelity platform name as reported by the host.
    pub platform: Option<String>,
    /// Whether the host reports itself online.
    pub online: Option<bool>,
    /// IANA timezone name (e.g. "America/Sao_Paulo").
    pub time_zone: Option<String>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    /// Device pixel ratio.
    pub dpr: Option<f64>,
    /// Referring page URL, if any.
    pub referrer: Option<String>,
    /// Current page URL.
    pub page: Option<String>,
    /// Maximum simultaneous touch points reported by the host.
    pub touch_points: u32,
    /// Network-information snapshot, when the capability exists.
    pub connection: Option<NetworkInfo>,
}

impl EnvSignals {
    /// Convenience constructor for the common case of only having an
    /// identification string.
    pub fn from_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: Some(user_agent.into()),
            ..Default::default()
        }
    }
}
