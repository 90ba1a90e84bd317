use crate::records::{Architecture, ParsedUa};
use serde::{Deserialize, Serialize};

/// A browser brand and its version, as reported in the capability brand list.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandEntry {
    /// Brand name (e.g. "Chromium", "Not-A.Brand").
    pub brand: String,
    /// Version string for the brand.
    pub version: String,
}

/// High-fidelity identification data returned by the optional capability
/// query API. Every field may be empty/absent; the enricher only fills gaps
/// the heuristic layer left open.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UaHints {
    /// Brand/version pairs, including the grease placeholder entries.
    pub brands: Vec<BrandEntry>,
    /// Compact form-factor flag.
    pub mobile: Option<bool>,
    /// Device model (mostly non-empty for Android devices).
    pub model: String,
    /// Full browser version.
    pub ua_full_version: String,
    /// Platform name (e.g. "Windows", "macOS").
    pub platform: String,
    /// Platform version (e.g. "10.0", "13").
    pub platform_version: String,
    /// CPU architecture (e.g. "x86", "arm").
    pub architecture: String,
    /// Pointer-width signal; "64" implies a 64-bit build.
    pub bitness: String,
}

/// Source of capability-query data.
///
/// `query` resolving to `None` means the capability is absent or the query
/// failed; the enricher fails open and leaves the heuristic result untouched.
pub trait HintsProvider {
    fn query(&self) -> impl std::future::Future<Output = Option<UaHints>>;
}

/// Grease placeholder brands ("Not-A.Brand" and friends) carry no real
/// identification and are skipped when picking the reported brand.
fn is_placeholder_brand(brand: &str) -> bool {
    let lower = brand.to_ascii_lowercase();
    match lower.find("not") {
        Some(at) => lower[at..].contains("brand"),
        None => false,
    }
}

fn pick_brand(brands: &[BrandEntry]) -> Option<&BrandEntry> {
    brands
        .iter()
        .find(|b| !is_placeholder_brand(&b.brand))
        .or_else(|| brands.first())
}

/// Reconciles capability-reported data into the heuristic parse.
///
/// Trust hierarchy: the capability layer is authoritative about the browser
/// itself (a reported full version replaces the heuristic one), but platform
/// and architecture data only fill gaps, so a confident heuristic result is
/// never contradicted.
pub fn apply_hints(parsed: &mut ParsedUa, hints: &UaHints) {
    if let Some(brand) = pick_brand(&hints.brands) {
        if !brand.brand.is_empty() {
            if parsed.browser == "Unknown" {
                parsed.browser = brand.brand.clone();
            }
            if !hints.ua_full_version.is_empty() {
                parsed.browser_version = hints.ua_full_version.clone();
            } else if !brand.version.is_empty() {
                parsed.browser_version = brand.version.clone();
            }
        }
    }

    if !hints.platform.is_empty() && parsed.operating_system == "Unknown" {
        parsed.operating_system = hints.platform.clone();
    }
    if !hints.platform_version.is_empty() && parsed.os_version.is_empty() {
        parsed.os_version = hints.platform_version.clone();
    }

    if parsed.architecture == Architecture::Unknown {
        parsed.architecture = match hints.architecture.as_str() {
            "x64" => Architecture::X64,
            "x86" => Architecture::X86,
            "arm" | "arm64" => Architecture::Arm64,
            // Not directly reported; a 64-bit pointer width still implies x64.
            "" if hints.bitness == "64" => Architecture::X64,
            _ => Architecture::Unknown,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_user_agent::parse_user_agent;

    fn chromium_hints() -> UaHints {
        UaHints {
            brands: vec![
                BrandEntry {
                    brand: "Not-A.Brand".into(),
                    version: "99".into(),
                },
                BrandEntry {
                    brand: "Chromium".into(),
                    version: "114".into(),
                },
            ],
            mobile: Some(false),
            ua_full_version: "114.0.5735.110".into(),
            platform: "Windows".into(),
            platform_version: "10.0.0".into(),
            architecture: "x86".into(),
            bitness: "64".into(),
            ..Default::default()
        }
    }

    #[test]
    fn placeholder_brands_are_skipped() {
        assert!(is_placeholder_brand("Not-A.Brand"));
        assert!(is_placeholder_brand("Not?A_Brand"));
        assert!(is_placeholder_brand("Not;A=Brand"));
        assert!(!is_placeholder_brand("Chromium"));
        assert!(!is_placeholder_brand("Google Chrome"));

        let hints = chromium_hints();
        let picked = pick_brand(&hints.brands).expect("brand");
        assert_eq!(picked.brand, "Chromium");
    }

    #[test]
    fn brand_fills_unknown_browser_only() {
        let mut parsed = ParsedUa::default();
        apply_hints(&mut parsed, &chromium_hints());
        assert_eq!(parsed.browser, "Chromium");

        let mut resolved = parse_user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
        );
        apply_hints(&mut resolved, &chromium_hints());
        assert_eq!(resolved.browser, "Chrome");
    }

    #[test]
    fn full_version_always_overrides() {
        let mut parsed = parse_user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
        );
        apply_hints(&mut parsed, &chromium_hints());
        assert_eq!(parsed.browser_version, "114.0.5735.110");
    }

    #[test]
    fn platform_only_fills_gaps() {
        let mut unknown = ParsedUa::default();
        apply_hints(&mut unknown, &chromium_hints());
        assert_eq!(unknown.operating_system, "Windows");
        assert_eq!(unknown.os_version, "10.0.0");

        let mut mac = parse_user_agent(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
             (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
        );
        apply_hints(&mut mac, &chromium_hints());
        assert_eq!(mac.operating_system, "macOS");
        assert_eq!(mac.os_version, "10.15.7");
    }

    #[test]
    fn bitness_implies_x64_when_architecture_silent() {
        let mut parsed = ParsedUa::default();
        let hints = UaHints {
            bitness: "64".into(),
            ..Default::default()
        };
        apply_hints(&mut parsed, &hints);
        assert_eq!(parsed.architecture, Architecture::X64);
    }

    #[test]
    fn architecture_never_contradicted() {
        let mut parsed = ParsedUa {
            architecture: Architecture::Arm64,
            ..ParsedUa::default()
        };
        apply_hints(&mut parsed, &chromium_hints());
        assert_eq!(parsed.architecture, Architecture::Arm64);
    }

    #[test]
    fn empty_hints_change_nothing() {
        let mut parsed = ParsedUa::default();
        let before = parsed.clone();
        apply_hints(&mut parsed, &UaHints::default());
        assert_eq!(parsed, before);
    }
}
