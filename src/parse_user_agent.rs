use crate::records::{Architecture, ParsedUa};

/// Windows NT kernel numbers with publicly stable marketing names.
/// Unmapped numbers pass through unchanged.
static WINDOWS_NT_VERSIONS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "10.0" => "10/11",
    "6.3" => "8.1",
    "6.2" => "8",
    "6.1" => "7",
    "6.0" => "Vista",
    "5.1" => "XP",
};

/// One entry of the ordered browser rule table.
struct BrowserRule {
    /// Canonical browser name reported on a match.
    name: &'static str,
    /// Version token; the rule only fires when a dotted version follows it.
    token: &'static str,
    /// Markers that must be absent (case-insensitive).
    excludes: &'static [&'static str],
    /// Markers that must also be present (case-insensitive).
    requires: &'static [&'static str],
}

/// Ordered browser rules, first match wins. Vendor-specific markers come
/// before generic ones: Chromium derivatives all carry a `Chrome/` token
/// for compatibility, so Samsung/Edge/Opera must be excluded before a bare
/// `Chrome/` counts as Chrome, and `Safari` only counts once `Chrome` is
/// ruled out.
const BROWSER_RULES: &[BrowserRule] = &[
    BrowserRule {
        name: "Samsung Internet",
        token: "SamsungBrowser/",
        excludes: &[],
        requires: &[],
    },
    BrowserRule {
        name: "Microsoft Edge",
        token: "Edg/",
        excludes: &[],
        requires: &[],
    },
    BrowserRule {
        name: "Opera",
        token: "OPR/",
        excludes: &[],
        requires: &[],
    },
    BrowserRule {
        name: "Chrome",
        token: "Chrome/",
        excludes: &["crios"],
        requires: &[],
    },
    BrowserRule {
        name: "Chrome (iOS)",
        token: "CriOS/",
        excludes: &[],
        requires: &[],
    },
    BrowserRule {
        name: "Firefox",
        token: "Firefox/",
        excludes: &[],
        requires: &[],
    },
    BrowserRule {
        name: "Firefox (iOS)",
        token: "FxiOS/",
        excludes: &[],
        requires: &[],
    },
    BrowserRule {
        name: "Safari",
        token: "Version/",
        excludes: &["chrome"],
        requires: &["safari"],
    },
];

/// 64-bit markers, checked first.
const X64_TOKENS: &[&str] = &["wow64", "win64", "x64", "amd64"];
/// ARM 64-bit markers.
const ARM64_TOKENS: &[&str] = &["arm64", "aarch64"];
/// Legacy 32-bit markers.
const X86_TOKENS: &[&str] = &["i686", "x86"];

/// Case-insensitive ASCII substring test without allocating.
#[inline]
pub(crate) fn contains_ci(hay: &str, needle: &str) -> bool {
    let hay = hay.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }
    if hay.len() < needle.len() {
        return false;
    }
    'outer: for i in 0..=hay.len() - needle.len() {
        for (j, b) in needle.iter().enumerate() {
            if !hay[i + j].eq_ignore_ascii_case(b) {
                continue 'outer;
            }
        }
        return true;
    }
    false
}

/// Captures the dotted version directly after `token` (exact match), e.g.
/// `"114.0.0.0"` after `"Chrome/"`. `None` when the token is absent or not
/// followed by a digit.
fn version_after(ua: &str, token: &str) -> Option<String> {
    let start = ua.find(token)? + token.len();
    let bytes = ua.as_bytes();
    let mut end = start;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    if end > start && bytes[start].is_ascii_digit() {
        Some(ua[start..end].to_string())
    } else {
        None
    }
}

/// Like [`version_after`] for versions embedded with underscore separators
/// (e.g. `"10_15_7"`), normalized to the conventional dotted form.
fn underscore_version_after(ua: &str, token: &str) -> Option<String> {
    let start = ua.find(token)? + token.len();
    let bytes = ua.as_bytes();
    let mut end = start;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'_') {
        end += 1;
    }
    if end > start && bytes[start].is_ascii_digit() {
        Some(ua[start..end].replace('_', "."))
    } else {
        None
    }
}

/// iPadOS identification: `iPad; CPU <words> OS <version>` where the span
/// between the markers is word characters and spaces.
fn ipad_os_version(ua: &str) -> Option<String> {
    let start = ua.find("iPad; CPU ")? + "iPad; CPU ".len();
    let rest = &ua[start..];
    let os_at = rest.find(" OS ")?;
    let between_ok = rest[..os_at]
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b' ');
    if !between_ok {
        return None;
    }
    underscore_version_after(rest, " OS ")
}

fn parse_operating_system(ua: &str) -> (String, String) {
    if let Some(nt) = version_after(ua, "Windows NT ") {
        let version = WINDOWS_NT_VERSIONS
            .get(nt.as_str())
            .map(|mapped| mapped.to_string())
            .unwrap_or(nt);
        return ("Windows".into(), version);
    }
    if let Some(version) = underscore_version_after(ua, "iPhone OS ") {
        return ("iOS".into(), version);
    }
    if let Some(version) = underscore_version_after(ua, "CPU OS ") {
        return ("iOS".into(), version);
    }
    if let Some(version) = ipad_os_version(ua) {
        return ("iPadOS".into(), version);
    }
    if let Some(version) = underscore_version_after(ua, "Mac OS X ") {
        return ("macOS".into(), version);
    }
    if let Some(version) = version_after(ua, "Android ") {
        return ("Android".into(), version);
    }
    if contains_ci(ua, "linux") {
        return ("Linux".into(), String::new());
    }
    ("Unknown".into(), String::new())
}

fn parse_architecture(ua: &str) -> Architecture {
    if X64_TOKENS.iter().any(|t| contains_ci(ua, t)) {
        Architecture::X64
    } else if ARM64_TOKENS.iter().any(|t| contains_ci(ua, t)) {
        Architecture::Arm64
    } else if X86_TOKENS.iter().any(|t| contains_ci(ua, t)) {
        Architecture::X86
    } else {
        Architecture::Unknown
    }
}

/// Heuristic extraction of browser, operating system and architecture from
/// a raw identification string.
///
/// Pure and infallible: signals that match nothing yield the
/// `"Unknown"`/empty defaults, never an error.
///
/// # Example
/// ```
/// use client_probe::parse_user_agent::parse_user_agent;
///
/// let parsed = parse_user_agent(
///     "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
///      (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
/// );
/// assert_eq!(parsed.browser, "Chrome");
/// assert_eq!(parsed.browser_version, "114.0.0.0");
/// ```
pub fn parse_user_agent(ua: &str) -> ParsedUa {
    let ua = ua.trim();
    let mut parsed = ParsedUa::default();

    let mut matched = false;
    for rule in BROWSER_RULES {
        if rule.requires.iter().all(|t| contains_ci(ua, t))
            && rule.excludes.iter().all(|t| !contains_ci(ua, t))
        {
            if let Some(version) = version_after(ua, rule.token) {
                parsed.browser = rule.name.into();
                parsed.browser_version = version;
                matched = true;
                break;
            }
        }
    }

    if !matched {
        // Bare WebKit shells: Android WebView marks itself with a "wv"
        // token and reuses the Version/ number.
        if contains_ci(ua, "; wv") || contains_ci(ua, " wv)") {
            parsed.browser = "Android WebView".into();
            parsed.browser_version = version_after(ua, "Version/").unwrap_or_default();
        } else if let Some(version) = version_after(ua, "AppleWebKit/") {
            parsed.browser = "WebKit-based".into();
            parsed.browser_version = version;
        }
    }

    let (operating_system, os_version) = parse_operating_system(ua);
    parsed.operating_system = operating_system;
    parsed.os_version = os_version;
    parsed.architecture = parse_architecture(ua);

    parsed
}
