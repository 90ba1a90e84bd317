use crate::parse_user_agent::contains_ci;
use crate::records::DeviceType;
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// Known crawler tokens, checked by case-insensitive substring match.
/// First token in list order wins as the reported bot name. Deliberately
/// best-effort: crawlers that mimic ordinary browsers pass undetected.
pub const BOT_PATTERNS: [&str; 22] = [
    "googlebot",
    "bingbot",
    "yandexbot",
    "duckduckbot",
    "baiduspider",
    "applebot",
    "facebot",
    "facebookexternalhit",
    "twitterbot",
    "slackbot",
    "discordbot",
    "linkedinbot",
    "semrushbot",
    "ahrefsbot",
    "mj12bot",
    "petalbot",
    "sogou",
    "exabot",
    "ia_archiver",
    "adsbot-google",
    "apis-google",
    "mediapartners-google",
];

/// Fallback crawler keywords, matched as standalone words only. "preview"
/// also catches link-preview fetchers; kept as observed behavior.
const GENERIC_BOT_WORDS: [&str; 4] = ["bot", "crawler", "spider", "preview"];

/// Android model-number prefixes for heuristic model extraction.
const MODEL_PREFIXES: [&str; 6] = ["sm-", "moto", "pixel ", "mi ", "redmi ", "oneplus "];

lazy_static::lazy_static! {
    static ref BOT_MATCHER: AhoCorasick = AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(BOT_PATTERNS)
        .expect("failed to compile AhoCorasick patterns");

    static ref GENERIC_BOT_MATCHER: AhoCorasick = AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(GENERIC_BOT_WORDS)
        .expect("failed to compile AhoCorasick patterns");

    static ref MODEL_PREFIX_MATCHER: AhoCorasick = AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostFirst)
        .build(MODEL_PREFIXES)
        .expect("failed to compile AhoCorasick patterns");
}

/// Bot classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotVerdict {
    pub is_bot: bool,
    /// Matched vendor token, "GenericBot" for keyword-only matches, empty
    /// when not a bot.
    pub bot_name: String,
}

impl BotVerdict {
    fn human() -> Self {
        Self {
            is_bot: false,
            bot_name: String::new(),
        }
    }
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// True when any of the keywords occurs as a standalone word (boundaries
/// are non-word bytes), so "googlebot" does not trip the generic "bot".
fn has_standalone_keyword(ua: &str) -> bool {
    let bytes = ua.as_bytes();
    for m in GENERIC_BOT_MATCHER.find_iter(ua) {
        let before_ok = m.start() == 0 || !is_word_byte(bytes[m.start() - 1]);
        let after_ok = m.end() == bytes.len() || !is_word_byte(bytes[m.end()]);
        if before_ok && after_ok {
            return true;
        }
    }
    false
}

/// Classifies the identification string against the crawler allow-list,
/// falling back to the standalone keyword check. Idempotent and infallible.
pub fn detect_bot(ua: &str) -> BotVerdict {
    // All occurrences are scanned so the reported name follows list order,
    // not haystack order.
    let named = BOT_MATCHER
        .find_iter(ua)
        .map(|m| m.pattern().as_usize())
        .min();

    if let Some(idx) = named {
        return BotVerdict {
            is_bot: true,
            bot_name: BOT_PATTERNS[idx].to_string(),
        };
    }
    if has_standalone_keyword(ua) {
        return BotVerdict {
            is_bot: true,
            bot_name: "GenericBot".to_string(),
        };
    }
    BotVerdict::human()
}

/// Device classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceVerdict {
    pub device_type: DeviceType,
    /// Best-effort model string, empty when nothing matched.
    pub model: String,
}

/// Extracts an Android model from a known manufacturer prefix followed by
/// word characters and dashes, returning the matched slice verbatim.
fn android_model(ua: &str) -> Option<String> {
    let m = MODEL_PREFIX_MATCHER.find(ua)?;
    let bytes = ua.as_bytes();
    let mut end = m.end();
    while end < bytes.len() && (is_word_byte(bytes[end]) || bytes[end] == b'-') {
        end += 1;
    }
    if end == m.end() {
        return None;
    }
    Some(ua[m.start()..end].to_string())
}

/// Infers device type and model from the identification string, capability
/// hints and the touch-point count.
///
/// Precedence, first matching rule wins: capability mobile flag, iPhone
/// token, Android phone (Android without the tablet shape), or a generic
/// mobile keyword make it mobile; iPad (including iPadOS masquerading as a
/// touch-capable Mac), Android-without-mobile, or a tablet keyword make it
/// a tablet; everything else is desktop.
pub fn detect_device(
    ua: &str,
    hints_mobile: Option<bool>,
    hints_model: &str,
    touch_points: u32,
) -> DeviceVerdict {
    let is_ipad = contains_ci(ua, "ipad") || (contains_ci(ua, "macintosh") && touch_points > 0);
    let is_iphone = contains_ci(ua, "iphone");
    let is_android = contains_ci(ua, "android");
    let is_android_tablet = is_android && !contains_ci(ua, "mobile");
    let tablet_keyword = contains_ci(ua, "tablet") || contains_ci(ua, "tab");
    let mobile_keyword = contains_ci(ua, "mobile") || contains_ci(ua, "phone");

    let device_type = if hints_mobile == Some(true)
        || is_iphone
        || (is_android && !is_android_tablet)
        || mobile_keyword
    {
        DeviceType::Mobile
    } else if is_ipad || is_android_tablet || tablet_keyword {
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    };

    // Capability-reported model first; the Apple families get fixed
    // literals, Android gets prefix extraction.
    let model = if !hints_model.is_empty() {
        hints_model.to_string()
    } else if is_iphone {
        "iPhone".to_string()
    } else if is_ipad {
        "iPad".to_string()
    } else if is_android {
        android_model(ua).unwrap_or_default()
    } else {
        String::new()
    };

    DeviceVerdict { device_type, model }
}
