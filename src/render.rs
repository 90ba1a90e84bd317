use crate::records::FinalRecord;
use chrono::{Local, TimeZone};
use std::collections::BTreeMap;
use tokio::sync::watch;

/// A rendering target: the page marks elements with a field name and the
/// renderer replaces their text content. Only the write is modeled here.
pub trait RecordSink {
    fn set_field(&mut self, name: &str, value: &str);
}

impl RecordSink for BTreeMap<String, String> {
    fn set_field(&mut self, name: &str, value: &str) {
        self.insert(name.to_string(), value.to_string());
    }
}

fn fmt_ts(ts: i64) -> Option<String> {
    Local
        .timestamp_millis_opt(ts)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Flattens the nested record into a lookup by field name with
/// type-appropriate formatting: coordinates to 6 decimal places,
/// distances/accuracies rounded, speed to 2 decimals, heading whole
/// degrees, timestamps as local date-time strings, everything else plain.
/// Absent optionals are omitted rather than rendered empty.
pub fn flatten(record: &FinalRecord) -> BTreeMap<&'static str, String> {
    let mut fields = BTreeMap::new();

    if let Some(geo) = &record.geo {
        fields.insert("lat", format!("{:.6}", geo.lat));
        fields.insert("lon", format!("{:.6}", geo.lon));
        if let Some(accuracy) = geo.accuracy {
            fields.insert("accuracy", format!("{}", accuracy.round() as i64));
        }
        if let Some(altitude) = geo.altitude {
            fields.insert("altitude", format!("{altitude:.1}"));
        }
        if let Some(altitude_accuracy) = geo.altitude_accuracy {
            fields.insert("altitudeAccuracy", format!("{}", altitude_accuracy.round() as i64));
        }
        if let Some(speed) = geo.speed {
            fields.insert("speed", format!("{speed:.2}"));
        }
        if let Some(heading) = geo.heading {
            fields.insert("heading", format!("{heading:.0}"));
        }
        if let Some(ts) = fmt_ts(geo.ts) {
            fields.insert("ts", ts);
        }
        if let Some(city) = &geo.city {
            fields.insert("city", city.clone());
        }
    }

    let env = &record.env;
    if let Some(ua) = &env.ua {
        fields.insert("ua", ua.clone());
    }
    fields.insert("browser", env.browser.clone());
    fields.insert("browserVersion", env.browser_version.clone());
    fields.insert("operatingSystem", env.operating_system.clone());
    fields.insert("osVersion", env.os_version.clone());
    fields.insert("architecture", env.architecture.as_str().to_string());
    fields.insert("deviceType", env.device_type.as_str().to_string());
    fields.insert("deviceModel", env.device_model.clone());
    fields.insert("touchPoints", env.touch_points.to_string());
    fields.insert("isBot", env.is_bot.to_string());
    fields.insert("botName", env.bot_name.clone());

    if let Some(language) = &env.language {
        fields.insert("language", language.clone());
    }
    if let Some(platform) = &env.platform {
        fields.insert("platform", platform.clone());
    }
    if let Some(online) = env.online {
        fields.insert("online", online.to_string());
    }
    if let Some(time_zone) = &env.time_zone {
        fields.insert("timeZone", time_zone.clone());
    }
    if let Some(width) = env.screen_width {
        fields.insert("screenWidth", width.to_string());
    }
    if let Some(height) = env.screen_height {
        fields.insert("screenHeight", height.to_string());
    }
    if let Some(dpr) = env.dpr {
        fields.insert("dpr", dpr.to_string());
    }
    if let Some(referrer) = &env.referrer {
        fields.insert("referrer", referrer.clone());
    }
    if let Some(page) = &env.page {
        fields.insert("page", page.clone());
    }
    if let Some(connection) = &env.connection {
        if let Some(effective_type) = &connection.effective_type {
            fields.insert("connectionType", effective_type.clone());
        }
        if let Some(downlink) = connection.downlink {
            fields.insert("connectionDownlink", downlink.to_string());
        }
        if let Some(rtt) = connection.rtt {
            fields.insert("connectionRtt", rtt.to_string());
        }
        if let Some(save_data) = connection.save_data {
            fields.insert("saveData", save_data.to_string());
        }
    }

    fields
}

/// Pushes every flattened field into the sink.
pub fn render(record: &FinalRecord, sink: &mut impl RecordSink) {
    for (name, value) in flatten(record) {
        sink.set_field(name, &value);
    }
}

/// Explicit, externally-owned cell holding the most recent record, so
/// late-arriving observers can inspect it, plus a subscription channel for
/// the completion notification.
pub struct LastRecord {
    tx: watch::Sender<Option<FinalRecord>>,
}

impl LastRecord {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Stores the record and notifies subscribers.
    pub fn publish(&self, record: FinalRecord) {
        self.tx.send_replace(Some(record));
    }

    /// The most recently published record, if any.
    pub fn latest(&self) -> Option<FinalRecord> {
        self.tx.borrow().clone()
    }

    /// A receiver that observes every publish, including ones that happened
    /// before subscribing (via the current value).
    pub fn subscribe(&self) -> watch::Receiver<Option<FinalRecord>> {
        self.tx.subscribe()
    }
}

impl Default for LastRecord {
    fn default() -> Self {
        Self::new()
    }
}
