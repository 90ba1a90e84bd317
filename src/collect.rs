use crate::classify::{detect_bot, detect_device};
use crate::client_hints::{apply_hints, HintsProvider, UaHints};
use crate::geo_cache::{GeoCache, KeyValueStore};
use crate::geolocate::{acquire, GeoError, GeoOptions, GeolocationProvider, PositionCallback};
use crate::parse_user_agent::parse_user_agent;
use crate::records::{EnvRecord, FinalRecord, GeoRecord};
use crate::render::LastRecord;
use crate::report::Reporter;
use crate::signals::EnvSignals;

/// Placeholder capability-query provider: the capability is absent and the
/// heuristic layer stands alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHints;

impl HintsProvider for NoHints {
    async fn query(&self) -> Option<UaHints> {
        None
    }
}

/// Placeholder geolocation provider: the capability is absent on this
/// platform, so every request settles as unsupported.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeolocation;

impl GeolocationProvider for NoGeolocation {
    fn request_position(&self, _options: &GeoOptions, deliver: PositionCallback) {
        deliver(Err(GeoError::Unsupported));
    }
}

/// Builds the environment half of the record from the raw signals and an
/// already-resolved hints payload. Pure; never fails.
pub fn build_env_record(signals: &EnvSignals, hints: Option<&UaHints>) -> EnvRecord {
    let ua = signals.user_agent.as_deref().unwrap_or("");

    let mut parsed = parse_user_agent(ua);
    if let Some(hints) = hints {
        apply_hints(&mut parsed, hints);
    }

    let bot = detect_bot(ua);
    let (hints_mobile, hints_model) = hints
        .map(|h| (h.mobile, h.model.as_str()))
        .unwrap_or((None, ""));
    let device = detect_device(ua, hints_mobile, hints_model, signals.touch_points);

    EnvRecord {
        ua: signals.user_agent.clone(),
        browser: parsed.browser,
        browser_version: parsed.browser_version,
        operating_system: parsed.operating_system,
        os_version: parsed.os_version,
        architecture: parsed.architecture,
        device_type: device.device_type,
        device_model: device.model,
        touch_points: signals.touch_points,
        is_bot: bot.is_bot,
        bot_name: bot.bot_name,
        language: signals.language.clone(),
        languages: signals.languages.clone(),
        platform: signals.platform.clone(),
        online: signals.online,
        time_zone: signals.time_zone.clone(),
        screen_width: signals.screen_width,
        screen_height: signals.screen_height,
        dpr: signals.dpr,
        referrer: signals.referrer.clone(),
        page: signals.page.clone(),
        connection: signals.connection.clone(),
    }
}

/// Sequences parsing, enrichment, classification, the cache-guarded
/// geolocation path, and the final merge. One `collect` call per page load.
pub struct Collector<H = NoHints, G = NoGeolocation, S = crate::geo_cache::MemoryStore> {
    hints: H,
    geolocation: G,
    cache: GeoCache<S>,
    geo_options: GeoOptions,
}

impl<S: KeyValueStore> Collector<NoHints, NoGeolocation, S> {
    /// A collector over the given storage with both optional capabilities
    /// absent.
    pub fn new(store: S) -> Self {
        Self {
            hints: NoHints,
            geolocation: NoGeolocation,
            cache: GeoCache::new(store),
            geo_options: GeoOptions::default(),
        }
    }
}

impl<H, G, S> Collector<H, G, S> {
    /// Attach a capability-query provider.
    pub fn with_hints_provider<H2: HintsProvider>(self, hints: H2) -> Collector<H2, G, S> {
        Collector {
            hints,
            geolocation: self.geolocation,
            cache: self.cache,
            geo_options: self.geo_options,
        }
    }

    /// Attach a platform geolocation capability.
    pub fn with_geolocation<G2: GeolocationProvider>(self, geolocation: G2) -> Collector<H, G2, S> {
        Collector {
            hints: self.hints,
            geolocation,
            cache: self.cache,
            geo_options: self.geo_options,
        }
    }

    /// Override the default acquisition options.
    pub fn with_geo_options(mut self, geo_options: GeoOptions) -> Self {
        self.geo_options = geo_options;
        self
    }
}

impl<H, G, S> Collector<H, G, S>
where
    H: HintsProvider,
    G: GeolocationProvider,
    S: KeyValueStore,
{
    /// Produces the final record.
    ///
    /// The environment build overlaps the cache lookup; they join before
    /// assembly. A cache hit reuses the stored coordinates and skips the
    /// acquisition entirely (no permission prompt). On a miss the acquirer
    /// runs; its failure degrades to a null geo plus the failure reason,
    /// and the environment half is emitted regardless.
    pub async fn collect(&self, signals: &EnvSignals) -> FinalRecord {
        let env_path = async {
            let hints = self.hints.query().await;
            build_env_record(signals, hints.as_ref())
        };
        let cache_path = async { self.cache.read() };
        let (env, cached) = tokio::join!(env_path, cache_path);

        if let Some(entry) = cached {
            tracing::debug!("reusing cached coordinates");
            return FinalRecord {
                env,
                geo: Some(entry.coords),
                error: None,
            };
        }

        match acquire(&self.geolocation, self.geo_options).await {
            Ok(position) => {
                // Reverse geocoding is disabled; the place slot stays empty.
                let geo = GeoRecord::from_position(&position, None);
                self.cache.write(&geo, None);
                FinalRecord {
                    env,
                    geo: Some(geo),
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "geolocation failed");
                FinalRecord {
                    env,
                    geo: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    /// [`collect`](Self::collect), then publish to the last-record cell and
    /// hand the record to the background reporter. Emission happens on
    /// every outcome; a geolocation failure never suppresses it.
    pub async fn collect_and_emit(
        &self,
        signals: &EnvSignals,
        last: &LastRecord,
        reporter: &Reporter,
    ) -> FinalRecord {
        let record = self.collect(signals).await;
        last.publish(record.clone());
        reporter.submit_background(record.clone());
        record
    }
}
