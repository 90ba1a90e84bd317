//! Client environment fingerprinting and telemetry collection.
//!
//! Gathers device, browser, network and geolocation signals from a host
//! environment, merges them into a single structured record, caches the
//! last coordinate fix to avoid repeated permission prompts, and hands the
//! result to rendering and reporting collaborators.
//!
//! The heuristic identification-string parser works alone; when the host
//! exposes a high-fidelity capability query its data fills the gaps
//! without ever contradicting a confident heuristic result. Geolocation is
//! cache-guarded and time-bounded: the platform request races a timer and
//! exactly one of success, platform failure, or timeout settles it. No
//! failure inside the pipeline suppresses the environment half of the
//! final record.
//!
//! ```no_run
//! use client_probe::{Collector, EnvSignals, MemoryStore};
//!
//! # async fn run() {
//! let collector = Collector::new(MemoryStore::new());
//! let record = collector
//!     .collect(&EnvSignals::from_user_agent(
//!         "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
//!          (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
//!     ))
//!     .await;
//! assert_eq!(record.env.browser, "Chrome");
//! # }
//! ```

/// Device and bot classification.
pub mod classify;
/// Capability-query enrichment.
pub mod client_hints;
/// Record assembly orchestration.
pub mod collect;
/// TTL-bounded coordinate cache.
pub mod geo_cache;
/// Time-bounded geolocation acquisition.
pub mod geolocate;
/// Identification-string parsing.
pub mod parse_user_agent;
/// Record types.
pub mod records;
/// Field rendering and the last-record cell.
pub mod render;
/// Outbound record reporting.
pub mod report;
/// Raw environment signals.
pub mod signals;

pub use classify::{detect_bot, detect_device, BotVerdict, DeviceVerdict};
pub use client_hints::{apply_hints, BrandEntry, HintsProvider, UaHints};
pub use collect::{build_env_record, Collector, NoGeolocation, NoHints};
pub use geo_cache::{CachedGeo, GeoCache, KeyValueStore, MemoryStore, CACHE_KEY, CACHE_TTL};
pub use geolocate::{acquire, GeoError, GeoOptions, GeolocationProvider, Position, PositionCallback};
pub use parse_user_agent::parse_user_agent;
pub use records::{Architecture, DeviceType, EnvRecord, FinalRecord, GeoRecord, ParsedUa};
pub use render::{flatten, render, LastRecord, RecordSink};
pub use report::{ReportEnvelope, Reporter};
pub use signals::{EnvSignals, NetworkInfo};

pub use url;
