use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Recognized acquisition options. Caller-supplied values override the
/// defaults `{true, 600000ms, 10000ms}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoOptions {
    /// Request the best available precision.
    pub enable_high_accuracy: bool,
    /// Accept a cached OS-level fix up to this age.
    pub maximum_age: Duration,
    /// Maximum wait before the acquisition is abandoned.
    pub timeout: Duration,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            maximum_age: Duration::from_millis(600_000),
            timeout: Duration::from_millis(10_000),
        }
    }
}

/// A raw coordinate fix as delivered by the platform capability.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    /// Fix timestamp, epoch milliseconds.
    pub timestamp: i64,
}

/// Acquisition failure reasons surfaced to the orchestrator. The messages
/// are the exact strings carried into the final record's error field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    /// The capability is absent on this platform.
    #[error("Geolocation not supported")]
    Unsupported,
    /// The configured wait elapsed before the platform answered.
    #[error("Geolocation timeout")]
    Timeout,
    /// Underlying platform error (permission denied, position unavailable).
    #[error("{0}")]
    Platform(String),
}

/// Single-use delivery callback handed to a [`GeolocationProvider`].
pub type PositionCallback = Box<dyn FnOnce(Result<Position, GeoError>) + Send + 'static>;

/// The platform geolocation capability: a single-shot request that answers
/// through `deliver` exactly once, with either a fix or a platform error.
/// The request cannot be aborted once issued; a result arriving after the
/// acquirer has settled is discarded.
pub trait GeolocationProvider {
    fn request_position(&self, options: &GeoOptions, deliver: PositionCallback);
}

/// A single-assignment result cell shared by the racing producers.
///
/// Whichever producer settles first wins; every later `settle` is an
/// explicit no-op returning `false`, which gives the at-most-once
/// resolution guarantee.
#[derive(Clone)]
pub(crate) struct SettleCell<T> {
    tx: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> SettleCell<T> {
    pub(crate) fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Writes the cell. Returns `true` for the winning producer, `false`
    /// when the cell was already settled.
    pub(crate) fn settle(&self, value: T) -> bool {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match sender {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }
}

/// Requests the current coordinates with a bounded wait.
///
/// The platform call races an independently scheduled timer set to
/// `options.timeout`; exactly one of success, platform failure, or timeout
/// resolves the operation. The timer only abandons the wait; it does not
/// stop the platform from finishing its attempt.
pub async fn acquire<P: GeolocationProvider>(
    provider: &P,
    options: GeoOptions,
) -> Result<Position, GeoError> {
    let (cell, rx) = SettleCell::new();

    let deliver = {
        let cell = cell.clone();
        Box::new(move |result: Result<Position, GeoError>| {
            cell.settle(result);
        })
    };
    provider.request_position(&options, deliver);

    let timer = cell.clone();
    tokio::spawn(async move {
        tokio::time::sleep(options.timeout).await;
        timer.settle(Err(GeoError::Timeout));
    });

    // The timer task settles eventually, so the sender side cannot vanish
    // silently; the fallback mirrors the timeout path anyway.
    rx.await.unwrap_or(Err(GeoError::Timeout))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix() -> Position {
        Position {
            latitude: -23.55052,
            longitude: -46.633308,
            accuracy: Some(15.0),
            altitude: None,
            altitude_accuracy: None,
            speed: None,
            heading: None,
            timestamp: 1_700_000_000_000,
        }
    }

    /// Answers inline, before the timer is even scheduled.
    struct ImmediateProvider(Result<Position, GeoError>);

    impl GeolocationProvider for ImmediateProvider {
        fn request_position(&self, _options: &GeoOptions, deliver: PositionCallback) {
            deliver(self.0.clone());
        }
    }

    /// Answers after a fixed delay on the runtime clock.
    struct SlowProvider {
        delay: Duration,
        result: Result<Position, GeoError>,
    }

    impl GeolocationProvider for SlowProvider {
        fn request_position(&self, _options: &GeoOptions, deliver: PositionCallback) {
            let delay = self.delay;
            let result = self.result.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                deliver(result);
            });
        }
    }

    #[tokio::test]
    async fn immediate_success_resolves() {
        let provider = ImmediateProvider(Ok(fix()));
        let got = acquire(&provider, GeoOptions::default()).await;
        assert_eq!(got, Ok(fix()));
    }

    #[tokio::test]
    async fn platform_error_passes_through() {
        let provider = ImmediateProvider(Err(GeoError::Platform(
            "User denied Geolocation".into(),
        )));
        let got = acquire(&provider, GeoOptions::default()).await;
        assert_eq!(
            got.unwrap_err().to_string(),
            "User denied Geolocation"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timer_wins_the_race() {
        let provider = SlowProvider {
            delay: Duration::from_secs(30),
            result: Ok(fix()),
        };
        let options = GeoOptions {
            timeout: Duration::from_secs(10),
            ..Default::default()
        };
        let got = acquire(&provider, options).await;
        assert_eq!(got, Err(GeoError::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn late_callback_is_discarded() {
        let provider = SlowProvider {
            delay: Duration::from_secs(30),
            result: Ok(fix()),
        };
        let options = GeoOptions {
            timeout: Duration::from_secs(1),
            ..Default::default()
        };
        assert_eq!(acquire(&provider, options).await, Err(GeoError::Timeout));

        // Let the slow delivery fire; settling an already-settled cell must
        // stay a no-op rather than panic or resurface.
        tokio::time::sleep(Duration::from_secs(60)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn provider_beats_a_generous_timer() {
        let provider = SlowProvider {
            delay: Duration::from_secs(2),
            result: Ok(fix()),
        };
        let options = GeoOptions {
            timeout: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(acquire(&provider, options).await, Ok(fix()));
    }

    #[tokio::test]
    async fn settle_cell_resolves_exactly_once() {
        let (cell, rx) = SettleCell::new();
        assert!(cell.settle(1));
        assert!(!cell.settle(2));
        assert!(!cell.settle(3));
        assert_eq!(rx.await, Ok(1));
    }

    #[test]
    fn default_options() {
        let options = GeoOptions::default();
        assert!(options.enable_high_accuracy);
        assert_eq!(options.maximum_age, Duration::from_millis(600_000));
        assert_eq!(options.timeout, Duration::from_millis(10_000));
    }
}
