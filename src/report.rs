use crate::records::FinalRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// HTTP timeout for report submissions.
const REPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// The outbound body: the final record wrapped with a submission id and
/// timestamp. The record fields are flattened into the envelope, keeping
/// the `{geo, env, error}` wire shape intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEnvelope {
    pub report_id: Uuid,
    pub reported_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: FinalRecord,
}

impl ReportEnvelope {
    pub fn new(record: FinalRecord) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            reported_at: Utc::now(),
            record,
        }
    }
}

/// Submits final records to the configured collection endpoint.
///
/// Fire-and-forget: submission failures are logged and swallowed, never
/// surfaced to the orchestrator.
#[derive(Debug, Clone)]
pub struct Reporter {
    endpoint: Url,
    client: reqwest::Client,
}

impl Reporter {
    pub fn new(endpoint: Url) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REPORT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self { endpoint, client }
    }

    /// Submit one record as a JSON POST body. Errors are logged via
    /// `tracing::warn` and discarded.
    pub async fn submit(&self, record: &FinalRecord) {
        let envelope = ReportEnvelope::new(record.clone());
        match self
            .client
            .post(self.endpoint.clone())
            .json(&envelope)
            .send()
            .await
        {
            Ok(response) => {
                if response.status().is_success() {
                    tracing::debug!(report_id = %envelope.report_id, "record submitted");
                } else {
                    tracing::warn!(
                        status = %response.status(),
                        "collection endpoint rejected record"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to submit record");
            }
        }
    }

    /// Submit on a background task. The critical path never awaits it;
    /// the task's outcome is captured by the same log-and-discard policy.
    pub fn submit_background(&self, record: FinalRecord) {
        let reporter = self.clone();
        tokio::spawn(async move {
            reporter.submit(&record).await;
        });
    }

    /// The configured collection endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::build_env_record;
    use crate::signals::EnvSignals;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_record() -> FinalRecord {
        FinalRecord {
            env: build_env_record(
                &EnvSignals::from_user_agent(
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
                ),
                None,
            ),
            geo: None,
            error: Some("Geolocation timeout".into()),
        }
    }

    fn endpoint(server: &MockServer) -> Url {
        format!("{}/api/geolocation", server.uri())
            .parse()
            .expect("valid endpoint")
    }

    #[tokio::test]
    async fn submits_json_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/geolocation"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Reporter::new(endpoint(&server)).submit(&sample_record()).await;
    }

    #[tokio::test]
    async fn server_error_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/geolocation"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        // Must not panic or propagate.
        Reporter::new(endpoint(&server)).submit(&sample_record()).await;
    }

    #[tokio::test]
    async fn connection_refused_is_swallowed() {
        let reporter = Reporter::new("http://127.0.0.1:1/api/geolocation".parse().unwrap());
        reporter.submit(&sample_record()).await;
    }

    #[tokio::test]
    async fn slow_server_hits_client_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/geolocation"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let reporter = Reporter::new(endpoint(&server));
        let start = std::time::Instant::now();
        reporter.submit(&sample_record()).await;
        assert!(
            start.elapsed() < Duration::from_secs(8),
            "submission should have timed out"
        );
    }

    #[test]
    fn envelope_keeps_wire_shape() {
        let envelope = ReportEnvelope::new(sample_record());
        let json = serde_json::to_value(&envelope).expect("should serialize");
        assert!(json.get("reportId").is_some());
        assert!(json.get("reportedAt").is_some());
        // Flattened record fields sit beside the envelope metadata.
        assert!(json.get("env").is_some());
        assert_eq!(json["geo"], serde_json::Value::Null);
        assert_eq!(json["error"], "Geolocation timeout");
        assert_eq!(json["env"]["browser"], "Chrome");
    }
}
