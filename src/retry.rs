//! HTTP fetching with rate-limit backoff
//!
//! Only `429 Too Many Requests` is retried. Every other failure (connection
//! errors, timeouts, other non-success statuses) is returned to the caller on
//! the first attempt.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::clock::Clock;

/// Default number of retries after the first rate-limited attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry (doubles each retry)
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;
/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Errors that can occur when fetching forecast data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or unreadable body
    #[error("Network error: {0}")]
    Network(String),

    /// Still rate limited after the retry budget was spent
    #[error("Rate limited by upstream after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Upstream answered with a non-success status other than 429
    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single GET request
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Transport backed by a reqwest client with a request timeout
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport whose requests fail after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

/// Retry budget and backoff schedule for rate-limited requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each subsequent retry
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        }
    }
}

/// Fetches URLs, backing off and retrying while upstream answers 429
#[derive(Clone)]
pub struct RetryingFetcher {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl fmt::Debug for RetryingFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingFetcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryingFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            clock,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches `url`, returning the first successful response
    ///
    /// Does not return until a success or a final failure is known. The URL
    /// carries the API key, so it is never logged.
    #[tracing::instrument(skip_all)]
    pub async fn fetch(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let mut backoff = self.policy.initial_backoff;
        let mut retries_left = self.policy.max_retries;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let response = self.transport.get(url).await?;

            if response.is_success() {
                if attempts > 1 {
                    tracing::info!(attempts, "Request succeeded after rate limiting");
                }
                return Ok(response);
            }

            if response.status != STATUS_TOO_MANY_REQUESTS {
                tracing::debug!(status = response.status, "Non-retryable status");
                return Err(FetchError::Status(response.status));
            }

            if retries_left == 0 {
                tracing::error!(attempts, "Rate limit retries exhausted");
                return Err(FetchError::RateLimited { attempts });
            }

            tracing::warn!(
                attempt = attempts,
                backoff_ms = backoff.as_millis() as u64,
                "Rate limited (429), backing off"
            );
            self.clock.sleep(backoff).await;
            backoff = backoff.saturating_mul(2);
            retries_left -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::test_support::FakeTransport;

    fn fetcher_with(
        responses: Vec<Result<HttpResponse, FetchError>>,
    ) -> (RetryingFetcher, Arc<FakeTransport>, Arc<ManualClock>) {
        let transport = Arc::new(FakeTransport::scripted(responses));
        let clock = Arc::new(ManualClock::default());
        let fetcher = RetryingFetcher::new(transport.clone(), clock.clone());
        (fetcher, transport, clock)
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(1000));
    }

    #[test]
    fn test_http_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(429, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_does_not_sleep() {
        let (fetcher, transport, clock) = fetcher_with(vec![Ok(HttpResponse::new(200, "ok"))]);

        let response = fetcher.fetch("https://example.test/").await.unwrap();

        assert_eq!(response.body, "ok");
        assert_eq!(transport.request_count(), 1);
        assert!(clock.recorded_sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_two_rate_limits_then_success() {
        let (fetcher, transport, clock) = fetcher_with(vec![
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(200, "done")),
        ]);

        let response = fetcher.fetch("https://example.test/").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "done");
        assert_eq!(transport.request_count(), 3);
        assert_eq!(
            clock.recorded_sleeps(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let (fetcher, transport, clock) = fetcher_with(vec![
            Ok(HttpResponse::new(500, "boom")),
            Ok(HttpResponse::new(200, "never reached")),
        ]);

        let result = fetcher.fetch("https://example.test/").await;

        assert!(matches!(result, Err(FetchError::Status(500))));
        assert_eq!(transport.request_count(), 1);
        assert!(clock.recorded_sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_network_error_is_not_retried() {
        let (fetcher, transport, _clock) = fetcher_with(vec![
            Err(FetchError::Network("connection refused".to_string())),
            Ok(HttpResponse::new(200, "never reached")),
        ]);

        let result = fetcher.fetch("https://example.test/").await;

        assert!(matches!(result, Err(FetchError::Network(_))));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_budget_exhausted() {
        let (fetcher, transport, clock) = fetcher_with(vec![
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(200, "never reached")),
        ]);

        let result = fetcher.fetch("https://example.test/").await;

        assert!(matches!(result, Err(FetchError::RateLimited { attempts: 4 })));
        assert_eq!(transport.request_count(), 4);
        assert_eq!(
            clock.recorded_sleeps(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_policy() {
        let (fetcher, transport, clock) = fetcher_with(vec![
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
        ]);
        let fetcher = fetcher.with_policy(RetryPolicy {
            max_retries: 1,
            initial_backoff: Duration::from_millis(50),
        });

        let result = fetcher.fetch("https://example.test/").await;

        assert!(matches!(result, Err(FetchError::RateLimited { attempts: 2 })));
        assert_eq!(transport.request_count(), 2);
        assert_eq!(clock.recorded_sleeps(), vec![Duration::from_millis(50)]);
    }

    #[test]
    fn test_reqwest_transport_builds_with_timeout() {
        assert!(ReqwestTransport::new(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)).is_ok());
    }

    /// Records the name and field names of every span opened
    #[derive(Clone, Default)]
    struct SpanRecorder(Arc<std::sync::Mutex<Vec<(String, Vec<String>)>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanRecorder {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let fields = attrs
                .metadata()
                .fields()
                .iter()
                .map(|field| field.name().to_string())
                .collect();
            self.0
                .lock()
                .unwrap()
                .push((attrs.metadata().name().to_string(), fields));
        }
    }

    #[test]
    fn test_fetch_span_omits_url() {
        use tracing_subscriber::layer::SubscriberExt;

        let recorder = SpanRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        let (fetcher, _, _) = fetcher_with(vec![Ok(HttpResponse::new(200, "{}"))]);

        tracing::subscriber::with_default(subscriber, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime
                .block_on(fetcher.fetch("https://example.test/forecast?apikey=secret"))
                .unwrap();
        });

        let spans = recorder.0.lock().unwrap().clone();
        let (_, fields) = spans
            .iter()
            .find(|(name, _)| name == "fetch")
            .expect("fetch should open a span");
        assert!(fields.is_empty(), "span recorded fields: {:?}", fields);
    }
}
