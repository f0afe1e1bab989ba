//! HTTP GET wrapped in [`seatbelt`] retry and timeout middleware.
//!
//! Network errors, timeouts and 5xx responses are retried with exponential backoff. A 429,
//! or a 403 carrying `Retry-After` (GitHub's secondary rate limit), is retried after the
//! delay the server asks for. Whatever remains once the attempts run out is handed back to
//! the caller for classification.

use core::time::Duration;
use layered::{Execute, Service, Stack};
use ohno::app_err;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use seatbelt::retry::{Backoff, Retry};
use seatbelt::timeout::Timeout;
use seatbelt::{RecoveryInfo, ResilienceContext};
use tick::Clock;

const LOG_TARGET: &str = "      http";

/// Wait before retrying a 429 that does not say how long to back off.
const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(5);

/// How transient failures are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts on top of the original request.
    pub max_retry_attempts: u32,

    /// Delay before the first retry; grows exponentially after that.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs))
}

fn recovery_for(result: &crate::Result<Response>) -> RecoveryInfo {
    let resp = match result {
        Err(_) => return RecoveryInfo::retry(),
        Ok(resp) => resp,
    };

    match resp.status() {
        s if s.is_server_error() => RecoveryInfo::retry(),
        StatusCode::TOO_MANY_REQUESTS => RecoveryInfo::retry().delay(retry_after(resp.headers()).unwrap_or(DEFAULT_RATE_LIMIT_DELAY)),
        StatusCode::FORBIDDEN => retry_after(resp.headers()).map_or_else(RecoveryInfo::never, |delay| RecoveryInfo::retry().delay(delay)),
        _ => RecoveryInfo::never(),
    }
}

/// Send a GET request with `headers`, retrying per `policy` and bounding each attempt by `timeout`.
pub async fn resilient_get(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
    policy: RetryPolicy,
    timeout: Duration,
) -> crate::Result<Response> {
    let clock = Clock::new_tokio();
    let context = ResilienceContext::new(&clock).name("hosting_get");

    let client = client.clone();
    let service = (
        Retry::layer("retry", &context)
            .clone_input()
            .recovery_with(|result: &crate::Result<Response>, _| recovery_for(result))
            .max_retry_attempts(policy.max_retry_attempts)
            .base_delay(policy.base_delay)
            .backoff(Backoff::Exponential)
            .on_retry(|_output, args| {
                log::debug!(
                    target: LOG_TARGET,
                    "Retrying GET (attempt {}, delay {}ms)",
                    args.attempt().index() + 1,
                    args.retry_delay().as_millis(),
                );
            }),
        Timeout::layer("timeout", &context)
            .timeout_error(move |_| app_err!("request timed out after {}ms", timeout.as_millis()))
            .timeout(timeout),
        Execute::new(move |url: String| {
            let request = client.get(&url).headers(headers.clone());
            async move { request.send().await.map_err(ohno::AppError::from) }
        }),
    )
        .into_service();

    service.execute(url.to_string()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            max_retry_attempts: 2,
            base_delay: Duration::from_millis(1),
        }
    }

    async fn get(server: &MockServer, p: &str) -> crate::Result<Response> {
        let client = reqwest::Client::new();
        resilient_get(&client, &format!("{}{p}", server.uri()), HeaderMap::new(), quick_policy(), TIMEOUT).await
    }

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        let _ = headers.insert(RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));

        let _ = headers.insert(RETRY_AFTER, "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap());
        assert_eq!(retry_after(&headers), None);
    }

    #[tokio::test]
    async fn test_retries_server_errors_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let resp = get(&server, "/flaky").await.unwrap();

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        assert_eq!(get(&server, "/down").await.unwrap().status(), 500);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(get(&server, "/missing").await.unwrap().status(), 404);
    }

    #[tokio::test]
    async fn test_too_many_requests_honors_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert_eq!(get(&server, "/busy").await.unwrap().status(), 200);
    }

    #[tokio::test]
    async fn test_secondary_rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/abuse"))
            .respond_with(ResponseTemplate::new(403).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/abuse"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert_eq!(get(&server, "/abuse").await.unwrap().status(), 200);
    }

    #[tokio::test]
    async fn test_forbidden_without_retry_after_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/private"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(get(&server, "/private").await.unwrap().status(), 403);
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let policy = RetryPolicy {
            max_retry_attempts: 0,
            base_delay: Duration::from_millis(1),
        };
        let err = resilient_get(&client, &format!("{}/slow", server.uri()), HeaderMap::new(), policy, Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_an_error() {
        let client = reqwest::Client::new();
        let result = resilient_get(&client, "http://127.0.0.1:1/unreachable", HeaderMap::new(), quick_policy(), TIMEOUT).await;
        let _ = result.unwrap_err();
    }
}
