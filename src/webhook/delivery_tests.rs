//! Tests for `HttpDelivery`.

use super::{
    AttemptError, DeliveryError, Endpoint, HttpClient, HttpDelivery, HttpError, HttpRequest,
    HttpResponse, IsRetryable, RetryPolicy, WebhookDelivery, verify,
};
use crate::payload::Payload;
use crate::time::{InstantSleeper, Sleeper};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

const SECRET: &str = "s3cr3t";

/// Client that replays queued outcomes and records every request.
///
/// Once the queue is drained it answers `200 OK`. Implemented on `&Self` so
/// tests keep ownership and can inspect it after delivering.
#[derive(Default)]
struct MockClient {
    outcomes: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockClient {
    fn with_outcomes(outcomes: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::default(),
        }
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpClient for &MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(req);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::status(http::StatusCode::OK)))
    }
}

/// Client whose transport always fails.
#[derive(Default)]
struct RefusingClient {
    calls: Mutex<usize>,
}

impl HttpClient for &RefusingClient {
    async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
        *self.calls.lock().unwrap() += 1;
        Err(connection_refused())
    }
}

/// Client that never answers.
struct StallingClient;

impl HttpClient for StallingClient {
    async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
        std::future::pending().await
    }
}

#[derive(Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl Sleeper for &RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

fn connection_refused() -> HttpError {
    HttpError::Connection(Box::new(std::io::Error::other("connection refused")))
}

fn endpoint() -> Endpoint {
    Endpoint::new(
        url::Url::parse("https://hooks.example.com/wa").unwrap(),
        SECRET,
    )
}

fn payload() -> Payload {
    let mut payload = Payload::new("message");
    payload.insert("from", "123@s.whatsapp.net");
    payload.insert("from_me", false);
    payload.insert("timestamp", "2023-11-14T22:13:20Z");
    payload
}

fn status(code: u16) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::status(
        http::StatusCode::from_u16(code).unwrap(),
    ))
}

mod request_shape {
    use super::*;

    #[tokio::test]
    async fn posts_json_with_verifiable_signature() {
        let client = MockClient::default();
        let delivery = HttpDelivery::new(&client).with_sleeper(InstantSleeper);

        delivery.deliver(&payload(), &endpoint()).await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.method, http::Method::POST);
        assert_eq!(req.url.as_str(), "https://hooks.example.com/wa");
        assert_eq!(req.header("content-type"), Some("application/json"));

        let signature = req.header("x-hub-signature-256").unwrap();
        assert!(signature.starts_with("sha256="));
        assert!(verify(&req.body, SECRET.as_bytes(), signature));
    }

    #[tokio::test]
    async fn body_is_the_serialized_payload() {
        let client = MockClient::default();
        let delivery = HttpDelivery::new(&client).with_sleeper(InstantSleeper);

        delivery.deliver(&payload(), &endpoint()).await.unwrap();

        let body = String::from_utf8(client.requests()[0].body.clone()).unwrap();
        assert_eq!(
            body,
            r#"{"event_type":"message","from":"123@s.whatsapp.net","from_me":false,"timestamp":"2023-11-14T22:13:20Z"}"#
        );
    }

    #[test]
    fn build_request_signs_with_endpoint_secret() {
        let req = HttpDelivery::<MockClient>::build_request(&payload(), &endpoint()).unwrap();
        let signature = req.header("x-hub-signature-256").unwrap();

        assert!(verify(&req.body, SECRET.as_bytes(), signature));
        assert!(!verify(&req.body, b"other", signature));
    }
}

mod retries {
    use super::*;

    #[tokio::test]
    async fn failing_transport_is_attempted_five_times() {
        let client = RefusingClient::default();
        let sleeper = RecordingSleeper::default();
        let delivery = HttpDelivery::new(&client).with_sleeper(&sleeper);

        let err = delivery.deliver(&payload(), &endpoint()).await.unwrap_err();

        assert_eq!(*client.calls.lock().unwrap(), 5);
        assert!(matches!(
            err,
            DeliveryError::MaxRetriesExceeded {
                attempts: 5,
                last_error: AttemptError::Http(HttpError::Connection(_)),
                ..
            }
        ));
        assert_eq!(err.attempts(), 5);
        assert_eq!(err.endpoint(), Some("https://hooks.example.com/wa"));
    }

    #[tokio::test]
    async fn delays_double_between_attempts() {
        let client = RefusingClient::default();
        let sleeper = RecordingSleeper::default();
        let delivery = HttpDelivery::new(&client).with_sleeper(&sleeper);

        let _ = delivery.deliver(&payload(), &endpoint()).await;

        let delays = sleeper.delays.lock().unwrap().clone();
        assert_eq!(delays, [1, 2, 4, 8].map(Duration::from_secs));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let client = MockClient::with_outcomes(vec![
            Err(connection_refused()),
            Err(HttpError::Timeout),
            status(200),
        ]);
        let sleeper = RecordingSleeper::default();
        let delivery = HttpDelivery::new(&client).with_sleeper(&sleeper);

        delivery.deliver(&payload(), &endpoint()).await.unwrap();

        assert_eq!(client.call_count(), 3);
        assert_eq!(sleeper.delays.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn every_attempt_sends_identical_bytes() {
        let client = MockClient::with_outcomes(vec![
            Err(connection_refused()),
            Err(connection_refused()),
            status(200),
        ]);
        let delivery = HttpDelivery::new(&client).with_sleeper(InstantSleeper);

        delivery.deliver(&payload(), &endpoint()).await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        for req in &requests[1..] {
            assert_eq!(req.body, requests[0].body);
            assert_eq!(req.headers, requests[0].headers);
        }
    }

    #[tokio::test]
    async fn custom_policy_limits_attempts() {
        let client = RefusingClient::default();
        let delivery = HttpDelivery::new(&client)
            .with_sleeper(InstantSleeper)
            .with_retry_policy(RetryPolicy::new().with_max_attempts(2));

        let err = delivery.deliver(&payload(), &endpoint()).await.unwrap_err();

        assert_eq!(*client.calls.lock().unwrap(), 2);
        assert_eq!(err.attempts(), 2);
    }

    #[tokio::test]
    async fn invalid_url_is_not_retried() {
        let client =
            MockClient::with_outcomes(vec![Err(HttpError::InvalidUrl("no host".to_string()))]);
        let delivery = HttpDelivery::new(&client).with_sleeper(InstantSleeper);

        let err = delivery.deliver(&payload(), &endpoint()).await.unwrap_err();

        assert_eq!(client.call_count(), 1);
        assert!(matches!(
            err,
            DeliveryError::Rejected {
                attempt: 1,
                source: AttemptError::Http(HttpError::InvalidUrl(_)),
                ..
            }
        ));
    }
}

mod status_handling {
    use super::*;

    #[tokio::test]
    async fn lenient_mode_counts_error_status_as_delivered() {
        let client = MockClient::with_outcomes(vec![status(500)]);
        let delivery = HttpDelivery::new(&client).with_sleeper(InstantSleeper);

        delivery.deliver(&payload(), &endpoint()).await.unwrap();

        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn strict_mode_retries_server_errors() {
        let client = MockClient::with_outcomes(vec![status(500), status(503), status(204)]);
        let delivery = HttpDelivery::new(&client)
            .with_sleeper(InstantSleeper)
            .with_strict_status(true);

        delivery.deliver(&payload(), &endpoint()).await.unwrap();

        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn strict_mode_retries_too_many_requests() {
        let client = MockClient::with_outcomes(vec![status(429), status(200)]);
        let delivery = HttpDelivery::new(&client)
            .with_sleeper(InstantSleeper)
            .with_strict_status(true);

        delivery.deliver(&payload(), &endpoint()).await.unwrap();

        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn strict_mode_rejects_client_errors() {
        let client = MockClient::with_outcomes(vec![Ok(HttpResponse::new(
            http::StatusCode::BAD_REQUEST,
            b"bad signature".to_vec(),
        ))]);
        let delivery = HttpDelivery::new(&client)
            .with_sleeper(InstantSleeper)
            .with_strict_status(true);

        let err = delivery.deliver(&payload(), &endpoint()).await.unwrap_err();

        assert_eq!(client.call_count(), 1);
        match err {
            DeliveryError::Rejected {
                attempt: 1,
                source: AttemptError::NonSuccessStatus { status, body },
                ..
            } => {
                assert_eq!(status, http::StatusCode::BAD_REQUEST);
                assert_eq!(body.as_deref(), Some("bad signature"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_success_status_display_includes_body() {
        let err = AttemptError::NonSuccessStatus {
            status: http::StatusCode::BAD_GATEWAY,
            body: Some("upstream down".to_string()),
        };

        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway: upstream down");
    }
}

mod timeouts {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stalled_request_times_out_and_counts_as_failure() {
        let delivery = HttpDelivery::new(StallingClient)
            .with_sleeper(InstantSleeper)
            .with_retry_policy(RetryPolicy::new().with_max_attempts(2));
        let started = tokio::time::Instant::now();

        let err = delivery.deliver(&payload(), &endpoint()).await.unwrap_err();

        assert!(matches!(
            err,
            DeliveryError::MaxRetriesExceeded {
                attempts: 2,
                last_error: AttemptError::Http(HttpError::Timeout),
                ..
            }
        ));
        assert!(started.elapsed() >= Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_request_timeout_is_applied() {
        let delivery = HttpDelivery::new(StallingClient)
            .with_sleeper(InstantSleeper)
            .with_request_timeout(Duration::from_secs(3))
            .with_retry_policy(RetryPolicy::new().with_max_attempts(1));
        let started = tokio::time::Instant::now();

        let _ = delivery.deliver(&payload(), &endpoint()).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(10));
    }
}

mod retryable {
    use super::*;

    #[test]
    fn transport_errors() {
        assert!(connection_refused().is_retryable());
        assert!(HttpError::Timeout.is_retryable());
        assert!(!HttpError::InvalidUrl("x".to_string()).is_retryable());
    }

    #[test]
    fn status_errors() {
        let retryable = |code: u16| {
            AttemptError::NonSuccessStatus {
                status: http::StatusCode::from_u16(code).unwrap(),
                body: None,
            }
            .is_retryable()
        };

        assert!(retryable(500));
        assert!(retryable(503));
        assert!(retryable(408));
        assert!(retryable(429));
        assert!(!retryable(400));
        assert!(!retryable(401));
        assert!(!retryable(404));
    }
}

#[test]
fn defaults_match_documented_values() {
    let delivery = HttpDelivery::new(MockClient::default());

    assert_eq!(delivery.request_timeout(), Duration::from_secs(10));
    assert_eq!(delivery.retry_policy(), &RetryPolicy::default());
    assert!(!delivery.strict_status());
}
