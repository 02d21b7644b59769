use crate::config::Settings;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Test fixture for driving the full router against a mocked identity provider.
///
/// The provider mock serves `/tokeninfo`; settings point the verifier at it
/// with client id `test-client-id`, required scope `email` (aliased to the
/// Google userinfo.email URI) and redirect patterns `https://claude.ai/*` and
/// `http://localhost:*`.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     fixture
///         .add_tokeninfo_mock("token", json!({"aud": "test-client-id"}), StatusCode::OK, 1)
///         .await;
///
///     let response = fixture.get_with_token("/whoami", "token").await;
///     response.assert_status(StatusCode::FORBIDDEN);
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration settings
    pub settings: Settings,
    /// Mock server for the token introspection endpoint
    pub provider_mock: MockServer,
}

impl TestFixture {
    /// Creates a new test fixture with a mock identity provider
    pub async fn new() -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let provider_mock = MockServer::start().await;
        let settings = Settings::for_test_with_mocks(&provider_mock);

        let state = AppState::new(settings.clone()).expect("Failed to create test state");
        let app = create_app(state).await;

        Self {
            app,
            settings,
            provider_mock,
        }
    }

    /// Initializes the test logger with the given level.
    ///
    /// Called by `TestFixture::new()`; only the first call takes effect.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Creates a request builder without credentials
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder().method(method).uri(uri.as_ref())
    }

    /// Sends an unauthenticated GET request
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a GET request carrying `Authorization: Bearer <token>`
    pub async fn get_with_token(&self, uri: impl AsRef<str>, token: &str) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and collects status, headers and JSON body
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }

    /// Mounts a tokeninfo response for one access token
    pub async fn add_tokeninfo_mock(
        &self,
        token: &str,
        response_body: impl Serialize,
        status_code: StatusCode,
        expected_calls: u64,
    ) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/tokeninfo"))
            .and(matchers::query_param("access_token", token))
            .respond_with(ResponseTemplate::new(status_code.as_u16()).set_body_json(response_body))
            .expect(expected_calls)
            .mount(&self.provider_mock)
            .await;
    }
}

/// Response from a test request
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Header value as a string, if present and ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Converts the response body to the specified type.
    ///
    /// # Panics
    ///
    /// Panics if deserialization fails.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
