//! HTTP `DistanceProvider` for Distance-Matrix style JSON services.
//!
//! This module provides [`HttpDistanceProvider`], an implementation of the
//! [`DistanceProvider`] trait that fetches one batch of origin rows per HTTP
//! request. Origins and destinations are sent as `|`-separated `lat,lng`
//! lists and the response is read as rows of elements carrying a distance
//! value.
//!
//! # Architecture
//!
//! The [`DistanceProvider`] trait is synchronous so the matrix builder can
//! run anywhere. This provider bridges the async HTTP calls to the sync
//! interface by blocking on a Tokio runtime internally.
//!
//! # Example
//!
//! ```no_run
//! use convoy_core::Coordinate;
//! use convoy_data::routing::{HttpDistanceProvider, HttpDistanceProviderConfig};
//!
//! let config = HttpDistanceProviderConfig::default().with_api_key("secret");
//! let builder = HttpDistanceProvider::with_config(config)?.into_matrix_builder();
//! let matrix = builder.build(&[
//!     Coordinate::new(35.0527, -89.8502),
//!     Coordinate::new(35.0497, -89.9776),
//! ])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::time::Duration;

use convoy_core::{
    Coordinate, DEFAULT_MAX_ELEMENTS_PER_CALL, DistanceMatrix, DistanceMatrixBuilder,
    DistanceMatrixError, DistanceProvider,
};
use log::debug;
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::google::{MatrixElement, MatrixResponse};

/// Error type for [`HttpDistanceProvider`] construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// The configured base URL does not parse.
    #[error("invalid distance service URL {url:?}: {source}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Default endpoint for distance-matrix requests.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Default user agent for distance requests.
pub const DEFAULT_USER_AGENT: &str = "convoy-routing/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpDistanceProvider`].
#[derive(Clone)]
pub struct HttpDistanceProviderConfig {
    /// Endpoint answering distance-matrix queries.
    pub base_url: String,
    /// API key appended as the `key` query parameter, if any.
    pub api_key: Option<String>,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Largest origins × destinations product the service accepts per call.
    pub max_elements_per_call: usize,
}

impl fmt::Debug for HttpDistanceProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDistanceProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("max_elements_per_call", &self.max_elements_per_call)
            .finish()
    }
}

impl Default for HttpDistanceProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            max_elements_per_call: DEFAULT_MAX_ELEMENTS_PER_CALL,
        }
    }
}

impl HttpDistanceProviderConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-call element limit.
    #[must_use]
    pub const fn with_max_elements_per_call(mut self, max_elements: usize) -> Self {
        self.max_elements_per_call = max_elements;
        self
    }
}

/// HTTP-based distance provider.
///
/// The provider implements the synchronous [`DistanceProvider`] trait by
/// internally blocking on asynchronous HTTP requests. It owns a Tokio
/// runtime that is reused across calls.
///
/// # Runtime behaviour
///
/// When called from outside any Tokio runtime, the provider uses its own
/// stored runtime. When called from within an existing multi-threaded Tokio
/// runtime (detected via [`Handle::try_current()`] and
/// [`RuntimeFlavor::MultiThread`]), it uses that runtime's handle with
/// [`tokio::task::block_in_place`] to avoid nested runtime panics. Inside a
/// `current_thread` runtime it falls back to its own runtime, which blocks
/// the caller's executor for the duration of the request.
///
/// The stored runtime is shut down in the background on drop, so the
/// provider may be dropped from async code.
pub struct HttpDistanceProvider {
    client: Client,
    config: HttpDistanceProviderConfig,
    base_url: Url,
    runtime: Option<Runtime>,
}

impl fmt::Debug for HttpDistanceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDistanceProvider")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl Drop for HttpDistanceProvider {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl HttpDistanceProvider {
    /// Create a provider for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpDistanceProviderConfig::new(base_url))
    }

    /// Create a new provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn with_config(config: HttpDistanceProviderConfig) -> Result<Self, ProviderBuildError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|source| ProviderBuildError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            base_url,
            runtime: Some(runtime),
        })
    }

    /// The configuration this provider was built with.
    #[must_use]
    pub const fn config(&self) -> &HttpDistanceProviderConfig {
        &self.config
    }

    /// Wrap the provider in a matrix builder honouring the configured limit.
    #[must_use]
    pub fn into_matrix_builder(self) -> DistanceMatrixBuilder<Self> {
        let max_elements = self.config.max_elements_per_call;
        DistanceMatrixBuilder::new(self).with_max_elements_per_call(max_elements)
    }

    /// Build the request URL without credentials.
    ///
    /// The format is `{base_url}?origins=lat,lng|...&destinations=lat,lng|...`
    /// with the pipes and commas percent-encoded.
    fn build_query_url(&self, origins: &[Coordinate], destinations: &[Coordinate]) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("origins", &join_coordinates(origins))
            .append_pair("destinations", &join_coordinates(destinations));
        url
    }

    /// Append the API key, when configured, to a query URL.
    fn with_credentials(&self, url: &Url) -> Url {
        let mut authed = url.clone();
        if let Some(key) = &self.config.api_key {
            authed.query_pairs_mut().append_pair("key", key);
        }
        authed
    }

    /// Fetch one batch of rows asynchronously.
    async fn fetch_rows_async(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        let url = self.build_query_url(origins, destinations);
        let shown = url.as_str();
        debug!(
            "requesting {}x{} distances from {}",
            origins.len(),
            destinations.len(),
            self.base_url
        );

        let response = self
            .client
            .get(self.with_credentials(&url))
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(err, shown))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(err, shown))?;

        let matrix_response: MatrixResponse =
            response
                .json()
                .await
                .map_err(|err| DistanceMatrixError::ParseError {
                    message: err.without_url().to_string(),
                })?;

        convert_response(matrix_response)
    }

    /// Convert a reqwest error to a `DistanceMatrixError`.
    ///
    /// The request URL is stripped from the error text because it carries
    /// the API key.
    fn convert_reqwest_error(&self, error: reqwest::Error, url: &str) -> DistanceMatrixError {
        if error.is_timeout() {
            return DistanceMatrixError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        let status = error.status();
        let message = error.without_url().to_string();
        if let Some(code) = status {
            return DistanceMatrixError::HttpError {
                url: url.to_owned(),
                status: code.as_u16(),
                message,
            };
        }

        DistanceMatrixError::NetworkError {
            url: url.to_owned(),
            message,
        }
    }
}

fn join_coordinates(coordinates: &[Coordinate]) -> String {
    coordinates
        .iter()
        .map(Coordinate::to_query_value)
        .collect::<Vec<_>>()
        .join("|")
}

/// Convert a service response into matrix rows.
fn convert_response(response: MatrixResponse) -> Result<DistanceMatrix, DistanceMatrixError> {
    if !response.is_ok() {
        return Err(DistanceMatrixError::ServiceError {
            code: response.status,
            message: response.error_message.unwrap_or_default(),
        });
    }

    response
        .rows
        .into_iter()
        .enumerate()
        .map(|(row_idx, row)| {
            row.elements
                .into_iter()
                .enumerate()
                .map(|(col_idx, element)| element_distance(row_idx, col_idx, element))
                .collect()
        })
        .collect()
}

fn element_distance(
    row: usize,
    col: usize,
    element: MatrixElement,
) -> Result<u64, DistanceMatrixError> {
    element
        .distance
        .map(|distance| distance.value)
        .ok_or_else(|| DistanceMatrixError::MalformedResponse {
            message: format!(
                "element ({row}, {col}) has no distance (status {})",
                element.status.as_deref().unwrap_or("missing")
            ),
        })
}

impl DistanceProvider for HttpDistanceProvider {
    /// Fetch one batch of rows.
    ///
    /// # Runtime requirements
    ///
    /// When called from within an existing Tokio runtime, the runtime should
    /// be multi-threaded (`flavor = "multi_thread"`); otherwise the caller's
    /// executor is blocked while the request runs on the provider's own
    /// runtime.
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        if origins.is_empty() || destinations.is_empty() {
            return Err(DistanceMatrixError::EmptyInput);
        }

        let future = self.fetch_rows_async(origins, destinations);
        match (Handle::try_current(), &self.runtime) {
            (Ok(handle), _) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            (_, Some(runtime)) => runtime.block_on(future),
            (_, None) => Err(DistanceMatrixError::NetworkError {
                url: self.base_url.to_string(),
                message: "provider runtime has shut down".to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn stops() -> Vec<Coordinate> {
        vec![Coordinate::new(35.0527, -89.8502), Coordinate::new(35.143, -90.0515)]
    }

    fn response(json: &str) -> MatrixResponse {
        serde_json::from_str(json).expect("fixture should deserialise")
    }

    #[rstest]
    fn query_url_lists_origins_and_destinations(stops: Vec<Coordinate>) {
        let provider =
            HttpDistanceProvider::new("http://matrix.example.com/json")
                .expect("provider should build");

        let url = provider.build_query_url(&stops[..1], &stops);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(
            pairs,
            vec![
                ("origins".to_owned(), "35.0527,-89.8502".to_owned()),
                (
                    "destinations".to_owned(),
                    "35.0527,-89.8502|35.143,-90.0515".to_owned()
                ),
            ]
        );
    }

    #[rstest]
    fn credentials_are_added_only_to_the_request(stops: Vec<Coordinate>) {
        let config = HttpDistanceProviderConfig::new("http://matrix.example.com/json")
            .with_api_key("s3cret");
        let provider = HttpDistanceProvider::with_config(config).expect("provider should build");

        let url = provider.build_query_url(&stops, &stops);
        let authed = provider.with_credentials(&url);

        assert!(!url.as_str().contains("s3cret"));
        assert!(authed.as_str().ends_with("&key=s3cret"));
        assert!(!format!("{:?}", provider.config()).contains("s3cret"));
    }

    #[rstest]
    fn invalid_base_url_is_rejected() {
        let err = HttpDistanceProvider::new("not a url").expect_err("should fail");
        assert!(matches!(err, ProviderBuildError::InvalidBaseUrl { .. }));
    }

    #[rstest]
    fn convert_response_handles_success() {
        let matrix = convert_response(response(
            r#"{"status": "OK", "rows": [
                {"elements": [{"status": "OK", "distance": {"value": 0}},
                              {"status": "OK", "distance": {"value": 14021}}]}
            ]}"#,
        ))
        .expect("should convert");

        assert_eq!(matrix, vec![vec![0, 14021]]);
    }

    #[rstest]
    fn convert_response_handles_service_error() {
        let err = convert_response(response(
            r#"{"status": "OVER_QUERY_LIMIT", "error_message": "quota", "rows": []}"#,
        ))
        .expect_err("should fail");

        match err {
            DistanceMatrixError::ServiceError { code, message } => {
                assert_eq!(code, "OVER_QUERY_LIMIT");
                assert_eq!(message, "quota");
            }
            other => panic!("expected ServiceError, got {other:?}"),
        }
    }

    #[rstest]
    fn convert_response_rejects_missing_distance() {
        let err = convert_response(response(
            r#"{"status": "OK", "rows": [
                {"elements": [{"status": "OK", "distance": {"value": 0}},
                              {"status": "ZERO_RESULTS"}]}
            ]}"#,
        ))
        .expect_err("should fail");

        assert!(err.is_malformed());
        assert!(err.to_string().contains("(0, 1)"));
    }

    #[rstest]
    fn empty_batch_returns_error(stops: Vec<Coordinate>) {
        let provider =
            HttpDistanceProvider::new("http://localhost:9").expect("provider should build");

        let err = provider.distance_rows(&[], &stops).expect_err("should fail");

        assert_eq!(err, DistanceMatrixError::EmptyInput);
    }

    #[rstest]
    fn matrix_builder_uses_configured_limit() {
        let config = HttpDistanceProviderConfig::new("http://localhost:9")
            .with_max_elements_per_call(25)
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent/1.0");
        let builder = HttpDistanceProvider::with_config(config)
            .expect("provider should build")
            .into_matrix_builder();

        assert_eq!(builder.max_elements_per_call(), 25);
        assert_eq!(builder.provider().config().user_agent, "test-agent/1.0");
    }
}
