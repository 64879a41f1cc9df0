//! HTTP `ReverseGeocoder` backed by Nominatim's `/reverse` endpoint.
//!
//! The [`ReverseGeocoder`] trait is synchronous so the core engines stay
//! runtime-agnostic. This geocoder bridges the async HTTP call to the sync
//! interface by blocking on a Tokio runtime internally.

use std::time::Duration;

use log::debug;
use reqwest::Client;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;
use waystation_core::{Address, GeoPoint, GeocodeError, ReverseGeocoder};

use super::nominatim::ReverseResponse;

/// Error type for [`HttpReverseGeocoder`] construction failures.
#[derive(Debug)]
pub enum GeocoderBuildError {
    /// The configured base URL could not be turned into an endpoint.
    BaseUrl(url::ParseError),
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// Failed to build the Tokio runtime.
    Runtime(std::io::Error),
}

impl std::fmt::Display for GeocoderBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaseUrl(err) => write!(f, "invalid geocoder base URL: {err}"),
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::Runtime(err) => write!(f, "failed to build Tokio runtime: {err}"),
        }
    }
}

impl std::error::Error for GeocoderBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BaseUrl(err) => Some(err),
            Self::HttpClient(err) => Some(err),
            Self::Runtime(err) => Some(err),
        }
    }
}

/// Public Nominatim instance.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Default user agent; Nominatim's usage policy rejects anonymous clients.
pub const DEFAULT_USER_AGENT: &str = "waystation-geocoder/0.1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpReverseGeocoder`].
#[derive(Debug, Clone)]
pub struct HttpReverseGeocoderConfig {
    /// Base URL of the Nominatim service, without the `/reverse` path.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Honour `HTTP_PROXY`-style environment variables.
    pub use_system_proxy: bool,
}

impl Default for HttpReverseGeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            use_system_proxy: true,
        }
    }
}

impl HttpReverseGeocoderConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Connect directly, ignoring proxy environment variables.
    #[must_use]
    pub fn without_system_proxy(mut self) -> Self {
        self.use_system_proxy = false;
        self
    }
}

/// Reverse geocoder calling a Nominatim service over HTTP.
///
/// Outside any Tokio runtime, and inside a `current_thread` runtime, the
/// request runs on a runtime owned by the geocoder. Inside a multi-threaded
/// runtime it runs on the caller's runtime via
/// [`tokio::task::block_in_place`]. Calling from a `current_thread` runtime
/// blocks that runtime until the request completes.
pub struct HttpReverseGeocoder {
    client: Client,
    config: HttpReverseGeocoderConfig,
    endpoint: Url,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpReverseGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReverseGeocoder")
            .field("config", &self.config)
            .field("endpoint", &self.endpoint.as_str())
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl HttpReverseGeocoder {
    /// Create a geocoder for `base_url` with default timeout and user agent.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, GeocoderBuildError> {
        Self::with_config(HttpReverseGeocoderConfig::new(base_url))
    }

    /// Create a geocoder with explicit configuration.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn with_config(config: HttpReverseGeocoderConfig) -> Result<Self, GeocoderBuildError> {
        let endpoint = Url::parse(&format!(
            "{}/reverse",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(GeocoderBuildError::BaseUrl)?;
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(GeocoderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(GeocoderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            endpoint,
            runtime,
        })
    }

    /// The configuration the geocoder was built with.
    #[must_use]
    pub const fn config(&self) -> &HttpReverseGeocoderConfig {
        &self.config
    }

    /// Build the lookup URL: `{base_url}/reverse?lat=..&lon=..&format=json&addressdetails=1`.
    fn reverse_url(&self, point: GeoPoint) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("lat", &point.latitude().to_string())
            .append_pair("lon", &point.longitude().to_string())
            .append_pair("format", "json")
            .append_pair("addressdetails", "1");
        url
    }

    async fn fetch_address(&self, point: GeoPoint) -> Result<Address, GeocodeError> {
        let url = self.reverse_url(point);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let body: ReverseResponse =
            response
                .json()
                .await
                .map_err(|err| GeocodeError::ParseError {
                    message: err.to_string(),
                })?;

        if let Some(reason) = &body.error {
            debug!(
                "nominatim found no address at {},{}: {reason}",
                point.latitude(),
                point.longitude()
            );
        }
        Ok(Address::from(body))
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> GeocodeError {
        if error.is_timeout() {
            return GeocodeError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return GeocodeError::HttpError {
                url: url.to_string(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        GeocodeError::NetworkError {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

impl ReverseGeocoder for HttpReverseGeocoder {
    fn reverse_geocode(&self, point: GeoPoint) -> Result<Address, GeocodeError> {
        // block_in_place is only available on multi-threaded runtimes.
        let future = self.fetch_address(point);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}
