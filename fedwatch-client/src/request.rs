//! Generic JSON request wrapper for the backend API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use fedwatch_types::{Error, Result};

use crate::error::classify;

/// Base address used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Per-request options: method, extra headers, and an optional JSON body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    method: Method,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
}

impl RequestOptions {
    /// A `GET` with no extra headers.
    pub fn get() -> Self {
        Self::default()
    }

    /// A `POST` carrying `body` as JSON.
    pub fn post<B: Serialize>(body: &B) -> Result<Self> {
        let body = serde_json::to_value(body).map_err(|e| Error::Decode(e.to_string()))?;
        Ok(Self {
            method: Method::POST,
            headers: HeaderMap::new(),
            body: Some(body),
        })
    }

    /// Set the method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a header. Caller headers replace the defaults on collision.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set a raw JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// Sends JSON requests to `base_url + endpoint`.
///
/// Non-2xx responses become [`Error::Http`]; requests that never got a
/// response become [`Error::Network`]. There is no retry and no caching.
///
/// # Example
///
/// ```rust,no_run
/// use fedwatch_client::{RequestClient, RequestOptions};
///
/// # async fn run() -> fedwatch_types::Result<()> {
/// let client = RequestClient::builder()
///     .base_url("http://localhost:5000")
///     .build()?;
///
/// let body: serde_json::Value = client
///     .request("/api/dashboard/metrics", RequestOptions::get())
///     .await?;
/// println!("{}", body);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestClient {
    client: Client,
    base_url: String,
}

impl RequestClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> RequestClientBuilder {
        RequestClientBuilder::default()
    }

    /// Client for `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    /// The configured base address.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full address for `endpoint`.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Send a request and decode the JSON response body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let response = self.send(endpoint, options).await?;
        response.json::<T>().await.map_err(|err| {
            let err = classify(err);
            warn!(endpoint, error = %err, "API request failed");
            err
        })
    }

    /// Send a request and return the response once its status is a success.
    ///
    /// The body is left unread.
    pub async fn send(&self, endpoint: &str, options: RequestOptions) -> Result<Response> {
        let url = self.url(endpoint);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in options.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        let mut builder = self
            .client
            .request(options.method.clone(), &url)
            .headers(headers);
        if let Some(body) = &options.body {
            let bytes = serde_json::to_vec(body).map_err(|e| Error::Decode(e.to_string()))?;
            builder = builder.body(bytes);
        }

        debug!(method = %options.method, %url, "sending API request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                let err = classify(err);
                warn!(endpoint, error = %err, "API request failed");
                return Err(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let err = Error::Http {
                status: status.as_u16(),
            };
            warn!(endpoint, error = %err, "API request failed");
            return Err(err);
        }

        debug!(method = %options.method, %url, %status, "received API response");
        Ok(response)
    }
}

/// Builder for [`RequestClient`].
#[derive(Debug, Default)]
pub struct RequestClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl RequestClientBuilder {
    /// Set the base address (default: `http://localhost:5000`).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Bound every request to `timeout`. Unset means no timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<RequestClient> {
        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(RequestClient { client, base_url })
    }
}
