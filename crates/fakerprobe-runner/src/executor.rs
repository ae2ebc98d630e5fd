//! Blocking HTTP executor: turns a `RequestSpec` into a live GET

use std::collections::HashMap;
use std::time::{Duration, Instant};

use fakerprobe_core::{Config, RequestSpec};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::{SetupError, TransportError};

/// Envelope status of a successful response.
pub const STATUS_OK: &str = "OK";

/// Response as received: status, raw body, and the body parsed as JSON
/// when it parses.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: String,
    pub status_code: u16,
    pub body: String,
    /// Seconds from send to fully read body
    pub elapsed: f64,
    json: Option<Value>,
}

impl Response {
    #[must_use]
    pub fn new(url: impl Into<String>, status_code: u16, body: impl Into<String>, elapsed: f64) -> Self {
        let body = body.into();
        let json = serde_json::from_str(&body).ok();
        Self {
            url: url.into(),
            status_code,
            body,
            elapsed,
            json,
        }
    }

    /// Parsed body; `None` when the body is not JSON.
    #[must_use]
    pub const fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Top-level envelope field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.json.as_ref().and_then(|j| j.get(key))
    }

    /// The `data` array.
    #[must_use]
    pub fn records(&self) -> Option<&[Value]> {
        self.field("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    #[must_use]
    pub fn first_record(&self) -> Option<&Value> {
        self.records().and_then(<[Value]>::first)
    }
}

/// Sends request specs against one base URL. No retries.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: reqwest::blocking::Client,
    base_url: String,
    headers: HeaderMap,
}

impl RequestExecutor {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SetupError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SetupError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers: HeaderMap::new(),
        })
    }

    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built or a configured
    /// header is not valid HTTP.
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))?
            .with_headers(&config.headers)
    }

    /// Headers sent with every request.
    ///
    /// # Errors
    ///
    /// Returns error naming the first header whose name or value cannot
    /// be sent.
    pub fn with_headers(mut self, headers: &HashMap<String, String>) -> Result<Self, SetupError> {
        let mut names: Vec<&String> = headers.keys().collect();
        names.sort();
        for name in names {
            let key = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SetupError::InvalidHeader(name.clone(), e.to_string()))?;
            let value = HeaderValue::from_str(&headers[name])
                .map_err(|e| SetupError::InvalidHeader(name.clone(), e.to_string()))?;
            self.headers.insert(key, value);
        }
        Ok(self)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL without query string.
    #[must_use]
    pub fn url(&self, spec: &RequestSpec) -> String {
        format!("{}{}", self.base_url, spec.endpoint())
    }

    /// Send `spec` as a GET with its parameters as the query string.
    ///
    /// # Errors
    ///
    /// Returns error if no response could be read within the timeout.
    pub fn send(&self, spec: &RequestSpec) -> Result<Response, TransportError> {
        let url = self.url(spec);
        let label = spec.label();

        let mut req = self.client.get(&url).headers(self.headers.clone());
        let query = spec.query_pairs();
        if !query.is_empty() {
            req = req.query(&query);
        }

        tracing::debug!(request = %label, "sending");
        let transport = |e: reqwest::Error| TransportError {
            request: label.clone(),
            timed_out: e.is_timeout(),
            message: e.to_string(),
        };

        let start = Instant::now();
        let resp = req.send().map_err(transport)?;
        let final_url = resp.url().to_string();
        let status_code = resp.status().as_u16();
        let body = resp.text().map_err(transport)?;
        let elapsed = start.elapsed().as_secs_f64();

        tracing::debug!(
            request = %label,
            status = status_code,
            bytes = body.len(),
            elapsed_ms = (elapsed * 1000.0) as u64,
            "received"
        );

        Ok(Response::new(final_url, status_code, body, elapsed))
    }
}
