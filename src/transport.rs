//! the http seam every network call goes through
//!
//! the core never talks to reqwest directly: it builds an [`HttpRequest`],
//! hands it to a [`Transport`] and reads back an [`HttpResponse`]. the
//! transport does not retry, callers decide that from the status/headers.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Post,
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Get => f.write_str("GET"),
      Self::Post => f.write_str("POST"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
  pub method: Method,
  pub url: String,
  pub headers: Vec<(String, String)>,
  /// query string parameters
  pub params: Vec<(String, String)>,
  pub body: Option<String>,
}

impl HttpRequest {
  pub fn new(method: Method, url: impl Into<String>) -> Self {
    Self {
      method,
      url: url.into(),
      headers: Vec::new(),
      params: Vec::new(),
      body: None,
    }
  }

  pub fn get(url: impl Into<String>) -> Self {
    Self::new(Method::Get, url)
  }

  pub fn post(url: impl Into<String>) -> Self {
    Self::new(Method::Post, url)
  }

  #[must_use]
  pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  #[must_use]
  pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.params.push((name.into(), value.into()));
    self
  }

  #[must_use]
  pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
  where
    K: Into<String>,
    V: Into<String>,
  {
    self
      .params
      .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
    self
  }

  #[must_use]
  pub fn body(mut self, body: impl Into<String>) -> Self {
    self.body = Some(body.into());
    self
  }

  /// first header with this name, compared case-insensitively
  pub fn header_value(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(k, _)| k.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
  pub status: u16,
  /// header names are stored lower-cased
  pub headers: HashMap<String, String>,
  pub body: String,
}

impl HttpResponse {
  pub fn new(status: u16, body: impl Into<String>) -> Self {
    Self {
      status,
      headers: HashMap::new(),
      body: body.into(),
    }
  }

  #[must_use]
  pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
    self.headers.insert(name.to_ascii_lowercase(), value.into());
    self
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .get(&name.to_ascii_lowercase())
      .map(String::as_str)
  }

  pub fn is_success(&self) -> bool {
    self.status == 200
  }

  pub fn json(&self) -> Result<Value> {
    Ok(serde_json::from_str(&self.body)?)
  }

  pub fn rate_limit(&self) -> RateLimitInfo {
    RateLimitInfo::from_response(self)
  }
}

/// rate limit headers sent back by the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
  pub limit: Option<u32>,
  pub remaining: Option<u32>,
  /// unix timestamp when the window resets
  pub reset: Option<u64>,
}

impl RateLimitInfo {
  pub fn from_response(response: &HttpResponse) -> Self {
    Self {
      limit: response
        .header("x-rate-limit-limit")
        .and_then(|v| v.trim().parse().ok()),
      remaining: response
        .header("x-rate-limit-remaining")
        .and_then(|v| v.trim().parse().ok()),
      reset: response
        .header("x-rate-limit-reset")
        .and_then(|v| v.trim().parse().ok()),
    }
  }

  /// only an explicit `remaining: 0` counts, a missing header does not
  #[must_use]
  pub fn is_exhausted(&self) -> bool {
    self.remaining == Some(0)
  }
}

/// something that can perform a single http exchange
#[async_trait]
pub trait Transport: Send + Sync {
  async fn request(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// default transport backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .gzip(true)
      .deflate(true)
      .brotli(true)
      .build()?;
    Ok(Self { client })
  }

  /// wrap an already configured client (timeouts, proxies...)
  pub fn with_client(client: reqwest::Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
    let mut headers = reqwest::header::HeaderMap::new();
    for (name, value) in &request.headers {
      let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::InvalidHeader(e.to_string()))?;
      let value = reqwest::header::HeaderValue::from_str(value)
        .map_err(|e| Error::InvalidHeader(e.to_string()))?;
      headers.append(name, value);
    }

    let builder = match request.method {
      Method::Get => self.client.get(&request.url),
      Method::Post => self.client.post(&request.url),
    };
    let mut builder = builder.headers(headers);
    if !request.params.is_empty() {
      builder = builder.query(&request.params);
    }
    if let Some(body) = request.body {
      builder = builder.body(body);
    }

    let response = builder.send().await?;
    let status = response.status().as_u16();
    let headers = response
      .headers()
      .iter()
      .filter_map(|(name, value)| {
        value
          .to_str()
          .ok()
          .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
      })
      .collect();
    let body = response.text().await?;

    Ok(HttpResponse {
      status,
      headers,
      body,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rate_limit_requires_explicit_zero() {
    let missing = HttpResponse::new(200, "{}");
    assert!(!missing.rate_limit().is_exhausted());

    let zero = HttpResponse::new(200, "{}").with_header("X-Rate-Limit-Remaining", "0");
    assert!(zero.rate_limit().is_exhausted());

    let some = HttpResponse::new(200, "{}")
      .with_header("x-rate-limit-remaining", "12")
      .with_header("x-rate-limit-reset", "1700000000");
    let info = some.rate_limit();
    assert_eq!(info.remaining, Some(12));
    assert_eq!(info.reset, Some(1_700_000_000));
    assert!(!info.is_exhausted());
  }

  #[test]
  fn request_headers_are_case_insensitive() {
    let req = HttpRequest::get("https://example.test").header("Authorization", "Bearer x");
    assert_eq!(req.header_value("authorization"), Some("Bearer x"));
    assert_eq!(req.header_value("cookie"), None);
  }
}
