use std::fmt;
use std::sync::Arc;

use base64::Engine;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::token_cache::{TokenCache, TokenRecord};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// public bearer shipped with the web client, good enough for guest access
pub const DEFAULT_BEARER: &str = "AAAAAAAAAAAAAAAAAAAAAPYXBAAAAAAACLXUNDekMxqa8h%2F40K4moUkGsoc%3DTYfbDKbT3jJPCEVnMYqilB28NHfOPqkca3qaAxGfsyKCs0wRbw";

/// how the client proves who it is
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
  /// long lived bearer secret, used as is
  Bearer(String),
  /// consumer pair exchanged for a bearer on first use
  Consumer { key: String, secret: String },
}

impl fmt::Debug for AuthMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Bearer(_) => f.write_str("Bearer(..)"),
      Self::Consumer { key, .. } => f
        .debug_struct("Consumer")
        .field("key", key)
        .field("secret", &"..")
        .finish(),
    }
  }
}

/// source of unix time, swapped out in tests
pub trait Clock: Send + Sync {
  fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> i64 {
    chrono::Utc::now().timestamp()
  }
}

/// per-request knobs for the headers the manager attaches
#[derive(Debug, Clone)]
pub struct RequestOptions {
  pub referer: Option<String>,
  /// attach `Authorization: Bearer ..`
  pub authenticated: bool,
  /// attach the guest token as header and cookie
  pub guest: bool,
}

impl Default for RequestOptions {
  fn default() -> Self {
    Self {
      referer: None,
      authenticated: true,
      guest: false,
    }
  }
}

impl RequestOptions {
  pub fn unauthenticated() -> Self {
    Self {
      authenticated: false,
      ..Self::default()
    }
  }

  pub fn guest() -> Self {
    Self {
      guest: true,
      ..Self::default()
    }
  }

  #[must_use]
  pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
    self.referer = Some(referer.into());
    self
  }
}

#[derive(Default)]
struct TokenState {
  access_token: Option<String>,
  guest: Option<TokenRecord>,
  cache_loaded: bool,
}

/// owns the bearer credential and the renewable guest token
pub struct CredentialManager {
  mode: AuthMode,
  config: ClientConfig,
  transport: Arc<dyn Transport>,
  cache: TokenCache,
  clock: Arc<dyn Clock>,
  state: Mutex<TokenState>,
}

impl fmt::Debug for CredentialManager {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CredentialManager")
      .field("mode", &self.mode)
      .field("cache", &self.cache)
      .finish_non_exhaustive()
  }
}

impl CredentialManager {
  pub fn new(mode: AuthMode, config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
    let cache = TokenCache::new(config.token_cache_path.clone());
    Self {
      mode,
      config,
      transport,
      cache,
      clock: Arc::new(SystemClock),
      state: Mutex::new(TokenState::default()),
    }
  }

  #[must_use]
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn mode(&self) -> &AuthMode {
    &self.mode
  }

  pub fn is_bearer(&self) -> bool {
    matches!(self.mode, AuthMode::Bearer(_))
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  pub fn transport(&self) -> &Arc<dyn Transport> {
    &self.transport
  }

  /// the bearer credential, exchanging the consumer pair the first time
  pub async fn access_token(&self) -> Result<String> {
    let (key, secret) = match &self.mode {
      AuthMode::Bearer(token) => return Ok(token.clone()),
      AuthMode::Consumer { key, secret } => (key, secret),
    };

    let mut state = self.state.lock().await;
    if let Some(token) = &state.access_token {
      return Ok(token.clone());
    }
    let token = self.exchange_consumer(key, secret).await?;
    state.access_token = Some(token.clone());
    Ok(token)
  }

  #[instrument(skip(self, key, secret))]
  async fn exchange_consumer(&self, key: &str, secret: &str) -> Result<String> {
    let basic = base64::engine::general_purpose::STANDARD.encode(format!("{key}:{secret}"));
    let request = HttpRequest::post(&self.config.oauth2_token_url)
      .param("grant_type", "client_credentials")
      .header("User-Agent", &self.config.user_agent)
      .header("Referer", &self.config.referer)
      .header("Authorization", format!("Basic {basic}"))
      .header("Content-Type", "application/x-www-form-urlencoded");

    let response = self.transport.request(request).await?;
    if !response.is_success() {
      return Err(Error::AuthFailure {
        status: response.status,
        body: response.body,
      });
    }
    let json = response.json()?;
    let token = json["access_token"]
      .as_str()
      .ok_or_else(|| Error::malformed("oauth2 token response", "missing `access_token`"))?;
    info!("exchanged consumer key for a bearer token");
    Ok(token.to_string())
  }

  /// a usable guest token, renewing it when forced or when the cached one
  /// has outlived the validity window
  #[instrument(skip(self))]
  pub async fn ensure_token(&self, force_renew: bool) -> Result<String> {
    let bearer = self.access_token().await?;
    let mut state = self.state.lock().await;
    if !state.cache_loaded {
      state.guest = self.cache.load().await;
      state.cache_loaded = true;
    }

    let now = self.clock.now();
    if let Some(record) = &state.guest {
      if !force_renew && record.is_fresh(now, self.config.token_validity) {
        return Ok(record.token.clone());
      }
      debug!(stored_at = record.stored_at, force_renew, "discarding guest token");
    }
    state.guest = None;

    let token = self.activate_guest(&bearer).await?;
    let record = TokenRecord::new(token.clone(), now);
    if let Err(e) = self.cache.store(&record).await {
      warn!(error = %e, "could not persist guest token");
    }
    state.guest = Some(record);
    Ok(token)
  }

  async fn activate_guest(&self, bearer: &str) -> Result<String> {
    let request = HttpRequest::post(&self.config.guest_activate_url)
      .header("User-Agent", &self.config.user_agent)
      .header("Referer", &self.config.referer)
      .header("Authorization", format!("Bearer {bearer}"))
      .body("");

    let response = self.transport.request(request).await?;
    if !response.is_success() {
      return Err(Error::AuthFailure {
        status: response.status,
        body: response.body,
      });
    }
    let json: Value = response.json()?;
    let token = json["guest_token"]
      .as_str()
      .ok_or_else(|| Error::malformed("guest activation response", "missing `guest_token`"))?;
    info!("activated a new guest token");
    Ok(token.to_string())
  }

  /// send a request with the browser-like headers, auth and guest token
  pub async fn request(&self, request: HttpRequest, options: &RequestOptions) -> Result<HttpResponse> {
    let referer = options
      .referer
      .clone()
      .unwrap_or_else(|| self.config.referer.clone());
    let mut request = request
      .header("User-Agent", &self.config.user_agent)
      .header("Referer", referer)
      .header("Accept-Language", "en-US,en;q=0.5");

    if options.authenticated {
      let bearer = self.access_token().await?;
      request = request.header("Authorization", format!("Bearer {bearer}"));
    }
    if options.guest {
      let guest = self.ensure_token(false).await?;
      request = request
        .header("x-guest-token", guest.clone())
        .header("x-twitter-active-user", "yes")
        .header("Cookie", format!("gt={guest}"));
    }

    debug!(method = %request.method, url = %request.url, "sending request");
    self.transport.request(request).await
  }

  /// GET that retries on 429/503 or an exhausted rate limit, renewing the
  /// guest token between attempts
  #[instrument(skip(self, params, options))]
  pub async fn get_with_retry(
    &self,
    operation: &str,
    url: &str,
    params: &[(String, String)],
    options: &RequestOptions,
  ) -> Result<HttpResponse> {
    let attempts = self.config.max_attempts.max(1);
    let mut last_status = 0;

    for attempt in 1..=attempts {
      let request = HttpRequest::get(url).params(params.iter().cloned());
      let response = self.request(request, options).await?;
      let exhausted = response.rate_limit().is_exhausted();
      let failure = (!response.is_success()).then(|| Error::UnexpectedStatus {
        operation: operation.to_string(),
        status: response.status,
      });
      match failure {
        Some(err) if !err.is_retryable() => return Err(err),
        None if !exhausted => return Ok(response),
        _ => {}
      }

      last_status = response.status;
      warn!(attempt, status = response.status, exhausted, "rate limited, renewing token");
      if attempt < attempts {
        self.ensure_token(true).await?;
      }
    }

    Err(Error::RetryExhausted {
      operation: operation.to_string(),
      attempts,
      last_status,
    })
  }
}
