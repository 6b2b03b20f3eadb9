//! error types shared by every component of the client

use thiserror::Error;

/// everything that can go wrong while discovering routes, managing
/// credentials or normalizing responses
#[derive(Error, Debug)]
pub enum Error {
  /// the host root page was unreachable (`status` is `None`) or not a 200
  #[error("route discovery failed: {}", host_page_outcome(.status))]
  DiscoveryFailure {
    status: Option<u16>,
    #[source]
    source: Option<Box<Error>>,
  },

  /// a bundle export was parsed but is not an object literal
  #[error("bundle {bundle} export changed shape: expected an object, found {found}")]
  BundleFormatChanged { bundle: String, found: String },

  /// a JS object literal could not be turned into JSON
  #[error("could not parse JS literal at byte {offset}: {reason}")]
  LiteralParse { offset: usize, reason: String },

  /// the credential exchange or guest activation was rejected
  #[error("authentication failed with status {status}: {body}")]
  AuthFailure { status: u16, body: String },

  /// 429/503/rate-limit responses outlasted the retry budget
  #[error("{operation}: gave up after {attempts} attempts (last status {last_status})")]
  RetryExhausted {
    operation: String,
    attempts: u32,
    last_status: u16,
  },

  #[error("cursor entry {entry_id} has neither `content` nor `operation`")]
  MalformedCursor { entry_id: String },

  #[error("tweet entry {entry_id} matches no known shape")]
  UnknownEntryShape { entry_id: String },

  #[error("tweet {tweet_id} carries unknown media type `{kind}`")]
  UnknownMediaType { tweet_id: u64, kind: String },

  /// the route registry has no entry for the operation
  #[error("route `{operation}` was not found in the discovered routes")]
  RouteNotFound { operation: String },

  /// a field the normalizer relies on is missing or has the wrong type
  #[error("malformed payload in {context}: {reason}")]
  MalformedPayload { context: String, reason: String },

  /// non-success status that is not covered by the retry contract
  #[error("{operation} returned status {status}, expected 200")]
  UnexpectedStatus { operation: String, status: u16 },

  #[error("invalid header value: {0}")]
  InvalidHeader(String),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  pub(crate) fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::MalformedPayload {
      context: context.into(),
      reason: reason.into(),
    }
  }

  /// whether the bounded retry loop may try the request again; for these
  /// `get_with_retry` renews the guest token and resends
  #[must_use]
  pub const fn is_retryable(&self) -> bool {
    match self {
      Self::UnexpectedStatus { status, .. } => *status == 429 || *status == 503,
      _ => false,
    }
  }

  /// true for errors caused by the host changing the shape of its payloads
  #[must_use]
  pub const fn is_schema_drift(&self) -> bool {
    matches!(
      self,
      Self::BundleFormatChanged { .. }
        | Self::LiteralParse { .. }
        | Self::MalformedCursor { .. }
        | Self::UnknownEntryShape { .. }
        | Self::UnknownMediaType { .. }
        | Self::MalformedPayload { .. }
    )
  }
}

fn host_page_outcome(status: &Option<u16>) -> String {
  match status {
    Some(status) => format!("host page returned {status}"),
    None => "host page unreachable".to_string(),
  }
}

/// result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
