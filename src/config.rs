//! client configuration
//!
//! every endpoint the client talks to lives here so tests (and mirrors of
//! the host) can point the client somewhere else.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// how long a guest session stays valid on the host
pub const TOKEN_VALIDITY: Duration = Duration::from_secs(3 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
  /// page that embeds the webpack manifest
  #[serde(default = "default_host_url")]
  pub host_url: String,

  /// root the script bundles are served from (must end with `/`)
  #[serde(default = "default_cdn_root")]
  pub cdn_root: String,

  /// base of discovered graphql endpoints
  #[serde(default = "default_graphql_base")]
  pub graphql_base: String,

  /// base that guest-token requests are rebased onto
  #[serde(default = "default_private_api_base")]
  pub private_api_base: String,

  #[serde(default = "default_rest_api_base")]
  pub rest_api_base: String,

  #[serde(default = "default_guest_activate_url")]
  pub guest_activate_url: String,

  #[serde(default = "default_oauth2_token_url")]
  pub oauth2_token_url: String,

  #[serde(default = "default_user_agent")]
  pub user_agent: String,

  #[serde(default = "default_referer")]
  pub referer: String,

  /// bundle names must end with one of these to be fetched
  #[serde(default = "default_bundle_suffixes")]
  pub bundle_suffixes: Vec<String>,

  /// one-letter build tag appended to the bundle content hash
  #[serde(default = "default_build_tag")]
  pub build_tag: String,

  #[serde(default = "default_token_validity", with = "duration_secs")]
  pub token_validity: Duration,

  /// attempts per page fetch before giving up
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,

  #[serde(default = "default_page_size")]
  pub page_size: u32,

  /// where the guest token record is kept, `None` disables persistence
  #[serde(default = "default_token_cache_path")]
  pub token_cache_path: Option<PathBuf>,
}

fn default_host_url() -> String {
  "https://twitter.com/".into()
}

fn default_cdn_root() -> String {
  "https://abs.twimg.com/".into()
}

fn default_graphql_base() -> String {
  "https://api.twitter.com/graphql".into()
}

fn default_private_api_base() -> String {
  "https://twitter.com/i/api/".into()
}

fn default_rest_api_base() -> String {
  "https://api.twitter.com/1.1/".into()
}

fn default_guest_activate_url() -> String {
  "https://api.twitter.com/1.1/guest/activate.json".into()
}

fn default_oauth2_token_url() -> String {
  "https://api.twitter.com/oauth2/token".into()
}

fn default_user_agent() -> String {
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
   Chrome/109.0.0.0 Safari/537.36"
    .into()
}

fn default_referer() -> String {
  "https://twitter.com/".into()
}

fn default_bundle_suffixes() -> Vec<String> {
  vec!["AudioSpaces".into(), "UsersGraphQL".into(), "api".into()]
}

fn default_build_tag() -> String {
  "a".into()
}

fn default_token_validity() -> Duration {
  TOKEN_VALIDITY
}

fn default_max_attempts() -> u32 {
  5
}

fn default_page_size() -> u32 {
  20
}

fn default_token_cache_path() -> Option<PathBuf> {
  dirs::config_dir().map(|dir| dir.join("private-twitter-client").join("token.json"))
}

mod duration_secs {
  use serde::{Deserialize, Deserializer, Serialize, Serializer};
  use std::time::Duration;

  pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    duration.as_secs().serialize(serializer)
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
  where
    D: Deserializer<'de>,
  {
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
  }
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      host_url: default_host_url(),
      cdn_root: default_cdn_root(),
      graphql_base: default_graphql_base(),
      private_api_base: default_private_api_base(),
      rest_api_base: default_rest_api_base(),
      guest_activate_url: default_guest_activate_url(),
      oauth2_token_url: default_oauth2_token_url(),
      user_agent: default_user_agent(),
      referer: default_referer(),
      bundle_suffixes: default_bundle_suffixes(),
      build_tag: default_build_tag(),
      token_validity: default_token_validity(),
      max_attempts: default_max_attempts(),
      page_size: default_page_size(),
      token_cache_path: default_token_cache_path(),
    }
  }
}

impl ClientConfig {
  /// read overrides from a JSON file, missing keys fall back to defaults
  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
  }

  /// same config without a token cache on disk
  #[must_use]
  pub fn without_token_cache(mut self) -> Self {
    self.token_cache_path = None;
    self
  }

  /// rewrite a public api url so it goes through the private api base
  pub(crate) fn rebase_private(&self, url: &str) -> String {
    url.replacen("https://api.twitter.com/", &self.private_api_base, 1)
  }
}
