//! one handle wiring the credential manager, route registry and composers

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::routes::{RouteMap, RouteRegistry};
use crate::session::{AuthMode, CredentialManager, DEFAULT_BEARER};
use crate::transport::{ReqwestTransport, Transport};
use crate::tweets::detail::tweet_detail;
use crate::tweets::query::{SearchMode, SearchPager};
use crate::tweets::users::user_by_screen_name;
use crate::types::{Checked, Tweet, User};
use crate::v1_api::{self, TimelineQuery};

/// a client instance; instances share nothing but, optionally, the token
/// cache file
#[derive(Clone)]
pub struct TwitterClient {
  session: Arc<CredentialManager>,
  routes: Arc<RouteRegistry>,
}

impl TwitterClient {
  /// client over the default reqwest transport
  pub fn new(mode: AuthMode, config: ClientConfig) -> Result<Self> {
    Ok(Self::with_transport(mode, config, Arc::new(ReqwestTransport::new()?)))
  }

  pub fn with_transport(mode: AuthMode, config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
    let session = Arc::new(CredentialManager::new(mode, config, transport));
    Self::from_parts(session.clone(), Arc::new(RouteRegistry::new(session)))
  }

  pub fn from_parts(session: Arc<CredentialManager>, routes: Arc<RouteRegistry>) -> Self {
    Self { session, routes }
  }

  /// guest access with the public web bearer and default config
  pub fn guest() -> Result<Self> {
    Self::new(AuthMode::Bearer(DEFAULT_BEARER.to_string()), ClientConfig::default())
  }

  pub fn session(&self) -> &Arc<CredentialManager> {
    &self.session
  }

  pub fn routes(&self) -> &Arc<RouteRegistry> {
    &self.routes
  }

  /// routes discovered on first use
  pub async fn route_map(&self) -> Result<Arc<RouteMap>> {
    self.routes.routes().await
  }

  /// search pager; `limit` < 0 walks every page
  pub fn search(&self, query: impl Into<String>, mode: SearchMode, limit: i64) -> SearchPager {
    SearchPager::new(self.session.clone(), self.routes.clone(), query, mode, limit)
  }

  pub async fn tweet(&self, tweet_id: u64) -> Result<Checked<Option<Tweet>>> {
    tweet_detail(&self.session, &self.routes, tweet_id).await
  }

  pub async fn user(&self, screen_name: &str) -> Result<Checked<Option<User>>> {
    user_by_screen_name(&self.session, &self.routes, screen_name).await
  }

  pub async fn user_timeline(&self, screen_name: &str, query: &TimelineQuery) -> Result<Vec<Tweet>> {
    v1_api::user_timeline(&self.session, screen_name, query).await
  }
}
