//! profile lookup through the `UserByScreenName` route

use serde_json::{json, Value};
use tracing::instrument;

use super::{graphql_params, missing_features, FeatureSet};
use crate::error::Result;
use crate::routes::RouteRegistry;
use crate::session::{CredentialManager, RequestOptions};
use crate::timeline::graphql_user;
use crate::types::{Checked, User};

pub const OPERATION: &str = "UserByScreenName";

pub const USER_FEATURES: FeatureSet = &[
  ("responsive_web_twitter_blue_verified_badge_is_enabled", true),
  ("verified_phone_label_enabled", true),
  ("responsive_web_graphql_timeline_navigation_enabled", true),
  ("responsive_web_graphql_skip_user_profile_image_extensions_enabled", false),
  ("responsive_web_graphql_exclude_directive_enabled", false),
];

/// a user by screen name (with or without the `@`); `None` when the host
/// reports no such user
#[instrument(skip(session, routes))]
pub async fn user_by_screen_name(
  session: &CredentialManager,
  routes: &RouteRegistry,
  screen_name: &str,
) -> Result<Checked<Option<User>>> {
  let route = routes.route(OPERATION).await?;
  let missing = missing_features(&route, USER_FEATURES);
  let variables = json!({
    "screen_name": screen_name.trim_start_matches('@'),
    "withSafetyModeUserFields": false,
    "withSuperFollowsUserFields": true,
  });
  let params = graphql_params(&variables, USER_FEATURES)?;

  let response = session
    .get_with_retry(OPERATION, &route.url, &params, &RequestOptions::guest())
    .await?;
  let body = response.json()?;
  let user = match body.pointer("/data/user/result") {
    Some(result) if result.get("legacy").map_or(false, Value::is_object) => Some(graphql_user(result)?),
    _ => None,
  };
  Ok(Checked::new(user, missing))
}
