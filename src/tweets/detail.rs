//! a single tweet through the `TweetDetail` route

use serde_json::json;
use tracing::instrument;

use super::{graphql_params, missing_features, FeatureSet};
use crate::error::{Error, Result};
use crate::routes::RouteRegistry;
use crate::session::{CredentialManager, RequestOptions};
use crate::timeline::iter_timeline;
use crate::types::{Checked, CursorState, Entry, Tweet};

pub const OPERATION: &str = "TweetDetail";

pub const TWEET_DETAIL_FEATURES: FeatureSet = &[
  ("responsive_web_twitter_blue_verified_badge_is_enabled", true),
  ("responsive_web_graphql_exclude_directive_enabled", false),
  ("verified_phone_label_enabled", false),
  ("responsive_web_graphql_timeline_navigation_enabled", true),
  ("responsive_web_graphql_skip_user_profile_image_extensions_enabled", false),
  ("longform_notetweets_consumption_enabled", true),
  ("tweetypie_unmention_optimization_enabled", true),
  ("vibe_api_enabled", true),
  ("responsive_web_edit_tweet_api_enabled", true),
  ("graphql_is_translatable_rweb_tweet_is_translatable_enabled", true),
  ("view_counts_everywhere_api_enabled", true),
  ("freedom_of_speech_not_reach_appeal_label_enabled", false),
  ("standardized_nudges_misinfo", true),
  ("tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled", false),
  ("interactive_text_enabled", true),
  ("responsive_web_text_conversations_enabled", false),
  ("responsive_web_enhance_cards_enabled", false),
];

/// the focal tweet of a conversation; `None` when it is deleted, withheld
/// or not part of the response
#[instrument(skip(session, routes))]
pub async fn tweet_detail(
  session: &CredentialManager,
  routes: &RouteRegistry,
  tweet_id: u64,
) -> Result<Checked<Option<Tweet>>> {
  let route = routes.route(OPERATION).await?;
  let missing = missing_features(&route, TWEET_DETAIL_FEATURES);
  // the guest token is only honoured on the private api host
  let url = session.config().rebase_private(&route.url);
  let variables = json!({
    "focalTweetId": tweet_id.to_string(),
    "with_rux_injections": false,
    "includePromotedContent": false,
    "withCommunity": true,
    "withQuickPromoteEligibilityTweetFields": false,
    "withBirdwatchNotes": true,
    "withVoice": true,
    "withV2Timeline": true,
  });
  let params = graphql_params(&variables, TWEET_DETAIL_FEATURES)?;

  let response = session
    .get_with_retry(OPERATION, &url, &params, &RequestOptions::guest())
    .await?;
  let body = response.json()?;
  let timeline = body
    .pointer("/data/threaded_conversation_with_injections_v2")
    .ok_or_else(|| Error::malformed(OPERATION, "missing `threaded_conversation_with_injections_v2`"))?;

  let mut cursors = CursorState::default();
  for entry in iter_timeline(timeline, None, -1, &mut cursors) {
    match entry? {
      Entry::Tweet { tweet, .. } if tweet.id == tweet_id => {
        return Ok(Checked::new(Some(*tweet), missing));
      }
      Entry::Tombstone { id } if id == tweet_id => break,
      _ => {}
    }
  }
  Ok(Checked::new(None, missing))
}
