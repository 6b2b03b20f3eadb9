//! v1.1 rest endpoints, the oldest response shape: tweets embed their
//! `user`, `quoted_status` and `retweeted_status` objects

use serde_json::Value;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::session::{CredentialManager, RequestOptions};
use crate::timeline::{common_tweet, TweetSource};
use crate::types::Tweet;

pub const USER_TIMELINE: &str = "statuses/user_timeline.json";

/// paging knobs for the user timeline
#[derive(Debug, Clone, Default)]
pub struct TimelineQuery {
  /// up to 200, the host default applies when unset
  pub count: Option<u32>,
  /// only tweets at or below this id
  pub max_id: Option<u64>,
  pub since_id: Option<u64>,
  pub include_retweets: bool,
  pub exclude_replies: bool,
}

impl TimelineQuery {
  fn params(&self, screen_name: &str) -> Vec<(String, String)> {
    let mut params = vec![
      ("screen_name".to_string(), screen_name.trim_start_matches('@').to_string()),
      ("tweet_mode".to_string(), "extended".to_string()),
      ("include_rts".to_string(), self.include_retweets.to_string()),
      ("exclude_replies".to_string(), self.exclude_replies.to_string()),
    ];
    if let Some(count) = self.count {
      params.push(("count".to_string(), count.to_string()));
    }
    if let Some(max_id) = self.max_id {
      params.push(("max_id".to_string(), max_id.to_string()));
    }
    if let Some(since_id) = self.since_id {
      params.push(("since_id".to_string(), since_id.to_string()));
    }
    params
  }
}

/// a user's recent tweets, newest first
#[instrument(skip(session, query))]
pub async fn user_timeline(
  session: &CredentialManager,
  screen_name: &str,
  query: &TimelineQuery,
) -> Result<Vec<Tweet>> {
  let url = format!("{}{USER_TIMELINE}", session.config().rest_api_base);
  let response = session
    .get_with_retry(USER_TIMELINE, &url, &query.params(screen_name), &RequestOptions::default())
    .await?;
  let body = response.json()?;
  let Value::Array(tweets) = body else {
    return Err(Error::malformed(USER_TIMELINE, "expected an array of tweets"));
  };
  tweets
    .iter()
    .map(|raw| common_tweet(raw, TweetSource::Rest))
    .collect()
}

/// `max_id` for the page after `tweets`
pub fn next_max_id(tweets: &[Tweet]) -> Option<u64> {
  tweets.iter().map(|t| t.id).min().and_then(|id| id.checked_sub(1))
}
