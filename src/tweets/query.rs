//! paginated search over the `SearchTimeline` route

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{graphql_params, missing_features, FeatureSet};
use crate::error::{Error, Result};
use crate::routes::RouteRegistry;
use crate::session::{CredentialManager, RequestOptions};
use crate::timeline::iter_timeline;
use crate::types::{Checked, CursorState, Entry};

pub const OPERATION: &str = "SearchTimeline";

pub const SEARCH_FEATURES: FeatureSet = &[
  ("rweb_lists_timeline_redesign_enabled", true),
  ("blue_business_profile_image_shape_enabled", true),
  ("responsive_web_graphql_exclude_directive_enabled", false),
  ("verified_phone_label_enabled", false),
  ("creator_subscriptions_tweet_preview_api_enabled", true),
  ("responsive_web_graphql_timeline_navigation_enabled", true),
  ("responsive_web_graphql_skip_user_profile_image_extensions_enabled", false),
  ("tweetypie_unmention_optimization_enabled", false),
  ("vibe_api_enabled", true),
  ("responsive_web_edit_tweet_api_enabled", false),
  ("graphql_is_translatable_rweb_tweet_is_translatable_enabled", true),
  ("view_counts_everywhere_api_enabled", true),
  ("longform_notetweets_consumption_enabled", true),
  ("tweet_awards_web_tipping_enabled", false),
  ("freedom_of_speech_not_reach_fetch_enabled", false),
  ("standardized_nudges_misinfo", false),
  ("tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled", false),
  ("interactive_text_enabled", false),
  ("responsive_web_text_conversations_enabled", true),
  ("longform_notetweets_rich_text_read_enabled", true),
  ("longform_notetweets_inline_media_enabled", true),
  ("responsive_web_enhance_cards_enabled", true),
];

/// search tab, sent as the `product` variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
  #[default]
  Top,
  Latest,
  People,
  Photos,
  Videos,
}

impl SearchMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Top => "Top",
      Self::Latest => "Latest",
      Self::People => "People",
      Self::Photos => "Photos",
      Self::Videos => "Videos",
    }
  }
}

impl fmt::Display for SearchMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// one fetched page of search results
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
  pub entries: Vec<Entry>,
  pub cursors: CursorState,
}

impl SearchPage {
  /// tweets and tombstones, without cursors
  pub fn items(&self) -> impl Iterator<Item = &Entry> {
    self.entries.iter().filter(|e| e.is_item())
  }
}

/// walks search results page by page, feeding each bottom cursor back in
///
/// nothing is fetched until [`SearchPager::next_page`] is awaited, and
/// dropping the pager never touches the network.
pub struct SearchPager {
  session: Arc<CredentialManager>,
  routes: Arc<RouteRegistry>,
  query: String,
  mode: SearchMode,
  count: u32,
  remaining: i64,
  cursor: Option<String>,
  missing_features: Vec<String>,
  done: bool,
}

impl SearchPager {
  /// `limit` < 0 fetches until the results run out
  pub fn new(
    session: Arc<CredentialManager>,
    routes: Arc<RouteRegistry>,
    query: impl Into<String>,
    mode: SearchMode,
    limit: i64,
  ) -> Self {
    let count = session.config().page_size;
    Self {
      session,
      routes,
      query: query.into(),
      mode,
      count,
      remaining: limit,
      cursor: None,
      missing_features: Vec::new(),
      done: limit == 0,
    }
  }

  /// start from a cursor saved from an earlier walk
  #[must_use]
  pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
    self.cursor = Some(cursor.into());
    self
  }

  pub fn is_done(&self) -> bool {
    self.done
  }

  /// what is left of the limit; negative when unbounded
  pub fn remaining(&self) -> i64 {
    self.remaining
  }

  /// bottom cursor the next page will be requested with
  pub fn cursor(&self) -> Option<&str> {
    self.cursor.as_deref()
  }

  /// switches the route asked for that the last fetched page did not send
  pub fn missing_features(&self) -> &[String] {
    &self.missing_features
  }

  fn variables(&self) -> Value {
    let mut variables = json!({
      "rawQuery": self.query,
      "count": self.count,
      "querySource": "typed_query",
      "product": self.mode.as_str(),
      "includePromotedContent": false,
    });
    if let Some(cursor) = &self.cursor {
      variables["cursor"] = Value::String(cursor.clone());
    }
    variables
  }

  /// fetch and normalize the next page, `None` once the walk is over
  #[instrument(skip(self), fields(query = %self.query, mode = %self.mode))]
  pub async fn next_page(&mut self) -> Result<Option<Checked<SearchPage>>> {
    if self.done {
      return Ok(None);
    }
    let route = self.routes.route(OPERATION).await?;
    let missing = missing_features(&route, SEARCH_FEATURES);
    let params = graphql_params(&self.variables(), SEARCH_FEATURES)?;

    let response = self
      .session
      .get_with_retry(OPERATION, &route.url, &params, &RequestOptions::guest())
      .await?;
    let body = response.json()?;
    let content = body
      .pointer("/data/search_by_raw_query/search_timeline")
      .ok_or_else(|| Error::malformed(OPERATION, "missing `data.search_by_raw_query.search_timeline`"))?;
    let timeline = content
      .get("timeline")
      .filter(|t| t.as_object().map_or(false, |t| !t.is_empty()))
      .ok_or_else(|| Error::malformed(OPERATION, "missing `timeline`"))?;
    let globals = content.get("globalObjects");

    let mut cursors = CursorState::default();
    let mut entries_iter = iter_timeline(timeline, globals, self.remaining, &mut cursors);
    let entries: Vec<Entry> = entries_iter.by_ref().collect::<Result<_>>()?;
    self.remaining = entries_iter.remaining();
    drop(entries_iter);

    let items = entries.iter().filter(|e| e.is_item()).count();
    let next = cursors.bottom_value().map(str::to_string);
    debug!(items, remaining = self.remaining, has_next = next.is_some(), "search page");
    if items == 0 || self.remaining == 0 || next.is_none() || next == self.cursor {
      self.done = true;
    }
    self.cursor = next;
    self.missing_features = missing.clone();

    Ok(Some(Checked::new(SearchPage { entries, cursors }, missing)))
  }

  /// every page with its feature diagnostics, fetched as the stream is polled
  pub fn into_pages(self) -> impl Stream<Item = Result<Checked<SearchPage>>> {
    stream::try_unfold(self, |mut pager| async move {
      let page = pager.next_page().await?;
      Ok::<_, Error>(page.map(|page| (page, pager)))
    })
  }

  /// tweets and tombstones across every page; use [`SearchPager::into_pages`]
  /// to keep the per-page diagnostics
  pub fn into_stream(self) -> impl Stream<Item = Result<Entry>> {
    self
      .into_pages()
      .map_ok(|page| {
        let items = page.value.entries.into_iter().filter(Entry::is_item).map(Ok::<Entry, Error>);
        stream::iter(items)
      })
      .try_flatten()
  }
}
