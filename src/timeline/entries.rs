//! classifying timeline entries and unpacking tweets and cursors from them

use serde_json::Value;
use tracing::debug;

use super::parsing::{common_tweet, graphql_tweet_node, parse_id, TweetSource};
use crate::error::{Error, Result};
use crate::types::{Cursor, CursorDirection, Entry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  Tweet,
  Cursor,
  /// modules, prompts, who-to-follow and friends
  Other,
}

/// kind of an entry, decided by its id prefix
pub fn classify(entry_id: &str) -> EntryKind {
  if entry_id.starts_with("tweet-") || entry_id.starts_with("sq-I-t-") {
    EntryKind::Tweet
  } else if entry_id.starts_with("cursor") || is_search_cursor(entry_id) {
    EntryKind::Cursor
  } else {
    EntryKind::Other
  }
}

/// adaptive search cursors: `sq-C..` and `sq-cursor-top` / `sq-cursor-bottom`
fn is_search_cursor(entry_id: &str) -> bool {
  entry_id.starts_with("sq-C") || entry_id.starts_with("sq-cursor")
}

/// numeric suffix of `tweet-123` / `sq-I-t-123`
fn tombstone_id(entry_id: &str) -> Option<u64> {
  entry_id
    .rsplit('-')
    .next()
    .and_then(|suffix| suffix.parse().ok())
    .filter(|id| *id != 0)
}

fn tombstone(entry_id: &str) -> Result<Entry> {
  match tombstone_id(entry_id) {
    Some(id) => {
      debug!(entry_id, "tweet entry without content, using a tombstone");
      Ok(Entry::Tombstone { id })
    }
    None => Err(Error::UnknownEntryShape {
      entry_id: entry_id.to_string(),
    }),
  }
}

/// the tweet behind a tweet entry, in whichever generation it was sent
pub fn unpack_tweet(entry: &Value, globals: Option<&Value>, entry_id: &str) -> Result<Entry> {
  // the graphql item can sit on the entry itself or under `content`
  let content = if entry.get("__typename").is_some() {
    entry
  } else {
    match entry.get("content") {
      Some(content) if content.as_object().map_or(false, |c| !c.is_empty()) => content,
      _ => return tombstone(entry_id),
    }
  };

  if content.get("__typename").is_some() || content.get("itemContent").is_some() {
    let node = content
      .pointer("/itemContent/tweet_results/result")
      .and_then(graphql_tweet_node);
    return match node {
      Some(node) => common_tweet(node, TweetSource::GraphQl).map(Entry::tweet),
      None => tombstone(entry_id),
    };
  }

  let pointer = content.get("item").unwrap_or(content);
  let Some(tweet_id) = pointer.pointer("/content/tweet/id").and_then(parse_id) else {
    return tombstone(entry_id);
  };
  let Some(globals) = globals else {
    return Err(Error::UnknownEntryShape {
      entry_id: entry_id.to_string(),
    });
  };
  match globals.get("tweets").and_then(|t| t.get(tweet_id.to_string())) {
    Some(raw) => common_tweet(raw, TweetSource::Globals(globals)).map(Entry::tweet),
    // pointer to a tweet the globals left out: deleted or withheld
    None => tombstone(entry_id),
  }
}

/// a cursor entry as `{direction, value}`; `None` for cursor types other
/// than top and bottom
pub fn unpack_cursor(entry: &Value, entry_id: &str) -> Result<Option<Cursor>> {
  let malformed = || Error::MalformedCursor {
    entry_id: entry_id.to_string(),
  };
  let payload = entry.get("content").ok_or_else(malformed)?;
  let content = payload.get("content").filter(|c| !is_empty(c));
  let operation = payload.get("operation").filter(|o| !is_empty(o));
  let graphql = payload.get("__typename").is_some();
  if content.is_none() && operation.is_none() && !graphql {
    return Err(malformed());
  }

  let cursor = if is_search_cursor(entry_id) {
    operation.and_then(|o| o.get("cursor")).ok_or_else(malformed)?
  } else if entry_id.starts_with("cursor-") {
    operation.and_then(|o| o.get("cursor")).unwrap_or(payload)
  } else {
    content.unwrap_or(payload)
  };

  let value = cursor
    .get("value")
    .and_then(Value::as_str)
    .ok_or_else(malformed)?;
  let cursor_type = cursor
    .get("cursorType")
    .and_then(Value::as_str)
    .unwrap_or_default();
  match CursorDirection::parse(cursor_type) {
    Some(direction) => Ok(Some(Cursor {
      direction,
      value: value.to_string(),
    })),
    None => {
      debug!(entry_id, cursor_type, "ignoring cursor");
      Ok(None)
    }
  }
}

fn is_empty(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::Object(map) => map.is_empty(),
    _ => false,
  }
}
