use serde_json::{json, Value};

use super::fixtures::{self, legacy_tweet};
use super::iter::iter_timeline;
use crate::error::{Error, Result};
use crate::types::{CursorState, Entry};

fn modern_page(ids: &[u64]) -> Value {
  let mut entries = vec![fixtures::modern_cursor("Top", "top-0")];
  for id in ids {
    let node = fixtures::graphql_tweet(legacy_tweet(*id, &format!("tweet {id}")));
    entries.push(fixtures::modern_tweet_entry(node));
  }
  entries.push(fixtures::modern_cursor("Bottom", "bottom-0"));
  fixtures::modern_timeline(entries)
}

fn tweets(entries: &[Entry]) -> Vec<u64> {
  entries
    .iter()
    .filter_map(|e| match e {
      Entry::Tweet { tweet, .. } => Some(tweet.id),
      Entry::Tombstone { id } => Some(*id),
      Entry::Cursor(_) => None,
    })
    .collect()
}

#[test]
fn legacy_and_modern_pages_yield_equal_entries() {
  let raws: Vec<Value> = (1..=3).map(|id| legacy_tweet(id, "same")).collect();
  let globals = fixtures::globals(&raws);
  let legacy = fixtures::legacy_timeline(
    (1..=3)
      .map(fixtures::legacy_tweet_entry)
      .chain([fixtures::legacy_cursor("Bottom", "next")])
      .collect(),
  );
  let modern = fixtures::modern_timeline(
    raws
      .into_iter()
      .map(|raw| fixtures::modern_tweet_entry(fixtures::graphql_tweet(raw)))
      .chain([fixtures::modern_cursor("Bottom", "next")])
      .collect(),
  );

  let mut legacy_cursors = CursorState::default();
  let from_legacy: Vec<Entry> = iter_timeline(&legacy, Some(&globals), -1, &mut legacy_cursors)
    .collect::<Result<_>>()
    .unwrap();
  let mut modern_cursors = CursorState::default();
  let from_modern: Vec<Entry> = iter_timeline(&modern, None, -1, &mut modern_cursors)
    .collect::<Result<_>>()
    .unwrap();

  assert_eq!(from_legacy, from_modern);
  assert_eq!(tweets(&from_legacy), vec![1, 2, 3]);
  assert_eq!(legacy_cursors, modern_cursors);
  assert_eq!(modern_cursors.bottom_value(), Some("next"));
}

#[test]
fn limit_stops_early_but_still_captures_the_bottom_cursor() {
  let page = modern_page(&[1, 2, 3, 4, 5]);
  let mut cursors = CursorState::default();
  let mut iter = iter_timeline(&page, None, 2, &mut cursors);
  let entries: Vec<Entry> = iter.by_ref().collect::<Result<_>>().unwrap();
  assert_eq!(iter.remaining(), 0);
  drop(iter);

  assert_eq!(tweets(&entries), vec![1, 2]);
  // the top cursor is yielded, the bottom one only recorded
  assert_eq!(entries.len(), 3);
  assert_eq!(cursors.top_value(), Some("top-0"));
  assert_eq!(cursors.bottom_value(), Some("bottom-0"));
}

#[test]
fn zero_limit_yields_nothing() {
  let page = modern_page(&[1, 2]);
  let mut cursors = CursorState::default();
  assert_eq!(iter_timeline(&page, None, 0, &mut cursors).count(), 0);
  assert_eq!(cursors, CursorState::default());
}

#[test]
fn negative_limit_is_unbounded() {
  let page = modern_page(&[1, 2, 3]);
  let mut cursors = CursorState::default();
  let mut iter = iter_timeline(&page, None, -1, &mut cursors);
  let entries: Vec<Entry> = iter.by_ref().collect::<Result<_>>().unwrap();
  assert_eq!(iter.remaining(), -1);
  assert_eq!(tweets(&entries), vec![1, 2, 3]);
  assert_eq!(entries.len(), 5);
}

#[test]
fn tombstones_count_toward_the_limit() {
  let tombstone = json!({
    "entryId": "tweet-50",
    "content": { "__typename": "TimelineTimelineItem", "itemContent": { "tweet_results": {} } }
  });
  let node = fixtures::graphql_tweet(legacy_tweet(51, "after"));
  let page = fixtures::modern_timeline(vec![tombstone, fixtures::modern_tweet_entry(node)]);

  let mut cursors = CursorState::default();
  let entries: Vec<Entry> = iter_timeline(&page, None, 1, &mut cursors)
    .collect::<Result<_>>()
    .unwrap();
  assert_eq!(entries, vec![Entry::Tombstone { id: 50 }]);
}

#[test]
fn replace_instructions_only_update_cursors() {
  let node = fixtures::graphql_tweet(legacy_tweet(60, "ignored"));
  let modern = json!({
    "instructions": [
      { "type": "TimelineClearCache" },
      { "type": "TimelineReplaceEntry", "entry_id_to_replace": "cursor-top-0", "entry": fixtures::modern_cursor("Top", "newer") },
      { "type": "TimelineReplaceEntry", "entry_id_to_replace": "tweet-60", "entry": fixtures::modern_tweet_entry(node) }
    ]
  });
  let mut cursors = CursorState::default();
  let entries: Vec<Entry> = iter_timeline(&modern, None, -1, &mut cursors)
    .collect::<Result<_>>()
    .unwrap();
  assert_eq!(tweets(&entries), Vec::<u64>::new());
  assert_eq!(cursors.top_value(), Some("newer"));

  let legacy = json!({
    "instructions": [
      { "replaceEntry": { "entryIdToReplace": "sq-cursor-bottom", "entry": fixtures::legacy_cursor("Bottom", "older") } }
    ]
  });
  let mut cursors = CursorState::default();
  assert_eq!(iter_timeline(&legacy, None, -1, &mut cursors).count(), 1);
  assert_eq!(cursors.bottom_value(), Some("older"));
}

#[test]
fn entries_are_normalized_lazily() {
  let good = fixtures::modern_tweet_entry(fixtures::graphql_tweet(legacy_tweet(70, "fine")));
  let mut bad_raw = legacy_tweet(71, "bad");
  bad_raw["extended_entities"] = json!({ "media": [{ "type": "sticker" }] });
  let bad = fixtures::modern_tweet_entry(fixtures::graphql_tweet(bad_raw));
  let page = fixtures::modern_timeline(vec![good, bad]);

  let mut cursors = CursorState::default();
  let mut iter = iter_timeline(&page, None, -1, &mut cursors);
  assert!(iter.next().unwrap().is_ok());
  assert!(matches!(
    iter.next(),
    Some(Err(Error::UnknownMediaType { tweet_id: 71, .. }))
  ));
  assert!(iter.next().is_none());
}

#[test]
fn entries_need_an_id() {
  let page = fixtures::modern_timeline(vec![json!({ "content": {} })]);
  let mut cursors = CursorState::default();
  let first = iter_timeline(&page, None, -1, &mut cursors).next();
  assert!(matches!(first, Some(Err(Error::MalformedPayload { .. }))));
}

#[test]
fn entries_serialize_with_a_type_tag() {
  let page = modern_page(&[80]);
  let mut cursors = CursorState::default();
  let entries: Vec<Entry> = iter_timeline(&page, None, -1, &mut cursors)
    .collect::<Result<_>>()
    .unwrap();

  let cursor = serde_json::to_value(&entries[0]).unwrap();
  assert_eq!(cursor, json!({ "type": "cursor", "direction": "top", "value": "top-0" }));
  let tweet = serde_json::to_value(&entries[1]).unwrap();
  assert_eq!(tweet["type"], "tweet");
  assert_eq!(tweet["tweet"]["id"], 80);
  assert_eq!(tweet["user"]["username"], "jack");
}
