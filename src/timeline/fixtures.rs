//! raw payload builders shared by the normalization tests

use serde_json::{json, Value};

pub const USER_ID: u64 = 783214;

pub fn legacy_user(id: u64, screen_name: &str) -> Value {
  json!({
    "id_str": id.to_string(),
    "name": "Display Name",
    "screen_name": screen_name,
    "description": "bio https://t.co/bio",
    "entities": {
      "description": { "urls": [{ "url": "https://t.co/bio", "expanded_url": "https://bio.example" }] },
      "url": { "urls": [{ "url": "https://t.co/home", "expanded_url": "https://home.example" }] }
    },
    "followers_count": 10,
    "friends_count": 5,
    "statuses_count": 100,
    "favourites_count": 7,
    "listed_count": 1,
    "media_count": 3,
    "created_at": "Wed Oct 10 20:19:24 +0000 2018",
    "location": "",
    "verified": false,
    "protected": false,
    "profile_image_url_https": "https://pbs.twimg.com/profile_images/1/avatar_normal.jpg",
    "profile_banner_url": "https://pbs.twimg.com/profile_banners/1/2"
  })
}

/// graphql `user_results.result`, the id lives outside `legacy`
pub fn graphql_user(id: u64, screen_name: &str) -> Value {
  let mut legacy = legacy_user(id, screen_name);
  if let Some(map) = legacy.as_object_mut() {
    map.remove("id_str");
  }
  json!({
    "__typename": "User",
    "rest_id": id.to_string(),
    "is_blue_verified": false,
    "legacy": legacy
  })
}

pub fn legacy_tweet(id: u64, text: &str) -> Value {
  json!({
    "id_str": id.to_string(),
    "created_at": "Thu Jun 01 12:00:00 +0000 2023",
    "full_text": text,
    "user_id_str": USER_ID.to_string(),
    "conversation_id_str": id.to_string(),
    "reply_count": 1,
    "retweet_count": 2,
    "favorite_count": 3,
    "quote_count": 4,
    "lang": "en",
    "source": "<a href=\"https://mobile.twitter.com\" rel=\"nofollow\">Twitter Web App</a>",
    "entities": { "urls": [] }
  })
}

/// graphql tweet node wrapping a legacy block
pub fn graphql_tweet(legacy: Value) -> Value {
  let id = legacy["id_str"].clone();
  json!({
    "__typename": "Tweet",
    "rest_id": id,
    "core": { "user_results": { "result": graphql_user(USER_ID, "jack") } },
    "legacy": legacy
  })
}

/// `globalObjects` holding the given legacy tweets and the default author
pub fn globals(tweets: &[Value]) -> Value {
  let tweets: serde_json::Map<String, Value> = tweets
    .iter()
    .map(|t| (t["id_str"].as_str().unwrap_or_default().to_string(), t.clone()))
    .collect();
  json!({
    "tweets": tweets,
    "users": { USER_ID.to_string(): legacy_user(USER_ID, "jack") }
  })
}

pub fn photo(id: u64, short_url: &str) -> Value {
  json!({
    "id_str": id.to_string(),
    "type": "photo",
    "url": short_url,
    "display_url": "pic.twitter.com/abc",
    "expanded_url": "https://twitter.com/jack/status/1/photo/1",
    "media_url_https": "https://pbs.twimg.com/media/abc.jpg",
    "original_info": { "width": 1200, "height": 800 },
    "ext_media_availability": { "status": "Available" },
    "features": {}
  })
}

pub fn modern_tweet_entry(node: Value) -> Value {
  let id = node["rest_id"].as_str().unwrap_or_default().to_string();
  json!({
    "entryId": format!("tweet-{id}"),
    "sortIndex": id,
    "content": {
      "entryType": "TimelineTimelineItem",
      "__typename": "TimelineTimelineItem",
      "itemContent": {
        "itemType": "TimelineTweet",
        "__typename": "TimelineTweet",
        "tweet_results": { "result": node }
      }
    }
  })
}

pub fn legacy_tweet_entry(id: u64) -> Value {
  json!({
    "entryId": format!("sq-I-t-{id}"),
    "sortIndex": id.to_string(),
    "content": { "item": { "content": { "tweet": { "id": id.to_string(), "displayType": "Tweet" } } } }
  })
}

pub fn modern_cursor(direction: &str, value: &str) -> Value {
  json!({
    "entryId": format!("cursor-{}-0", direction.to_lowercase()),
    "sortIndex": "0",
    "content": {
      "entryType": "TimelineTimelineCursor",
      "__typename": "TimelineTimelineCursor",
      "value": value,
      "cursorType": direction
    }
  })
}

pub fn legacy_cursor(direction: &str, value: &str) -> Value {
  json!({
    "entryId": format!("sq-cursor-{}", direction.to_lowercase()),
    "sortIndex": "0",
    "content": { "operation": { "cursor": { "value": value, "cursorType": direction } } }
  })
}

pub fn modern_timeline(entries: Vec<Value>) -> Value {
  json!({ "instructions": [{ "type": "TimelineAddEntries", "entries": entries }] })
}

pub fn legacy_timeline(entries: Vec<Value>) -> Value {
  json!({ "instructions": [{ "addEntries": { "entries": entries } }] })
}
