//! building users, tweets and media out of raw payload objects
//!
//! every function here is pure: it reads the payload and returns fresh
//! entities, the payload itself is never patched.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::types::{
  ExtendedMedia, Link, Media, MediaType, Tweet, TweetSummary, User, UserCounts, VideoMeta,
  VideoVariant,
};

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<]+?>").expect("valid tag regex"));

/// host date format, e.g. `Wed Oct 10 20:19:24 +0000 2018`
const TWITTER_DATE: &str = "%a %b %d %H:%M:%S %z %Y";

/// where a tweet's author and nested tweets are looked up
#[derive(Debug, Clone, Copy)]
pub enum TweetSource<'a> {
  /// legacy adaptive timeline: flat `globalObjects.{tweets,users}` tables
  Globals(&'a Value),
  /// graphql nodes with inline `core.user_results` and `legacy` blocks
  GraphQl,
  /// v1.1 rest objects with embedded `user` / `quoted_status`
  Rest,
}

/* -------------------------------- helpers -------------------------------- */

/// ids arrive as numbers or as numeric strings
pub fn parse_id(value: &Value) -> Option<u64> {
  match value {
    Value::Number(n) => n.as_u64(),
    Value::String(s) => s.parse().ok(),
    _ => None,
  }
}

pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_str(raw, TWITTER_DATE)
    .or_else(|_| DateTime::parse_from_rfc2822(raw))
    .map(|d| d.with_timezone(&Utc))
    .map_err(|e| Error::malformed("created_at", format!("`{raw}`: {e}")))
}

fn str_of<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
  value.get(key).and_then(Value::as_str)
}

fn count(value: &Value, key: &str) -> u64 {
  value.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn required_str(value: &Value, key: &str, context: &str) -> Result<String> {
  str_of(value, key)
    .map(str::to_string)
    .ok_or_else(|| Error::malformed(context, format!("missing `{key}`")))
}

fn array<'a>(value: &'a Value, path: &[&str]) -> &'a [Value] {
  path
    .iter()
    .try_fold(value, |v, key| v.get(key))
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

/// `<a href="..">Twitter Web App</a>` -> `Twitter Web App`
pub fn strip_source(source: &str) -> String {
  HTML_TAG.replace_all(&source.replace("\\/", "/"), "").into_owned()
}

/* --------------------------------- users --------------------------------- */

/// a user from its legacy (rest style) object; `id` overrides the object's
/// own id fields, graphql keeps the id outside of `legacy`
pub fn make_user(legacy: &Value, id: Option<u64>) -> Result<User> {
  let id = id
    .or_else(|| legacy.get("id_str").and_then(parse_id))
    .or_else(|| legacy.get("id").and_then(parse_id))
    .ok_or_else(|| Error::malformed("user", "missing numeric id"))?;
  let username = required_str(legacy, "screen_name", "user")?;

  let mut description = str_of(legacy, "description").unwrap_or_default().to_string();
  for url in array(legacy, &["entities", "description", "urls"]) {
    if let (Some(short), Some(expanded)) = (str_of(url, "url"), str_of(url, "expanded_url")) {
      description = description.replace(short, expanded);
    }
  }
  let link_url = array(legacy, &["entities", "url", "urls"])
    .first()
    .and_then(|link| str_of(link, "expanded_url").or_else(|| str_of(link, "url")))
    .map(str::to_string);

  let verified = legacy.get("verified").and_then(Value::as_bool).unwrap_or(false);
  let verified_type = verified.then(|| str_of(legacy, "verified_type").unwrap_or("Legacy").to_string());
  let created = str_of(legacy, "created_at").map(parse_date).transpose()?;

  Ok(User {
    username,
    display_name: str_of(legacy, "name").map(str::to_string),
    description,
    id,
    verified,
    verified_type,
    counts: UserCounts {
      followers: count(legacy, "followers_count"),
      friends: count(legacy, "friends_count"),
      statuses: count(legacy, "statuses_count"),
      favourites: count(legacy, "favourites_count"),
      listed: count(legacy, "listed_count"),
      media: count(legacy, "media_count"),
    },
    created,
    location: str_of(legacy, "location")
      .filter(|l| !l.is_empty())
      .map(str::to_string),
    protected: legacy.get("protected").and_then(Value::as_bool).unwrap_or(false),
    link_url,
    profile_image_url: str_of(legacy, "profile_image_url_https").map(|u| u.replace("_normal", "_400x400")),
    profile_banner_url: str_of(legacy, "profile_banner_url").map(str::to_string),
  })
}

/// a user from a graphql `user_results.result` node
pub fn graphql_user(result: &Value) -> Result<User> {
  let legacy = result
    .get("legacy")
    .ok_or_else(|| Error::malformed("graphql user", "missing `legacy`"))?;
  let id = result.get("rest_id").and_then(parse_id);
  let mut user = make_user(legacy, id)?;
  let blue = result.get("is_blue_verified").and_then(Value::as_bool).unwrap_or(false);
  if blue && !user.verified {
    user.verified = true;
    user.verified_type = Some("Blue".to_string());
  }
  Ok(user)
}

/* --------------------------------- media --------------------------------- */

fn media_kind(item: &Value, tweet_id: u64) -> Result<MediaType> {
  let kind = str_of(item, "type").unwrap_or_default();
  MediaType::parse(kind).ok_or_else(|| Error::UnknownMediaType {
    tweet_id,
    kind: kind.to_string(),
  })
}

pub fn parse_media(item: &Value, tweet_id: u64) -> Result<Media> {
  let kind = media_kind(item, tweet_id)?;
  let id = item
    .get("id_str")
    .and_then(parse_id)
    .or_else(|| item.get("id").and_then(parse_id))
    .ok_or_else(|| Error::malformed("media", "missing numeric id"))?;
  Ok(Media {
    display_url: required_str(item, "display_url", "media")?,
    expanded_url: required_str(item, "expanded_url", "media")?,
    id,
    media_url: required_str(item, "media_url_https", "media")?,
    kind,
    features: item
      .get("features")
      .and_then(Value::as_object)
      .cloned()
      .unwrap_or_else(Map::new),
    original_info: item.get("original_info").cloned().unwrap_or(Value::Null),
  })
}

fn video_meta(info: &Value) -> VideoMeta {
  let aspect = info
    .get("aspect_ratio")
    .or_else(|| info.get("aspect"))
    .and_then(Value::as_array)
    .and_then(|pair| match pair.as_slice() {
      [w, h] => Some((w.as_u64()?, h.as_u64()?)),
      _ => None,
    })
    .unwrap_or((0, 0));
  let variants = array(info, &["variants"])
    .iter()
    .map(|v| VideoVariant {
      bitrate: v.get("bitrate").and_then(Value::as_u64),
      content_type: str_of(v, "content_type").unwrap_or("video/unknown").to_string(),
      url: str_of(v, "url").unwrap_or_default().to_string(),
    })
    .collect();
  VideoMeta {
    aspect,
    duration: count(info, "duration_millis") as f64 / 1000.0,
    variants,
  }
}

pub fn parse_extended_media(item: &Value, tweet_id: u64) -> Result<ExtendedMedia> {
  let media = parse_media(item, tweet_id)?;
  let video = if media.kind.is_playable() {
    item.get("video_info").map(video_meta)
  } else {
    None
  };
  Ok(ExtendedMedia {
    media,
    availability: item.get("ext_media_availability").cloned().unwrap_or(Value::Null),
    color: item.get("ext_media_color").cloned(),
    video,
  })
}

/* --------------------------------- tweets -------------------------------- */

/// the node a graphql `tweet_results.result` points at, unwrapping
/// visibility wrappers; `None` for tombstones and empty results
pub fn graphql_tweet_node(result: &Value) -> Option<&Value> {
  match str_of(result, "__typename") {
    Some("TweetWithVisibilityResults") => result.get("tweet").and_then(graphql_tweet_node),
    Some("TweetTombstone" | "TweetUnavailable") => None,
    _ if result.as_object().map_or(true, Map::is_empty) => None,
    _ => Some(result),
  }
}

/// replace short links, then drop the media short link the host appends
pub fn normalize_text(text: &str, links: &[Link], has_media: bool) -> String {
  let mut content = text.to_string();
  for link in links {
    content = content.replace(&link.url, &link.expanded_url);
  }
  if !has_media {
    return content;
  }
  let trimmed = content.trim_end();
  let (head, last) = trimmed
    .rsplit_once(char::is_whitespace)
    .unwrap_or(("", trimmed));
  if last.starts_with("https://t.co") {
    head.trim_end().to_string()
  } else {
    content
  }
}

fn legacy_block<'a>(node: &'a Value, source: TweetSource<'_>) -> Result<&'a Value> {
  match source {
    TweetSource::GraphQl => node
      .get("legacy")
      .ok_or_else(|| Error::malformed("graphql tweet", "missing `legacy`")),
    TweetSource::Globals(_) | TweetSource::Rest => Ok(node),
  }
}

fn author(node: &Value, base: &Value, source: TweetSource<'_>) -> Result<User> {
  match source {
    TweetSource::GraphQl => {
      let result = node
        .pointer("/core/user_results/result")
        .ok_or_else(|| Error::malformed("graphql tweet", "missing `core.user_results.result`"))?;
      graphql_user(result)
    }
    TweetSource::Globals(globals) => {
      let user_id = base
        .get("user_id_str")
        .and_then(parse_id)
        .or_else(|| base.get("user_id").and_then(parse_id))
        .ok_or_else(|| Error::malformed("tweet", "missing `user_id_str`"))?;
      let legacy = globals
        .get("users")
        .and_then(|users| users.get(user_id.to_string()))
        .ok_or_else(|| Error::malformed("globalObjects.users", format!("no user {user_id}")))?;
      make_user(legacy, Some(user_id))
    }
    TweetSource::Rest => {
      let legacy = base
        .get("user")
        .ok_or_else(|| Error::malformed("rest tweet", "missing `user`"))?;
      make_user(legacy, None)
    }
  }
}

/// the raw node of a quoted or retweeted tweet, when the payload has one
fn nested<'a>(
  node: &'a Value,
  base: &'a Value,
  source: TweetSource<'a>,
  kind: &str,
) -> Option<&'a Value> {
  match source {
    TweetSource::Globals(globals) => {
      let id = base
        .get(&format!("{kind}_status_id_str"))
        .and_then(parse_id)
        .or_else(|| base.get(&format!("{kind}_status_id")).and_then(parse_id))?;
      globals.get("tweets")?.get(id.to_string())
    }
    TweetSource::GraphQl => {
      let key = format!("{kind}_status_result");
      let result = base
        .get(&key)
        .or_else(|| node.get(&key))
        .and_then(|r| r.get("result"))?;
      graphql_tweet_node(result)
    }
    TweetSource::Rest => base.get(&format!("{kind}_status")).filter(|v| v.is_object()),
  }
}

fn summary_with(
  node: &Value,
  source: TweetSource<'_>,
  retweeted: Option<&TweetSummary>,
) -> Result<TweetSummary> {
  let base = legacy_block(node, source)?;
  let id = base
    .get("id_str")
    .and_then(parse_id)
    .or_else(|| node.get("rest_id").and_then(parse_id))
    .or_else(|| base.get("id").and_then(parse_id))
    .ok_or_else(|| Error::malformed("tweet", "missing numeric id"))?;
  let user = author(node, base, source)?;

  let links: Vec<Link> = array(base, &["entities", "urls"])
    .iter()
    .filter_map(|url| {
      Some(Link {
        url: str_of(url, "url")?.to_string(),
        expanded_url: str_of(url, "expanded_url")?.to_string(),
        display_url: str_of(url, "display_url").map(str::to_string),
      })
    })
    .collect();

  let media = array(base, &["entities", "media"])
    .iter()
    .map(|item| parse_media(item, id))
    .collect::<Result<Vec<_>>>()?;
  let extended_media = array(base, &["extended_entities", "media"])
    .iter()
    .map(|item| parse_extended_media(item, id))
    .collect::<Result<Vec<_>>>()?;

  // a retweet's own text is truncated, the retweeted one is authoritative
  let text = match retweeted {
    Some(rt) => rt.content.as_str(),
    None => str_of(base, "full_text")
      .or_else(|| str_of(base, "text"))
      .unwrap_or_default(),
  };
  let content = normalize_text(text, &links, !extended_media.is_empty());

  let date = parse_date(&required_str(base, "created_at", "tweet")?)?;
  let source_html = str_of(base, "source").or_else(|| str_of(node, "source")).unwrap_or_default();

  Ok(TweetSummary {
    id,
    date,
    content,
    links,
    user,
    replies: count(base, "reply_count"),
    retweets: count(base, "retweet_count"),
    favorites: count(base, "favorite_count"),
    quotes: count(base, "quote_count"),
    conversation_id: base
      .get("conversation_id_str")
      .and_then(parse_id)
      .unwrap_or(id),
    language: str_of(base, "lang").map(str::to_string),
    source: strip_source(source_html),
    media,
    extended_media,
  })
}

/// a tweet on its own, ignoring anything it quotes or retweets
pub fn tweet_summary(node: &Value, source: TweetSource<'_>) -> Result<TweetSummary> {
  summary_with(node, source, None)
}

/// a tweet with its quoted and retweeted tweets resolved one level deep
pub fn common_tweet(node: &Value, source: TweetSource<'_>) -> Result<Tweet> {
  let base = legacy_block(node, source)?;
  let retweeted_tweet = nested(node, base, source, "retweeted")
    .map(|raw| tweet_summary(raw, source))
    .transpose()?;
  let quoted_tweet = nested(node, base, source, "quoted")
    .map(|raw| tweet_summary(raw, source))
    .transpose()?;
  let summary = summary_with(node, source, retweeted_tweet.as_ref())?;
  Ok(Tweet {
    summary,
    retweeted_tweet,
    quoted_tweet,
  })
}
