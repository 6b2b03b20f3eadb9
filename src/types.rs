//! canonical entities every response shape is normalized into

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/* --------------------------------- users --------------------------------- */

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounts {
  pub followers: u64,
  pub friends: u64,
  pub statuses: u64,
  pub favourites: u64,
  pub listed: u64,
  pub media: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  /// screen name, without the `@`
  pub username: String,
  pub display_name: Option<String>,
  /// bio with its shortened links expanded
  pub description: String,
  pub id: u64,
  pub verified: bool,
  /// `Legacy`, `Blue`, `Business`, ... when verified
  pub verified_type: Option<String>,
  pub counts: UserCounts,
  pub created: Option<DateTime<Utc>>,
  pub location: Option<String>,
  pub protected: bool,
  /// homepage link from the profile
  pub link_url: Option<String>,
  /// 400x400 variant of the avatar
  pub profile_image_url: Option<String>,
  pub profile_banner_url: Option<String>,
}

impl User {
  /// a user known only by name and id
  pub fn blank(username: impl Into<String>, id: u64) -> Self {
    Self {
      username: username.into(),
      display_name: None,
      description: String::new(),
      id,
      verified: false,
      verified_type: None,
      counts: UserCounts::default(),
      created: None,
      location: None,
      protected: false,
      link_url: None,
      profile_image_url: None,
      profile_banner_url: None,
    }
  }

  pub fn url(&self) -> String {
    format!("https://twitter.com/{}", self.username)
  }
}

/* --------------------------------- media --------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
  Photo,
  Video,
  AnimatedGif,
}

impl MediaType {
  /// `None` for anything the host has not been seen sending
  pub fn parse(kind: &str) -> Option<Self> {
    match kind {
      "photo" => Some(Self::Photo),
      "video" => Some(Self::Video),
      "animated_gif" => Some(Self::AnimatedGif),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Photo => "photo",
      Self::Video => "video",
      Self::AnimatedGif => "animated_gif",
    }
  }

  /// videos and gifs both carry a `video_info` block
  pub fn is_playable(&self) -> bool {
    matches!(self, Self::Video | Self::AnimatedGif)
  }
}

impl fmt::Display for MediaType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// size variants the media cdn serves for images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSize {
  Orig,
  Large,
  Medium,
  Small,
}

impl MediaSize {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Orig => "orig",
      Self::Large => "large",
      Self::Medium => "medium",
      Self::Small => "small",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
  /// `pic.twitter.com/..` as shown in the text
  pub display_url: String,
  pub expanded_url: String,
  pub id: u64,
  /// direct cdn url of the image or video thumbnail
  pub media_url: String,
  #[serde(rename = "type")]
  pub kind: MediaType,
  /// opaque feature bag, passed through untouched
  #[serde(default)]
  pub features: Map<String, Value>,
  /// `{ width, height, focus_rects }` of the original upload
  #[serde(default)]
  pub original_info: Value,
}

impl Media {
  /// `<media_url>:<size>`, only defined for photos and gifs
  pub fn sized_url(&self, size: MediaSize) -> Option<String> {
    match self.kind {
      MediaType::Photo | MediaType::AnimatedGif => Some(format!("{}:{}", self.media_url, size.as_str())),
      MediaType::Video => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoVariant {
  /// absent on the adaptive (m3u8) variant
  pub bitrate: Option<u64>,
  pub content_type: String,
  pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
  /// width:height
  pub aspect: (u64, u64),
  /// seconds; gifs have none and report 0
  pub duration: f64,
  pub variants: Vec<VideoVariant>,
}

impl VideoMeta {
  /// mp4 variant with the highest bitrate
  pub fn best_variant(&self) -> Option<&VideoVariant> {
    self
      .variants
      .iter()
      .filter(|v| v.bitrate.is_some())
      .max_by_key(|v| v.bitrate)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedMedia {
  #[serde(flatten)]
  pub media: Media,
  #[serde(default)]
  pub availability: Value,
  pub color: Option<Value>,
  /// only for videos and gifs
  pub video: Option<VideoMeta>,
}

impl Deref for ExtendedMedia {
  type Target = Media;

  fn deref(&self) -> &Media {
    &self.media
  }
}

/* --------------------------------- tweets -------------------------------- */

/// a url entity from the tweet text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
  /// the t.co short link
  pub url: String,
  pub expanded_url: String,
  pub display_url: Option<String>,
}

/// a tweet without nested tweets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetSummary {
  pub id: u64,
  pub date: DateTime<Utc>,
  pub content: String,
  pub links: Vec<Link>,
  pub user: User,
  pub replies: u64,
  pub retweets: u64,
  pub favorites: u64,
  pub quotes: u64,
  pub conversation_id: u64,
  pub language: Option<String>,
  /// client name, html stripped
  pub source: String,
  pub media: Vec<Media>,
  pub extended_media: Vec<ExtendedMedia>,
}

impl TweetSummary {
  pub fn url(&self) -> String {
    format!("https://twitter.com/{}/status/{}", self.user.username, self.id)
  }
}

/// a tweet with its retweeted and quoted tweets resolved one level deep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
  #[serde(flatten)]
  pub summary: TweetSummary,
  pub retweeted_tweet: Option<TweetSummary>,
  pub quoted_tweet: Option<TweetSummary>,
}

impl Tweet {
  pub fn retweeted(&self) -> Option<&TweetSummary> {
    self.retweeted_tweet.as_ref()
  }

  pub fn quoted(&self) -> Option<&TweetSummary> {
    self.quoted_tweet.as_ref()
  }

  pub fn into_summary(self) -> TweetSummary {
    self.summary
  }
}

impl Deref for Tweet {
  type Target = TweetSummary;

  fn deref(&self) -> &TweetSummary {
    &self.summary
  }
}

/* --------------------------------- cursors ------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
  Top,
  Bottom,
}

impl CursorDirection {
  /// from a `cursorType` field, compared case-insensitively
  pub fn parse(cursor_type: &str) -> Option<Self> {
    match cursor_type.to_lowercase().as_str() {
      "top" => Some(Self::Top),
      "bottom" => Some(Self::Bottom),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
  pub direction: CursorDirection,
  /// opaque, sent back as the `cursor` variable
  pub value: String,
}

/// last cursor seen in each direction while walking a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorState {
  pub top: Option<Cursor>,
  pub bottom: Option<Cursor>,
}

impl CursorState {
  pub fn record(&mut self, cursor: Cursor) {
    match cursor.direction {
      CursorDirection::Top => self.top = Some(cursor),
      CursorDirection::Bottom => self.bottom = Some(cursor),
    }
  }

  pub fn bottom_value(&self) -> Option<&str> {
    self.bottom.as_ref().map(|c| c.value.as_str())
  }

  pub fn top_value(&self) -> Option<&str> {
    self.top.as_ref().map(|c| c.value.as_str())
  }
}

/* --------------------------------- entries ------------------------------- */

/// one item of a normalized timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
  Tweet { tweet: Box<Tweet>, user: User },
  /// deleted or withheld tweet, only its id survives
  Tombstone { id: u64 },
  Cursor(Cursor),
}

impl Entry {
  pub fn tweet(tweet: Tweet) -> Self {
    let user = tweet.user.clone();
    Self::Tweet {
      tweet: Box::new(tweet),
      user,
    }
  }

  pub fn as_tweet(&self) -> Option<&Tweet> {
    match self {
      Self::Tweet { tweet, .. } => Some(&**tweet),
      _ => None,
    }
  }

  pub fn into_tweet(self) -> Option<Tweet> {
    match self {
      Self::Tweet { tweet, .. } => Some(*tweet),
      _ => None,
    }
  }

  /// tweets and tombstones, the entries a limit counts
  pub fn is_item(&self) -> bool {
    !matches!(self, Self::Cursor(_))
  }
}

/* ------------------------------- diagnostics ----------------------------- */

/// a result plus the feature switches the route asked for that the request
/// did not send
#[derive(Debug, Clone, PartialEq)]
pub struct Checked<T> {
  pub value: T,
  pub missing_features: Vec<String>,
}

impl<T> Checked<T> {
  pub fn new(value: T, missing_features: Vec<String>) -> Self {
    Self {
      value,
      missing_features,
    }
  }

  pub fn is_complete(&self) -> bool {
    self.missing_features.is_empty()
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Checked<U> {
    Checked {
      value: f(self.value),
      missing_features: self.missing_features,
    }
  }

  pub fn into_inner(self) -> T {
    self.value
  }
}
