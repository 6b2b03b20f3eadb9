//! response normalization: turns the legacy adaptive, graphql and rest
//! payload shapes into [`crate::types`] entities and walks paginated
//! timelines

mod entries;
mod iter;
mod parsing;

pub use entries::{classify, unpack_cursor, unpack_tweet, EntryKind};
pub use iter::{iter_timeline, TimelineEntries};
pub use parsing::{
  common_tweet, graphql_tweet_node, graphql_user, make_user, normalize_text, parse_date,
  parse_extended_media, parse_id, parse_media, strip_source, tweet_summary, TweetSource,
};

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod iter_test;
