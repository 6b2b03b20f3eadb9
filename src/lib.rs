//! client for the web app's private graphql api
//!
//! endpoints move with every deploy, so the client mines the current query
//! ids and feature switches out of the site's own script bundles
//! ([`routes`]), keeps a guest token alive behind a bounded retry loop
//! ([`session`]) and folds the several response generations into one set
//! of entities ([`timeline`], [`types`]).

pub mod client;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod timeline;
pub mod transport;
pub mod tweets;
pub mod types;
pub mod v1_api;

pub use client::TwitterClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use routes::{Route, RouteMap, RouteRegistry};
pub use session::{AuthMode, CredentialManager, RequestOptions, DEFAULT_BEARER};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use tweets::query::{SearchMode, SearchPage, SearchPager};
pub use types::{
  Checked, Cursor, CursorDirection, CursorState, Entry, ExtendedMedia, Link, Media, MediaSize,
  MediaType, Tweet, TweetSummary, User, UserCounts, VideoMeta, VideoVariant,
};

#[cfg(test)]
mod test_util;
