//! credential lifecycle: bearer resolution, guest token renewal and the
//! retrying request path every composer goes through

mod manager;
mod token_cache;

pub use manager::{
  AuthMode, Clock, CredentialManager, RequestOptions, SystemClock, DEFAULT_BEARER,
};
pub use token_cache::{TokenCache, TokenRecord};

#[cfg(test)]
mod token_cache_test;
