use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

// distinguishes concurrent writers inside one process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// the single persisted record: `{ "tk": <token>, "st": <unix seconds> }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
  #[serde(rename = "tk")]
  pub token: String,
  #[serde(rename = "st")]
  pub stored_at: i64,
}

impl TokenRecord {
  pub fn new(token: impl Into<String>, stored_at: i64) -> Self {
    Self {
      token: token.into(),
      stored_at,
    }
  }

  /// still inside the validity window at `now`
  pub fn is_fresh(&self, now: i64, validity: Duration) -> bool {
    let age = now.saturating_sub(self.stored_at);
    age >= 0 && (age as u64) <= validity.as_secs()
  }
}

/// file holding the guest token record, shared by every client pointed at
/// the same path (last writer wins)
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
  path: Option<PathBuf>,
}

impl TokenCache {
  pub fn new(path: Option<PathBuf>) -> Self {
    Self { path }
  }

  pub fn disabled() -> Self {
    Self { path: None }
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  /// read the record, a missing or unreadable file is just "no token"
  pub async fn load(&self) -> Option<TokenRecord> {
    let path = self.path.as_ref()?;
    let text = match tokio::fs::read_to_string(path).await {
      Ok(text) => text,
      Err(e) => {
        debug!(path = %path.display(), error = %e, "no token cache");
        return None;
      }
    };
    match serde_json::from_str(&text) {
      Ok(record) => Some(record),
      Err(e) => {
        debug!(path = %path.display(), error = %e, "ignoring unreadable token cache");
        None
      }
    }
  }

  /// write through a temp file + rename so concurrent readers never see a
  /// half written record
  pub async fn store(&self, record: &TokenRecord) -> Result<()> {
    let Some(path) = self.path.as_ref() else {
      return Ok(());
    };
    if let Some(dir) = path.parent() {
      tokio::fs::create_dir_all(dir).await?;
    }
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, serde_json::to_vec(record)?).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), "token cache written");
    Ok(())
  }
}

/// sibling of `path` unique to this process and this write
pub(super) fn temp_path(path: &Path) -> PathBuf {
  let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
  path.with_extension(format!("tmp{}-{seq}", std::process::id()))
}
