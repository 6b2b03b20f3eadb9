use std::time::Duration;

use super::token_cache::temp_path;
use super::{TokenCache, TokenRecord};

#[test]
fn record_uses_short_keys() {
  let record = TokenRecord::new("123", 1_700_000_000);
  let json = serde_json::to_value(&record).unwrap();
  assert_eq!(json, serde_json::json!({ "tk": "123", "st": 1_700_000_000 }));
}

#[test]
fn freshness_window_is_inclusive() {
  let record = TokenRecord::new("123", 1_000);
  let window = Duration::from_secs(10_800);
  assert!(record.is_fresh(1_000, window));
  assert!(record.is_fresh(11_800, window));
  assert!(!record.is_fresh(11_801, window));
  // a record from the future is not trusted
  assert!(!record.is_fresh(999, window));
}

#[tokio::test]
async fn store_then_load() {
  let dir = tempfile::tempdir().unwrap();
  let cache = TokenCache::new(Some(dir.path().join("nested").join("token.json")));
  assert_eq!(cache.load().await, None);

  let record = TokenRecord::new("987654321", 42);
  cache.store(&record).await.unwrap();
  assert_eq!(cache.load().await, Some(record));
}

#[tokio::test]
async fn garbage_file_reads_as_empty() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("token.json");
  std::fs::write(&path, "not json").unwrap();
  let cache = TokenCache::new(Some(path));
  assert_eq!(cache.load().await, None);
}

#[tokio::test]
async fn disabled_cache_is_a_no_op() {
  let cache = TokenCache::disabled();
  cache.store(&TokenRecord::new("1", 1)).await.unwrap();
  assert_eq!(cache.load().await, None);
  assert!(cache.path().is_none());
}

#[test]
fn temp_names_differ_per_write() {
  let path = std::path::Path::new("/tmp/cache/token.json");
  let first = temp_path(path);
  let second = temp_path(path);
  assert_ne!(first, second);
  assert_eq!(first.parent(), path.parent());
}

#[tokio::test]
async fn concurrent_writers_sharing_a_path_all_succeed() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("token.json");
  let caches: Vec<TokenCache> = (0..8).map(|_| TokenCache::new(Some(path.clone()))).collect();

  let writes = caches
    .iter()
    .enumerate()
    .map(|(i, cache)| async move { cache.store(&TokenRecord::new(i.to_string(), i as i64)).await });
  for result in futures::future::join_all(writes).await {
    result.unwrap();
  }

  let record = caches[0].load().await.unwrap();
  assert!(record.token.parse::<usize>().unwrap() < 8);
  // no temp files are left behind
  assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
