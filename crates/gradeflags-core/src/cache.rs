//! Request-scoped memoization.
//!
//! A [`RequestCache`] is created at the start of one request (or any other
//! logical call context) and dropped at its end. Nothing is shared between
//! requests, so there is no invalidation: a fresh cache sees fresh rows.

use std::{
  collections::HashMap,
  future::Future,
  hash::Hash,
  sync::{Mutex, MutexGuard, PoisonError},
};

/// A memo map keyed by call arguments.
///
/// The inner lock is never held across an await point.
#[derive(Debug)]
pub struct RequestCache<K, V> {
  entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for RequestCache<K, V> {
  fn default() -> Self { Self { entries: Mutex::new(HashMap::new()) } }
}

impl<K, V> RequestCache<K, V>
where
  K: Eq + Hash,
  V: Clone,
{
  pub fn new() -> Self { Self::default() }

  pub fn get(&self, key: &K) -> Option<V> { self.lock().get(key).cloned() }

  pub fn insert(&self, key: K, value: V) { self.lock().insert(key, value); }

  pub fn len(&self) -> usize { self.lock().len() }

  pub fn is_empty(&self) -> bool { self.lock().is_empty() }

  /// Return the cached value for `key`, or await `f` and cache its result.
  ///
  /// Errors are returned to the caller and not cached, so a later call with
  /// the same key tries again.
  pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, f: F) -> Result<V, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
  {
    if let Some(hit) = self.get(&key) {
      return Ok(hit);
    }
    let value = f().await?;
    self.insert(key, value.clone());
    Ok(value)
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<K, V>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
