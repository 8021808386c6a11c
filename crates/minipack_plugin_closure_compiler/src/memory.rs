use std::{any::Any, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};

/// The pipeline phase that wrote a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Source,
  Chunk,
}

type Payload = Arc<dyn Any + Send + Sync>;

#[derive(Clone)]
struct MemoryRecord {
  value: Payload,
  phase: Phase,
}

/// Per-build store of artifacts that one transform stage leaves for another.
///
/// Records never expire while the build runs; the whole store is dropped at the next build start.
#[derive(Default)]
pub struct Memory {
  records: DashMap<String, MemoryRecord>,
}

impl Memory {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
    let value = Arc::clone(&self.records.get(key)?.value);
    value.downcast::<T>().ok()
  }

  /// Last write wins.
  pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T, phase: Phase) {
    self.records.insert(key.into(), MemoryRecord { value: Arc::new(value), phase });
  }

  /// Returns the record under `key`, computing and storing it first if absent or of another type.
  /// `compute` runs without holding any lock, so it may read the store itself.
  pub fn get_or_insert_with<T: Any + Send + Sync>(
    &self,
    key: impl Into<String>,
    phase: Phase,
    compute: impl FnOnce() -> T,
  ) -> Arc<T> {
    let key = key.into();
    if let Some(value) = self.get::<T>(&key) {
      return value;
    }

    let value = Arc::new(compute());
    let record = MemoryRecord { value: Arc::clone(&value) as Payload, phase };
    match self.records.entry(key) {
      Entry::Occupied(mut occupied) => {
        // Another task got there first, keep its value.
        if let Ok(existing) = Arc::clone(&occupied.get().value).downcast::<T>() {
          return existing;
        }
        occupied.insert(record);
      }
      Entry::Vacant(vacant) => {
        vacant.insert(record);
      }
    }
    value
  }

  pub fn remove(&self, key: &str) -> bool {
    self.records.remove(key).is_some()
  }

  pub fn phase(&self, key: &str) -> Option<Phase> {
    self.records.get(key).map(|record| record.phase)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.records.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

impl std::fmt::Debug for Memory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut keys = self.records.iter().map(|record| record.key().clone()).collect::<Vec<_>>();
    keys.sort_unstable();
    f.debug_struct("Memory").field("keys", &keys).finish()
  }
}
