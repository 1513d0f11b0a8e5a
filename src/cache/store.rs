//! Cache store keyed by (resource class, region).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::key::{RegionKey, ResourceClass};
use crate::environment::ResultSet;

/// Handle shared by every orchestrator in the process.
///
/// Never hold the lock across an `.await`.
pub type SharedCache = Arc<Mutex<CacheStore>>;

/// A cached result set and the moment it was stored.
#[derive(Debug, Clone)]
struct CacheEntry {
  data: ResultSet,
  timestamp: Instant,
}

/// Time-expiring store with one namespace per resource class.
#[derive(Debug)]
pub struct CacheStore {
  duration: Duration,
  namespaces: HashMap<ResourceClass, HashMap<RegionKey, CacheEntry>>,
}

impl CacheStore {
  /// Default lifetime of a cache entry.
  pub const DEFAULT_DURATION: Duration = Duration::from_secs(5 * 60);

  pub fn new(duration: Duration) -> Self {
    Self {
      duration,
      namespaces: HashMap::new(),
    }
  }

  pub fn shared(duration: Duration) -> SharedCache {
    Arc::new(Mutex::new(Self::new(duration)))
  }

  /// Whether a live entry exists for the key.
  ///
  /// An expired entry is deleted as a side effect.
  pub fn is_valid(&mut self, class: ResourceClass, region: &RegionKey) -> bool {
    let Some(namespace) = self.namespaces.get_mut(&class) else {
      return false;
    };
    let Some(entry) = namespace.get(region) else {
      return false;
    };

    if entry.timestamp.elapsed() >= self.duration {
      debug!(%class, %region, "cache entry expired, evicting");
      namespace.remove(region);
      return false;
    }

    debug!(%class, %region, records = entry.data.len(), "cache hit");
    true
  }

  /// Cached payload without a validity check; call [`Self::is_valid`] first.
  pub fn get(&self, class: ResourceClass, region: &RegionKey) -> Option<&ResultSet> {
    self
      .namespaces
      .get(&class)
      .and_then(|namespace| namespace.get(region))
      .map(|entry| &entry.data)
  }

  /// Store `data`, replacing any existing entry with a fresh timestamp.
  pub fn set(&mut self, class: ResourceClass, region: RegionKey, data: ResultSet) {
    debug_assert_eq!(class, data.resource_class());
    debug!(%class, %region, records = data.len(), "cached result set");
    self.namespaces.entry(class).or_default().insert(
      region,
      CacheEntry {
        data,
        timestamp: Instant::now(),
      },
    );
  }

  /// Drop one namespace, or every namespace when `class` is `None`.
  pub fn clear(&mut self, class: Option<ResourceClass>) {
    match class {
      Some(class) => {
        self.namespaces.remove(&class);
        debug!(%class, "cleared cache namespace");
      }
      None => {
        self.namespaces.clear();
        debug!("cleared all cache namespaces");
      }
    }
  }

  /// Number of stored entries per resource class (expired ones included until read).
  pub fn status(&self) -> BTreeMap<ResourceClass, usize> {
    ResourceClass::ALL
      .iter()
      .map(|class| {
        let count = self.namespaces.get(class).map(HashMap::len).unwrap_or(0);
        (*class, count)
      })
      .collect()
  }
}

impl Default for CacheStore {
  fn default() -> Self {
    Self::new(Self::DEFAULT_DURATION)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::environment::{Earthquake, ResultSet};

  fn quakes(n: usize) -> ResultSet {
    ResultSet::Earthquakes((0..n).map(|i| Earthquake::sample(&format!("eq{}", i))).collect())
  }

  #[tokio::test(start_paused = true)]
  async fn test_valid_immediately_after_set() {
    let mut cache = CacheStore::new(Duration::from_secs(300));
    let global = RegionKey::global();

    assert!(!cache.is_valid(ResourceClass::Earthquakes, &global));

    cache.set(ResourceClass::Earthquakes, global.clone(), quakes(3));
    assert!(cache.is_valid(ResourceClass::Earthquakes, &global));
    assert_eq!(cache.get(ResourceClass::Earthquakes, &global).map(ResultSet::len), Some(3));
  }

  #[tokio::test(start_paused = true)]
  async fn test_expired_entry_is_evicted_on_read() {
    let mut cache = CacheStore::new(Duration::from_secs(300));
    let global = RegionKey::global();
    cache.set(ResourceClass::Earthquakes, global.clone(), quakes(1));

    tokio::time::advance(Duration::from_secs(299)).await;
    assert!(cache.is_valid(ResourceClass::Earthquakes, &global));

    // Exactly at the duration boundary the entry is no longer valid
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(!cache.is_valid(ResourceClass::Earthquakes, &global));
    assert!(cache.get(ResourceClass::Earthquakes, &global).is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_get_does_not_check_expiry() {
    let mut cache = CacheStore::new(Duration::from_secs(10));
    let global = RegionKey::global();
    cache.set(ResourceClass::Earthquakes, global.clone(), quakes(2));

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(cache.get(ResourceClass::Earthquakes, &global).is_some());
  }

  #[tokio::test(start_paused = true)]
  async fn test_set_refreshes_timestamp() {
    let mut cache = CacheStore::new(Duration::from_secs(300));
    let global = RegionKey::global();
    cache.set(ResourceClass::Earthquakes, global.clone(), quakes(1));

    tokio::time::advance(Duration::from_secs(200)).await;
    cache.set(ResourceClass::Earthquakes, global.clone(), quakes(4));

    tokio::time::advance(Duration::from_secs(200)).await;
    assert!(cache.is_valid(ResourceClass::Earthquakes, &global));
    assert_eq!(cache.get(ResourceClass::Earthquakes, &global).map(ResultSet::len), Some(4));
  }

  #[test]
  fn test_namespaces_are_independent() {
    let mut cache = CacheStore::default();
    let central = RegionKey::new("central");
    cache.set(ResourceClass::Weather, central.clone(), ResultSet::Weather(Vec::new()));
    cache.set(ResourceClass::AirQuality, central.clone(), ResultSet::AirQuality(Vec::new()));

    assert!(cache.get(ResourceClass::UvIndex, &central).is_none());

    cache.clear(Some(ResourceClass::Weather));
    assert!(cache.get(ResourceClass::Weather, &central).is_none());
    assert!(cache.get(ResourceClass::AirQuality, &central).is_some());

    cache.clear(None);
    assert!(cache.get(ResourceClass::AirQuality, &central).is_none());
  }

  #[test]
  fn test_status_counts_entries_per_class() {
    let mut cache = CacheStore::default();
    cache.set(ResourceClass::Weather, "central".into(), ResultSet::Weather(Vec::new()));
    cache.set(ResourceClass::Weather, "north".into(), ResultSet::Weather(Vec::new()));
    cache.set(ResourceClass::Earthquakes, RegionKey::global(), quakes(0));

    let status = cache.status();
    assert_eq!(status[&ResourceClass::Weather], 2);
    assert_eq!(status[&ResourceClass::UvIndex], 0);
    assert_eq!(status[&ResourceClass::Earthquakes], 1);
  }
}
