//! Cache namespaces and region keys.

use std::fmt;

/// The fixed set of cached resource classes, one per environmental adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceClass {
  Weather,
  UvIndex,
  AirQuality,
  Earthquakes,
}

impl ResourceClass {
  pub const ALL: [ResourceClass; 4] = [
    ResourceClass::Weather,
    ResourceClass::UvIndex,
    ResourceClass::AirQuality,
    ResourceClass::Earthquakes,
  ];

  /// Region-partitioned classes fan out one request per province.
  /// Earthquakes come from a single global feed.
  pub fn is_region_partitioned(self) -> bool {
    !matches!(self, ResourceClass::Earthquakes)
  }

  pub fn name(self) -> &'static str {
    match self {
      ResourceClass::Weather => "weather",
      ResourceClass::UvIndex => "uv",
      ResourceClass::AirQuality => "air",
      ResourceClass::Earthquakes => "quakes",
    }
  }
}

impl fmt::Display for ResourceClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Opaque region identifier scoping a cache entry (e.g. "central", "global").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKey(String);

impl RegionKey {
  pub const GLOBAL: &'static str = "global";

  pub fn new(key: impl Into<String>) -> Self {
    Self(key.into().trim().to_lowercase())
  }

  /// Key used by resource classes with no per-region partitioning.
  pub fn global() -> Self {
    Self(Self::GLOBAL.to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for RegionKey {
  fn from(key: &str) -> Self {
    Self::new(key)
  }
}

impl fmt::Display for RegionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
