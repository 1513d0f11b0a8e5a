//! Dashboard layer identities.

use std::fmt;
use std::str::FromStr;

use crate::cache::ResourceClass;

/// Every layer the dashboard can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
  Hospitals,
  Students,
  Weather,
  UvIndex,
  AirQuality,
  Earthquakes,
}

/// Layers backed by the feature server that support create/update/delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableLayer {
  Hospitals,
  Students,
}

impl LayerKind {
  pub const ALL: [LayerKind; 6] = [
    LayerKind::Hospitals,
    LayerKind::Students,
    LayerKind::Weather,
    LayerKind::UvIndex,
    LayerKind::AirQuality,
    LayerKind::Earthquakes,
  ];

  /// Cache namespace for environmental layers; `None` for editable ones.
  pub fn resource_class(self) -> Option<ResourceClass> {
    match self {
      LayerKind::Weather => Some(ResourceClass::Weather),
      LayerKind::UvIndex => Some(ResourceClass::UvIndex),
      LayerKind::AirQuality => Some(ResourceClass::AirQuality),
      LayerKind::Earthquakes => Some(ResourceClass::Earthquakes),
      LayerKind::Hospitals | LayerKind::Students => None,
    }
  }

  pub fn editable(self) -> Option<EditableLayer> {
    match self {
      LayerKind::Hospitals => Some(EditableLayer::Hospitals),
      LayerKind::Students => Some(EditableLayer::Students),
      _ => None,
    }
  }

  /// Whether a region change re-keys this layer's data.
  pub fn is_region_partitioned(self) -> bool {
    self
      .resource_class()
      .map(ResourceClass::is_region_partitioned)
      .unwrap_or(false)
  }

  pub fn name(self) -> &'static str {
    match self {
      LayerKind::Hospitals => "hospitals",
      LayerKind::Students => "students",
      LayerKind::Weather => "weather",
      LayerKind::UvIndex => "uv",
      LayerKind::AirQuality => "air",
      LayerKind::Earthquakes => "quakes",
    }
  }
}

impl fmt::Display for LayerKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for LayerKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "hospitals" | "hospital" | "h" => Ok(LayerKind::Hospitals),
      "students" | "student" | "s" => Ok(LayerKind::Students),
      "weather" | "w" => Ok(LayerKind::Weather),
      "uv" | "uv-index" | "uvindex" => Ok(LayerKind::UvIndex),
      "air" | "air-quality" | "aqi" => Ok(LayerKind::AirQuality),
      "quakes" | "earthquakes" | "eq" => Ok(LayerKind::Earthquakes),
      other => Err(format!(
        "unknown layer '{}' (expected one of: hospitals, students, weather, uv, air, quakes)",
        other
      )),
    }
  }
}

impl From<EditableLayer> for LayerKind {
  fn from(layer: EditableLayer) -> Self {
    match layer {
      EditableLayer::Hospitals => LayerKind::Hospitals,
      EditableLayer::Students => LayerKind::Students,
    }
  }
}

impl fmt::Display for EditableLayer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    LayerKind::from(*self).fmt(f)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_aliases() {
    assert_eq!("AQI".parse::<LayerKind>(), Ok(LayerKind::AirQuality));
    assert_eq!("earthquakes".parse::<LayerKind>(), Ok(LayerKind::Earthquakes));
    assert_eq!("hospital".parse::<LayerKind>(), Ok(LayerKind::Hospitals));
    assert!("rivers".parse::<LayerKind>().is_err());
  }

  #[test]
  fn test_only_feature_layers_are_editable() {
    for layer in LayerKind::ALL {
      assert_eq!(layer.editable().is_some(), layer.resource_class().is_none());
    }
  }

  #[test]
  fn test_region_partitioning() {
    assert!(LayerKind::Weather.is_region_partitioned());
    assert!(LayerKind::AirQuality.is_region_partitioned());
    assert!(!LayerKind::Earthquakes.is_region_partitioned());
    assert!(!LayerKind::Hospitals.is_region_partitioned());
  }
}
