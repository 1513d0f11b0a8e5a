//! Per-layer index from feature identifier to the last loaded feature.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::layer::EditableLayer;
use crate::wfs::Feature;

/// Handle to one layer's registry. Never hold the lock across an `.await`.
pub type SharedRegistry = Arc<Mutex<FeatureRegistry>>;

/// One registry per editable layer, constructed once and handed to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistries {
  hospitals: SharedRegistry,
  students: SharedRegistry,
}

impl FeatureRegistries {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn for_layer(&self, layer: EditableLayer) -> &SharedRegistry {
    match layer {
      EditableLayer::Hospitals => &self.hospitals,
      EditableLayer::Students => &self.students,
    }
  }
}

/// Always exactly the most recent load of one editable layer.
///
/// Never patched in place: a write is followed by a full reload and rebuild.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
  features: HashMap<String, Feature>,
  /// Features in the last load that had no identifier
  unindexed: usize,
}

impl FeatureRegistry {
  /// Replace the whole index with `features`.
  pub fn rebuild(&mut self, features: &[Feature]) {
    self.features.clear();
    self.unindexed = 0;

    for feature in features {
      match feature.identifier() {
        Some(id) => {
          self.features.insert(id, feature.clone());
        }
        None => self.unindexed += 1,
      }
    }

    debug!(
      indexed = self.features.len(),
      unindexed = self.unindexed,
      "rebuilt feature registry"
    );
  }

  pub fn get(&self, id: &str) -> Option<&Feature> {
    self.features.get(id)
  }

  pub fn clear(&mut self) {
    self.features.clear();
    self.unindexed = 0;
  }

  pub fn unindexed(&self) -> usize {
    self.unindexed
  }

  /// Sorted identifiers, for listing.
  pub fn ids(&self) -> Vec<&str> {
    let mut ids: Vec<&str> = self.features.keys().map(String::as_str).collect();
    ids.sort_unstable();
    ids
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn feature(value: serde_json::Value) -> Feature {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_rebuild_replaces_everything() {
    let mut registry = FeatureRegistry::default();
    registry.rebuild(&[
      feature(json!({ "id": "hospitals.1", "properties": {} })),
      feature(json!({ "id": "hospitals.2", "properties": {} })),
    ]);
    assert_eq!(registry.ids().len(), 2);

    registry.rebuild(&[
      feature(json!({ "id": "hospitals.2", "properties": { "name_en": "new" } })),
      feature(json!({ "id": "hospitals.3", "properties": {} })),
    ]);

    assert!(registry.get("hospitals.1").is_none());
    assert_eq!(
      registry.get("hospitals.2").and_then(|f| f.property("name_en")),
      Some("new".to_string())
    );
    assert_eq!(registry.ids(), vec!["hospitals.2", "hospitals.3"]);
  }

  #[test]
  fn test_features_without_identifier_are_skipped() {
    let mut registry = FeatureRegistry::default();
    registry.rebuild(&[
      feature(json!({ "properties": { "name": "anonymous" } })),
      feature(json!({ "properties": { "id": 7 } })),
    ]);

    assert_eq!(registry.ids().len(), 1);
    assert_eq!(registry.unindexed(), 1);
    assert!(registry.get("7").is_some());
  }

  #[test]
  fn test_clear() {
    let mut registry = FeatureRegistry::default();
    registry.rebuild(&[feature(json!({ "id": "a", "properties": {} }))]);
    registry.clear();
    assert!(registry.ids().is_empty());
    assert!(registry.get("a").is_none());
  }
}
