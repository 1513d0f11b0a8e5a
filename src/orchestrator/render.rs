use crate::environment::ResultSet;
use crate::layer::LayerKind;
use crate::wfs::Feature;

/// What a finished load hands to the renderer.
#[derive(Debug, Clone, Copy)]
pub enum LayerData<'a> {
  Environment(&'a ResultSet),
  Features(&'a [Feature]),
}

impl LayerData<'_> {
  pub fn len(&self) -> usize {
    match self {
      LayerData::Environment(set) => set.len(),
      LayerData::Features(features) => features.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      LayerData::Environment(set) => set.is_empty(),
      LayerData::Features(features) => features.is_empty(),
    }
  }
}

/// Display boundary. Implementations must not block.
pub trait Renderer: Send + Sync {
  /// Replace whatever is shown for `layer` with `data`.
  fn render(&self, layer: LayerKind, data: LayerData<'_>);

  /// Remove `layer` from the display.
  fn clear(&self, layer: LayerKind);
}

#[cfg(test)]
pub mod testing {
  use std::sync::Mutex;

  use super::*;

  #[derive(Debug, Clone, PartialEq)]
  pub enum Drawn {
    Render {
      layer: LayerKind,
      records: usize,
      /// Province names for environmental data, feature ids otherwise
      labels: Vec<String>,
    },
    Clear(LayerKind),
  }

  /// Records every call for assertions.
  #[derive(Default)]
  pub struct RecordingRenderer {
    drawn: Mutex<Vec<Drawn>>,
  }

  impl RecordingRenderer {
    pub fn drawn(&self) -> Vec<Drawn> {
      self.drawn.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn renders(&self, layer: LayerKind) -> Vec<Drawn> {
      self
        .drawn()
        .into_iter()
        .filter(|d| matches!(d, Drawn::Render { layer: l, .. } if *l == layer))
        .collect()
    }
  }

  impl Renderer for RecordingRenderer {
    fn render(&self, layer: LayerKind, data: LayerData<'_>) {
      let labels = match data {
        LayerData::Environment(set) => set.provinces().into_iter().map(String::from).collect(),
        LayerData::Features(features) => features.iter().filter_map(Feature::identifier).collect(),
      };
      self.drawn.lock().expect("renderer lock").push(Drawn::Render {
        layer,
        records: data.len(),
        labels,
      });
    }

    fn clear(&self, layer: LayerKind) {
      self.drawn.lock().expect("renderer lock").push(Drawn::Clear(layer));
    }
  }
}
