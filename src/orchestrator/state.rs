use std::fmt;

use crate::error::LayerError;
use crate::layer::LayerKind;
use crate::wfs::{LayerFilter, WriteOutcome};

/// Lifecycle of one layer. A failed load leaves the previous render in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerState {
  #[default]
  Inactive,
  Loading,
  Loaded,
  Failed,
}

impl fmt::Display for LayerState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      LayerState::Inactive => "inactive",
      LayerState::Loading => "loading",
      LayerState::Loaded => "loaded",
      LayerState::Failed => "failed",
    })
  }
}

/// Per-layer bookkeeping owned by the orchestrator.
#[derive(Debug, Clone, Default)]
pub(crate) struct LayerSlot {
  pub active: bool,
  pub state: LayerState,
  /// Bumped by every load and deactivation; a load whose token no longer
  /// matches on completion is stale.
  pub generation: u64,
  pub filter: Option<LayerFilter>,
  pub records: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
  Network,
  Cache,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
  /// Data was handed to the renderer (or, for an inactive layer, indexed only).
  Rendered {
    layer: LayerKind,
    source: LoadSource,
    records: usize,
  },
  /// A newer load or a deactivation started while this one was in flight.
  Superseded { layer: LayerKind },
}

/// Result of a write and the reload it triggered.
#[derive(Debug)]
pub struct WriteReport {
  pub outcome: WriteOutcome,
  /// `None` when the server rejected the write and nothing was reloaded
  pub reload: Option<Result<LoadOutcome, LayerError>>,
}

/// Snapshot for status displays.
#[derive(Debug, Clone)]
pub struct LayerStatus {
  pub layer: LayerKind,
  pub active: bool,
  pub state: LayerState,
  pub records: usize,
  /// Loaded features without an identifier, which cannot be edited
  pub unindexed: usize,
  pub filtered: bool,
}
