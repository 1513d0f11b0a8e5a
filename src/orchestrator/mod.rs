//! Per-layer load coordination.
//!
//! The orchestrator decides cache-or-fetch, calls the environmental adapters
//! or the feature server, rebuilds the feature registry for editable layers
//! and hands finished data to the [`Renderer`]. Every load takes a generation
//! token; a load that completes after a newer one started is discarded
//! instead of rendered.

mod render;
mod state;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::{RegionKey, ResourceClass, SharedCache};
use crate::environment::{EnvironmentAdapters, ResultSet};
use crate::error::{FetchError, LayerError, WriteError};
use crate::layer::{EditableLayer, LayerKind};
use crate::registry::FeatureRegistries;
use crate::wfs::{Feature, FeatureDraft, LayerFilter, LonLat, WfsClient, WriteOutcome};

pub use render::{LayerData, Renderer};
pub use state::{LayerState, LayerStatus, LoadOutcome, LoadSource, WriteReport};

use state::LayerSlot;

#[cfg(test)]
pub use render::testing;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner {
  region: RegionKey,
  slots: BTreeMap<LayerKind, LayerSlot>,
}

/// A load in flight: which layer, under which token, for which inputs.
struct Ticket {
  layer: LayerKind,
  token: u64,
  region: RegionKey,
  filter: Option<LayerFilter>,
}

pub struct LayerOrchestrator {
  cache: SharedCache,
  registries: FeatureRegistries,
  adapters: EnvironmentAdapters,
  wfs: WfsClient,
  renderer: Arc<dyn Renderer>,
  inner: Mutex<Inner>,
}

impl LayerOrchestrator {
  pub fn new(
    cache: SharedCache,
    registries: FeatureRegistries,
    adapters: EnvironmentAdapters,
    wfs: WfsClient,
    renderer: Arc<dyn Renderer>,
    region: RegionKey,
  ) -> Self {
    Self {
      cache,
      registries,
      adapters,
      wfs,
      renderer,
      inner: Mutex::new(Inner {
        region,
        slots: LayerKind::ALL
          .iter()
          .map(|layer| (*layer, LayerSlot::default()))
          .collect(),
      }),
    }
  }

  // ==========================================================================
  // Activation
  // ==========================================================================

  /// Turn a layer on and load it.
  pub async fn activate(&self, layer: LayerKind) -> Result<LoadOutcome, LayerError> {
    self.with_slot(layer, |slot| slot.active = true);
    info!(%layer, "layer activated");
    self.load(layer).await
  }

  /// Turn a layer off: clears the display and the registry, keeps the cache,
  /// and makes any in-flight load stale.
  pub fn deactivate(&self, layer: LayerKind) {
    self.with_slot(layer, |slot| {
      slot.active = false;
      slot.state = LayerState::Inactive;
      slot.generation += 1;
      slot.records = 0;
    });
    if let Some(editable) = layer.editable() {
      lock(self.registries.for_layer(editable)).clear();
    }
    self.renderer.clear(layer);
    info!(%layer, "layer deactivated");
  }

  pub fn is_active(&self, layer: LayerKind) -> bool {
    self.with_slot(layer, |slot| slot.active)
  }

  // ==========================================================================
  // Loading
  // ==========================================================================

  /// Load a layer with its current region and filter.
  ///
  /// Environmental layers are served from the cache while it is valid.
  /// Only active layers are rendered.
  pub async fn load(&self, layer: LayerKind) -> Result<LoadOutcome, LayerError> {
    let ticket = self.begin(layer);
    match layer.editable() {
      Some(editable) => self.load_features(editable, ticket).await,
      None => self.load_environment(ticket).await,
    }
  }

  async fn load_environment(&self, ticket: Ticket) -> Result<LoadOutcome, LayerError> {
    let layer = ticket.layer;
    let Some(class) = layer.resource_class() else {
      return Err(LayerError::NotEditable(layer));
    };
    let key = if class.is_region_partitioned() {
      ticket.region.clone()
    } else {
      RegionKey::global()
    };

    let cached = {
      let mut cache = lock(&self.cache);
      if cache.is_valid(class, &key) {
        cache.get(class, &key).cloned()
      } else {
        None
      }
    };
    if let Some(data) = cached {
      return Ok(self.finish_environment(&ticket, &data, LoadSource::Cache));
    }

    debug!(%layer, region = %key, "cache miss, fetching");
    match self.adapters.for_class(class).fetch(&key).await {
      Ok(data) => {
        // Keyed by region, so even a stale result is correct to keep
        lock(&self.cache).set(class, key, data.clone());
        Ok(self.finish_environment(&ticket, &data, LoadSource::Network))
      }
      Err(source) => self.fail(&ticket, source),
    }
  }

  fn finish_environment(&self, ticket: &Ticket, data: &ResultSet, source: LoadSource) -> LoadOutcome {
    let Some(active) = self.complete(ticket, data.len()) else {
      return LoadOutcome::Superseded {
        layer: ticket.layer,
      };
    };
    if active {
      self.renderer.render(ticket.layer, LayerData::Environment(data));
    }
    LoadOutcome::Rendered {
      layer: ticket.layer,
      source,
      records: data.len(),
    }
  }

  async fn load_features(&self, layer: EditableLayer, ticket: Ticket) -> Result<LoadOutcome, LayerError> {
    let result = match &ticket.filter {
      Some(filter) => self.wfs.fetch_filtered(filter).await,
      None => self.wfs.fetch_features(layer).await,
    };

    let features = match result {
      Ok(features) => features,
      Err(source) => return self.fail(&ticket, source),
    };

    let Some(active) = self.complete(&ticket, features.len()) else {
      return Ok(LoadOutcome::Superseded {
        layer: ticket.layer,
      });
    };
    lock(self.registries.for_layer(layer)).rebuild(&features);
    if active {
      self.renderer.render(ticket.layer, LayerData::Features(&features));
    }

    Ok(LoadOutcome::Rendered {
      layer: ticket.layer,
      source: LoadSource::Network,
      records: features.len(),
    })
  }

  /// Start a load: bump the generation and capture the inputs.
  fn begin(&self, layer: LayerKind) -> Ticket {
    let mut inner = lock(&self.inner);
    let region = inner.region.clone();
    let slot = inner.slots.entry(layer).or_default();
    slot.generation += 1;
    if slot.active {
      slot.state = LayerState::Loading;
    }
    Ticket {
      layer,
      token: slot.generation,
      region,
      filter: slot.filter.clone(),
    }
  }

  /// Mark a load done if it is still current. Returns whether the layer is
  /// active, or `None` when the load is stale.
  fn complete(&self, ticket: &Ticket, records: usize) -> Option<bool> {
    let mut inner = lock(&self.inner);
    let slot = inner.slots.entry(ticket.layer).or_default();
    if slot.generation != ticket.token {
      debug!(layer = %ticket.layer, token = ticket.token, current = slot.generation, "discarding stale load");
      return None;
    }
    if slot.active {
      slot.state = LayerState::Loaded;
      slot.records = records;
    }
    Some(slot.active)
  }

  /// Record a failed load. The rendered layer is left as it was.
  fn fail(&self, ticket: &Ticket, source: FetchError) -> Result<LoadOutcome, LayerError> {
    {
      let mut inner = lock(&self.inner);
      let slot = inner.slots.entry(ticket.layer).or_default();
      if slot.generation != ticket.token {
        debug!(layer = %ticket.layer, error = %source, "stale load failed");
        return Ok(LoadOutcome::Superseded {
          layer: ticket.layer,
        });
      }
      if slot.active {
        slot.state = LayerState::Failed;
      }
    }

    if matches!(source, FetchError::AuthRequired) {
      warn!(layer = %ticket.layer, "authentication required");
    } else {
      warn!(layer = %ticket.layer, error = %source, "layer load failed");
    }
    Err(LayerError::Fetch {
      layer: ticket.layer,
      source,
    })
  }

  // ==========================================================================
  // Region and filters
  // ==========================================================================

  pub fn region(&self) -> RegionKey {
    lock(&self.inner).region.clone()
  }

  /// Switch region and return the active layers that now need a reload.
  pub fn select_region(&self, region: RegionKey) -> Vec<LayerKind> {
    let mut inner = lock(&self.inner);
    info!(from = %inner.region, to = %region, "region changed");
    inner.region = region;
    inner
      .slots
      .iter()
      .filter(|(layer, slot)| slot.active && layer.is_region_partitioned())
      .map(|(layer, _)| *layer)
      .collect()
  }

  /// Switch region and reload every active region-partitioned layer.
  pub async fn set_region(
    &self,
    region: RegionKey,
  ) -> Vec<(LayerKind, Result<LoadOutcome, LayerError>)> {
    let layers = self.select_region(region);
    let results = join_all(layers.iter().map(|layer| self.load(*layer))).await;
    layers.into_iter().zip(results).collect()
  }

  /// Store a filter for its layer and reload it.
  ///
  /// Filters always go to the server; they are never cached.
  pub async fn apply_filter(&self, filter: LayerFilter) -> Result<LoadOutcome, LayerError> {
    let layer = self.set_filter(filter);
    self.load(layer).await
  }

  /// Store a filter without loading; it applies from the next load.
  /// An empty filter clears.
  pub fn set_filter(&self, filter: LayerFilter) -> LayerKind {
    let layer = LayerKind::from(filter.layer());
    let filter = (!filter.is_empty()).then_some(filter);
    self.with_slot(layer, |slot| slot.filter = filter);
    layer
  }

  pub async fn clear_filter(&self, layer: EditableLayer) -> Result<LoadOutcome, LayerError> {
    let layer = LayerKind::from(layer);
    self.with_slot(layer, |slot| slot.filter = None);
    self.load(layer).await
  }

  pub fn filter(&self, layer: LayerKind) -> Option<LayerFilter> {
    self.with_slot(layer, |slot| slot.filter.clone())
  }

  // ==========================================================================
  // Edits
  // ==========================================================================

  /// A feature from the last load of `layer`.
  pub fn feature(&self, layer: LayerKind, id: &str) -> Result<Feature, LayerError> {
    let editable = layer.editable().ok_or(LayerError::NotEditable(layer))?;
    lock(self.registries.for_layer(editable))
      .get(id)
      .cloned()
      .ok_or_else(|| LayerError::FeatureNotFound {
        layer,
        id: id.to_string(),
      })
  }

  /// Identifiers currently loaded for `layer`.
  pub fn feature_ids(&self, layer: EditableLayer) -> Vec<String> {
    lock(self.registries.for_layer(layer))
      .ids()
      .into_iter()
      .map(String::from)
      .collect()
  }

  pub async fn create(&self, draft: &FeatureDraft, at: LonLat) -> Result<WriteReport, LayerError> {
    let layer = draft.layer();
    let outcome = self
      .wfs
      .create(draft, at)
      .await
      .map_err(|source| write_error(layer, source))?;
    Ok(self.after_write(layer, outcome).await)
  }

  /// Replace the properties and location of a loaded feature.
  pub async fn update(&self, id: &str, draft: &FeatureDraft, at: LonLat) -> Result<WriteReport, LayerError> {
    let layer = draft.layer();
    self.feature(layer.into(), id)?;
    let outcome = self
      .wfs
      .update(id, draft, at)
      .await
      .map_err(|source| write_error(layer, source))?;
    Ok(self.after_write(layer, outcome).await)
  }

  pub async fn delete(&self, layer: LayerKind, id: &str) -> Result<WriteReport, LayerError> {
    let editable = layer.editable().ok_or(LayerError::NotEditable(layer))?;
    self.feature(layer, id)?;
    let outcome = self
      .wfs
      .delete(editable, id)
      .await
      .map_err(|source| write_error(editable, source))?;
    Ok(self.after_write(editable, outcome).await)
  }

  /// A committed write invalidates the registry and forces a reload.
  async fn after_write(&self, layer: EditableLayer, outcome: WriteOutcome) -> WriteReport {
    if !outcome.success {
      return WriteReport {
        outcome,
        reload: None,
      };
    }

    lock(self.registries.for_layer(layer)).clear();
    let reload = self.load(layer.into()).await;
    WriteReport {
      outcome,
      reload: Some(reload),
    }
  }

  // ==========================================================================
  // Introspection
  // ==========================================================================

  pub fn state(&self, layer: LayerKind) -> LayerState {
    self.with_slot(layer, |slot| slot.state)
  }

  pub fn statuses(&self) -> Vec<LayerStatus> {
    let mut statuses: Vec<LayerStatus> = lock(&self.inner)
      .slots
      .iter()
      .map(|(layer, slot)| LayerStatus {
        layer: *layer,
        active: slot.active,
        state: slot.state,
        records: slot.records,
        unindexed: 0,
        filtered: slot.filter.is_some(),
      })
      .collect();

    // Registry locks are taken after the slot lock is released
    for status in &mut statuses {
      if let Some(editable) = status.layer.editable() {
        status.unindexed = lock(self.registries.for_layer(editable)).unindexed();
      }
    }
    statuses
  }

  pub fn cache_status(&self) -> BTreeMap<ResourceClass, usize> {
    lock(&self.cache).status()
  }

  pub fn clear_cache(&self, class: Option<ResourceClass>) {
    lock(&self.cache).clear(class);
  }

  fn with_slot<R>(&self, layer: LayerKind, f: impl FnOnce(&mut LayerSlot) -> R) -> R {
    let mut inner = lock(&self.inner);
    f(inner.slots.entry(layer).or_default())
  }
}

fn write_error(layer: EditableLayer, source: WriteError) -> LayerError {
  LayerError::Write {
    layer: layer.into(),
    source,
  }
}
