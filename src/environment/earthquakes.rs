//! Rolling 7-day global earthquake feed (USGS).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::api_types::{ApiQuakeFeature, ApiQuakeFeed};
use super::types::ResultSet;
use super::{get_json, EnvironmentAdapter};
use crate::cache::{RegionKey, ResourceClass};
use crate::error::FetchError;
use crate::http::Transport;

/// Single-request adapter; the region key is ignored.
pub struct EarthquakeAdapter {
  transport: Arc<dyn Transport>,
  feed: Url,
}

impl EarthquakeAdapter {
  pub fn new(transport: Arc<dyn Transport>, feed: Url) -> Self {
    Self { transport, feed }
  }
}

#[async_trait]
impl EnvironmentAdapter for EarthquakeAdapter {
  fn resource_class(&self) -> ResourceClass {
    ResourceClass::Earthquakes
  }

  async fn fetch(&self, _region: &RegionKey) -> Result<ResultSet, FetchError> {
    let feed: ApiQuakeFeed = get_json(self.transport.as_ref(), &self.feed).await?;
    let features = feed
      .features
      .ok_or_else(|| FetchError::Decode("missing `features` array".to_string()))?;

    let total = features.len();
    let quakes: Vec<_> = features
      .into_iter()
      .filter_map(|value| serde_json::from_value::<ApiQuakeFeature>(value).ok())
      .filter_map(ApiQuakeFeature::into_earthquake)
      .collect();

    debug!(total, usable = quakes.len(), "decoded earthquake feed");
    Ok(ResultSet::Earthquakes(quakes))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::environment::{DepthBand, MagnitudeTier};
  use crate::http::testing::{FakeReply, FakeTransport};
  use serde_json::json;

  fn adapter(transport: FakeTransport) -> EarthquakeAdapter {
    EarthquakeAdapter::new(
      Arc::new(transport),
      Url::parse("https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson")
        .unwrap(),
    )
  }

  #[tokio::test]
  async fn test_each_point_is_classified() {
    let feed = json!({
      "type": "FeatureCollection",
      "features": [
        { "id": "a", "properties": { "mag": 2.1 }, "geometry": { "coordinates": [100.0, 13.0, 5.0] } },
        { "id": "b", "properties": { "mag": 4.5 }, "geometry": { "coordinates": [120.0, 20.0, 150.0] } },
        { "id": "c", "properties": { "mag": 7.0 }, "geometry": { "coordinates": [140.0, 35.0, 420.0] } },
        { "id": "broken", "properties": "not an object" },
        { "id": "nogeom", "properties": { "mag": 1.0 } }
      ]
    });
    let quakes = adapter(FakeTransport::new().on_get("all_week", FakeReply::json(feed)))
      .fetch(&RegionKey::global())
      .await
      .unwrap();

    let ResultSet::Earthquakes(quakes) = quakes else {
      panic!("expected earthquakes");
    };
    assert_eq!(quakes.len(), 3);
    assert_eq!(quakes[0].depth_band, DepthBand::Shallow);
    assert_eq!(quakes[1].depth_band, DepthBand::Intermediate);
    assert_eq!(quakes[2].depth_band, DepthBand::Deep);
    assert_eq!(quakes[1].magnitude_tier, MagnitudeTier::Moderate);
    assert_eq!(quakes[2].magnitude_tier, MagnitudeTier::Major);
  }

  #[tokio::test]
  async fn test_missing_features_fails_the_load() {
    let result = adapter(FakeTransport::new().on_get("all_week", FakeReply::json(json!({ "type": "x" }))))
      .fetch(&RegionKey::global())
      .await;

    assert!(matches!(result, Err(FetchError::Decode(_))));
  }

  #[tokio::test]
  async fn test_network_failure_propagates() {
    let result = adapter(FakeTransport::new().on_get("all_week", FakeReply::network_error("dns")))
      .fetch(&RegionKey::global())
      .await;

    assert!(matches!(result, Err(FetchError::Transport(_))));
  }
}
