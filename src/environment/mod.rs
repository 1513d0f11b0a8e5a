//! Remote fetch adapters for the read-only environmental layers.
//!
//! Each adapter builds its outbound request(s), decodes the provider's JSON
//! defensively and produces a classified [`ResultSet`]. Adapters never touch
//! the cache; the orchestrator consults it before calling them.

mod air_quality;
mod api_types;
mod classify;
mod earthquakes;
mod fanout;
mod types;
mod uv;
mod weather;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::cache::{RegionKey, ResourceClass};
use crate::config::EnvironmentConfig;
use crate::error::{ConfigError, FetchError};
use crate::http::Transport;

pub use air_quality::AirQualityAdapter;
pub use earthquakes::EarthquakeAdapter;
pub use types::{
  AirQualityReading, Earthquake, HourlyForecast, ResultSet, UvReading, WeatherReading,
};
pub use uv::UvAdapter;
pub use weather::WeatherAdapter;

#[cfg(test)]
pub use classify::{AqiBand, DepthBand, MagnitudeTier, UvBand, WeatherBand};

/// A fetcher for one resource class.
#[async_trait]
pub trait EnvironmentAdapter: Send + Sync {
  fn resource_class(&self) -> ResourceClass;

  /// Fetch a fresh result set for `region`. Global classes ignore the key.
  async fn fetch(&self, region: &RegionKey) -> Result<ResultSet, FetchError>;
}

/// One adapter per resource class.
#[derive(Clone)]
pub struct EnvironmentAdapters {
  pub weather: Arc<dyn EnvironmentAdapter>,
  pub uv_index: Arc<dyn EnvironmentAdapter>,
  pub air_quality: Arc<dyn EnvironmentAdapter>,
  pub earthquakes: Arc<dyn EnvironmentAdapter>,
}

impl EnvironmentAdapters {
  pub fn new(transport: Arc<dyn Transport>, config: &EnvironmentConfig) -> Result<Self, ConfigError> {
    let forecast = ConfigError::parse_url(&config.forecast_url)?;
    let air_quality = ConfigError::parse_url(&config.air_quality_url)?;
    let feed = ConfigError::parse_url(&config.earthquake_feed_url)?;

    Ok(Self {
      weather: Arc::new(WeatherAdapter::new(
        transport.clone(),
        forecast.clone(),
        &config.timezone,
      )),
      uv_index: Arc::new(UvAdapter::new(transport.clone(), forecast, &config.timezone)),
      air_quality: Arc::new(AirQualityAdapter::new(transport.clone(), air_quality)),
      earthquakes: Arc::new(EarthquakeAdapter::new(transport, feed)),
    })
  }

  pub fn for_class(&self, class: ResourceClass) -> &Arc<dyn EnvironmentAdapter> {
    match class {
      ResourceClass::Weather => &self.weather,
      ResourceClass::UvIndex => &self.uv_index,
      ResourceClass::AirQuality => &self.air_quality,
      ResourceClass::Earthquakes => &self.earthquakes,
    }
  }
}

/// GET `url` and decode a JSON body, failing on non-2xx.
async fn get_json<T: DeserializeOwned>(transport: &dyn Transport, url: &Url) -> Result<T, FetchError> {
  let response = transport.get(url).await?;
  if !response.is_success() {
    return Err(FetchError::Status {
      status: response.status,
    });
  }

  serde_json::from_str(&response.body).map_err(|e| FetchError::Decode(e.to_string()))
}
