//! Current US AQI and particulates per province (Open-Meteo air quality).

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::api_types::ApiAirQualityResponse;
use super::fanout::fan_out;
use super::types::{AirQualityReading, ResultSet};
use super::{get_json, EnvironmentAdapter};
use crate::cache::{RegionKey, ResourceClass};
use crate::error::FetchError;
use crate::http::Transport;
use crate::region::Province;

pub struct AirQualityAdapter {
  transport: Arc<dyn Transport>,
  endpoint: Url,
}

impl AirQualityAdapter {
  pub fn new(transport: Arc<dyn Transport>, endpoint: Url) -> Self {
    Self {
      transport,
      endpoint,
    }
  }

  fn request_url(&self, province: &Province) -> Url {
    let mut url = self.endpoint.clone();
    url
      .query_pairs_mut()
      .append_pair("latitude", &province.lat.to_string())
      .append_pair("longitude", &province.lon.to_string())
      .append_pair("current", "pm10,pm2_5,us_aqi");
    url
  }

  async fn fetch_province(&self, province: Province) -> Result<AirQualityReading, FetchError> {
    let response: ApiAirQualityResponse =
      get_json(self.transport.as_ref(), &self.request_url(&province)).await?;

    response
      .into_reading(province)
      .ok_or_else(|| FetchError::Decode("missing `current` block".to_string()))
  }
}

#[async_trait]
impl EnvironmentAdapter for AirQualityAdapter {
  fn resource_class(&self) -> ResourceClass {
    ResourceClass::AirQuality
  }

  async fn fetch(&self, region: &RegionKey) -> Result<ResultSet, FetchError> {
    let readings = fan_out(self.resource_class(), region, |p| self.fetch_province(p)).await?;
    Ok(ResultSet::AirQuality(readings))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::environment::AqiBand;
  use crate::http::testing::{FakeReply, FakeTransport};
  use serde_json::json;

  fn aqi(value: f64) -> FakeReply {
    FakeReply::json(json!({ "current": { "us_aqi": value, "pm2_5": 12.0, "pm10": 20.0 } }))
  }

  #[tokio::test]
  async fn test_boundary_values_and_gaps() {
    let transport = Arc::new(
      FakeTransport::new()
        .on_get("latitude=7.1898", aqi(50.0))
        .on_get("latitude=7.8804", aqi(51.0))
        .on_get("latitude=9.1382", aqi(200.0))
        .on_get("latitude=8.4304", aqi(201.0))
        .on_get("latitude=8.0863", FakeReply::status(200, "<html>oops</html>")),
    );
    let adapter = AirQualityAdapter::new(
      transport,
      Url::parse("https://air-quality-api.open-meteo.com/v1/air-quality").unwrap(),
    );

    let ResultSet::AirQuality(readings) = adapter.fetch(&"south".into()).await.unwrap() else {
      panic!("expected air quality records");
    };

    let bands: Vec<AqiBand> = readings.iter().map(|r| r.band).collect();
    assert_eq!(
      bands,
      vec![
        AqiBand::Good,
        AqiBand::Moderate,
        AqiBand::VeryUnhealthy,
        AqiBand::Hazardous
      ]
    );
    assert_eq!(readings[0].marker_radius(), 6.0);
  }
}
