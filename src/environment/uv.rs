//! Daily maximum UV index per province (Open-Meteo).

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::api_types::ApiForecastResponse;
use super::fanout::fan_out;
use super::types::{ResultSet, UvReading};
use super::{get_json, EnvironmentAdapter};
use crate::cache::{RegionKey, ResourceClass};
use crate::error::FetchError;
use crate::http::Transport;
use crate::region::Province;

pub struct UvAdapter {
  transport: Arc<dyn Transport>,
  endpoint: Url,
  timezone: String,
}

impl UvAdapter {
  pub fn new(transport: Arc<dyn Transport>, endpoint: Url, timezone: &str) -> Self {
    Self {
      transport,
      endpoint,
      timezone: timezone.to_string(),
    }
  }

  fn request_url(&self, province: &Province) -> Url {
    let mut url = self.endpoint.clone();
    url
      .query_pairs_mut()
      .append_pair("latitude", &province.lat.to_string())
      .append_pair("longitude", &province.lon.to_string())
      .append_pair("daily", "uv_index_max,uv_index_clear_sky_max")
      .append_pair("timezone", &self.timezone)
      .append_pair("forecast_days", "1");
    url
  }

  async fn fetch_province(&self, province: Province) -> Result<UvReading, FetchError> {
    let response: ApiForecastResponse =
      get_json(self.transport.as_ref(), &self.request_url(&province)).await?;

    response
      .into_uv(province)
      .ok_or_else(|| FetchError::Decode("missing `daily.uv_index_max`".to_string()))
  }
}

#[async_trait]
impl EnvironmentAdapter for UvAdapter {
  fn resource_class(&self) -> ResourceClass {
    ResourceClass::UvIndex
  }

  async fn fetch(&self, region: &RegionKey) -> Result<ResultSet, FetchError> {
    let readings = fan_out(self.resource_class(), region, |p| self.fetch_province(p)).await?;
    Ok(ResultSet::UvIndex(readings))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::environment::UvBand;
  use crate::http::testing::{FakeReply, FakeTransport};
  use serde_json::json;

  #[tokio::test]
  async fn test_uv_bands_per_province() {
    let transport = Arc::new(
      FakeTransport::new()
        .on_get(
          "latitude=12.6814",
          FakeReply::json(json!({ "daily": { "uv_index_max": [11.2] } })),
        )
        .on_get(
          "latitude=12.2428",
          FakeReply::json(json!({ "daily": { "uv_index_max": [] } })),
        )
        .on_get(
          "latitude=",
          FakeReply::json(json!({ "daily": { "uv_index_max": [2.5], "uv_index_clear_sky_max": [4.0] } })),
        ),
    );
    let adapter = UvAdapter::new(
      transport,
      Url::parse("https://api.open-meteo.com/v1/forecast").unwrap(),
      "Asia/Bangkok",
    );

    let ResultSet::UvIndex(readings) = adapter.fetch(&"east".into()).await.unwrap() else {
      panic!("expected uv records");
    };

    let names: Vec<&str> = readings.iter().map(|r| r.province.name).collect();
    assert_eq!(names, vec!["Chon Buri", "Rayong", "Chanthaburi"]);
    assert_eq!(readings[0].band, UvBand::Low);
    assert_eq!(readings[0].clear_sky_uv_index, Some(4.0));
    assert_eq!(readings[1].band, UvBand::Extreme);
    assert_eq!(readings[1].clear_sky_uv_index, None);
  }
}
