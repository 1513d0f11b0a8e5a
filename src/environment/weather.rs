//! Current weather and 24-hour forecast per province (Open-Meteo).

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::api_types::ApiForecastResponse;
use super::fanout::fan_out;
use super::types::{ResultSet, WeatherReading};
use super::{get_json, EnvironmentAdapter};
use crate::cache::{RegionKey, ResourceClass};
use crate::error::FetchError;
use crate::http::Transport;
use crate::region::Province;

const CURRENT_FIELDS: &str =
  "temperature_2m,precipitation,weathercode,windspeed_10m,relativehumidity_2m";
const HOURLY_FIELDS: &str =
  "temperature_2m,precipitation_probability,precipitation,weathercode,windspeed_10m";

pub struct WeatherAdapter {
  transport: Arc<dyn Transport>,
  endpoint: Url,
  timezone: String,
}

impl WeatherAdapter {
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
      .append_pair("current", CURRENT_FIELDS)
      .append_pair("hourly", HOURLY_FIELDS)
      .append_pair("timezone", &self.timezone)
      .append_pair("forecast_days", "2");
    url
  }

  async fn fetch_province(&self, province: Province) -> Result<WeatherReading, FetchError> {
    let response: ApiForecastResponse =
      get_json(self.transport.as_ref(), &self.request_url(&province)).await?;

    response
      .into_weather(province)
      .ok_or_else(|| FetchError::Decode("missing `current` block".to_string()))
  }
}

#[async_trait]
impl EnvironmentAdapter for WeatherAdapter {
  fn resource_class(&self) -> ResourceClass {
    ResourceClass::Weather
  }

  async fn fetch(&self, region: &RegionKey) -> Result<ResultSet, FetchError> {
    let readings = fan_out(self.resource_class(), region, |p| self.fetch_province(p)).await?;
    Ok(ResultSet::Weather(readings))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::testing::{FakeReply, FakeTransport, Method};
  use serde_json::json;

  fn current(temp: f64, code: u32) -> FakeReply {
    FakeReply::json(json!({
      "current": { "temperature_2m": temp, "weathercode": code, "windspeed_10m": 5.0 }
    }))
  }

  fn adapter(transport: Arc<FakeTransport>) -> WeatherAdapter {
    WeatherAdapter::new(
      transport,
      Url::parse("https://api.open-meteo.com/v1/forecast").unwrap(),
      "Asia/Bangkok",
    )
  }

  #[tokio::test]
  async fn test_missing_current_drops_only_that_province() {
    let transport = Arc::new(
      FakeTransport::new()
        .on_get("latitude=13.7563", current(33.0, 0))
        .on_get("latitude=13.8621", current(32.0, 2))
        .on_get("latitude=14.0208", FakeReply::json(json!({ "hourly": {} })))
        .on_get("latitude=14.3692", current(31.0, 63))
        .on_get("latitude=13.8199", current(30.0, 95)),
    );

    let result = adapter(transport.clone())
      .fetch(&"central".into())
      .await
      .unwrap();

    assert_eq!(result.len(), 4);
    assert_eq!(
      result.provinces(),
      vec!["Bangkok", "Nonthaburi", "Phra Nakhon Si Ayutthaya", "Nakhon Pathom"]
    );
    assert_eq!(transport.count(Method::Get, "api.open-meteo.com"), 5);

    let ResultSet::Weather(readings) = result else {
      panic!("expected weather records");
    };
    assert_eq!(readings[2].band.label(), "rain");
    assert_eq!(readings[3].band.label(), "thunderstorm");
  }

  #[tokio::test]
  async fn test_network_error_and_http_error_are_gaps() {
    let transport = Arc::new(
      FakeTransport::new()
        .on_get("latitude=13.7563", FakeReply::network_error("connection reset"))
        .on_get("latitude=13.8621", FakeReply::status(502, "bad gateway"))
        .on_get("latitude=", current(29.0, 1)),
    );

    let result = adapter(transport).fetch(&"central".into()).await.unwrap();
    assert_eq!(result.len(), 3);
  }

  #[test]
  fn test_request_carries_coordinates_and_timezone() {
    let adapter = adapter(Arc::new(FakeTransport::new()));
    let url = adapter.request_url(&Province {
      name: "Bangkok",
      lat: 13.7563,
      lon: 100.5018,
    });
    let query = url.query().unwrap_or_default();

    assert!(query.contains("latitude=13.7563"));
    assert!(query.contains("longitude=100.5018"));
    assert!(query.contains("timezone=Asia%2FBangkok"));
    assert!(query.contains("forecast_days=2"));
  }
}
