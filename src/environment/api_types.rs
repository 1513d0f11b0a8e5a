//! Serde-deserializable types matching the environmental provider responses.
//!
//! Every field is optional: the providers omit blocks freely, and a missing
//! block is a per-record gap rather than a decode failure.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::classify::{AqiBand, DepthBand, MagnitudeTier, UvBand, WeatherBand};
use super::types::{AirQualityReading, Earthquake, HourlyForecast, UvReading, WeatherReading};
use crate::region::Province;

const HOURLY_LIMIT: usize = 24;

// ============================================================================
// Open-Meteo forecast endpoint (weather and UV)
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiForecastResponse {
  pub current: Option<ApiCurrentWeather>,
  pub hourly: Option<ApiHourly>,
  pub daily: Option<ApiDaily>,
  pub timezone_abbreviation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiCurrentWeather {
  pub time: Option<String>,
  pub temperature_2m: Option<f64>,
  pub precipitation: Option<f64>,
  pub weathercode: Option<f64>,
  pub windspeed_10m: Option<f64>,
  pub relativehumidity_2m: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiHourly {
  #[serde(default)]
  pub time: Vec<String>,
  #[serde(default)]
  pub temperature_2m: Vec<Option<f64>>,
  #[serde(default)]
  pub precipitation_probability: Vec<Option<f64>>,
  #[serde(default)]
  pub precipitation: Vec<Option<f64>>,
  #[serde(default)]
  pub weathercode: Vec<Option<f64>>,
  #[serde(default)]
  pub windspeed_10m: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiDaily {
  pub uv_index_max: Option<Vec<Option<f64>>>,
  pub uv_index_clear_sky_max: Option<Vec<Option<f64>>>,
}

// ============================================================================
// Open-Meteo air quality endpoint
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiAirQualityResponse {
  pub current: Option<ApiAirCurrent>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiAirCurrent {
  pub us_aqi: Option<f64>,
  pub pm2_5: Option<f64>,
  pub pm10: Option<f64>,
}

// ============================================================================
// USGS GeoJSON summary feed
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiQuakeFeed {
  /// Kept untyped so one malformed point does not sink the feed
  pub features: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiQuakeFeature {
  pub id: Option<String>,
  #[serde(default)]
  pub properties: ApiQuakeProperties,
  pub geometry: Option<ApiQuakeGeometry>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiQuakeProperties {
  pub mag: Option<f64>,
  pub place: Option<String>,
  /// Milliseconds since the Unix epoch
  pub time: Option<i64>,
  pub tsunami: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiQuakeGeometry {
  #[serde(default)]
  pub coordinates: Vec<f64>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiForecastResponse {
  /// Current conditions; `None` when the `current` block or its core fields are missing.
  pub fn into_weather(self, province: Province) -> Option<WeatherReading> {
    let current = self.current?;
    let temperature = current.temperature_2m?;
    let code = current.weathercode?.round() as i64;

    Some(WeatherReading {
      province,
      temperature_c: temperature.round() as i32,
      weather_code: code,
      band: WeatherBand::classify(code),
      humidity_pct: current.relativehumidity_2m,
      wind_speed_kmh: current.windspeed_10m.map(|w| w.round() as i32),
      precipitation_mm: current.precipitation.unwrap_or(0.0),
      observed_at: current.time,
      timezone: self
        .timezone_abbreviation
        .unwrap_or_else(|| "GMT+7".to_string()),
      hourly: self.hourly.map(ApiHourly::into_forecast).unwrap_or_default(),
    })
  }

  /// Today's maximum UV index; `None` when the `daily` block or its first value is missing.
  pub fn into_uv(self, province: Province) -> Option<UvReading> {
    let daily = self.daily?;
    let uv_index = daily.uv_index_max?.first().copied().flatten()?;
    let clear_sky_uv_index = daily
      .uv_index_clear_sky_max
      .and_then(|values| values.first().copied().flatten());

    Some(UvReading {
      province,
      uv_index,
      clear_sky_uv_index,
      band: UvBand::classify(uv_index),
    })
  }
}

impl ApiHourly {
  fn into_forecast(self) -> Vec<HourlyForecast> {
    let value = |series: &[Option<f64>], i: usize| series.get(i).copied().flatten().unwrap_or(0.0);

    self
      .time
      .iter()
      .take(HOURLY_LIMIT)
      .enumerate()
      .map(|(i, time)| {
        let code = value(&self.weathercode, i).round() as i64;
        HourlyForecast {
          time: time.clone(),
          temperature_c: value(&self.temperature_2m, i).round() as i32,
          precipitation_probability: value(&self.precipitation_probability, i),
          precipitation_mm: value(&self.precipitation, i),
          wind_speed_kmh: value(&self.windspeed_10m, i).round() as i32,
          band: WeatherBand::classify(code),
        }
      })
      .collect()
  }
}

impl ApiAirQualityResponse {
  /// `None` when the `current` block is missing.
  pub fn into_reading(self, province: Province) -> Option<AirQualityReading> {
    let current = self.current?;
    let aqi = current.us_aqi.map(|v| v.round().max(0.0) as u32).unwrap_or(0);

    Some(AirQualityReading {
      province,
      aqi,
      pm2_5: one_decimal(current.pm2_5),
      pm10: one_decimal(current.pm10),
      band: AqiBand::classify(f64::from(aqi)),
    })
  }
}

impl ApiQuakeFeature {
  /// `None` when the point has no usable coordinates.
  pub fn into_earthquake(self) -> Option<Earthquake> {
    let coords = self.geometry?.coordinates;
    let (lon, lat) = (*coords.first()?, *coords.get(1)?);
    let depth_km = coords.get(2).copied().unwrap_or(0.0);
    let magnitude = self.properties.mag.unwrap_or(0.0);

    Some(Earthquake {
      id: self.id,
      magnitude,
      place: self
        .properties
        .place
        .unwrap_or_else(|| "Unknown".to_string()),
      time: self
        .properties
        .time
        .and_then(DateTime::<Utc>::from_timestamp_millis),
      depth_km,
      lon,
      lat,
      tsunami: self.properties.tsunami == Some(1),
      depth_band: DepthBand::classify(depth_km),
      magnitude_tier: MagnitudeTier::classify(magnitude),
    })
  }
}

fn one_decimal(value: Option<f64>) -> f64 {
  value.map(|v| (v * 10.0).round() / 10.0).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  const BANGKOK: Province = Province {
    name: "Bangkok",
    lat: 13.7563,
    lon: 100.5018,
  };

  #[test]
  fn test_weather_without_current_is_a_gap() {
    let response: ApiForecastResponse =
      serde_json::from_value(json!({ "hourly": { "time": [] } })).unwrap();
    assert!(response.into_weather(BANGKOK).is_none());
  }

  #[test]
  fn test_weather_reading_rounds_and_limits_hourly() {
    let times: Vec<String> = (0..48).map(|h| format!("2026-10-18T{:02}:00", h % 24)).collect();
    let response: ApiForecastResponse = serde_json::from_value(json!({
      "timezone_abbreviation": "ICT",
      "current": {
        "time": "2026-10-18T10:00",
        "temperature_2m": 31.6,
        "weathercode": 61,
        "windspeed_10m": 12.4,
        "relativehumidity_2m": 70
      },
      "hourly": {
        "time": times,
        "temperature_2m": [30.2],
        "weathercode": [95]
      }
    }))
    .unwrap();

    let reading = response.into_weather(BANGKOK).unwrap();
    assert_eq!(reading.temperature_c, 32);
    assert_eq!(reading.band, WeatherBand::Rain);
    assert_eq!(reading.wind_speed_kmh, Some(12));
    assert_eq!(reading.precipitation_mm, 0.0);
    assert_eq!(reading.timezone, "ICT");
    assert_eq!(reading.hourly.len(), 24);
    assert_eq!(reading.hourly[0].band, WeatherBand::Thunderstorm);
    // Short series default to zero rather than panicking
    assert_eq!(reading.hourly[1].temperature_c, 0);
  }

  #[test]
  fn test_uv_requires_first_daily_value() {
    let missing: ApiForecastResponse =
      serde_json::from_value(json!({ "daily": { "uv_index_max": [null] } })).unwrap();
    assert!(missing.into_uv(BANGKOK).is_none());

    let present: ApiForecastResponse = serde_json::from_value(json!({
      "daily": { "uv_index_max": [9.45], "uv_index_clear_sky_max": [10.1] }
    }))
    .unwrap();
    let reading = present.into_uv(BANGKOK).unwrap();
    assert_eq!(reading.band, UvBand::VeryHigh);
    assert_eq!(reading.clear_sky_uv_index, Some(10.1));
  }

  #[test]
  fn test_air_quality_rounding() {
    let response: ApiAirQualityResponse = serde_json::from_value(json!({
      "current": { "us_aqi": 150.4, "pm2_5": 55.56, "pm10": 80.04 }
    }))
    .unwrap();
    let reading = response.into_reading(BANGKOK).unwrap();
    assert_eq!(reading.aqi, 150);
    assert_eq!(reading.band, AqiBand::Unhealthy);
    assert_eq!(reading.pm2_5, 55.6);
    assert_eq!(reading.pm10, 80.0);
    assert_eq!(reading.marker_radius(), 15.0);
  }

  #[test]
  fn test_quake_feature_conversion() {
    let feature: ApiQuakeFeature = serde_json::from_value(json!({
      "id": "us7000abcd",
      "properties": { "mag": 6.3, "place": "Off the coast", "time": 1760000000000i64, "tsunami": 1 },
      "geometry": { "coordinates": [142.1, 38.2, 350.0] }
    }))
    .unwrap();
    let quake = feature.into_earthquake().unwrap();
    assert_eq!(quake.depth_band, DepthBand::Deep);
    assert_eq!(quake.magnitude_tier, MagnitudeTier::Major);
    assert!(quake.tsunami);
    assert!(quake.time.is_some());
    assert_eq!(quake.marker_radius(), 6.3 * 2.5);
  }

  #[test]
  fn test_quake_without_geometry_is_skipped() {
    let feature: ApiQuakeFeature =
      serde_json::from_value(json!({ "id": "x", "properties": { "mag": 2.0 } })).unwrap();
    assert!(feature.into_earthquake().is_none());
  }
}
