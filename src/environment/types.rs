//! Renderable records produced by the environmental adapters.

use chrono::{DateTime, Utc};

use super::classify::{AqiBand, DepthBand, MagnitudeTier, UvBand, WeatherBand};
use crate::cache::ResourceClass;
use crate::region::Province;

/// Current conditions for one province
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
  pub province: Province,
  pub temperature_c: i32,
  pub weather_code: i64,
  pub band: WeatherBand,
  pub humidity_pct: Option<f64>,
  pub wind_speed_kmh: Option<i32>,
  pub precipitation_mm: f64,
  pub observed_at: Option<String>,
  pub timezone: String,
  /// Up to 24 upcoming hours
  pub hourly: Vec<HourlyForecast>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecast {
  pub time: String,
  pub temperature_c: i32,
  pub precipitation_probability: f64,
  pub precipitation_mm: f64,
  pub wind_speed_kmh: i32,
  pub band: WeatherBand,
}

/// Daily maximum UV index for one province
#[derive(Debug, Clone, PartialEq)]
pub struct UvReading {
  pub province: Province,
  pub uv_index: f64,
  pub clear_sky_uv_index: Option<f64>,
  pub band: UvBand,
}

impl UvReading {
  pub fn marker_radius(&self) -> f64 {
    8.0 + self.uv_index * 0.8
  }
}

/// Current air quality for one province
#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityReading {
  pub province: Province,
  pub aqi: u32,
  pub pm2_5: f64,
  pub pm10: f64,
  pub band: AqiBand,
}

impl AirQualityReading {
  pub fn marker_radius(&self) -> f64 {
    (f64::from(self.aqi) / 10.0).clamp(6.0, 20.0)
  }
}

/// One event from the seismic feed
#[derive(Debug, Clone, PartialEq)]
pub struct Earthquake {
  pub id: Option<String>,
  pub magnitude: f64,
  pub place: String,
  pub time: Option<DateTime<Utc>>,
  pub depth_km: f64,
  pub lon: f64,
  pub lat: f64,
  pub tsunami: bool,
  pub depth_band: DepthBand,
  pub magnitude_tier: MagnitudeTier,
}

impl Earthquake {
  pub fn marker_radius(&self) -> f64 {
    (self.magnitude * 2.5).max(4.0)
  }

  #[cfg(test)]
  pub fn sample(id: &str) -> Self {
    Self {
      id: Some(id.to_string()),
      magnitude: 4.2,
      place: "somewhere".to_string(),
      time: None,
      depth_km: 10.0,
      lon: 100.0,
      lat: 13.0,
      tsunami: false,
      depth_band: DepthBand::Shallow,
      magnitude_tier: MagnitudeTier::Moderate,
    }
  }
}

/// Decoded, classified output of one adapter fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultSet {
  Weather(Vec<WeatherReading>),
  UvIndex(Vec<UvReading>),
  AirQuality(Vec<AirQualityReading>),
  Earthquakes(Vec<Earthquake>),
}

impl ResultSet {
  pub fn resource_class(&self) -> ResourceClass {
    match self {
      ResultSet::Weather(_) => ResourceClass::Weather,
      ResultSet::UvIndex(_) => ResourceClass::UvIndex,
      ResultSet::AirQuality(_) => ResourceClass::AirQuality,
      ResultSet::Earthquakes(_) => ResourceClass::Earthquakes,
    }
  }

  pub fn len(&self) -> usize {
    match self {
      ResultSet::Weather(r) => r.len(),
      ResultSet::UvIndex(r) => r.len(),
      ResultSet::AirQuality(r) => r.len(),
      ResultSet::Earthquakes(r) => r.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Province names in record order; empty for earthquakes.
  #[cfg(test)]
  pub fn provinces(&self) -> Vec<&'static str> {
    match self {
      ResultSet::Weather(r) => r.iter().map(|x| x.province.name).collect(),
      ResultSet::UvIndex(r) => r.iter().map(|x| x.province.name).collect(),
      ResultSet::AirQuality(r) => r.iter().map(|x| x.province.name).collect(),
      ResultSet::Earthquakes(_) => Vec::new(),
    }
  }
}
