//! Terminal implementation of the renderer boundary.

use std::io::{self, Write};

use crate::environment::{
  AirQualityReading, Earthquake, HourlyForecast, ResultSet, UvReading, WeatherReading,
};
use crate::layer::LayerKind;
use crate::orchestrator::{LayerData, Renderer};
use crate::wfs::Feature;

/// Forecast hours shown per province, every third hour of the next day
const FORECAST_STEP: usize = 3;

/// Prints each rendered layer as a block of lines on stdout.
#[derive(Debug, Default)]
pub struct ConsoleRenderer;

impl ConsoleRenderer {
  pub fn new() -> Self {
    Self
  }
}

impl Renderer for ConsoleRenderer {
  fn render(&self, layer: LayerKind, data: LayerData<'_>) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "── {} ({} records)", layer, data.len());
    if data.is_empty() {
      let _ = writeln!(out, "   (no records)");
      return;
    }
    for line in format_lines(data) {
      let _ = writeln!(out, "   {}", line);
    }
  }

  fn clear(&self, layer: LayerKind) {
    let _ = writeln!(io::stdout().lock(), "── {} cleared", layer);
  }
}

/// Display lines for a layer; weather records take two lines each.
pub fn format_lines(data: LayerData<'_>) -> Vec<String> {
  match data {
    LayerData::Environment(ResultSet::Weather(readings)) => readings.iter().flat_map(weather_lines).collect(),
    LayerData::Environment(ResultSet::UvIndex(readings)) => readings.iter().map(uv_line).collect(),
    LayerData::Environment(ResultSet::AirQuality(readings)) => readings.iter().map(air_line).collect(),
    LayerData::Environment(ResultSet::Earthquakes(quakes)) => quakes.iter().map(quake_line).collect(),
    LayerData::Features(features) => features.iter().map(feature_line).collect(),
  }
}

/// Map marker hint: fill color and radius in pixels.
fn marker(color: &str, radius: f64) -> String {
  format!("marker {} r{:.1}", color, radius)
}

fn weather_lines(r: &WeatherReading) -> Vec<String> {
  let mut line = format!(
    "{:<26} {:>3}°C  {} (code {})  rain {:.1} mm",
    r.province.name,
    r.temperature_c,
    r.band.label(),
    r.weather_code,
    r.precipitation_mm
  );
  if let Some(wind) = r.wind_speed_kmh {
    line.push_str(&format!("  wind {} km/h", wind));
  }
  if let Some(humidity) = r.humidity_pct {
    line.push_str(&format!("  humidity {:.0}%", humidity));
  }
  if let Some(observed) = &r.observed_at {
    line.push_str(&format!("  at {} {}", observed, r.timezone));
  }

  let mut lines = vec![line];
  if !r.hourly.is_empty() {
    let forecast: Vec<String> = r.hourly.iter().step_by(FORECAST_STEP).map(forecast_entry).collect();
    lines.push(format!("  next 24h: {}", forecast.join(" | ")));
  }
  lines
}

fn forecast_entry(h: &HourlyForecast) -> String {
  let hour = h.time.split_once('T').map(|(_, t)| t).unwrap_or(&h.time);
  format!(
    "{} {}°C {} {:.0}%/{:.1}mm {}km/h",
    hour,
    h.temperature_c,
    h.band.label(),
    h.precipitation_probability,
    h.precipitation_mm,
    h.wind_speed_kmh
  )
}

fn uv_line(r: &UvReading) -> String {
  let clear_sky = r
    .clear_sky_uv_index
    .map(|uv| format!(" (clear sky {:.1})", uv))
    .unwrap_or_default();
  format!(
    "{:<26} UV {:>4.1}{}  {}: {}  {}",
    r.province.name,
    r.uv_index,
    clear_sky,
    r.band.label(),
    r.band.advice(),
    marker(r.band.color(), r.marker_radius())
  )
}

fn air_line(r: &AirQualityReading) -> String {
  format!(
    "{:<26} AQI {:>3}  {}  PM2.5 {:.1}  PM10 {:.1}  {}",
    r.province.name,
    r.aqi,
    r.band.label(),
    r.pm2_5,
    r.pm10,
    marker(r.band.color(), r.marker_radius())
  )
}

fn quake_line(q: &Earthquake) -> String {
  let when = q
    .time
    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
    .unwrap_or_else(|| "unknown time".to_string());
  let mut line = format!(
    "{} M{:.1}  {}  depth {:.0} km ({})  at {:.2},{:.2}  {}  id {}  {}",
    q.magnitude_tier.icon(),
    q.magnitude,
    q.place,
    q.depth_km,
    q.depth_band.color(),
    q.lat,
    q.lon,
    when,
    q.id.as_deref().unwrap_or("-"),
    marker(q.magnitude_tier.color(), q.marker_radius())
  );
  if q.tsunami {
    line.push_str("  [tsunami]");
  }
  line
}

fn feature_line(feature: &Feature) -> String {
  let id = feature.identifier().unwrap_or_else(|| "?".to_string());
  let name = feature
    .property("name_th")
    .or_else(|| feature.property("s_name"))
    .unwrap_or_default();
  match feature.point() {
    Some(at) => format!("{:<16} {}  ({:.4}, {:.4})", id, name, at.lon, at.lat),
    None => format!("{:<16} {}", id, name),
  }
}
