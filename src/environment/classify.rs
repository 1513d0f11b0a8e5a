//! Fixed threshold tables mapping continuous readings to display bands.
//!
//! Every classifier is total: any input lands in exactly one band.

/// US AQI bands. Thresholds are strict `>` comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiBand {
  Good,
  Moderate,
  Unhealthy,
  VeryUnhealthy,
  Hazardous,
}

impl AqiBand {
  pub fn classify(aqi: f64) -> Self {
    if aqi > 200.0 {
      AqiBand::Hazardous
    } else if aqi > 150.0 {
      AqiBand::VeryUnhealthy
    } else if aqi > 100.0 {
      AqiBand::Unhealthy
    } else if aqi > 50.0 {
      AqiBand::Moderate
    } else {
      AqiBand::Good
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      AqiBand::Good => "good",
      AqiBand::Moderate => "moderate",
      AqiBand::Unhealthy => "unhealthy",
      AqiBand::VeryUnhealthy => "very unhealthy",
      AqiBand::Hazardous => "hazardous",
    }
  }

  pub fn color(self) -> &'static str {
    match self {
      AqiBand::Good => "#10b981",
      AqiBand::Moderate => "#f59e0b",
      AqiBand::Unhealthy => "#f97316",
      AqiBand::VeryUnhealthy => "#dc2626",
      AqiBand::Hazardous => "#9333ea",
    }
  }
}

/// UV index bands. Upper bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvBand {
  Low,
  Moderate,
  High,
  VeryHigh,
  Extreme,
}

impl UvBand {
  pub fn classify(uv: f64) -> Self {
    if uv < 3.0 {
      UvBand::Low
    } else if uv < 6.0 {
      UvBand::Moderate
    } else if uv < 8.0 {
      UvBand::High
    } else if uv < 11.0 {
      UvBand::VeryHigh
    } else {
      UvBand::Extreme
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      UvBand::Low => "low",
      UvBand::Moderate => "moderate",
      UvBand::High => "high",
      UvBand::VeryHigh => "very high",
      UvBand::Extreme => "extreme",
    }
  }

  pub fn color(self) -> &'static str {
    match self {
      UvBand::Low => "#22c55e",
      UvBand::Moderate => "#eab308",
      UvBand::High => "#f97316",
      UvBand::VeryHigh => "#ef4444",
      UvBand::Extreme => "#991b1b",
    }
  }

  pub fn advice(self) -> &'static str {
    match self {
      UvBand::Low => "Safe, no special protection needed",
      UvBand::Moderate => "Use sunscreen",
      UvBand::High => "Use sunscreen and a hat",
      UvBand::VeryHigh => "Avoid midday sun, full protection",
      UvBand::Extreme => "Dangerous, avoid sun exposure all day",
    }
  }
}

/// Sky condition derived from a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherBand {
  Clear,
  PartlyCloudy,
  Fog,
  Drizzle,
  Rain,
  Snow,
  HeavyRain,
  RainAndSnow,
  Thunderstorm,
}

impl WeatherBand {
  /// Codes outside the table (87-94, negatives) fall back to partly cloudy.
  pub fn classify(code: i64) -> Self {
    match code {
      0 => WeatherBand::Clear,
      1..=3 => WeatherBand::PartlyCloudy,
      4..=48 => WeatherBand::Fog,
      49..=57 => WeatherBand::Drizzle,
      58..=67 => WeatherBand::Rain,
      68..=77 => WeatherBand::Snow,
      78..=82 => WeatherBand::HeavyRain,
      83..=86 => WeatherBand::RainAndSnow,
      95..=i64::MAX => WeatherBand::Thunderstorm,
      _ => WeatherBand::PartlyCloudy,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      WeatherBand::Clear => "clear",
      WeatherBand::PartlyCloudy => "partly cloudy",
      WeatherBand::Fog => "fog",
      WeatherBand::Drizzle => "drizzle",
      WeatherBand::Rain => "rain",
      WeatherBand::Snow => "snow",
      WeatherBand::HeavyRain => "heavy rain",
      WeatherBand::RainAndSnow => "rain and snow",
      WeatherBand::Thunderstorm => "thunderstorm",
    }
  }
}

/// Earthquake severity by hypocenter depth, independent of magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthBand {
  /// Band A: 100 km or shallower
  Shallow,
  /// Band B: deeper than 100 km
  Intermediate,
  /// Band C: deeper than 300 km
  Deep,
}

impl DepthBand {
  pub fn classify(depth_km: f64) -> Self {
    if depth_km > 300.0 {
      DepthBand::Deep
    } else if depth_km > 100.0 {
      DepthBand::Intermediate
    } else {
      DepthBand::Shallow
    }
  }

  pub fn color(self) -> &'static str {
    match self {
      DepthBand::Shallow => "#3b82f6",
      DepthBand::Intermediate => "#f59e0b",
      DepthBand::Deep => "#dc2626",
    }
  }
}

/// Structural risk icon tier driven by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnitudeTier {
  Minor,
  Moderate,
  Major,
}

impl MagnitudeTier {
  pub fn classify(magnitude: f64) -> Self {
    if magnitude >= 6.0 {
      MagnitudeTier::Major
    } else if magnitude >= 4.0 {
      MagnitudeTier::Moderate
    } else {
      MagnitudeTier::Minor
    }
  }

  pub fn icon(self) -> &'static str {
    match self {
      MagnitudeTier::Minor => "fa-house",
      MagnitudeTier::Moderate => "fa-house-chimney-crack",
      MagnitudeTier::Major => "fa-house-crack",
    }
  }

  pub fn color(self) -> &'static str {
    match self {
      MagnitudeTier::Minor => "#fbbf24",
      MagnitudeTier::Moderate => "#f97316",
      MagnitudeTier::Major => "#ef4444",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_aqi_boundaries() {
    assert_eq!(AqiBand::classify(0.0), AqiBand::Good);
    assert_eq!(AqiBand::classify(50.0), AqiBand::Good);
    assert_eq!(AqiBand::classify(51.0), AqiBand::Moderate);
    assert_eq!(AqiBand::classify(100.0), AqiBand::Moderate);
    assert_eq!(AqiBand::classify(101.0), AqiBand::Unhealthy);
    assert_eq!(AqiBand::classify(150.0), AqiBand::Unhealthy);
    assert_eq!(AqiBand::classify(151.0), AqiBand::VeryUnhealthy);
    assert_eq!(AqiBand::classify(200.0), AqiBand::VeryUnhealthy);
    assert_eq!(AqiBand::classify(201.0), AqiBand::Hazardous);
  }

  #[test]
  fn test_aqi_200_is_not_hazardous() {
    assert_ne!(AqiBand::classify(200.0), AqiBand::Hazardous);
    assert_eq!(AqiBand::classify(200.0).label(), "very unhealthy");
  }

  #[test]
  fn test_aqi_lower_extreme() {
    assert_eq!(AqiBand::classify(-5.0), AqiBand::Good);
    assert_eq!(AqiBand::classify(f64::MIN), AqiBand::Good);
  }

  #[test]
  fn test_uv_boundaries() {
    assert_eq!(UvBand::classify(0.0), UvBand::Low);
    assert_eq!(UvBand::classify(2.999), UvBand::Low);
    assert_eq!(UvBand::classify(3.0), UvBand::Moderate);
    assert_eq!(UvBand::classify(5.999), UvBand::Moderate);
    assert_eq!(UvBand::classify(6.0), UvBand::High);
    assert_eq!(UvBand::classify(8.0), UvBand::VeryHigh);
    assert_eq!(UvBand::classify(10.99), UvBand::VeryHigh);
    assert_eq!(UvBand::classify(11.0), UvBand::Extreme);
    assert_eq!(UvBand::classify(f64::MAX), UvBand::Extreme);
    assert_eq!(UvBand::classify(f64::MIN), UvBand::Low);
  }

  #[test]
  fn test_weather_code_table() {
    let cases = [
      (0, WeatherBand::Clear),
      (1, WeatherBand::PartlyCloudy),
      (3, WeatherBand::PartlyCloudy),
      (4, WeatherBand::Fog),
      (45, WeatherBand::Fog),
      (48, WeatherBand::Fog),
      (49, WeatherBand::Drizzle),
      (57, WeatherBand::Drizzle),
      (58, WeatherBand::Rain),
      (67, WeatherBand::Rain),
      (68, WeatherBand::Snow),
      (77, WeatherBand::Snow),
      (78, WeatherBand::HeavyRain),
      (82, WeatherBand::HeavyRain),
      (83, WeatherBand::RainAndSnow),
      (86, WeatherBand::RainAndSnow),
      (87, WeatherBand::PartlyCloudy),
      (94, WeatherBand::PartlyCloudy),
      (95, WeatherBand::Thunderstorm),
      (99, WeatherBand::Thunderstorm),
      (-1, WeatherBand::PartlyCloudy),
    ];
    for (code, expected) in cases {
      assert_eq!(WeatherBand::classify(code), expected, "code {}", code);
    }
  }

  #[test]
  fn test_depth_bands_ignore_magnitude() {
    assert_eq!(DepthBand::classify(-2.0), DepthBand::Shallow);
    assert_eq!(DepthBand::classify(100.0), DepthBand::Shallow);
    assert_eq!(DepthBand::classify(100.1), DepthBand::Intermediate);
    assert_eq!(DepthBand::classify(300.0), DepthBand::Intermediate);
    assert_eq!(DepthBand::classify(300.5), DepthBand::Deep);
  }

  #[test]
  fn test_magnitude_tiers() {
    assert_eq!(MagnitudeTier::classify(0.0), MagnitudeTier::Minor);
    assert_eq!(MagnitudeTier::classify(3.99), MagnitudeTier::Minor);
    assert_eq!(MagnitudeTier::classify(4.0), MagnitudeTier::Moderate);
    assert_eq!(MagnitudeTier::classify(5.99), MagnitudeTier::Moderate);
    assert_eq!(MagnitudeTier::classify(6.0), MagnitudeTier::Major);
  }
}
