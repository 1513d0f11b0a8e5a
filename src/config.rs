use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub feature_server: FeatureServerConfig,
  pub environment: EnvironmentConfig,
  pub cache: CacheConfig,
  /// Region shown on startup (central, north, northeast, east, west, south)
  pub default_region: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      feature_server: FeatureServerConfig::default(),
      environment: EnvironmentConfig::default(),
      cache: CacheConfig::default(),
      default_region: "central".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureServerConfig {
  /// GeoServer base URL, e.g. http://localhost:8080/geoserver
  pub url: String,
  /// Workspace holding the editable layers; also used as the XML namespace prefix
  pub workspace: String,
  pub namespace_uri: String,
  pub hospital_layer: String,
  pub student_layer: String,
}

impl Default for FeatureServerConfig {
  fn default() -> Self {
    Self {
      url: "http://localhost:8080/geoserver".to_string(),
      workspace: "db_gis".to_string(),
      namespace_uri: "http://db_gis".to_string(),
      hospital_layer: "hospitals".to_string(),
      student_layer: "students".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
  /// Weather and UV share the forecast endpoint
  pub forecast_url: String,
  pub air_quality_url: String,
  pub earthquake_feed_url: String,
  pub timezone: String,
}

impl Default for EnvironmentConfig {
  fn default() -> Self {
    Self {
      forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
      air_quality_url: "https://air-quality-api.open-meteo.com/v1/air-quality".to_string(),
      earthquake_feed_url:
        "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson".to_string(),
      timezone: "Asia/Bangkok".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub duration_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { duration_secs: 300 }
  }
}

impl CacheConfig {
  pub fn duration(&self) -> Duration {
    Duration::from_secs(self.duration_secs)
  }
}

/// Feature-server login taken from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./geodash.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/geodash/config.yaml
  ///
  /// Falls back to built-in defaults when no file exists.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => {
        info!("no configuration file found, using defaults");
        Ok(Self::default())
      }
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("geodash.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("geodash").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config = Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    info!(path = %path.display(), "loaded configuration");
    Ok(config)
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Feature-server credentials from GEODASH_USERNAME and GEODASH_PASSWORD.
  ///
  /// `None` unless both are set.
  pub fn credentials() -> Option<Credentials> {
    let username = std::env::var("GEODASH_USERNAME").ok()?;
    let password = std::env::var("GEODASH_PASSWORD").ok()?;
    Some(Credentials { username, password })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = Config::parse("{}").unwrap();
    assert_eq!(config.feature_server.workspace, "db_gis");
    assert_eq!(config.cache.duration(), Duration::from_secs(300));
    assert_eq!(config.default_region, "central");
    assert_eq!(config.environment.timezone, "Asia/Bangkok");
  }

  #[test]
  fn test_partial_sections_keep_remaining_defaults() {
    let config = Config::parse(
      r#"
feature_server:
  url: https://gis.example.org/geoserver
  hospital_layer: hospitals_v2
cache:
  duration_secs: 60
default_region: south
"#,
    )
    .unwrap();

    assert_eq!(config.feature_server.url, "https://gis.example.org/geoserver");
    assert_eq!(config.feature_server.hospital_layer, "hospitals_v2");
    assert_eq!(config.feature_server.student_layer, "students");
    assert_eq!(config.cache.duration_secs, 60);
    assert_eq!(config.default_region, "south");
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/geodash.yaml"))).is_err());
  }
}
