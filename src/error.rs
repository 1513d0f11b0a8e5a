//! Error types for the layer synchronization core.

use thiserror::Error;

use crate::layer::LayerKind;

/// A request that never produced an HTTP response.
#[derive(Debug, Clone, Error)]
#[error("request to {url} failed: {message}")]
pub struct TransportError {
  pub url: String,
  pub message: String,
}

/// Errors from the read paths (environmental adapters and feature server reads).
#[derive(Debug, Error)]
pub enum FetchError {
  /// Feature server answered 401/404 or served a login page
  #[error("authentication required")]
  AuthRequired,

  /// Any other non-success HTTP status
  #[error("server returned HTTP {status}")]
  Status { status: u16 },

  #[error(transparent)]
  Transport(#[from] TransportError),

  /// Response arrived but lacks the expected shape
  #[error("malformed response: {0}")]
  Decode(String),

  /// Region key resolves to no provinces
  #[error("unknown region '{0}'")]
  UnknownRegion(String),

  /// Every per-province request in a batch failed
  #[error("all {attempted} requests for region '{region}' failed")]
  EmptyBatch { region: String, attempted: usize },
}

/// Errors from the transactional write path.
///
/// A server rejection is not an error here: it comes back as a
/// `WriteOutcome` with `success == false` and the raw response text.
#[derive(Debug, Error)]
pub enum WriteError {
  #[error("authentication required")]
  AuthRequired,

  #[error(transparent)]
  Transport(#[from] TransportError),

  #[error("coordinates out of range: lon {lon}, lat {lat}")]
  InvalidCoordinates { lon: f64, lat: f64 },
}

/// Errors surfaced at the layer orchestrator boundary.
#[derive(Debug, Error)]
pub enum LayerError {
  #[error("{layer}: {source}")]
  Fetch {
    layer: LayerKind,
    #[source]
    source: FetchError,
  },

  #[error("{layer}: {source}")]
  Write {
    layer: LayerKind,
    #[source]
    source: WriteError,
  },

  #[error("layer {0} does not support editing")]
  NotEditable(LayerKind),

  #[error("feature '{id}' is not loaded in layer {layer}")]
  FeatureNotFound { layer: LayerKind, id: String },
}

impl LayerError {
  /// Whether the caller should route to the login flow instead of showing a data error.
  pub fn is_auth_required(&self) -> bool {
    matches!(
      self,
      LayerError::Fetch {
        source: FetchError::AuthRequired,
        ..
      } | LayerError::Write {
        source: WriteError::AuthRequired,
        ..
      }
    )
  }
}

/// Rejected XML element name (from configuration).
#[derive(Debug, Clone, Error)]
#[error("invalid XML name '{0}'")]
pub struct XmlNameError(pub String);

/// Configured endpoints or names that cannot be turned into clients.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid url '{url}': {source}")]
  Url {
    url: String,
    #[source]
    source: url::ParseError,
  },

  #[error("url '{0}' cannot carry a path")]
  NotABase(String),

  #[error(transparent)]
  Name(#[from] XmlNameError),
}

impl ConfigError {
  pub fn parse_url(url: &str) -> Result<url::Url, ConfigError> {
    url::Url::parse(url).map_err(|source| ConfigError::Url {
      url: url.to_string(),
      source,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn auth_required_is_detected_on_both_paths() {
    let read = LayerError::Fetch {
      layer: LayerKind::Hospitals,
      source: FetchError::AuthRequired,
    };
    let write = LayerError::Write {
      layer: LayerKind::Students,
      source: WriteError::AuthRequired,
    };
    let other = LayerError::Fetch {
      layer: LayerKind::Hospitals,
      source: FetchError::Status { status: 500 },
    };

    assert!(read.is_auth_required());
    assert!(write.is_auth_required());
    assert!(!other.is_auth_required());
  }
}
