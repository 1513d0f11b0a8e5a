//! Feature-server access for the editable layers: WFS reads, WFS-T writes
//! and session login.

mod auth;
mod client;
mod filter;
mod types;
mod xml;

use url::Url;

use crate::error::ConfigError;

pub use auth::SessionAuth;
pub use client::WfsClient;
pub use filter::{Condition, LayerFilter};
pub use types::{Feature, FeatureDraft, LonLat, WriteOutcome};

#[cfg(test)]
pub use filter::HospitalFilter;
#[cfg(test)]
pub use types::HospitalProperties;

/// `base` with `segments` appended to its path.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ConfigError> {
  let mut url = base.clone();
  url
    .path_segments_mut()
    .map_err(|_| ConfigError::NotABase(base.to_string()))?
    .pop_if_empty()
    .extend(segments);
  Ok(url)
}
