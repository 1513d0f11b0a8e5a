use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use super::endpoint;
use crate::config::FeatureServerConfig;
use crate::error::{ConfigError, TransportError};
use crate::http::Transport;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Session login against the feature server's form-based security endpoint.
///
/// The session cookie lives in the shared transport, so reads and writes
/// issued through it afterwards are authenticated.
pub struct SessionAuth {
  transport: Arc<dyn Transport>,
  login_url: Url,
  logout_url: Url,
  check_url: Url,
}

impl SessionAuth {
  pub fn new(transport: Arc<dyn Transport>, config: &FeatureServerConfig) -> Result<Self, ConfigError> {
    let base = ConfigError::parse_url(&config.url)?;
    Ok(Self {
      transport,
      login_url: endpoint(&base, &["j_spring_security_check"])?,
      logout_url: endpoint(&base, &["j_spring_security_logout"])?,
      check_url: endpoint(&base, &["rest", "about", "version.json"])?,
    })
  }

  /// `Ok(false)` means the server rejected the credentials.
  pub async fn login(&self, username: &str, password: &str) -> Result<bool, TransportError> {
    let form = url::form_urlencoded::Serializer::new(String::new())
      .append_pair("username", username)
      .append_pair("password", password)
      .finish();

    let response = self
      .transport
      .post(&self.login_url, FORM_CONTENT_TYPE, form)
      .await?;

    // Failed logins redirect back to the login page with an error marker
    let accepted = response.is_success()
      || (response.is_redirect()
        && !response
          .location
          .as_deref()
          .is_some_and(|location| location.contains("error")));

    if accepted {
      info!(username, "logged in to feature server");
    } else {
      warn!(username, status = response.status, "feature server login rejected");
    }
    Ok(accepted)
  }

  pub async fn logout(&self) -> Result<(), TransportError> {
    self
      .transport
      .post(&self.logout_url, FORM_CONTENT_TYPE, String::new())
      .await?;
    info!("logged out of feature server");
    Ok(())
  }

  /// Whether the current session can reach an authenticated endpoint.
  pub async fn check(&self) -> bool {
    match self.transport.get(&self.check_url).await {
      Ok(response) => response.is_success(),
      Err(e) => {
        warn!(error = %e, "session check failed");
        false
      }
    }
  }
}
