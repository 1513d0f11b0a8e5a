//! HTTP transport seam between the core and the network.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use url::Url;

use crate::error::TransportError;

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  /// `Location` header, present on redirects
  pub location: Option<String>,
  pub body: String,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  pub fn is_redirect(&self) -> bool {
    (300..400).contains(&self.status)
  }
}

/// Outbound HTTP used by adapters, the feature-server client and session auth.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;

  async fn post(
    &self,
    url: &Url,
    content_type: &str,
    body: String,
  ) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by `reqwest`.
///
/// Keeps a cookie store so a feature-server login session carries over to
/// later reads and writes. Redirects are not followed.
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new() -> Result<Self, TransportError> {
    let client = reqwest::Client::builder()
      .cookie_store(true)
      .redirect(Policy::none())
      .user_agent(concat!("geodash/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| TransportError {
        url: String::new(),
        message: format!("failed to build HTTP client: {}", e),
      })?;

    Ok(Self { client })
  }

  async fn read(url: &Url, response: reqwest::Response) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let location = response
      .headers()
      .get(reqwest::header::LOCATION)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    let body = response.text().await.map_err(|e| transport_error(url, e))?;

    Ok(HttpResponse {
      status,
      location,
      body,
    })
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
    let response = self
      .client
      .get(url.clone())
      .send()
      .await
      .map_err(|e| transport_error(url, e))?;

    Self::read(url, response).await
  }

  async fn post(
    &self,
    url: &Url,
    content_type: &str,
    body: String,
  ) -> Result<HttpResponse, TransportError> {
    let response = self
      .client
      .post(url.clone())
      .header(reqwest::header::CONTENT_TYPE, content_type)
      .body(body)
      .send()
      .await
      .map_err(|e| transport_error(url, e))?;

    Self::read(url, response).await
  }
}

fn transport_error(url: &Url, e: reqwest::Error) -> TransportError {
  TransportError {
    url: url.to_string(),
    message: e.to_string(),
  }
}
