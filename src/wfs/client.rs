use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use super::filter::LayerFilter;
use super::types::{Feature, FeatureCollection, FeatureDraft, LonLat, WriteOutcome};
use super::xml::{Attr, SafeXmlString, XmlName, XmlWriter};
use super::endpoint;
use crate::config::FeatureServerConfig;
use crate::error::{ConfigError, FetchError, WriteError};
use crate::http::{HttpResponse, Transport};
use crate::layer::EditableLayer;

const WFS_NS: &str = "http://www.opengis.net/wfs";
const OGC_NS: &str = "http://www.opengis.net/ogc";
const GML_NS: &str = "http://www.opengis.net/gml";
const XML_CONTENT_TYPE: &str = "application/xml";
const JSON_OUTPUT: &str = "application/json";
const GEOMETRY_PROPERTY: &str = "geom";

/// Read and transactional-write client for the editable layers.
pub struct WfsClient {
  transport: Arc<dyn Transport>,
  ows_url: Url,
  prefix: XmlName,
  namespace_uri: String,
  hospitals: XmlName,
  students: XmlName,
}

impl WfsClient {
  pub fn new(transport: Arc<dyn Transport>, config: &FeatureServerConfig) -> Result<Self, ConfigError> {
    let base = ConfigError::parse_url(&config.url)?;
    let prefix = XmlName::new(&config.workspace)?;
    let ows_url = endpoint(&base, &[prefix.as_str(), "ows"])?;

    Ok(Self {
      transport,
      ows_url,
      namespace_uri: config.namespace_uri.clone(),
      hospitals: XmlName::new(&config.hospital_layer)?,
      students: XmlName::new(&config.student_layer)?,
      prefix,
    })
  }

  fn local_name(&self, layer: EditableLayer) -> &XmlName {
    match layer {
      EditableLayer::Hospitals => &self.hospitals,
      EditableLayer::Students => &self.students,
    }
  }

  /// `workspace:layer`
  pub fn type_name(&self, layer: EditableLayer) -> XmlName {
    XmlName::qualified(&self.prefix, self.local_name(layer))
  }

  // ==========================================================================
  // Reads
  // ==========================================================================

  /// Every feature in the layer (GET GetFeature).
  pub async fn fetch_features(&self, layer: EditableLayer) -> Result<Vec<Feature>, FetchError> {
    let mut url = self.ows_url.clone();
    url
      .query_pairs_mut()
      .append_pair("service", "WFS")
      .append_pair("version", "1.0.0")
      .append_pair("request", "GetFeature")
      .append_pair("typeName", self.type_name(layer).as_str())
      .append_pair("outputFormat", JSON_OUTPUT);

    let response = self.transport.get(&url).await?;
    read_collection(layer, response)
  }

  /// Features matching `filter` (POST GetFeature with an OGC filter).
  ///
  /// An empty filter falls back to the unfiltered read.
  pub async fn fetch_filtered(&self, filter: &LayerFilter) -> Result<Vec<Feature>, FetchError> {
    let layer = filter.layer();
    if filter.is_empty() {
      return self.fetch_features(layer).await;
    }

    let body = self.get_feature_xml(filter);
    debug!(%layer, "posting filtered GetFeature");
    let response = self
      .transport
      .post(&self.ows_url, XML_CONTENT_TYPE, body)
      .await?;
    read_collection(layer, response)
  }

  fn get_feature_xml(&self, filter: &LayerFilter) -> String {
    let type_name = self.type_name(filter.layer());
    let mut w = XmlWriter::new();
    w.open(
      "wfs:GetFeature",
      &[
        Attr::new("service", "WFS"),
        Attr::new("version", "1.0.0"),
        Attr::new("outputFormat", JSON_OUTPUT),
        Attr::new("xmlns:wfs", WFS_NS),
        Attr::new("xmlns:ogc", OGC_NS),
        Attr::new("xmlns:gml", GML_NS),
        Attr::xmlns(&self.prefix, &self.namespace_uri),
      ],
    )
    .open("wfs:Query", &[Attr::new("typeName", type_name.as_str())]);
    filter.write_ogc(&mut w);
    w.finish()
  }

  // ==========================================================================
  // Transactions
  // ==========================================================================

  pub async fn create(&self, draft: &FeatureDraft, at: LonLat) -> Result<WriteOutcome, WriteError> {
    let layer = draft.layer();
    let type_name = self.type_name(layer);

    let mut w = self.transaction();
    w.open("wfs:Insert", &[]).open(&type_name, &[]);
    for (key, value) in draft.fields() {
      w.element(&self.prefix.child(key), &SafeXmlString::escape(value));
    }
    w.open(&self.prefix.child(GEOMETRY_PROPERTY), &[]);
    write_point(&mut w, at);

    self.post_transaction(layer, "insert", w.finish()).await
  }

  /// Replace every property and the location of feature `id`.
  pub async fn update(
    &self,
    id: &str,
    draft: &FeatureDraft,
    at: LonLat,
  ) -> Result<WriteOutcome, WriteError> {
    let layer = draft.layer();
    let type_name = self.type_name(layer);

    let mut w = self.transaction();
    w.open("wfs:Update", &[Attr::new("typeName", type_name.as_str())]);
    for (key, value) in draft.fields() {
      w.open("wfs:Property", &[])
        .element("wfs:Name", &SafeXmlString::escape(key))
        .element("wfs:Value", &SafeXmlString::escape(value))
        .close();
    }
    w.open("wfs:Property", &[])
      .element("wfs:Name", &SafeXmlString::escape(GEOMETRY_PROPERTY))
      .open("wfs:Value", &[]);
    write_point(&mut w, at);
    w.close().close();
    write_feature_id(&mut w, id);

    self.post_transaction(layer, "update", w.finish()).await
  }

  pub async fn delete(&self, layer: EditableLayer, id: &str) -> Result<WriteOutcome, WriteError> {
    let type_name = self.type_name(layer);

    let mut w = self.transaction();
    w.open("wfs:Delete", &[Attr::new("typeName", type_name.as_str())]);
    write_feature_id(&mut w, id);

    self.post_transaction(layer, "delete", w.finish()).await
  }

  fn transaction(&self) -> XmlWriter {
    let mut w = XmlWriter::new();
    w.open(
      "wfs:Transaction",
      &[
        Attr::new("service", "WFS"),
        Attr::new("version", "1.0.0"),
        Attr::new("xmlns:wfs", WFS_NS),
        Attr::new("xmlns:ogc", OGC_NS),
        Attr::new("xmlns:gml", GML_NS),
        Attr::xmlns(&self.prefix, &self.namespace_uri),
      ],
    );
    w
  }

  async fn post_transaction(
    &self,
    layer: EditableLayer,
    operation: &'static str,
    body: String,
  ) -> Result<WriteOutcome, WriteError> {
    let response = self
      .transport
      .post(&self.ows_url, XML_CONTENT_TYPE, body)
      .await?;

    if matches!(response.status, 401 | 404) {
      warn!(%layer, operation, status = response.status, "write requires authentication");
      return Err(WriteError::AuthRequired);
    }

    let success = response.is_success() && !response.body.contains("ExceptionReport");
    if success {
      info!(%layer, operation, "transaction committed");
    } else {
      warn!(%layer, operation, status = response.status, "transaction rejected");
    }

    Ok(WriteOutcome {
      success,
      status: response.status,
      raw_response: response.body,
    })
  }
}

fn write_point(w: &mut XmlWriter, at: LonLat) {
  w.open("gml:Point", &[Attr::new("srsName", "EPSG:4326")])
    .element("gml:coordinates", &SafeXmlString::escape(&at.to_gml()))
    .close();
}

fn write_feature_id(w: &mut XmlWriter, id: &str) {
  w.open("ogc:Filter", &[])
    .empty("ogc:FeatureId", &[Attr::new("fid", id)])
    .close();
}

fn read_collection(layer: EditableLayer, response: HttpResponse) -> Result<Vec<Feature>, FetchError> {
  if matches!(response.status, 401 | 404) {
    warn!(%layer, status = response.status, "read requires authentication");
    return Err(FetchError::AuthRequired);
  }
  if !response.is_success() {
    return Err(FetchError::Status {
      status: response.status,
    });
  }

  // A login page served with 200 means the session is gone
  if response.body.trim_start().starts_with('<') {
    warn!(%layer, "feature server returned markup instead of JSON");
    return Err(FetchError::AuthRequired);
  }

  let collection: FeatureCollection =
    serde_json::from_str(&response.body).map_err(|e| FetchError::Decode(e.to_string()))?;
  debug!(%layer, features = collection.features.len(), "decoded feature collection");
  Ok(collection.features)
}
