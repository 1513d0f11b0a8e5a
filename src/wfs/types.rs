use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::WriteError;
use crate::layer::EditableLayer;

/// A GeoJSON feature as served by the feature server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feature {
  #[serde(default, deserialize_with = "deserialize_opt_id")]
  pub id: Option<String>,
  #[serde(default)]
  pub properties: Map<String, Value>,
  #[serde(default)]
  pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Geometry {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub coordinates: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
  #[serde(default)]
  pub features: Vec<Feature>,
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let v: Option<Value> = Option::deserialize(deserializer)?;
  Ok(v.as_ref().and_then(value_as_id))
}

fn value_as_id(value: &Value) -> Option<String> {
  match value {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

impl Feature {
  /// Top-level `id`, falling back to `properties.id`.
  pub fn identifier(&self) -> Option<String> {
    self
      .id
      .clone()
      .or_else(|| self.properties.get("id").and_then(value_as_id))
  }

  /// String form of a property; numbers are rendered, null and missing are `None`.
  pub fn property(&self, key: &str) -> Option<String> {
    match self.properties.get(key)? {
      Value::String(s) => Some(s.clone()),
      Value::Null => None,
      other => Some(other.to_string()),
    }
  }

  /// Location of a point geometry.
  pub fn point(&self) -> Option<LonLat> {
    let geometry = self.geometry.as_ref()?;
    // MultiPoint layers wrap a single point in an extra array
    let coords = match geometry.kind.as_str() {
      "Point" => geometry.coordinates.as_array()?,
      "MultiPoint" => geometry.coordinates.as_array()?.first()?.as_array()?,
      _ => return None,
    };
    Some(LonLat {
      lon: coords.first()?.as_f64()?,
      lat: coords.get(1)?.as_f64()?,
    })
  }
}

/// WGS84 position, longitude first as the feature server expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
  pub lon: f64,
  pub lat: f64,
}

impl LonLat {
  pub fn new(lon: f64, lat: f64) -> Result<Self, WriteError> {
    let valid = lon.is_finite()
      && lat.is_finite()
      && (-180.0..=180.0).contains(&lon)
      && (-90.0..=90.0).contains(&lat);
    if valid {
      Ok(Self { lon, lat })
    } else {
      Err(WriteError::InvalidCoordinates { lon, lat })
    }
  }

  /// `lon,lat` as used in `gml:coordinates`
  pub fn to_gml(self) -> String {
    format!("{},{}", self.lon, self.lat)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HospitalProperties {
  pub name_th: String,
  pub name_en: String,
  pub district: String,
  pub address: String,
  pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentProperties {
  pub s_id: String,
  pub s_name: String,
  pub curriculum: String,
  pub department: String,
  pub faculty: String,
  pub graduated_from: String,
  pub subdistrict: String,
  pub district: String,
  pub province: String,
}

/// Property values for an insert or update, typed per layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureDraft {
  Hospital(HospitalProperties),
  Student(StudentProperties),
}

impl FeatureDraft {
  pub fn empty(layer: EditableLayer) -> Self {
    match layer {
      EditableLayer::Hospitals => FeatureDraft::Hospital(HospitalProperties::default()),
      EditableLayer::Students => FeatureDraft::Student(StudentProperties::default()),
    }
  }

  /// Draft pre-filled from a loaded feature, for edits that only change some fields.
  pub fn from_feature(layer: EditableLayer, feature: &Feature) -> Self {
    let mut draft = Self::empty(layer);
    for key in draft.keys() {
      if let (Some(value), Some(slot)) = (feature.property(key), draft.field_mut(key)) {
        *slot = value;
      }
    }
    draft
  }

  /// Apply `key=value` pairs; unknown keys are an error.
  pub fn apply_pairs(&mut self, pairs: &[(String, String)]) -> Result<(), String> {
    for (key, value) in pairs {
      self.set(key, value.clone())?;
    }
    Ok(())
  }

  pub fn layer(&self) -> EditableLayer {
    match self {
      FeatureDraft::Hospital(_) => EditableLayer::Hospitals,
      FeatureDraft::Student(_) => EditableLayer::Students,
    }
  }

  /// Property names in schema order.
  pub fn keys(&self) -> &'static [&'static str] {
    match self {
      FeatureDraft::Hospital(_) => &["name_th", "name_en", "district", "address", "source"],
      FeatureDraft::Student(_) => &[
        "s_id",
        "s_name",
        "curriculum",
        "department",
        "faculty",
        "graduated_from",
        "subdistrict",
        "district",
        "province",
      ],
    }
  }

  /// `(property, value)` in schema order.
  pub fn fields(&self) -> Vec<(&'static str, &str)> {
    match self {
      FeatureDraft::Hospital(p) => vec![
        ("name_th", p.name_th.as_str()),
        ("name_en", p.name_en.as_str()),
        ("district", p.district.as_str()),
        ("address", p.address.as_str()),
        ("source", p.source.as_str()),
      ],
      FeatureDraft::Student(p) => vec![
        ("s_id", p.s_id.as_str()),
        ("s_name", p.s_name.as_str()),
        ("curriculum", p.curriculum.as_str()),
        ("department", p.department.as_str()),
        ("faculty", p.faculty.as_str()),
        ("graduated_from", p.graduated_from.as_str()),
        ("subdistrict", p.subdistrict.as_str()),
        ("district", p.district.as_str()),
        ("province", p.province.as_str()),
      ],
    }
  }

  fn set(&mut self, key: &str, value: String) -> Result<(), String> {
    let layer = self.layer();
    let slot = self
      .field_mut(key)
      .ok_or_else(|| format!("{} has no property '{}'", layer, key))?;
    *slot = value;
    Ok(())
  }

  fn field_mut(&mut self, key: &str) -> Option<&mut String> {
    let slot = match self {
      FeatureDraft::Hospital(p) => match key {
        "name_th" => &mut p.name_th,
        "name_en" => &mut p.name_en,
        "district" => &mut p.district,
        "address" => &mut p.address,
        "source" => &mut p.source,
        _ => return None,
      },
      FeatureDraft::Student(p) => match key {
        "s_id" => &mut p.s_id,
        "s_name" => &mut p.s_name,
        "curriculum" => &mut p.curriculum,
        "department" => &mut p.department,
        "faculty" => &mut p.faculty,
        "graduated_from" => &mut p.graduated_from,
        "subdistrict" => &mut p.subdistrict,
        "district" => &mut p.district,
        "province" => &mut p.province,
        _ => return None,
      },
    };
    Some(slot)
  }
}

/// Result of a transaction the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
  pub success: bool,
  pub status: u16,
  /// Server response text, kept for diagnostics
  pub raw_response: String,
}
