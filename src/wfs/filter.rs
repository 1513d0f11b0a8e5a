//! Per-layer filter criteria and their OGC filter encoding.

use super::xml::{like_pattern, Attr, SafeXmlString, XmlWriter, LIKE_ESCAPE, LIKE_SINGLE_CHAR, LIKE_WILDCARD};
use crate::layer::EditableLayer;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HospitalFilter {
  /// Substring of the Thai name
  pub name: Option<String>,
  /// Exact district
  pub district: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
  /// Substring of the student name
  pub name: Option<String>,
  /// Substring of the student id
  pub id: Option<String>,
  pub district: Option<String>,
  pub province: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerFilter {
  Hospital(HospitalFilter),
  Student(StudentFilter),
}

/// A single comparison against a feature property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
  Like { property: &'static str, term: String },
  Equals { property: &'static str, value: String },
}

impl LayerFilter {
  /// An empty filter for `layer`.
  pub fn none(layer: EditableLayer) -> Self {
    match layer {
      EditableLayer::Hospitals => LayerFilter::Hospital(HospitalFilter::default()),
      EditableLayer::Students => LayerFilter::Student(StudentFilter::default()),
    }
  }

  /// Build from `key=value` pairs, e.g. `name=Siriraj district=Bangkok Noi`.
  pub fn from_pairs(layer: EditableLayer, pairs: &[(String, String)]) -> Result<Self, String> {
    let mut filter = Self::none(layer);
    for (key, value) in pairs {
      let slot = match (&mut filter, key.as_str()) {
        (LayerFilter::Hospital(f), "name") => &mut f.name,
        (LayerFilter::Hospital(f), "district") => &mut f.district,
        (LayerFilter::Student(f), "name" | "s_name") => &mut f.name,
        (LayerFilter::Student(f), "id" | "s_id") => &mut f.id,
        (LayerFilter::Student(f), "district") => &mut f.district,
        (LayerFilter::Student(f), "province") => &mut f.province,
        (_, other) => return Err(format!("{} cannot be filtered by '{}'", layer, other)),
      };
      *slot = Some(value.clone());
    }
    Ok(filter)
  }

  pub fn layer(&self) -> EditableLayer {
    match self {
      LayerFilter::Hospital(_) => EditableLayer::Hospitals,
      LayerFilter::Student(_) => EditableLayer::Students,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.conditions().is_empty()
  }

  /// Non-blank criteria in a fixed order.
  pub fn conditions(&self) -> Vec<Condition> {
    let mut out = Vec::new();
    match self {
      LayerFilter::Hospital(f) => {
        push_like(&mut out, "name_th", &f.name);
        push_equals(&mut out, "district", &f.district);
      }
      LayerFilter::Student(f) => {
        push_like(&mut out, "s_name", &f.name);
        push_like(&mut out, "s_id", &f.id);
        push_equals(&mut out, "district", &f.district);
        push_equals(&mut out, "province", &f.province);
      }
    }
    out
  }

  /// Write `<ogc:Filter>`; several conditions are combined with `<ogc:And>`.
  pub fn write_ogc(&self, w: &mut XmlWriter) {
    let conditions = self.conditions();
    if conditions.is_empty() {
      return;
    }

    w.open("ogc:Filter", &[]);
    if conditions.len() > 1 {
      w.open("ogc:And", &[]);
    }
    for condition in &conditions {
      condition.write_ogc(w);
    }
    if conditions.len() > 1 {
      w.close();
    }
    w.close();
  }
}

impl Condition {
  fn write_ogc(&self, w: &mut XmlWriter) {
    match self {
      Condition::Like { property, term } => {
        w.open(
          "ogc:PropertyIsLike",
          &[
            Attr::new("wildCard", LIKE_WILDCARD.to_string().as_str()),
            Attr::new("singleChar", LIKE_SINGLE_CHAR.to_string().as_str()),
            Attr::new("escape", LIKE_ESCAPE.to_string().as_str()),
            Attr::new("matchCase", "false"),
          ],
        )
        .element("ogc:PropertyName", &SafeXmlString::escape(property))
        .element("ogc:Literal", &like_pattern(term))
        .close();
      }
      Condition::Equals { property, value } => {
        w.open("ogc:PropertyIsEqualTo", &[])
          .element("ogc:PropertyName", &SafeXmlString::escape(property))
          .element("ogc:Literal", &SafeXmlString::escape(value))
          .close();
      }
    }
  }
}

fn non_blank(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(String::from)
}

fn push_like(out: &mut Vec<Condition>, property: &'static str, value: &Option<String>) {
  if let Some(term) = non_blank(value) {
    out.push(Condition::Like { property, term });
  }
}

fn push_equals(out: &mut Vec<Condition>, property: &'static str, value: &Option<String>) {
  if let Some(value) = non_blank(value) {
    out.push(Condition::Equals { property, value });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn test_blank_criteria_are_ignored() {
    let filter = LayerFilter::Hospital(HospitalFilter {
      name: Some("   ".into()),
      district: None,
    });
    assert!(filter.is_empty());
  }

  #[test]
  fn test_student_conditions_use_like_and_equals() {
    let filter = LayerFilter::from_pairs(
      EditableLayer::Students,
      &pairs(&[("province", "Chiang Mai"), ("id", "6401"), ("name", " Somchai ")]),
    )
    .unwrap();

    assert_eq!(
      filter.conditions(),
      vec![
        Condition::Like {
          property: "s_name",
          term: "Somchai".into()
        },
        Condition::Like {
          property: "s_id",
          term: "6401".into()
        },
        Condition::Equals {
          property: "province",
          value: "Chiang Mai".into()
        },
      ]
    );
  }

  #[test]
  fn test_unknown_key_is_rejected() {
    let err = LayerFilter::from_pairs(EditableLayer::Hospitals, &pairs(&[("province", "x")]));
    assert!(err.is_err());
  }

  #[test]
  fn test_single_condition_has_no_and() {
    let filter = LayerFilter::from_pairs(EditableLayer::Hospitals, &pairs(&[("district", "Bang Rak")])).unwrap();
    let mut w = XmlWriter::new();
    filter.write_ogc(&mut w);
    let xml = w.finish();

    assert!(!xml.contains("ogc:And"));
    assert!(xml.contains(
      "<ogc:PropertyIsEqualTo><ogc:PropertyName>district</ogc:PropertyName><ogc:Literal>Bang Rak</ogc:Literal></ogc:PropertyIsEqualTo>"
    ));
  }

  #[test]
  fn test_like_conditions_ignore_case() {
    let filter = LayerFilter::from_pairs(
      EditableLayer::Students,
      &pairs(&[("name", "somchai"), ("id", "ab12")]),
    )
    .unwrap();
    let mut w = XmlWriter::new();
    filter.write_ogc(&mut w);
    let xml = w.finish();

    assert_eq!(xml.matches(r#"matchCase="false""#).count(), 2);
    assert!(xml.contains(
      r#"<ogc:PropertyIsLike wildCard="*" singleChar="." escape="!" matchCase="false"><ogc:PropertyName>s_name</ogc:PropertyName><ogc:Literal>*somchai*</ogc:Literal></ogc:PropertyIsLike>"#
    ));
  }

  #[test]
  fn test_equality_has_no_match_case() {
    let filter = LayerFilter::from_pairs(EditableLayer::Students, &pairs(&[("province", "Nan")])).unwrap();
    let mut w = XmlWriter::new();
    filter.write_ogc(&mut w);
    assert!(!w.finish().contains("matchCase"));
  }

  #[test]
  fn test_multiple_conditions_are_anded() {
    let filter = LayerFilter::from_pairs(
      EditableLayer::Hospitals,
      &pairs(&[("name", "<script>"), ("district", "Pathum Wan")]),
    )
    .unwrap();
    let mut w = XmlWriter::new();
    filter.write_ogc(&mut w);
    let xml = w.finish();

    assert!(xml.contains("<ogc:Filter><ogc:And><ogc:PropertyIsLike"));
    assert!(xml.contains(r#"wildCard="*" singleChar="." escape="!""#));
    assert!(xml.contains("<ogc:Literal>*&lt;script&gt;*</ogc:Literal>"));
    assert!(xml.ends_with("</ogc:And></ogc:Filter>"));
  }
}
