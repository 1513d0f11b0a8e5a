//! Minimal XML writer for WFS request bodies.
//!
//! Text and attribute values only enter a document as [`SafeXmlString`],
//! and element names are either string literals or validated [`XmlName`]s,
//! so no call site can splice raw input into markup.

use std::fmt;

use crate::error::XmlNameError;

/// Entity-escaped character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeXmlString(String);

impl SafeXmlString {
  pub fn escape(raw: &str) -> Self {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
      match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&apos;"),
        _ => out.push(c),
      }
    }
    Self(out)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for SafeXmlString {
  fn from(raw: &str) -> Self {
    Self::escape(raw)
  }
}

impl fmt::Display for SafeXmlString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A checked element or prefix name taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlName(String);

impl XmlName {
  /// Accepts `[A-Za-z_][A-Za-z0-9_.-]*`; no prefixes.
  pub fn new(name: &str) -> Result<Self, XmlNameError> {
    let mut chars = name.chars();
    let valid_start = chars
      .next()
      .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid_start && valid_rest {
      Ok(Self(name.to_string()))
    } else {
      Err(XmlNameError(name.to_string()))
    }
  }

  /// `prefix:local`
  pub fn qualified(prefix: &XmlName, local: &XmlName) -> Self {
    Self(format!("{}:{}", prefix.0, local.0))
  }

  /// `self:local` for a literal local name.
  pub fn child(&self, local: &'static str) -> Self {
    Self(format!("{}:{}", self.0, local))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for XmlName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Something usable as an element name.
///
/// Implemented for string literals and validated names only.
pub trait Tag {
  fn tag(&self) -> &str;
}

impl Tag for &'static str {
  fn tag(&self) -> &str {
    self
  }
}

impl Tag for &XmlName {
  fn tag(&self) -> &str {
    self.as_str()
  }
}

/// One `name="value"` pair.
#[derive(Debug, Clone)]
pub struct Attr {
  name: String,
  value: SafeXmlString,
}

impl Attr {
  pub fn new(name: &'static str, value: impl Into<SafeXmlString>) -> Self {
    Self {
      name: name.to_string(),
      value: value.into(),
    }
  }

  /// `xmlns:prefix="uri"`
  pub fn xmlns(prefix: &XmlName, uri: &str) -> Self {
    Self {
      name: format!("xmlns:{}", prefix),
      value: SafeXmlString::escape(uri),
    }
  }
}

/// Append-only writer; `finish` closes anything left open.
#[derive(Debug)]
pub struct XmlWriter {
  buf: String,
  open: Vec<String>,
}

impl XmlWriter {
  pub fn new() -> Self {
    Self {
      buf: String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#),
      open: Vec::new(),
    }
  }

  pub fn open(&mut self, name: impl Tag, attrs: &[Attr]) -> &mut Self {
    self.start_tag(name.tag(), attrs, false);
    self.open.push(name.tag().to_string());
    self
  }

  pub fn empty(&mut self, name: impl Tag, attrs: &[Attr]) -> &mut Self {
    self.start_tag(name.tag(), attrs, true);
    self
  }

  pub fn text(&mut self, text: &SafeXmlString) -> &mut Self {
    self.buf.push_str(text.as_str());
    self
  }

  /// `<name>text</name>`
  pub fn element(&mut self, name: impl Tag, text: &SafeXmlString) -> &mut Self {
    self.open(name, &[]).text(text).close()
  }

  pub fn close(&mut self) -> &mut Self {
    if let Some(name) = self.open.pop() {
      self.buf.push_str("</");
      self.buf.push_str(&name);
      self.buf.push('>');
    }
    self
  }

  pub fn finish(mut self) -> String {
    while !self.open.is_empty() {
      self.close();
    }
    self.buf
  }

  fn start_tag(&mut self, name: &str, attrs: &[Attr], self_closing: bool) {
    self.buf.push('<');
    self.buf.push_str(name);
    for attr in attrs {
      self.buf.push(' ');
      self.buf.push_str(&attr.name);
      self.buf.push_str("=\"");
      self.buf.push_str(attr.value.as_str());
      self.buf.push('"');
    }
    self.buf.push_str(if self_closing { "/>" } else { ">" });
  }
}

impl Default for XmlWriter {
  fn default() -> Self {
    Self::new()
  }
}

/// Wildcard, single-character and escape characters used by `PropertyIsLike`.
pub const LIKE_WILDCARD: char = '*';
pub const LIKE_SINGLE_CHAR: char = '.';
pub const LIKE_ESCAPE: char = '!';

/// `*term*` with the pattern specials in `term` escaped.
pub fn like_pattern(term: &str) -> SafeXmlString {
  let mut pattern = String::with_capacity(term.len() + 2);
  pattern.push(LIKE_WILDCARD);
  for c in term.chars() {
    if matches!(c, LIKE_WILDCARD | LIKE_SINGLE_CHAR | LIKE_ESCAPE) {
      pattern.push(LIKE_ESCAPE);
    }
    pattern.push(c);
  }
  pattern.push(LIKE_WILDCARD);
  SafeXmlString::escape(&pattern)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_escapes_all_five_entities() {
    let escaped = SafeXmlString::escape(r#"<a href="x">Tom & Jerry's</a>"#);
    assert_eq!(
      escaped.as_str(),
      "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;"
    );
  }

  #[test]
  fn test_thai_text_passes_through() {
    assert_eq!(SafeXmlString::escape("โรงพยาบาล").as_str(), "โรงพยาบาล");
  }

  #[test]
  fn test_name_validation() {
    assert!(XmlName::new("db_gis").is_ok());
    assert!(XmlName::new("hospitals-2024.v1").is_ok());
    assert!(XmlName::new("").is_err());
    assert!(XmlName::new("1abc").is_err());
    assert!(XmlName::new("a b").is_err());
    assert!(XmlName::new("x><evil").is_err());
    assert!(XmlName::new("ws:layer").is_err());
  }

  #[test]
  fn test_writer_nests_and_closes() {
    let ns = XmlName::new("db_gis").unwrap();
    let mut w = XmlWriter::new();
    w.open("root", &[Attr::xmlns(&ns, "http://db_gis"), Attr::new("note", "a\"b")])
      .element("child", &SafeXmlString::escape("1 < 2"))
      .empty("leaf", &[Attr::new("fid", "hospitals.3")])
      .open("dangling", &[]);

    assert_eq!(
      w.finish(),
      concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<root xmlns:db_gis="http://db_gis" note="a&quot;b">"#,
        "<child>1 &lt; 2</child>",
        r#"<leaf fid="hospitals.3"/>"#,
        "<dangling></dangling></root>"
      )
    );
  }

  #[test]
  fn test_like_pattern_escapes_specials() {
    assert_eq!(like_pattern("Siriraj").as_str(), "*Siriraj*");
    assert_eq!(like_pattern("St. Mary*").as_str(), "*St!. Mary!**");
    assert_eq!(like_pattern("wow!").as_str(), "*wow!!*");
    assert_eq!(like_pattern("A&B").as_str(), "*A&amp;B*");
  }
}
