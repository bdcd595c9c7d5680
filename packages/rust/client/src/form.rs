//! Ordered `application/x-www-form-urlencoded` request bodies.
//!
//! The audit service reads its form positionally in places, so fields are
//! serialized in insertion order and bare keys (`AUDITTYPE`) are kept as-is.

use std::fmt;

use scraper::Html;
use url::form_urlencoded;

/// An ordered list of form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBody {
    fields: Vec<(String, Option<String>)>,
}

impl FormBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key=value`. The value must already be form-safe (service codes,
    /// digits, pre-encoded literals).
    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), Some(value.into())));
        self
    }

    /// Append a bare `key` with no `=`.
    pub fn flag(mut self, key: &str) -> Self {
        self.fields.push((key.to_string(), None));
        self
    }

    /// Append `key=<encode_label(label)>` for human-readable text.
    pub fn label(self, key: &str, label: &str) -> Self {
        let encoded = encode_label(label);
        self.field(key, encoded)
    }

    /// Append `key=<value>` with the value percent-encoded.
    pub fn encoded(self, key: &str, value: &str) -> Self {
        let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
        self.field(key, encoded)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for FormBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            f.write_str(key)?;
            if let Some(value) = value {
                write!(f, "={value}")?;
            }
        }
        Ok(())
    }
}

/// Labels scraped from HTML carry entities (`&amp;`) and may contain spaces or
/// `&`, which would break a form body: decode the entities, then
/// percent-encode the result (spaces become `+`).
pub fn encode_label(raw: &str) -> String {
    let decoded = html_unescape(raw);
    form_urlencoded::byte_serialize(decoded.as_bytes()).collect()
}

/// Decode HTML character references in a text fragment.
pub fn html_unescape(raw: &str) -> String {
    Html::parse_fragment(raw).root_element().text().collect()
}
