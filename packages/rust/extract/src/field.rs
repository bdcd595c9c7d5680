//! Named-pattern field extraction.

use std::collections::BTreeMap;

use regex::Regex;
use regfetch_shared::{ExtractFailure, RegfetchError, Result};

/// A named regular expression whose named groups are the fields it yields.
///
/// Every named group is mandatory: a match where any group did not
/// participate, or captured nothing, is a failure rather than a default.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    name: &'static str,
    regex: Regex,
}

/// Named captures from one successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    pattern: &'static str,
    values: BTreeMap<String, String>,
}

impl Fields {
    /// The value of `group`, or a `MissingGroup` failure.
    pub fn require(&self, group: &str) -> Result<&str> {
        self.values.get(group).map(String::as_str).ok_or_else(|| {
            RegfetchError::extraction(self.pattern, ExtractFailure::MissingGroup(group.into()))
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FieldPattern {
    pub fn new(name: &'static str, regex: Regex) -> Self {
        Self { name, regex }
    }

    /// Match against `text` and return every named group.
    pub fn extract(&self, text: &str) -> Result<Fields> {
        let caps = self
            .regex
            .captures(text)
            .ok_or_else(|| self.fail(ExtractFailure::NoMatch))?;

        let mut values = BTreeMap::new();
        for group in self.regex.capture_names().flatten() {
            let value = caps
                .name(group)
                .ok_or_else(|| self.fail(ExtractFailure::MissingGroup(group.into())))?
                .as_str();
            if value.is_empty() {
                return Err(self.fail(ExtractFailure::EmptyCapture(group.into())));
            }
            values.insert(group.to_string(), value.to_string());
        }

        if values.is_empty() {
            return Err(self.fail(ExtractFailure::MissingGroup("<named group>".into())));
        }

        Ok(Fields {
            pattern: self.name,
            values,
        })
    }

    /// Match against `text` and return the single group `group`.
    pub fn extract_one(&self, text: &str, group: &str) -> Result<String> {
        self.extract(text)?.require(group).map(str::to_string)
    }

    /// Match against the sub-document between `open` and `close`.
    pub fn extract_within(&self, text: &str, open: &str, close: &str) -> Result<Fields> {
        let inner = section(self.name, text, open, close)?;
        self.extract(inner)
    }

    fn fail(&self, reason: ExtractFailure) -> RegfetchError {
        RegfetchError::extraction(self.name, reason)
    }
}

/// The text between the first `open` marker and the last `close` marker.
///
/// Missing `open` is a plain no-match; an `open` without a following `close`
/// means the document is truncated or malformed.
pub fn section<'a>(field: &str, text: &'a str, open: &str, close: &str) -> Result<&'a str> {
    let start = text
        .find(open)
        .ok_or_else(|| RegfetchError::extraction(field, ExtractFailure::NoMatch))?
        + open.len();

    match text.rfind(close) {
        Some(end) if end >= start => Ok(&text[start..end]),
        _ => Err(RegfetchError::extraction(
            field,
            ExtractFailure::MalformedDocument(format!("`{open}` without closing `{close}`")),
        )),
    }
}
