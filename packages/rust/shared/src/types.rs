//! Core domain types shared by the audit pipeline and the batch fetcher.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{RegfetchError, Result};
use crate::term::Term;

/// Department code → opaque option reference (URL or form value).
pub type DepartmentOptions = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// SessionCredential
// ---------------------------------------------------------------------------

/// Caller-supplied session cookie. Forwarded verbatim, never parsed.
#[derive(Clone)]
pub struct SessionCredential(String);

impl SessionCredential {
    pub fn new(cookie: impl Into<String>) -> Result<Self> {
        let cookie = cookie.into();
        if cookie.trim().is_empty() {
            return Err(RegfetchError::validation("session cookie is empty"));
        }
        Ok(Self(cookie))
    }

    /// The raw cookie header value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCredential(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Student record
// ---------------------------------------------------------------------------

/// A student identifier: a non-empty string of ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentId(String);

impl StudentId {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RegfetchError::validation(format!(
                "student id must be digits, got `{raw}`"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A service code together with its human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedLabel {
    pub code: String,
    pub label: String,
}

/// Program attributes resolved in the second audit stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramAttributes {
    /// School code, e.g. `U`.
    pub school: String,
    /// Degree code and its full name (`BS` / `Bachelor of Science`).
    pub degree: CodedLabel,
    /// Student level code and label (`3` / `Junior`).
    pub level: CodedLabel,
    /// Major code and label.
    pub major: CodedLabel,
}

/// Everything the audit request needs, threaded forward stage by stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub student_id: StudentId,
    pub program: ProgramAttributes,
}

// ---------------------------------------------------------------------------
// DepartmentTask
// ---------------------------------------------------------------------------

/// One unit of batch work: what to fetch and how to ask for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentTask {
    /// Schedule term; `None` for catalogue and prerequisite fetches.
    pub term: Option<Term>,
    /// Department code as listed by the remote service (may contain `/`).
    pub department: String,
    /// Opaque option reference from the department lookup.
    pub option: String,
}

impl DepartmentTask {
    /// Progress label: `COMPSCI`, or `F26: COMPSCI` for schedule tasks.
    pub fn label(&self) -> String {
        match &self.term {
            Some(term) => format!("{}: {}", term.short_label(), self.department),
            None => self.department.clone(),
        }
    }
}
