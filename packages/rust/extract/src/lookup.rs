//! Code → label lookup tables embedded in audit-service pages.
//!
//! The student-details page ships its picklists as script statements:
//!
//! ```text
//! sMajorPicklist[sMajorPicklist.length] = new DataItem("CSE     ", "Computer Sci &amp; Engineering   ");
//! ```
//!
//! [`LookupTables::parse`] collects every such statement once; callers then
//! resolve codes with [`LookupTable::lookup`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use regfetch_shared::{ExtractFailure, RegfetchError, Result};

/// Matches one `sXxxPicklist[sXxxPicklist.length] = new DataItem("code", "label");`.
static PICKLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"s(?P<table>\w+?)Picklist\[s(?P<index_table>\w+?)Picklist\.length\]\s*=\s*new DataItem\(\s*"(?P<code>[^"]*)"\s*,\s*"(?P<label>[^"]*)"\s*\);"#,
    )
    .expect("picklist regex")
});

/// One picklist: code → label.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    name: String,
    entries: HashMap<String, String>,
}

impl LookupTable {
    /// Resolve `code` to its label. Surrounding pad spaces are ignored.
    pub fn lookup(&self, code: &str) -> Result<&str> {
        self.entries
            .get(code.trim())
            .map(String::as_str)
            .ok_or_else(|| {
                RegfetchError::extraction(
                    format!("s{}Picklist", self.name),
                    ExtractFailure::UnknownCode(code.trim().to_string()),
                )
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All picklists found in one document, keyed by name (`Major`, `Level`, ...).
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    tables: HashMap<String, LookupTable>,
}

impl LookupTables {
    /// Collect every picklist entry in `body`. The first entry for a code wins.
    pub fn parse(body: &str) -> Self {
        let mut tables: HashMap<String, LookupTable> = HashMap::new();

        for caps in PICKLIST_RE.captures_iter(body) {
            let name = &caps["table"];
            if name != &caps["index_table"] {
                continue;
            }
            let table = tables.entry(name.to_string()).or_insert_with(|| LookupTable {
                name: name.to_string(),
                entries: HashMap::new(),
            });
            table
                .entries
                .entry(caps["code"].trim().to_string())
                .or_insert_with(|| caps["label"].trim().to_string());
        }

        Self { tables }
    }

    /// The picklist named `name`, or a no-match failure if the page had none.
    pub fn table(&self, name: &str) -> Result<&LookupTable> {
        self.tables
            .get(name)
            .ok_or_else(|| {
                RegfetchError::extraction(format!("s{name}Picklist"), ExtractFailure::NoMatch)
            })
    }

    /// Two-hop resolution: the label for `code` in picklist `name`.
    pub fn lookup(&self, name: &str, code: &str) -> Result<&str> {
        self.table(name)?.lookup(code)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
