//! On-disk cache tree for fetched registrar pages and audit reports.
//!
//! Layout under the configured root:
//!
//! ```text
//! <root>/registrar/<DEPT>/catalogue.html
//! <root>/registrar/<DEPT>/prereqs.html
//! <root>/registrar/<DEPT>/soc_<term>.txt
//! <root>/DGW_Report-<student id>.xsl
//! ```
//!
//! `/` in department codes becomes `_`. An artifact's existence is the only
//! cache-hit signal; artifacts are written whole via a temporary sibling and a
//! rename, so an interrupted write never leaves a file that looks complete.

use std::fs;
use std::path::{Path, PathBuf};

use regfetch_shared::{RegfetchError, Result, StudentId, Term};

/// Subdirectory holding per-department artifacts.
const REGISTRAR_DIR: &str = "registrar";

/// What a department artifact contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    Catalogue,
    Prerequisites,
    Schedule(Term),
}

impl ArtifactKind {
    pub fn file_name(&self) -> String {
        match self {
            Self::Catalogue => "catalogue.html".into(),
            Self::Prerequisites => "prereqs.html".into(),
            Self::Schedule(term) => format!("soc_{term}.txt"),
        }
    }
}

/// Root of the cache tree. Cheap to clone; holds only the path.
#[derive(Debug, Clone)]
pub struct CacheTree {
    root: PathBuf,
}

impl CacheTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/registrar/<department with '/' replaced by '_'>`.
    pub fn department_dir(&self, department: &str) -> Result<PathBuf> {
        let name = department.trim().replace('/', "_");
        if name.is_empty() || name == "." || name == ".." {
            return Err(RegfetchError::validation(format!(
                "department code `{department}` cannot name a cache directory"
            )));
        }
        Ok(self.root.join(REGISTRAR_DIR).join(name))
    }

    pub fn artifact_path(&self, department: &str, kind: &ArtifactKind) -> Result<PathBuf> {
        Ok(self.department_dir(department)?.join(kind.file_name()))
    }

    /// `<root>/DGW_Report-<student id>.xsl`.
    pub fn audit_report_path(&self, student_id: &StudentId) -> PathBuf {
        self.root.join(format!("DGW_Report-{student_id}.xsl"))
    }

    /// Whether the artifact has already been written.
    pub fn contains(&self, department: &str, kind: &ArtifactKind) -> Result<bool> {
        Ok(self.artifact_path(department, kind)?.is_file())
    }

    /// Write (or fully replace) a department artifact, creating directories.
    pub fn write_artifact(
        &self,
        department: &str,
        kind: &ArtifactKind,
        body: &str,
    ) -> Result<PathBuf> {
        let path = self.artifact_path(department, kind)?;
        write_atomic(&path, body)?;
        Ok(path)
    }

    /// Write (or fully replace) a student's audit report.
    pub fn write_audit_report(&self, student_id: &StudentId, body: &str) -> Result<PathBuf> {
        let path = self.audit_report_path(student_id);
        write_atomic(&path, body)?;
        Ok(path)
    }
}

/// Write `body` to a temporary sibling of `path`, then rename it into place.
fn write_atomic(path: &Path, body: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| RegfetchError::validation(format!("{} has no parent", path.display())))?;
    fs::create_dir_all(parent).map_err(|e| RegfetchError::io(parent, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = parent.join(format!(".{file_name}.part"));

    fs::write(&partial, body).map_err(|e| RegfetchError::io(&partial, e))?;
    if let Err(e) = fs::rename(&partial, path) {
        let _ = fs::remove_file(&partial);
        return Err(RegfetchError::io(path, e));
    }

    tracing::debug!(path = %path.display(), bytes = body.len(), "cache artifact written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regfetch_shared::term::fall_term;
    use uuid::Uuid;

    fn test_tree() -> CacheTree {
        CacheTree::new(std::env::temp_dir().join(format!("rf_cache_{}", Uuid::now_v7())))
    }

    #[test]
    fn artifact_file_names() {
        assert_eq!(ArtifactKind::Catalogue.file_name(), "catalogue.html");
        assert_eq!(ArtifactKind::Prerequisites.file_name(), "prereqs.html");
        assert_eq!(
            ArtifactKind::Schedule(fall_term(2026)).file_name(),
            "soc_2026-92.txt"
        );
    }

    #[test]
    fn department_slashes_become_underscores() {
        let tree = CacheTree::new("/var/www");
        assert_eq!(
            tree.artifact_path("CRM/LAW", &ArtifactKind::Catalogue).unwrap(),
            PathBuf::from("/var/www/registrar/CRM_LAW/catalogue.html")
        );
        assert_eq!(
            tree.department_dir("I&C SCI").unwrap(),
            PathBuf::from("/var/www/registrar/I&C SCI")
        );
    }

    #[test]
    fn unusable_department_codes_are_rejected() {
        let tree = CacheTree::new("/var/www");
        assert!(tree.department_dir("").is_err());
        assert!(tree.department_dir("..").is_err());
    }

    #[test]
    fn audit_report_path() {
        let tree = CacheTree::new("/var/www");
        let id = StudentId::parse("12345678").unwrap();
        assert_eq!(
            tree.audit_report_path(&id),
            PathBuf::from("/var/www/DGW_Report-12345678.xsl")
        );
    }

    #[test]
    fn write_creates_directories_and_replaces_content() {
        let tree = test_tree();
        let kind = ArtifactKind::Schedule(fall_term(2026));

        assert!(!tree.contains("COMPSCI", &kind).unwrap());
        let path = tree.write_artifact("COMPSCI", &kind, "first").unwrap();
        assert!(tree.contains("COMPSCI", &kind).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        tree.write_artifact("COMPSCI", &kind, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");

        // No temporary file is left behind.
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = fs::remove_dir_all(tree.root());
    }

    #[test]
    fn write_audit_report_at_root() {
        let tree = test_tree();
        let id = StudentId::parse("42").unwrap();
        let path = tree.write_audit_report(&id, "<xml/>").unwrap();
        assert_eq!(path, tree.root().join("DGW_Report-42.xsl"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<xml/>");

        let _ = fs::remove_dir_all(tree.root());
    }
}
