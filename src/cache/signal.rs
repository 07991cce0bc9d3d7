//! "Investigation in progress" signal used to pick the TTL of absent entries.

use std::path::{Path, PathBuf};

/// Existence check for an investigation artifact keyed by identifier.
///
/// The cache only asks whether one exists; it never reads or writes it.
pub trait InvestigationSignal: Send + Sync {
    fn exists(&self, id: &str) -> bool;
}

/// Looks for `<dir>/<id>.<extension>` on disk.
#[derive(Debug, Clone)]
pub struct FsInvestigationSignal {
    dir: PathBuf,
    extension: String,
}

impl FsInvestigationSignal {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn artifact_path(&self, id: &str) -> PathBuf {
        if self.extension.is_empty() {
            self.dir.join(id)
        } else {
            self.dir.join(format!("{}.{}", id, self.extension))
        }
    }
}

impl InvestigationSignal for FsInvestigationSignal {
    fn exists(&self, id: &str) -> bool {
        // Identifiers are alphanumeric; anything else never maps to a file.
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        self.artifact_path(id).is_file()
    }
}

/// No identifier is ever under investigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInvestigations;

impl InvestigationSignal for NoInvestigations {
    fn exists(&self, _id: &str) -> bool {
        false
    }
}

impl<F> InvestigationSignal for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn exists(&self, id: &str) -> bool {
        self(id)
    }
}
