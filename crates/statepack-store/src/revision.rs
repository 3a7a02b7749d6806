use std::path::Path;

/// Best-effort lookup of the revision a repository is currently at.
///
/// Implementations must never fail the caller: anything that goes wrong is
/// reported as `None`.
pub trait RevisionSource {
    fn current_revision(&self, repo_root: &Path) -> Option<String>;
}

/// A fixed answer, for callers that already know the revision (or know there
/// is none).
#[derive(Debug, Clone, Default)]
pub struct StaticRevision(pub Option<String>);

impl RevisionSource for StaticRevision {
    fn current_revision(&self, _repo_root: &Path) -> Option<String> {
        self.0.clone()
    }
}
