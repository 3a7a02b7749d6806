use statepack_store::RevisionSource;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Reads `HEAD` with `git -C <root> rev-parse HEAD`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitRevision;

impl RevisionSource for GitRevision {
    fn current_revision(&self, repo_root: &Path) -> Option<String> {
        git_stdout(repo_root, &["rev-parse", "HEAD"])
    }
}

/// The enclosing git work tree of `path`, or `path` itself (canonicalized
/// when possible) outside of git.
pub fn resolve_repo_root(path: &Path) -> PathBuf {
    if let Some(top) = git_stdout(path, &["rev-parse", "--show-toplevel"]) {
        return PathBuf::from(top);
    }
    debug!("{} is not inside a git work tree", path.display());
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn git_stdout(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(["-c", "user.name=statepack", "-c", "user.email=statepack@example.invalid"])
            .args(args)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn plain_directory_resolves_to_itself() {
        let dir = tempfile::tempdir().unwrap();
        if git(dir.path(), &["rev-parse", "--show-toplevel"]) {
            return;
        }
        assert_eq!(
            resolve_repo_root(dir.path()),
            dir.path().canonicalize().unwrap()
        );
        assert_eq!(GitRevision.current_revision(dir.path()), None);
    }

    #[test]
    fn missing_directory_falls_back_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert_eq!(resolve_repo_root(&missing), missing);
    }

    #[test]
    fn git_repository_reports_head_and_toplevel() {
        let dir = tempfile::tempdir().unwrap();
        if !git(dir.path(), &["init", "-q"]) {
            return;
        }
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        assert!(git(dir.path(), &["add", "a.txt"]));
        assert!(git(dir.path(), &["commit", "-q", "-m", "init"]));

        let head = GitRevision.current_revision(dir.path()).unwrap();
        assert!(head.len() >= 40 && head.bytes().all(|b| b.is_ascii_hexdigit()));

        let nested = dir.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(
            resolve_repo_root(&nested).canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
