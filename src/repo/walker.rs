//! Ignore-aware file traversal.
//!
//! Walks a repository depth-first, pruning whole subtrees whose directory
//! matches the repository's ignore rules and skipping matching files.
//! Ignore rules are compiled once per repository path and cached; the cache
//! is shared across concurrently indexed repositories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Concurrency-safe cache of compiled `.gitignore` matchers keyed by
/// repository path. Entries are immutable once built.
#[derive(Debug, Default)]
pub struct IgnoreCache {
    matchers: RwLock<HashMap<PathBuf, Arc<Gitignore>>>,
}

impl IgnoreCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the compiled matcher for a repository, building it on first use.
    pub fn matcher(&self, repo_path: &Path) -> Arc<Gitignore> {
        if let Some(matcher) = self.matchers.read().get(repo_path) {
            return Arc::clone(matcher);
        }

        let built = Arc::new(build_matcher(repo_path));
        let mut matchers = self.matchers.write();
        // Another pass may have built the entry while we compiled ours.
        Arc::clone(matchers.entry(repo_path.to_path_buf()).or_insert(built))
    }

    /// Check whether a path inside `repo_path` is ignored.
    #[must_use]
    pub fn is_ignored(&self, repo_path: &Path, path: &Path, is_dir: bool) -> bool {
        self.matcher(repo_path).matched(path, is_dir).is_ignore()
    }
}

/// Compile the repository's `.gitignore`, or an empty matcher when absent
/// or unreadable.
fn build_matcher(repo_path: &Path) -> Gitignore {
    let gitignore_path = repo_path.join(".gitignore");
    if !gitignore_path.exists() {
        return Gitignore::empty();
    }

    let mut builder = GitignoreBuilder::new(repo_path);
    if let Some(err) = builder.add(&gitignore_path) {
        tracing::warn!(path = %gitignore_path.display(), error = %err, "Failed to read .gitignore");
        return Gitignore::empty();
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!(path = %gitignore_path.display(), error = %err, "Failed to compile .gitignore");
        Gitignore::empty()
    })
}

/// Walk all files under `repo_path` depth-first, invoking the visitor with
/// each surviving file's path and metadata.
///
/// Directories matching the ignore rules are pruned without descending;
/// matching files are skipped. Traversal errors on individual entries are
/// logged and do not abort the walk.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] when the token fires mid-walk, or the
/// first error returned by the visitor.
pub fn walk_files<F>(
    cancel: &CancellationToken,
    cache: &IgnoreCache,
    repo_path: &Path,
    mut visit: F,
) -> Result<()>
where
    F: FnMut(&Path, &std::fs::Metadata) -> Result<()>,
{
    let root = repo_path.to_path_buf();
    let walker = WalkDir::new(repo_path).into_iter().filter_entry(|entry| {
        // Keep the root itself; prune ignored directories wholesale.
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        !cache.is_ignored(&root, entry.path(), true)
    });

    for entry in walker {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "Error walking directory entry");
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        if cache.is_ignored(repo_path, entry.path(), false) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::warn!(path = %entry.path().display(), error = %err, "Failed to stat file");
                continue;
            }
        };

        visit(entry.path(), &metadata)?;
    }

    Ok(())
}
