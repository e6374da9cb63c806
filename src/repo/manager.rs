//! Repository acquisition and metadata.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::RepositoryError;
use crate::model::{CommitInfo, Repository, Submodule};
use crate::{Error, Result};

use super::submodules::read_submodules;
use super::walker::{self, IgnoreCache};

/// Handles repository acquisition (clone/update or local validation) and
/// ignore-aware file discovery.
pub struct RepoManager {
    repo_dir: PathBuf,
    ignores: IgnoreCache,
}

impl RepoManager {
    /// Create a manager that clones remote repositories under `repo_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(repo_dir: impl Into<PathBuf>) -> Result<Self> {
        let repo_dir = repo_dir.into();
        std::fs::create_dir_all(&repo_dir)?;

        Ok(Self {
            repo_dir,
            ignores: IgnoreCache::new(),
        })
    }

    /// Prepare a repository for indexing: clone or fast-forward update when
    /// `source` is an `http(s)`/`git` URL, validate the directory when it is
    /// a local path.
    ///
    /// An update failure on an existing clone is downgraded to a warning and
    /// the existing snapshot is used; a stale index beats a hard failure.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] when a local path is missing or not a
    /// directory, when a fresh clone fails, or [`Error::Cancelled`] when the
    /// token fires during the clone.
    pub async fn prepare_repository(
        &self,
        cancel: &CancellationToken,
        source: &str,
        name: Option<&str>,
    ) -> Result<Repository> {
        if let Some(url) = remote_url(source) {
            let repo_name = name.map_or_else(|| derive_repo_name(&url), ToString::to_string);
            let target = self.repo_dir.join(&repo_name);

            let clone_url = url.to_string();
            let clone_target = target.clone();
            let clone_cancel = cancel.clone();
            tokio::task::spawn_blocking(move || {
                clone_or_update(&clone_cancel, &clone_url, &clone_target)
            })
            .await
            .map_err(|e| Error::internal(format!("clone task failed: {e}")))??;

            let repo = repository_info(&target, Some(source), Some(&repo_name));
            tracing::info!(name = %repo.name, path = %repo.path.display(), remote = true, "Repository prepared");
            return Ok(repo);
        }

        let path = Path::new(source);
        if !path.exists() {
            return Err(RepositoryError::MissingPath {
                path: source.to_string(),
            }
            .into());
        }
        let abs = path.canonicalize()?;
        if !abs.is_dir() {
            return Err(RepositoryError::NotADirectory {
                path: abs.display().to_string(),
            }
            .into());
        }

        let repo = repository_info(&abs, None, name);
        tracing::info!(name = %repo.name, path = %repo.path.display(), remote = false, "Repository prepared");
        Ok(repo)
    }

    /// Walk eligible files under `repo_path`, honoring the cached ignore
    /// rules. See [`walker::walk_files`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] on cancellation or the first visitor
    /// error.
    pub fn walk_files<F>(
        &self,
        cancel: &CancellationToken,
        repo_path: &Path,
        visit: F,
    ) -> Result<()>
    where
        F: FnMut(&Path, &std::fs::Metadata) -> Result<()>,
    {
        walker::walk_files(cancel, &self.ignores, repo_path, visit)
    }

    /// Submodule declarations of the repository, empty when none exist.
    ///
    /// # Errors
    ///
    /// Returns an error only when an existing `.gitmodules` is unreadable.
    pub fn submodules(&self, repo_path: &Path) -> Result<Vec<Submodule>> {
        read_submodules(repo_path)
    }

    /// Commit history from head, skipping past `from_commit` (inclusive)
    /// and bounded by `limit`. See [`super::commit_history`].
    ///
    /// # Errors
    ///
    /// Returns an error when `repo_path` is not a git repository.
    pub fn commit_history(
        &self,
        repo_path: &Path,
        from_commit: &str,
        limit: usize,
    ) -> Result<Vec<CommitInfo>> {
        super::history::commit_history(repo_path, from_commit, limit)
    }

    /// Directory remote repositories are cloned into.
    #[must_use]
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Stable key for the local directory a source resolves to. Used to
    /// serialize concurrent passes over the same repository before the
    /// repository record (and its id) exists.
    #[must_use]
    pub fn pass_key(&self, source: &str, name: Option<&str>) -> PathBuf {
        if let Some(url) = remote_url(source) {
            let repo_name = name.map_or_else(|| derive_repo_name(&url), ToString::to_string);
            return self.repo_dir.join(repo_name);
        }
        Path::new(source)
            .canonicalize()
            .unwrap_or_else(|_| PathBuf::from(source))
    }
}

/// Deterministic repository identity: truncated content hash of the
/// resolved absolute path. Stable across re-runs and clone timing.
#[must_use]
pub(crate) fn repo_id(path: &Path) -> String {
    let digest = blake3::hash(path.to_string_lossy().as_bytes());
    digest.to_hex()[..16].to_string()
}

/// Parse `source` as a clone URL; `None` means a local path.
fn remote_url(source: &str) -> Option<Url> {
    let url = Url::parse(source).ok()?;
    matches!(url.scheme(), "http" | "https" | "git").then_some(url)
}

/// Derive a clone directory name from the URL's last two path segments,
/// e.g. `https://host/org/repo.git` becomes `org-repo`.
fn derive_repo_name(url: &Url) -> String {
    let path = url.path().trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => "unknown-repo".to_string(),
        [single] => (*single).to_string(),
        [.., org, repo] => format!("{org}-{repo}"),
    }
}

/// Clone a repository, or fast-forward an existing clone. Update failures
/// are logged and the existing snapshot wins.
fn clone_or_update(cancel: &CancellationToken, url: &str, target: &Path) -> Result<()> {
    if target.join(".git").exists() {
        tracing::info!(path = %target.display(), "Updating existing clone");
        if let Err(err) = fast_forward_update(cancel, target) {
            if matches!(err, Error::Cancelled) {
                return Err(err);
            }
            tracing::warn!(
                path = %target.display(),
                error = %err,
                "Failed to update clone, continuing with existing snapshot"
            );
        }
        return Ok(());
    }

    tracing::info!(url, path = %target.display(), "Cloning repository");

    let mut callbacks = git2::RemoteCallbacks::new();
    let token = cancel.clone();
    callbacks.transfer_progress(move |_| !token.is_cancelled());

    let mut fetch_options = git2::FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);

    git2::build::RepoBuilder::new()
        .fetch_options(fetch_options)
        .clone(url, target)
        .map(|_| ())
        .map_err(|err| {
            if cancel.is_cancelled() {
                Error::Cancelled
            } else {
                RepositoryError::Clone {
                    url: url.to_string(),
                    reason: err.message().to_string(),
                }
                .into()
            }
        })
}

/// Fetch from origin and fast-forward the current branch. Anything other
/// than a fast-forward is reported as an error for the caller to downgrade.
fn fast_forward_update(cancel: &CancellationToken, target: &Path) -> Result<()> {
    let repo = git2::Repository::open(target)?;
    let mut remote = repo.find_remote("origin")?;

    let mut callbacks = git2::RemoteCallbacks::new();
    let token = cancel.clone();
    callbacks.transfer_progress(move |_| !token.is_cancelled());
    let mut fetch_options = git2::FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);

    remote.fetch(&[] as &[&str], Some(&mut fetch_options), None)?;
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

    if analysis.is_up_to_date() {
        return Ok(());
    }

    if analysis.is_fast_forward() {
        let head_name = repo
            .head()?
            .name()
            .map(ToString::to_string)
            .ok_or_else(|| RepositoryError::Git("unnamed HEAD reference".to_string()))?;
        let mut reference = repo.find_reference(&head_name)?;
        reference.set_target(fetch_commit.id(), "fast-forward")?;
        repo.set_head(&head_name)?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
        return Ok(());
    }

    Err(RepositoryError::Git("non-fast-forward update required".to_string()).into())
}

/// Build the repository record: identity, name, and best-effort git
/// metadata (branch, head hash, submodules). Plain directories simply get
/// no git fields.
fn repository_info(path: &Path, url: Option<&str>, name: Option<&str>) -> Repository {
    let mut repo = Repository {
        id: repo_id(path),
        path: path.to_path_buf(),
        url: url.map(ToString::to_string),
        ..Default::default()
    };

    repo.name = name.map_or_else(
        || {
            path.file_name()
                .map_or_else(|| "unknown-repo".to_string(), |n| n.to_string_lossy().to_string())
        },
        ToString::to_string,
    );

    if let Ok(git) = git2::Repository::open(path) {
        if let Ok(head) = git.head() {
            repo.branch = head.shorthand().map(ToString::to_string);
            if let Some(oid) = head.target() {
                let hash = oid.to_string();
                repo.last_commit = Some(hash[..8].to_string());
                repo.last_indexed_hash = Some(hash);
            }
        }
        repo.submodules = read_submodules(path).unwrap_or_default();
    }

    repo
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_repo_id_is_deterministic() {
        let a = repo_id(Path::new("/some/repo"));
        let b = repo_id(Path::new("/some/repo"));
        let c = repo_id(Path::new("/other/repo"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_remote_url_detection() {
        assert!(remote_url("https://github.com/org/repo.git").is_some());
        assert!(remote_url("http://example.com/repo").is_some());
        assert!(remote_url("git://example.com/repo.git").is_some());
        assert!(remote_url("/home/user/project").is_none());
        assert!(remote_url("./relative/path").is_none());
    }

    #[test]
    fn test_derive_repo_name() {
        let url = Url::parse("https://github.com/acme/widgets.git").unwrap();
        assert_eq!(derive_repo_name(&url), "acme-widgets");

        let url = Url::parse("https://example.com/solo").unwrap();
        assert_eq!(derive_repo_name(&url), "solo");

        let url = Url::parse("https://example.com/a/b/c").unwrap();
        assert_eq!(derive_repo_name(&url), "b-c");
    }

    #[tokio::test]
    async fn test_prepare_local_directory() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("main.rs"), "fn main() {}").unwrap();

        let manager = RepoManager::new(tmp.path().join("clones")).unwrap();
        let cancel = CancellationToken::new();
        let repo = manager
            .prepare_repository(&cancel, tmp.path().to_str().unwrap(), Some("demo"))
            .await
            .unwrap();

        assert_eq!(repo.name, "demo");
        assert_eq!(repo.id.len(), 16);
        assert!(repo.url.is_none());
        assert!(repo.branch.is_none()); // plain directory, no git metadata
    }

    #[tokio::test]
    async fn test_prepare_missing_path_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let manager = RepoManager::new(tmp.path().join("clones")).unwrap();
        let cancel = CancellationToken::new();

        let err = manager
            .prepare_repository(&cancel, "/no/such/path/anywhere", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Repository(RepositoryError::MissingPath { .. })
        ));
    }

    #[tokio::test]
    async fn test_prepare_file_path_is_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("single.rs");
        fs::write(&file, "fn main() {}").unwrap();

        let manager = RepoManager::new(tmp.path().join("clones")).unwrap();
        let cancel = CancellationToken::new();

        let err = manager
            .prepare_repository(&cancel, file.to_str().unwrap(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Repository(RepositoryError::NotADirectory { .. })
        ));
    }

    #[tokio::test]
    async fn test_prepare_git_repository_extracts_metadata() {
        let tmp = TempDir::new().unwrap();
        let repo = git2::Repository::init(tmp.path()).unwrap();
        fs::write(tmp.path().join("a.txt"), "hello").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("a.txt")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();

        let manager = RepoManager::new(tmp.path().join("clones")).unwrap();
        let cancel = CancellationToken::new();
        let prepared = manager
            .prepare_repository(&cancel, tmp.path().to_str().unwrap(), None)
            .await
            .unwrap();

        assert!(prepared.branch.is_some());
        assert!(prepared.last_indexed_hash.is_some());
        assert_eq!(prepared.last_commit.as_ref().unwrap().len(), 8);
    }

    #[test]
    fn test_repository_info_name_fallback() {
        let tmp = TempDir::new().unwrap();
        let repo = repository_info(tmp.path(), None, None);
        assert_eq!(
            repo.name,
            tmp.path().file_name().unwrap().to_string_lossy().to_string()
        );
    }
}
