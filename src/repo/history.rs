//! Commit history with change sets.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::RepositoryError;
use crate::model::CommitInfo;
use crate::Result;

/// Walk commit history from the current head.
///
/// When `from_commit` is non-empty, commits are skipped up to and including
/// the matching hash, so the result contains only commits strictly older
/// than `from_commit` ("changes since" semantics). At most `limit` records
/// are returned. Each record carries the paths changed relative to the
/// commit's first parent; merge commits are diffed against parent 0 only.
///
/// # Errors
///
/// Returns [`RepositoryError::NotARepository`] when `repo_path` is not a
/// git repository, or a git error when the walk itself fails.
pub fn commit_history(
    repo_path: &Path,
    from_commit: &str,
    limit: usize,
) -> Result<Vec<CommitInfo>> {
    let repo = git2::Repository::open(repo_path).map_err(|_| RepositoryError::NotARepository {
        path: repo_path.display().to_string(),
    })?;

    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;

    let mut commits = Vec::new();
    let mut found_start = from_commit.is_empty();

    for oid in revwalk {
        let oid = oid?;

        if !found_start {
            if oid.to_string() == from_commit {
                found_start = true;
            }
            continue;
        }

        if commits.len() >= limit {
            break;
        }

        let commit = repo.find_commit(oid)?;
        commits.push(commit_info(&repo, &commit));
    }

    Ok(commits)
}

/// Build a [`CommitInfo`] record including the changed-file set.
fn commit_info(repo: &git2::Repository, commit: &git2::Commit<'_>) -> CommitInfo {
    let author = commit.author();
    let date = DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    CommitInfo {
        hash: commit.id().to_string(),
        message: commit.message().unwrap_or_default().to_string(),
        author: author.name().unwrap_or_default().to_string(),
        email: author.email().unwrap_or_default().to_string(),
        date,
        files: changed_files(repo, commit),
    }
}

/// Paths changed by a commit relative to its first parent. Root commits
/// and diff failures yield an empty set.
fn changed_files(repo: &git2::Repository, commit: &git2::Commit<'_>) -> Vec<String> {
    let mut files = Vec::new();

    if commit.parent_count() == 0 {
        return files;
    }

    let Ok(parent) = commit.parent(0) else {
        return files;
    };
    let (Ok(parent_tree), Ok(tree)) = (parent.tree(), commit.tree()) else {
        return files;
    };
    let Ok(diff) = repo.diff_tree_to_tree(Some(&parent_tree), Some(&tree), None) else {
        return files;
    };

    for delta in diff.deltas() {
        let old = delta.old_file().path().map(|p| p.to_string_lossy().to_string());
        let new = delta.new_file().path().map(|p| p.to_string_lossy().to_string());

        if let Some(old_path) = &old {
            files.push(old_path.clone());
        }
        if let Some(new_path) = new {
            if old.as_deref() != Some(new_path.as_str()) {
                files.push(new_path);
            }
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Create a commit touching `name` and return its hash.
    fn add_commit(repo: &git2::Repository, dir: &Path, name: &str, content: &str) -> String {
        fs::write(dir.join(name), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        let sig = git2::Signature::now("Test Author", "test@example.com").unwrap();
        let parents: Vec<git2::Commit<'_>> = repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .and_then(|oid| repo.find_commit(oid).ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let oid = repo
            .commit(
                Some("HEAD"),
                &sig,
                &sig,
                &format!("add {name}"),
                &tree,
                &parent_refs,
            )
            .unwrap();
        oid.to_string()
    }

    fn seed_repo(dir: &Path, files: &[(&str, &str)]) -> (git2::Repository, Vec<String>) {
        let repo = git2::Repository::init(dir).unwrap();
        let mut hashes = Vec::new();
        for (name, content) in files {
            hashes.push(add_commit(&repo, dir, name, content));
        }
        (repo, hashes)
    }

    #[test]
    fn test_not_a_repository() {
        let tmp = TempDir::new().unwrap();
        let err = commit_history(tmp.path(), "", 10).unwrap_err();
        assert!(err.to_string().contains("not a git repository"));
    }

    #[test]
    fn test_history_newest_first_with_files() {
        let tmp = TempDir::new().unwrap();
        let (_repo, hashes) =
            seed_repo(tmp.path(), &[("a.txt", "one"), ("b.txt", "two"), ("c.txt", "three")]);

        let commits = commit_history(tmp.path(), "", 10).unwrap();
        assert_eq!(commits.len(), 3);
        assert_eq!(commits[0].hash, hashes[2]);
        assert_eq!(commits[2].hash, hashes[0]);
        assert_eq!(commits[0].files, vec!["c.txt".to_string()]);
        assert_eq!(commits[0].author, "Test Author");
        assert_eq!(commits[0].email, "test@example.com");
        // Root commit has no parent to diff against.
        assert!(commits[2].files.is_empty());
    }

    #[test]
    fn test_from_commit_is_excluded() {
        let tmp = TempDir::new().unwrap();
        let (_repo, hashes) =
            seed_repo(tmp.path(), &[("a.txt", "one"), ("b.txt", "two"), ("c.txt", "three")]);

        let commits = commit_history(tmp.path(), &hashes[2], 10).unwrap();
        assert_eq!(commits.len(), 2);
        assert!(commits.iter().all(|c| c.hash != hashes[2]));
        assert_eq!(commits[0].hash, hashes[1]);
        assert_eq!(commits[1].hash, hashes[0]);
    }

    #[test]
    fn test_limit_bounds_results() {
        let tmp = TempDir::new().unwrap();
        let (_repo, _) = seed_repo(
            tmp.path(),
            &[("a.txt", "1"), ("b.txt", "2"), ("c.txt", "3"), ("d.txt", "4")],
        );

        let commits = commit_history(tmp.path(), "", 2).unwrap();
        assert_eq!(commits.len(), 2);
    }

    #[test]
    fn test_pagination_resumes_from_cursor() {
        let tmp = TempDir::new().unwrap();
        let (_repo, hashes) = seed_repo(
            tmp.path(),
            &[("a.txt", "1"), ("b.txt", "2"), ("c.txt", "3"), ("d.txt", "4")],
        );

        let page1 = commit_history(tmp.path(), "", 2).unwrap();
        let page2 = commit_history(tmp.path(), &page1[1].hash, 2).unwrap();
        assert_eq!(page2.len(), 2);
        assert_eq!(page2[0].hash, hashes[1]);
        assert_eq!(page2[1].hash, hashes[0]);
    }
}
