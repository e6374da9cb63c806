//! Indexing orchestrator.
//!
//! Runs one full pass per repository: prepare, walk and filter, hash,
//! parse (best-effort), chunk, submit to the search backend, aggregate
//! statistics. Per-file failures are logged and skipped; only repository
//! acquisition failure and cancellation abort a pass. Passes over the same
//! repository are serialized; passes over different repositories may run
//! concurrently.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::chunker::Chunker;
use crate::config::Config;
use crate::model::{CodeFile, IndexingProgress, IndexingStatus, Repository};
use crate::parser::{helpers, Registry};
use crate::repo::{file_language, RepoManager, UNKNOWN_LANGUAGE};
use crate::search::SearchEngine;
use crate::{Error, Result};

mod store;

pub use store::{LocationStore, StoredLocation};

/// Orchestrates repository manager, parser registry, chunker, and search
/// backend for full indexing passes.
pub struct Indexer {
    config: Config,
    repo_manager: Arc<RepoManager>,
    registry: Registry,
    chunker: Chunker,
    engine: Arc<dyn SearchEngine>,
    locations: LocationStore,
    pass_locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
    progress: RwLock<HashMap<String, IndexingProgress>>,
}

impl Indexer {
    /// Create an indexer.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or the location
    /// store cannot be opened.
    pub fn new(
        config: Config,
        repo_manager: Arc<RepoManager>,
        engine: Arc<dyn SearchEngine>,
    ) -> Result<Self> {
        config.validate()?;
        let locations = LocationStore::open(config.location_store_path())?;
        let chunker = Chunker::new(config.chunking.clone());

        Ok(Self {
            config,
            repo_manager,
            registry: Registry::new(),
            chunker,
            engine,
            locations,
            pass_locks: Mutex::new(HashMap::new()),
            progress: RwLock::new(HashMap::new()),
        })
    }

    /// Run one full indexing pass over `source` (local path or clone URL).
    ///
    /// Returns the repository record with aggregated statistics: count of
    /// successfully indexed files, total lines, and the sorted language
    /// set.
    ///
    /// # Errors
    ///
    /// Returns a repository error when acquisition fails, or
    /// [`Error::Cancelled`] when the token fires during the pass. Per-file
    /// failures are logged and skipped, never propagated.
    pub async fn index_repository(
        &self,
        cancel: &CancellationToken,
        source: &str,
        name: Option<&str>,
    ) -> Result<Repository> {
        let pass_lock = self.pass_lock(source, name);
        let _guard = pass_lock.lock().await;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tracing::info!(source, "Starting repository indexing");
        let mut repo = self
            .repo_manager
            .prepare_repository(cancel, source, name)
            .await?;

        if let Err(err) = self.locations.record(
            &repo.id,
            StoredLocation {
                source: source.to_string(),
                name: name.map(ToString::to_string),
            },
        ) {
            tracing::warn!(repo_id = %repo.id, error = %err, "Failed to record repository location");
        }

        self.start_progress(&repo);

        let files = match self.discover_files(cancel, &repo) {
            Ok(files) => files,
            Err(err) => {
                self.fail_progress(&repo.id, "file discovery failed");
                return Err(err);
            }
        };
        self.update_progress(&repo.id, |p| {
            p.status = IndexingStatus::Indexing;
            p.total_files = files.len();
        });

        tracing::info!(
            repo_id = %repo.id,
            total_files = files.len(),
            "File discovery completed"
        );

        let mut total_lines = 0;
        let mut indexed = 0;
        let mut processed = 0;
        let mut languages = BTreeSet::new();

        for path in &files {
            if cancel.is_cancelled() {
                self.fail_progress(&repo.id, "cancelled");
                return Err(Error::Cancelled);
            }

            processed += 1;
            self.update_progress(&repo.id, |p| {
                p.files_processed += 1;
                p.current_file = Some(path.display().to_string());
            });

            match self.index_file(path, &repo).await {
                Ok((lines, language)) => {
                    indexed += 1;
                    total_lines += lines;
                    if language != UNKNOWN_LANGUAGE {
                        languages.insert(language.to_string());
                    }
                }
                Err(err) => {
                    tracing::warn!(file = %path.display(), error = %err, "Failed to index file, skipping");
                }
            }

            if processed % 100 == 0 {
                tracing::info!(repo_id = %repo.id, processed, total = files.len(), "Indexing progress");
            }
        }

        repo.file_count = indexed;
        repo.total_lines = total_lines;
        repo.languages = languages.into_iter().collect();
        repo.indexed_at = Some(Utc::now());

        self.update_progress(&repo.id, |p| {
            p.status = IndexingStatus::Completed;
            p.current_file = None;
            p.completed_at = Some(Utc::now());
            p.elapsed_seconds = (Utc::now() - p.started_at).num_milliseconds() as f64 / 1000.0;
        });

        tracing::info!(
            repo_id = %repo.id,
            repo_name = %repo.name,
            files_indexed = repo.file_count,
            total_lines = repo.total_lines,
            languages = ?repo.languages,
            "Repository indexing completed"
        );

        Ok(repo)
    }

    /// Delete a repository from the backend and re-run a full pass against
    /// its stored source location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] when no location is stored for the
    /// id, otherwise the same errors as [`Self::index_repository`].
    pub async fn reindex_repository(
        &self,
        cancel: &CancellationToken,
        repository_id: &str,
    ) -> Result<Repository> {
        let Some(location) = self.locations.lookup(repository_id) else {
            return Err(Error::unsupported(format!(
                "re-index of '{repository_id}' requires a stored source location"
            )));
        };

        tracing::info!(repo_id = repository_id, source = %location.source, "Re-indexing repository");
        self.engine.delete_repository(repository_id).await?;
        self.index_repository(cancel, &location.source, location.name.as_deref())
            .await
    }

    /// Progress snapshot of the latest pass over a repository, if one ran
    /// in this process.
    #[must_use]
    pub fn progress(&self, repository_id: &str) -> Option<IndexingProgress> {
        self.progress.read().get(repository_id).cloned()
    }

    /// The durable repository-location store.
    #[must_use]
    pub fn locations(&self) -> &LocationStore {
        &self.locations
    }

    /// Walk the repository collecting files that pass the eligibility
    /// filter.
    fn discover_files(
        &self,
        cancel: &CancellationToken,
        repo: &Repository,
    ) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.repo_manager
            .walk_files(cancel, &repo.path, |path, metadata| {
                if self.should_index_file(path, metadata) {
                    files.push(path.to_path_buf());
                }
                Ok(())
            })?;
        Ok(files)
    }

    /// Eligibility filter: regular file, within the size bound, supported
    /// extension, not excluded for itself or any ancestor directory.
    fn should_index_file(&self, path: &Path, metadata: &std::fs::Metadata) -> bool {
        if metadata.is_dir() {
            return false;
        }
        if metadata.len() > self.config.max_file_size {
            return false;
        }
        if !self.config.is_file_supported(path) {
            return false;
        }
        if self.config.should_exclude_file(path) {
            return false;
        }
        true
    }

    /// Read, hash, parse, chunk, and submit one file. Returns its line
    /// count and detected language.
    async fn index_file(&self, path: &Path, repo: &Repository) -> Result<(usize, &'static str)> {
        let bytes = tokio::fs::read(path).await?;
        let hash = blake3::hash(&bytes).to_hex().to_string();
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let language = file_language(path);

        let relative_path = path
            .strip_prefix(&repo.path)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let mut file = CodeFile {
            id: format!("{}:{relative_path}", repo.id),
            repository_id: repo.id.clone(),
            path: path.to_path_buf(),
            relative_path,
            language: language.to_string(),
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
            size: bytes.len() as u64,
            content,
            hash,
            indexed_at: Some(Utc::now()),
            ..Default::default()
        };

        // Best-effort parse: a failure degrades to a bare line count.
        match self.registry.parse_file(&file.content, path, language) {
            Ok(parsed) => {
                file.lines = parsed.lines;
                file.functions = parsed.functions;
                file.classes = parsed.classes;
                file.variables = parsed.variables;
                file.imports = parsed.imports;
                file.comments = parsed.comments;
            }
            Err(err) => {
                tracing::warn!(file = %path.display(), language, error = %err, "Failed to parse file");
            }
        }
        if file.lines == 0 {
            file.lines = helpers::count_lines(&file.content);
        }

        file.chunks = self.chunker.chunk_file(&file);

        self.engine
            .index_file(&file, repo)
            .await
            .map_err(|e| Error::search(format!("failed to submit file: {e}")))?;

        Ok((file.lines, language))
    }

    /// Per-target mutex serializing passes over the same repository.
    fn pass_lock(&self, source: &str, name: Option<&str>) -> Arc<tokio::sync::Mutex<()>> {
        let key = self.repo_manager.pass_key(source, name);
        Arc::clone(self.pass_locks.lock().entry(key).or_default())
    }

    fn start_progress(&self, repo: &Repository) {
        self.progress.write().insert(
            repo.id.clone(),
            IndexingProgress {
                repository_id: repo.id.clone(),
                repository: repo.name.clone(),
                status: IndexingStatus::Starting,
                files_processed: 0,
                total_files: 0,
                current_file: None,
                error: None,
                started_at: Utc::now(),
                completed_at: None,
                elapsed_seconds: 0.0,
            },
        );
    }

    fn update_progress(&self, repository_id: &str, f: impl FnOnce(&mut IndexingProgress)) {
        if let Some(progress) = self.progress.write().get_mut(repository_id) {
            f(progress);
        }
    }

    fn fail_progress(&self, repository_id: &str, reason: &str) {
        self.update_progress(repository_id, |p| {
            p.status = IndexingStatus::Failed;
            p.error = Some(reason.to_string());
            p.completed_at = Some(Utc::now());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MemoryEngine;
    use std::fs;
    use tempfile::TempDir;

    fn setup(tmp: &TempDir) -> (Arc<MemoryEngine>, Indexer) {
        let config = Config::new().with_repo_dir(tmp.path().join("repos"));
        let manager = Arc::new(RepoManager::new(config.repo_dir.clone()).unwrap());
        let engine = Arc::new(MemoryEngine::new());
        let indexer = Indexer::new(config, manager, Arc::clone(&engine) as Arc<dyn SearchEngine>)
            .unwrap();
        (engine, indexer)
    }

    fn write_source_tree(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join("main.go"),
            "package main\n\nfunc main() {\n\tprintln(\"hi\")\n}\n",
        )
        .unwrap();
        fs::write(dir.join("util.py"), "def helper():\n    return 1\n").unwrap();
        fs::write(dir.join("image.png"), [0_u8, 1, 2]).unwrap();
    }

    #[tokio::test]
    async fn test_index_repository_counts_and_languages() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("project");
        write_source_tree(&src);

        let (engine, indexer) = setup(&tmp);
        let cancel = CancellationToken::new();
        let repo = indexer
            .index_repository(&cancel, src.to_str().unwrap(), Some("project"))
            .await
            .unwrap();

        assert_eq!(repo.file_count, 2); // png filtered by extension
        assert_eq!(repo.languages, vec!["go".to_string(), "python".to_string()]);
        assert!(repo.total_lines > 0);
        assert!(repo.indexed_at.is_some());
        assert_eq!(engine.file_count(), 2);
    }

    #[tokio::test]
    async fn test_oversized_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("project");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("small.py"), "x = 1\n").unwrap();
        fs::write(src.join("big.py"), "y = 2\n".repeat(100_000)).unwrap();

        let config = Config::new()
            .with_repo_dir(tmp.path().join("repos"))
            .with_max_file_size(1024);
        let manager = Arc::new(RepoManager::new(config.repo_dir.clone()).unwrap());
        let engine = Arc::new(MemoryEngine::new());
        let indexer =
            Indexer::new(config, manager, Arc::clone(&engine) as Arc<dyn SearchEngine>).unwrap();

        let cancel = CancellationToken::new();
        let repo = indexer
            .index_repository(&cancel, src.to_str().unwrap(), None)
            .await
            .unwrap();

        assert_eq!(repo.file_count, 1);
    }

    #[tokio::test]
    async fn test_excluded_directories_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("project");
        fs::create_dir_all(src.join("node_modules/pkg")).unwrap();
        fs::write(src.join("node_modules/pkg/index.js"), "module.exports = 1;\n").unwrap();
        fs::write(src.join("app.js"), "const x = 1;\n").unwrap();

        let (_engine, indexer) = setup(&tmp);
        let cancel = CancellationToken::new();
        let repo = indexer
            .index_repository(&cancel, src.to_str().unwrap(), None)
            .await
            .unwrap();

        assert_eq!(repo.file_count, 1);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_pass() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("project");
        write_source_tree(&src);

        let (_engine, indexer) = setup(&tmp);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = indexer
            .index_repository(&cancel, src.to_str().unwrap(), None)
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_missing_repository_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let (_engine, indexer) = setup(&tmp);
        let cancel = CancellationToken::new();

        let result = indexer
            .index_repository(&cancel, "/no/such/place", None)
            .await;
        assert!(matches!(result, Err(Error::Repository(_))));
    }

    #[tokio::test]
    async fn test_reindex_without_location_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let (_engine, indexer) = setup(&tmp);
        let cancel = CancellationToken::new();

        let result = indexer.reindex_repository(&cancel, "unknown-id").await;
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_reindex_uses_stored_location() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("project");
        write_source_tree(&src);

        let (engine, indexer) = setup(&tmp);
        let cancel = CancellationToken::new();
        let repo = indexer
            .index_repository(&cancel, src.to_str().unwrap(), Some("project"))
            .await
            .unwrap();

        let again = indexer
            .reindex_repository(&cancel, &repo.id)
            .await
            .unwrap();
        assert_eq!(again.id, repo.id);
        assert_eq!(again.file_count, repo.file_count);
        assert_eq!(engine.file_count(), 2);
    }

    #[tokio::test]
    async fn test_file_hash_is_stable() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("project");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("one.py"), "x = 1\n").unwrap();

        let (engine, indexer) = setup(&tmp);
        let cancel = CancellationToken::new();
        indexer
            .index_repository(&cancel, src.to_str().unwrap(), None)
            .await
            .unwrap();
        let first = engine.file_metadata("one.py", None).await.unwrap().hash;

        indexer
            .index_repository(&cancel, src.to_str().unwrap(), None)
            .await
            .unwrap();
        let second = engine.file_metadata("one.py", None).await.unwrap().hash;

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[tokio::test]
    async fn test_progress_reaches_completed() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("project");
        write_source_tree(&src);

        let (_engine, indexer) = setup(&tmp);
        let cancel = CancellationToken::new();
        let repo = indexer
            .index_repository(&cancel, src.to_str().unwrap(), None)
            .await
            .unwrap();

        let progress = indexer.progress(&repo.id).unwrap();
        assert_eq!(progress.status, IndexingStatus::Completed);
        assert_eq!(progress.files_processed, progress.total_files);
        assert!(progress.completed_at.is_some());
    }
}
