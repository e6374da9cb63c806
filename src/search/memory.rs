//! In-memory search engine.
//!
//! Reference implementation of the backend contract, used by tests and the
//! CLI binary. Substring matching over symbol names and chunk content; no
//! ranking beyond exact-name-first.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::model::{CodeFile, Repository};
use crate::{Error, Result};

use super::{IndexStats, SearchEngine, SearchQuery, SearchResult};

/// In-memory backend holding whole `CodeFile` records keyed by file id.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    repositories: RwLock<HashMap<String, Repository>>,
    files: RwLock<HashMap<String, CodeFile>>,
}

impl MemoryEngine {
    /// Create an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently indexed.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }
}

#[async_trait]
impl SearchEngine for MemoryEngine {
    async fn index_file(&self, file: &CodeFile, repo: &Repository) -> Result<()> {
        self.repositories
            .write()
            .insert(repo.id.clone(), repo.clone());
        self.files.write().insert(file.id.clone(), file.clone());
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let needle = query.query.to_lowercase();
        let max_results = query.max_results.unwrap_or(50);
        let repositories = self.repositories.read();
        let files = self.files.read();
        let mut results = Vec::new();

        for file in files.values() {
            if let Some(language) = &query.language {
                if !file.language.eq_ignore_ascii_case(language) {
                    continue;
                }
            }
            if let Some(path_filter) = &query.file_path {
                if !file.relative_path.contains(path_filter.as_str()) {
                    continue;
                }
            }
            let repo_name = repositories
                .get(&file.repository_id)
                .map(|r| r.name.clone())
                .unwrap_or_default();
            if let Some(repository) = &query.repository {
                if !repo_name.eq_ignore_ascii_case(repository) {
                    continue;
                }
            }

            collect_file_matches(file, &repo_name, &needle, query, &mut results);
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(max_results);
        Ok(results)
    }

    async fn file_metadata(
        &self,
        relative_path: &str,
        repository: Option<&str>,
    ) -> Result<CodeFile> {
        let repositories = self.repositories.read();
        let files = self.files.read();

        files
            .values()
            .find(|file| {
                if file.relative_path != relative_path {
                    return false;
                }
                match repository {
                    Some(name) => repositories
                        .get(&file.repository_id)
                        .is_some_and(|r| r.name.eq_ignore_ascii_case(name)),
                    None => true,
                }
            })
            .cloned()
            .ok_or_else(|| Error::search(format!("file not found: {relative_path}")))
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let mut repos: Vec<Repository> = self.repositories.read().values().cloned().collect();
        repos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(repos)
    }

    async fn index_stats(&self) -> Result<IndexStats> {
        let files = self.files.read();
        let mut stats = IndexStats {
            total_repositories: self.repositories.read().len(),
            total_files: files.len(),
            ..Default::default()
        };

        for file in files.values() {
            stats.total_lines += file.lines;
            stats.total_functions += file.functions.len();
            stats.total_classes += file.classes.len();
            stats.total_variables += file.variables.len();
            stats.total_chunks += file.chunks.len();
            *stats.language_stats.entry(file.language.clone()).or_insert(0) += 1;
        }

        Ok(stats)
    }

    async fn delete_repository(&self, repository_id: &str) -> Result<()> {
        self.repositories.write().remove(repository_id);
        self.files
            .write()
            .retain(|_, file| file.repository_id != repository_id);
        Ok(())
    }
}

/// Append matches from one file: symbol hits by name, content hits by
/// chunk. Exact name matches outscore substring matches.
fn collect_file_matches(
    file: &CodeFile,
    repo_name: &str,
    needle: &str,
    query: &SearchQuery,
    results: &mut Vec<SearchResult>,
) {
    let kind_allows = |kind: &str| query.kind.as_deref().map_or(true, |k| k == kind);

    let make = |kind: &str, name: &str, content: &str, start: usize, end: usize, score: f64| {
        SearchResult {
            id: format!("{}:{kind}:{name}:{start}", file.id),
            repository_id: file.repository_id.clone(),
            repository: repo_name.to_string(),
            file_path: file.relative_path.clone(),
            language: file.language.clone(),
            kind: kind.to_string(),
            name: name.to_string(),
            content: content.to_string(),
            start_line: start,
            end_line: end,
            score,
        }
    };

    if kind_allows("function") {
        for function in &file.functions {
            if let Some(score) = name_score(&function.name, needle) {
                results.push(make(
                    "function",
                    &function.name,
                    &function.signature,
                    function.start_line,
                    function.end_line,
                    score,
                ));
            }
        }
    }

    if kind_allows("class") {
        for class in &file.classes {
            if let Some(score) = name_score(&class.name, needle) {
                results.push(make(
                    "class",
                    &class.name,
                    &class.name,
                    class.start_line,
                    class.end_line,
                    score,
                ));
            }
        }
    }

    if kind_allows("variable") {
        for variable in &file.variables {
            if let Some(score) = name_score(&variable.name, needle) {
                results.push(make(
                    "variable",
                    &variable.name,
                    &variable.name,
                    variable.start_line,
                    variable.end_line,
                    score,
                ));
            }
        }
    }

    if kind_allows("content") {
        for chunk in &file.chunks {
            if chunk.content.to_lowercase().contains(needle) {
                results.push(make(
                    "content",
                    &chunk.name,
                    &chunk.content,
                    chunk.start_line,
                    chunk.end_line,
                    0.5,
                ));
            }
        }
    }
}

/// Score a symbol name against the lowercased needle.
fn name_score(name: &str, needle: &str) -> Option<f64> {
    let lower = name.to_lowercase();
    if lower == needle {
        Some(1.0)
    } else if lower.contains(needle) {
        Some(0.75)
    } else {
        None
    }
}
