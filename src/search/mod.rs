//! Search backend contract.
//!
//! The pipeline hands completed [`CodeFile`] records to an implementation
//! of [`SearchEngine`] and never mutates them afterwards. Storage and
//! ranking are the backend's concern; this module only fixes the boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{CodeFile, Repository};
use crate::Result;

mod memory;

pub use memory::MemoryEngine;

/// A search query with optional filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    /// Restrict to a result kind: "function", "class", "variable",
    /// "content", or "comment".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Repository name filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// File path substring filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    pub fuzzy: bool,
}

/// One search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub repository_id: String,
    pub repository: String,
    pub file_path: String,
    pub language: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub score: f64,
}

/// Aggregate statistics over everything indexed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_repositories: usize,
    pub total_files: usize,
    pub total_lines: usize,
    pub total_functions: usize,
    pub total_classes: usize,
    pub total_variables: usize,
    pub total_chunks: usize,
    pub language_stats: BTreeMap<String, usize>,
}

/// The external search backend consumed by the indexer.
///
/// `index_file` must be safe to call once per file per pass; persisting a
/// file is atomic from the backend's point of view (a complete `CodeFile`
/// or none at all).
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Persist or upsert one file plus its chunks.
    async fn index_file(&self, file: &CodeFile, repo: &Repository) -> Result<()>;

    /// Answer a query.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>>;

    /// Metadata for one indexed file by repository-relative path.
    async fn file_metadata(
        &self,
        relative_path: &str,
        repository: Option<&str>,
    ) -> Result<CodeFile>;

    /// All repositories known to the backend.
    async fn list_repositories(&self) -> Result<Vec<Repository>>;

    /// Aggregate index statistics.
    async fn index_stats(&self) -> Result<IndexStats>;

    /// Remove a repository and everything indexed under it.
    async fn delete_repository(&self, repository_id: &str) -> Result<()>;
}
