//! Core data records produced by the ingestion pipeline.
//!
//! Everything here is derived data: built once per indexing pass, handed to
//! the search backend at submission time, and never mutated afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository that has been (or is being) indexed.
///
/// Identity is a truncated content hash of the resolved absolute path, so it
/// is stable across re-runs and independent of clone timing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Short hash of the most recent commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    /// Full head hash at the time of the last index pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_indexed_hash: Option<String>,
    pub file_count: usize,
    pub total_lines: usize,
    /// Sorted set of languages detected during the pass.
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submodules: Vec<Submodule>,
    /// Recorded mode; only [`IndexingMode::Full`] has behavior.
    pub indexing_mode: IndexingMode,
    /// Reserved for sparse indexing. Recorded, never interpreted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sparse_patterns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
}

/// How a repository is indexed. Incremental and sparse are declared
/// extension points with no behavior behind them yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingMode {
    #[default]
    Full,
    Incremental,
    Sparse,
}

/// A submodule declaration parsed from `.gitmodules`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submodule {
    pub name: String,
    pub path: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// One commit in a repository's history, with the paths it changed
/// relative to its first parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub email: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

/// A source file with its extracted metadata and chunks.
///
/// Identity is `{repository_id}:{relative_path}`. A re-parse replaces the
/// whole record; it is never partially updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeFile {
    pub id: String,
    pub repository_id: String,
    pub path: PathBuf,
    pub relative_path: String,
    pub language: String,
    pub extension: String,
    pub size: u64,
    pub lines: usize,
    pub content: String,
    /// Content hash used for change detection.
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<Function>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<Class>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Import>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<CodeChunk>,
}

/// A function or method definition. Line ranges are 1-based and inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    pub is_method: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

/// A class, struct, or equivalent type definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
}

/// A variable or constant declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_type: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub is_constant: bool,
}

/// An import or include statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Import {
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub start_line: usize,
}

/// A comment in the source, with its span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
    pub kind: CommentKind,
}

/// Comment flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    Line,
    Block,
    Doc,
}

/// A bounded, addressable excerpt of a file sized for retrieval.
///
/// Identity is a deterministic hash of `(file_id, kind, name, start_line)`,
/// so the same inputs always yield the same id across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChunk {
    pub id: String,
    pub file_id: String,
    pub kind: ChunkKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    /// Free-form metadata for the search backend.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

/// What a chunk's boundaries were aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Function,
    Class,
    Block,
    Header,
}

impl ChunkKind {
    /// Stable string form used in chunk identity hashes and context maps.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Block => "block",
            Self::Header => "header",
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one indexing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingStatus {
    Starting,
    Indexing,
    Completed,
    Failed,
}

/// Ephemeral progress of one indexing pass. Never persisted; lives only for
/// the duration of the pass that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct IndexingProgress {
    pub repository_id: String,
    pub repository: String,
    pub status: IndexingStatus,
    pub files_processed: usize,
    pub total_files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: f64,
}
