//! Retrieval-sized chunking of parsed files.
//!
//! A strategy-selected decomposition: semantic chunks align to functions
//! and classes, line-based chunks slide a fixed window, hybrid runs
//! semantic first and re-splits anything oversized. Chunk identifiers are
//! deterministic hashes of `(file_id, kind, name, start_line)` so external
//! references stay stable across re-indexing runs.

use std::collections::BTreeMap;

use serde_json::json;

use crate::model::{ChunkKind, Class, CodeChunk, CodeFile, Function};
use crate::{Error, Result};

/// How chunk boundaries are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Boundaries aligned to functions and classes, with block chunks for
    /// leftover runs and an optional header chunk.
    #[default]
    Semantic,
    /// Fixed sliding window; the strategy of last resort for content with
    /// no recognizable structure.
    LineBased,
    /// Semantic first, oversized chunks re-split with the sliding window.
    Hybrid,
}

/// Chunking configuration.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub strategy: ChunkStrategy,
    /// Upper bound on a chunk's line span.
    pub max_chunk_lines: usize,
    /// Minimum run length for a standalone block chunk.
    pub min_chunk_lines: usize,
    /// Lines of context added on both ends of structural chunks, and the
    /// window overlap for line-based chunking.
    pub overlap_lines: usize,
    /// Widen structural chunks by `overlap_lines`.
    pub preserve_context: bool,
    /// Include import lines in the header chunk.
    pub include_imports: bool,
    /// Include early comments in the header chunk.
    pub include_comments: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Semantic,
            max_chunk_lines: 100,
            min_chunk_lines: 5,
            overlap_lines: 5,
            preserve_context: true,
            include_imports: true,
            include_comments: true,
        }
    }
}

impl ChunkerConfig {
    /// Validate chunking bounds.
    ///
    /// # Errors
    ///
    /// Returns an error when the sliding window could not advance.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_lines == 0 {
            return Err(Error::config("max_chunk_lines cannot be 0"));
        }
        if self.overlap_lines >= self.max_chunk_lines {
            return Err(Error::config(
                "overlap_lines must be smaller than max_chunk_lines",
            ));
        }
        Ok(())
    }
}

/// Converts a parsed file into an ordered set of retrieval chunks.
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a chunker with the given configuration.
    #[must_use]
    pub const fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Chunk a file according to the configured strategy.
    #[must_use]
    pub fn chunk_file(&self, file: &CodeFile) -> Vec<CodeChunk> {
        if file.content.is_empty() {
            return Vec::new();
        }

        match self.config.strategy {
            ChunkStrategy::Semantic => self.semantic(file),
            ChunkStrategy::LineBased => self.line_based(file),
            ChunkStrategy::Hybrid => self.hybrid(file),
        }
    }

    /// Structural chunking: functions, classes, leftover blocks, header.
    fn semantic(&self, file: &CodeFile) -> Vec<CodeChunk> {
        let lines: Vec<&str> = file.content.split('\n').collect();
        let mut chunks = Vec::new();

        for function in &file.functions {
            chunks.push(self.function_chunk(file, function, &lines));
        }
        for class in &file.classes {
            chunks.push(self.class_chunk(file, class, &lines));
        }

        let standalone = self.standalone_chunks(file, &lines, &chunks);
        chunks.extend(standalone);

        if self.config.include_imports || self.config.include_comments {
            if let Some(header) = self.header_chunk(file, &lines) {
                chunks.insert(0, header);
            }
        }

        chunks
    }

    fn function_chunk(&self, file: &CodeFile, function: &Function, lines: &[&str]) -> CodeChunk {
        let (start, end) = self.widened_span(function.start_line, function.end_line, lines.len());
        let content = lines[start - 1..end].join("\n");

        let mut context = base_context(file);
        context.insert("function_name".to_string(), json!(function.name));
        context.insert("signature".to_string(), json!(function.signature));
        context.insert("parameters".to_string(), json!(function.parameters));
        context.insert("return_type".to_string(), json!(function.return_type));
        context.insert("visibility".to_string(), json!(function.visibility));
        context.insert("is_method".to_string(), json!(function.is_method));

        CodeChunk {
            id: chunk_id(&file.id, ChunkKind::Function.as_str(), &function.name, start),
            file_id: file.id.clone(),
            kind: ChunkKind::Function,
            name: function.name.clone(),
            start_line: start,
            end_line: end,
            content,
            context,
            dependencies: Vec::new(),
        }
    }

    fn class_chunk(&self, file: &CodeFile, class: &Class, lines: &[&str]) -> CodeChunk {
        let start = class.start_line.clamp(1, lines.len());
        let end = class.end_line.clamp(start, lines.len());

        let mut context = base_context(file);
        context.insert("class_name".to_string(), json!(class.name));
        context.insert("super_class".to_string(), json!(class.super_class));
        context.insert("interfaces".to_string(), json!(class.interfaces));
        context.insert("visibility".to_string(), json!(class.visibility));

        // An oversized class gets only a head chunk, flagged partial,
        // rather than one enormous chunk.
        if end - start > self.config.max_chunk_lines {
            let head_end = (start + self.config.max_chunk_lines).min(end);
            context.insert("is_partial".to_string(), json!(end > head_end));

            return CodeChunk {
                id: chunk_id(&file.id, ChunkKind::Class.as_str(), &class.name, start),
                file_id: file.id.clone(),
                kind: ChunkKind::Class,
                name: class.name.clone(),
                start_line: start,
                end_line: head_end,
                content: lines[start - 1..head_end].join("\n"),
                context,
                dependencies: Vec::new(),
            };
        }

        let (start, end) = self.widened_span(start, end, lines.len());

        CodeChunk {
            id: chunk_id(&file.id, ChunkKind::Class.as_str(), &class.name, start),
            file_id: file.id.clone(),
            kind: ChunkKind::Class,
            name: class.name.clone(),
            start_line: start,
            end_line: end,
            content: lines[start - 1..end].join("\n"),
            context,
            dependencies: Vec::new(),
        }
    }

    /// Block chunks for maximal runs of non-blank lines not yet claimed by
    /// a structural chunk, at least `min_chunk_lines` long.
    fn standalone_chunks(
        &self,
        file: &CodeFile,
        lines: &[&str],
        existing: &[CodeChunk],
    ) -> Vec<CodeChunk> {
        let mut covered = vec![false; lines.len()];
        for chunk in existing {
            for slot in covered
                .iter_mut()
                .take(chunk.end_line.min(lines.len()))
                .skip(chunk.start_line.saturating_sub(1))
            {
                *slot = true;
            }
        }

        let mut chunks = Vec::new();
        let mut run_start: Option<usize> = None;

        for (i, line) in lines.iter().enumerate() {
            if !covered[i] && !line.trim().is_empty() {
                run_start.get_or_insert(i);
            } else if let Some(start) = run_start.take() {
                if i - start >= self.config.min_chunk_lines {
                    chunks.push(self.block_chunk(file, lines, start, i - 1));
                }
            }
        }

        if let Some(start) = run_start {
            if lines.len() - start >= self.config.min_chunk_lines {
                chunks.push(self.block_chunk(file, lines, start, lines.len() - 1));
            }
        }

        chunks
    }

    /// Build a block chunk from 0-based inclusive line indices.
    fn block_chunk(&self, file: &CodeFile, lines: &[&str], start: usize, end: usize) -> CodeChunk {
        let mut context = base_context(file);
        context.insert("chunk_type".to_string(), json!("standalone"));

        CodeChunk {
            id: chunk_id(&file.id, ChunkKind::Block.as_str(), "", start + 1),
            file_id: file.id.clone(),
            kind: ChunkKind::Block,
            name: String::new(),
            start_line: start + 1,
            end_line: end + 1,
            content: lines[start..=end].join("\n"),
            context,
            dependencies: Vec::new(),
        }
    }

    /// One chunk assembled from the file's import lines and any comments
    /// starting within the first 20 lines. Returns `None` when there is
    /// nothing to include.
    fn header_chunk(&self, file: &CodeFile, lines: &[&str]) -> Option<CodeChunk> {
        let mut header_lines = Vec::new();
        let mut end_idx = 0;

        if self.config.include_imports {
            for import in &file.imports {
                let idx = import.start_line.saturating_sub(1);
                if idx < lines.len() {
                    header_lines.push(lines[idx]);
                    end_idx = end_idx.max(idx);
                }
            }
        }

        if self.config.include_comments {
            for comment in &file.comments {
                if comment.start_line > 20 {
                    continue;
                }
                for idx in comment.start_line - 1..comment.end_line.min(lines.len()) {
                    header_lines.push(lines[idx]);
                    end_idx = end_idx.max(idx);
                }
            }
        }

        if header_lines.is_empty() {
            return None;
        }

        let mut context = base_context(file);
        context.insert("chunk_type".to_string(), json!("file_header"));
        context.insert("import_count".to_string(), json!(file.imports.len()));

        Some(CodeChunk {
            id: chunk_id(&file.id, ChunkKind::Header.as_str(), "", 1),
            file_id: file.id.clone(),
            kind: ChunkKind::Header,
            name: String::new(),
            start_line: 1,
            end_line: end_idx + 1,
            content: header_lines.join("\n"),
            context,
            dependencies: Vec::new(),
        })
    }

    /// Fixed sliding window over the whole file.
    fn line_based(&self, file: &CodeFile) -> Vec<CodeChunk> {
        let lines: Vec<&str> = file.content.split('\n').collect();
        let step = self.config.max_chunk_lines - self.config.overlap_lines;
        let mut chunks = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            let end = (i + self.config.max_chunk_lines).min(lines.len());

            let mut context = base_context(file);
            context.insert("chunk_type".to_string(), json!("line_based"));

            chunks.push(CodeChunk {
                id: chunk_id(&file.id, ChunkKind::Block.as_str(), "", i + 1),
                file_id: file.id.clone(),
                kind: ChunkKind::Block,
                name: String::new(),
                start_line: i + 1,
                end_line: end,
                content: lines[i..end].join("\n"),
                context,
                dependencies: Vec::new(),
            });

            i += step;
        }

        chunks
    }

    /// Semantic chunking, then re-split anything wider than the window.
    fn hybrid(&self, file: &CodeFile) -> Vec<CodeChunk> {
        let mut result = Vec::new();

        for chunk in self.semantic(file) {
            if chunk.end_line - chunk.start_line > self.config.max_chunk_lines {
                result.extend(self.split_large_chunk(&chunk));
            } else {
                result.push(chunk);
            }
        }

        result
    }

    /// Sliding-window split of one oversized chunk. Sub-chunks keep the
    /// parent's kind and context, plus a partial-part marker and index.
    fn split_large_chunk(&self, chunk: &CodeChunk) -> Vec<CodeChunk> {
        let lines: Vec<&str> = chunk.content.split('\n').collect();
        let step = self.config.max_chunk_lines - self.config.overlap_lines;
        let marker = format!("{}_part", chunk.kind);
        let mut parts = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            let end = (i + self.config.max_chunk_lines).min(lines.len());

            let mut context = chunk.context.clone();
            context.insert("is_partial".to_string(), json!(true));
            context.insert("part_number".to_string(), json!(parts.len() + 1));

            parts.push(CodeChunk {
                id: chunk_id(&chunk.file_id, &marker, &chunk.name, chunk.start_line + i),
                file_id: chunk.file_id.clone(),
                kind: chunk.kind,
                name: chunk.name.clone(),
                start_line: chunk.start_line + i,
                end_line: chunk.start_line + end - 1,
                content: lines[i..end].join("\n"),
                context,
                dependencies: Vec::new(),
            });

            i += step;
        }

        parts
    }

    /// Clamp a 1-based inclusive span to the file and widen it by the
    /// configured overlap when context preservation is on.
    fn widened_span(&self, start_line: usize, end_line: usize, total: usize) -> (usize, usize) {
        let start = start_line.clamp(1, total);
        let end = end_line.clamp(start, total);

        if !self.config.preserve_context {
            return (start, end);
        }

        (
            start.saturating_sub(self.config.overlap_lines).max(1),
            (end + self.config.overlap_lines).min(total),
        )
    }
}

/// Shared context entries every chunk carries.
fn base_context(file: &CodeFile) -> BTreeMap<String, serde_json::Value> {
    let mut context = BTreeMap::new();
    context.insert("language".to_string(), json!(file.language));
    context.insert(
        "file_path".to_string(),
        json!(file.path.display().to_string()),
    );
    context
}

/// Deterministic chunk identity: truncated content hash of
/// `(file_id, kind, name, start_line)`. Content-independent, so the id is
/// stable across runs as long as those inputs are.
#[must_use]
pub fn chunk_id(file_id: &str, kind: &str, name: &str, start_line: usize) -> String {
    let digest = blake3::hash(format!("{file_id}:{kind}:{name}:{start_line}").as_bytes());
    digest.to_hex()[..16].to_string()
}
