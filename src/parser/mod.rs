//! Best-effort structural extraction for source files.
//!
//! One [`LanguageParser`] per well-known language plus a generic fallback
//! that only extracts comments and a line count. Selection is by detected
//! language string; an unrecognized language is never an error. Callers
//! must treat a parse failure as recoverable: the indexer falls back to a
//! bare line count and proceeds.

use std::collections::HashMap;
use std::path::Path;

use crate::model::{Class, Comment, Function, Import, Variable};
use crate::Result;

mod generic;
mod go;
pub(crate) mod helpers;
mod java;
mod javascript;
mod python;

pub use generic::GenericParser;
pub use go::GoParser;
pub use java::JavaParser;
pub use javascript::JavaScriptParser;
pub use python::PythonParser;

/// Language sentinel the generic parser reports and the registry falls
/// back to.
pub const GENERIC_LANGUAGE: &str = "generic";

/// Structural extraction of a single file.
///
/// Minimum contract: `lines` is always the correct line count, even when
/// every other field is empty.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub language: String,
    pub lines: usize,
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
    pub variables: Vec<Variable>,
    pub imports: Vec<Import>,
    pub comments: Vec<Comment>,
}

/// A parser for one language.
pub trait LanguageParser: Send + Sync {
    /// Language string this parser handles.
    fn language(&self) -> &'static str;

    /// Extract structure from `content`.
    ///
    /// # Errors
    ///
    /// May fail on pathological input; callers must recover (the file is
    /// then retained with only a line count).
    fn parse(&self, content: &str, path: &Path) -> Result<ParsedFile>;
}

/// Registry of available parsers, keyed by language string, with the
/// generic parser as the fixed fallback.
pub struct Registry {
    parsers: HashMap<&'static str, Box<dyn LanguageParser>>,
    fallback: GenericParser,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry with the built-in parsers registered.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            parsers: HashMap::new(),
            fallback: GenericParser,
        };

        registry.register(Box::new(GoParser));
        registry.register(Box::new(PythonParser));
        registry.register(Box::new(JavaScriptParser));
        registry.register(Box::new(JavaParser));

        registry
    }

    /// Add or replace a parser.
    pub fn register(&mut self, parser: Box<dyn LanguageParser>) {
        self.parsers.insert(parser.language(), parser);
    }

    /// Parser for `language`, or the generic fallback.
    #[must_use]
    pub fn get(&self, language: &str) -> &dyn LanguageParser {
        self.parsers
            .get(language)
            .map_or(&self.fallback as &dyn LanguageParser, AsRef::as_ref)
    }

    /// Parse a file with the parser selected for `language`.
    ///
    /// # Errors
    ///
    /// Propagates the selected parser's error; callers recover per the
    /// module contract.
    pub fn parse_file(&self, content: &str, path: &Path, language: &str) -> Result<ParsedFile> {
        self.get(language).parse(content, path)
    }
}
