//! Heuristic parser for Java source.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Class, Function, Import, Variable};
use crate::Result;

use super::helpers::{brace_block_end, count_lines, extract_comments, line_of_offset};
use super::{LanguageParser, ParsedFile};

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"import\s+(?:static\s+)?([^;]+);").expect("static pattern"));
static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(public|private|protected)?\s*(?:static\s+)?(?:final\s+)?[\w<>\[\]]+\s+(\w+)\s*\(([^)]*)\)\s*(?:throws\s+[\w,\s]+)?\{")
        .expect("static pattern")
});
static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:public|private|protected)?\s*(?:abstract\s+)?class\s+(\w+)(?:\s+extends\s+(\w+))?(?:\s+implements\s+([^{]+))?\s*\{")
        .expect("static pattern")
});
static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:public|private|protected)\s+(?:static\s+)?(final\s+)?[\w<>\[\]]+\s+(\w+)\s*[=;]")
        .expect("static pattern")
});

/// Regex-based extraction for Java: methods with visibility, classes with
/// extends/implements clauses, fields, imports.
pub struct JavaParser;

impl LanguageParser for JavaParser {
    fn language(&self) -> &'static str {
        "java"
    }

    fn parse(&self, content: &str, _path: &Path) -> Result<ParsedFile> {
        let lines: Vec<&str> = content.split('\n').collect();

        Ok(ParsedFile {
            language: "java".to_string(),
            lines: count_lines(content),
            functions: extract_methods(content, &lines),
            classes: extract_classes(content, &lines),
            variables: extract_fields(content),
            imports: extract_imports(content),
            comments: extract_comments(content, "//", Some(("/*", "*/"))),
        })
    }
}

fn extract_imports(content: &str) -> Vec<Import> {
    let mut imports = Vec::new();

    for caps in IMPORT_RE.captures_iter(content) {
        let (Some(whole), Some(module)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        imports.push(Import {
            module: module.as_str().trim().to_string(),
            alias: None,
            start_line: line_of_offset(content, whole.start()),
        });
    }

    imports
}

fn extract_methods(content: &str, lines: &[&str]) -> Vec<Function> {
    let mut methods = Vec::new();

    for caps in METHOD_RE.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };

        // Control-flow keywords produce method-shaped matches.
        if matches!(name.as_str(), "if" | "for" | "while" | "switch" | "catch") {
            continue;
        }

        let start_line = line_of_offset(content, whole.start());
        let end_line = brace_block_end(lines, start_line - 1) + 1;
        let params = caps
            .get(3)
            .map(|m| split_parameters(m.as_str()))
            .unwrap_or_default();

        methods.push(Function {
            name: name.as_str().to_string(),
            start_line,
            end_line,
            signature: whole.as_str().trim_end_matches('{').trim().to_string(),
            parameters: params,
            return_type: None,
            visibility: caps.get(1).map(|m| m.as_str().to_string()),
            is_method: true,
            class_name: None,
        });
    }

    methods
}

fn extract_classes(content: &str, lines: &[&str]) -> Vec<Class> {
    let mut classes = Vec::new();

    for caps in CLASS_RE.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let start_line = line_of_offset(content, whole.start());
        let end_line = brace_block_end(lines, start_line - 1) + 1;

        let interfaces: Vec<String> = caps
            .get(3)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|i| !i.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        classes.push(Class {
            name: name.as_str().to_string(),
            start_line,
            end_line,
            visibility: None,
            super_class: caps.get(2).map(|m| m.as_str().to_string()),
            interfaces,
        });
    }

    classes
}

fn extract_fields(content: &str) -> Vec<Variable> {
    let mut fields = Vec::new();

    for caps in FIELD_RE.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let start_line = line_of_offset(content, whole.start());
        fields.push(Variable {
            name: name.as_str().to_string(),
            var_type: None,
            start_line,
            end_line: start_line,
            is_constant: caps.get(1).is_some(),
        });
    }

    fields
}

fn split_parameters(params: &str) -> Vec<String> {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .collect()
}
