//! Heuristic parser for Python source.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Class, Function, Import, Variable};
use crate::Result;

use super::helpers::{count_lines, extract_comments, indent_block_end, line_of_offset};
use super::{LanguageParser, ParsedFile};

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*import\s+(\w+(?:\.\w+)*)").expect("static pattern"));
static FROM_IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*from\s+(\w+(?:\.\w+)*)\s+import\s+(.+)").expect("static pattern")
});
static DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\s*)(?:async\s+)?def\s+(\w+)\s*\(([^)]*)\)").expect("static pattern"));
static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*class\s+(\w+)(?:\(([^)]*)\))?\s*:").expect("static pattern"));
static ASSIGN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\s*=[^=]").expect("static pattern"));

/// Regex and indentation based extraction for Python: defs (including
/// methods, recognized by indentation), classes with bases, module-level
/// assignments, imports, `#` comments and docstring blocks.
pub struct PythonParser;

impl LanguageParser for PythonParser {
    fn language(&self) -> &'static str {
        "python"
    }

    fn parse(&self, content: &str, _path: &Path) -> Result<ParsedFile> {
        let lines: Vec<&str> = content.split('\n').collect();

        Ok(ParsedFile {
            language: "python".to_string(),
            lines: count_lines(content),
            functions: extract_functions(content, &lines),
            classes: extract_classes(content, &lines),
            variables: extract_variables(&lines),
            imports: extract_imports(content),
            comments: extract_comments(content, "#", Some(("\"\"\"", "\"\"\""))),
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
            module: module.as_str().to_string(),
            alias: None,
            start_line: line_of_offset(content, whole.start()),
        });
    }

    for caps in FROM_IMPORT_RE.captures_iter(content) {
        let (Some(whole), Some(module)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        imports.push(Import {
            module: module.as_str().to_string(),
            alias: caps.get(2).map(|m| m.as_str().trim().to_string()),
            start_line: line_of_offset(content, whole.start()),
        });
    }

    imports
}

fn extract_functions(content: &str, lines: &[&str]) -> Vec<Function> {
    let mut functions = Vec::new();

    for caps in DEF_RE.captures_iter(content) {
        let (Some(whole), Some(indent), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let start_line = line_of_offset(content, whole.start());
        let end_line = indent_block_end(lines, start_line - 1) + 1;
        let is_method = !indent.as_str().is_empty();
        let params = caps
            .get(3)
            .map(|m| split_parameters(m.as_str()))
            .unwrap_or_default();

        functions.push(Function {
            name: name.as_str().to_string(),
            start_line,
            end_line,
            signature: whole.as_str().trim().to_string(),
            parameters: params,
            return_type: None,
            visibility: Some(python_visibility(name.as_str())),
            is_method,
            class_name: None,
        });
    }

    functions
}

fn extract_classes(content: &str, lines: &[&str]) -> Vec<Class> {
    let mut classes = Vec::new();

    for caps in CLASS_RE.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let start_line = line_of_offset(content, whole.start());
        let end_line = indent_block_end(lines, start_line - 1) + 1;

        let bases: Vec<String> = caps
            .get(2)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        classes.push(Class {
            name: name.as_str().to_string(),
            start_line,
            end_line,
            visibility: Some(python_visibility(name.as_str())),
            super_class: bases.first().cloned(),
            interfaces: bases.into_iter().skip(1).collect(),
        });
    }

    classes
}

fn extract_variables(lines: &[&str]) -> Vec<Variable> {
    let mut variables = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        let Some(caps) = ASSIGN_RE.captures(trimmed) else {
            continue;
        };
        let Some(name) = caps.get(1) else { continue };

        let name = name.as_str().to_string();
        let is_constant = name.chars().all(|c| c.is_uppercase() || c == '_');
        variables.push(Variable {
            name,
            var_type: None,
            start_line: i + 1,
            end_line: i + 1,
            is_constant,
        });
    }

    variables
}

fn split_parameters(params: &str) -> Vec<String> {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "self")
        .map(ToString::to_string)
        .collect()
}

fn python_visibility(name: &str) -> String {
    if name.starts_with('_') {
        "private".to_string()
    } else {
        "public".to_string()
    }
}
