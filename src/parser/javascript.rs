//! Heuristic parser for JavaScript source.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Class, Function, Import, Variable};
use crate::Result;

use super::helpers::{brace_block_end, count_lines, extract_comments, line_of_offset};
use super::{LanguageParser, ParsedFile};

static IMPORT_FROM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+.*?\s+from\s+['"]([^'"]+)['"]"#).expect("static pattern"));
static REQUIRE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(['"]([^'"]+)['"]\)"#).expect("static pattern"));
static FUNCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"function\s+(\w+)\s*\(([^)]*)\)").expect("static pattern"));
static METHOD_PROP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:\s*function\s*\(([^)]*)\)").expect("static pattern"));
static ARROW_CONST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?\(([^)]*)\)\s*=>").expect("static pattern")
});
static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"class\s+(\w+)(?:\s+extends\s+(\w+))?\s*\{").expect("static pattern")
});
static VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\b(var|let|const)\s+(\w+)").expect("static pattern"));

/// Regex-based extraction for JavaScript: declared functions, object
/// methods, arrow functions bound to const/let/var, classes with their
/// superclass, variable declarations, ES and CommonJS imports.
pub struct JavaScriptParser;

impl LanguageParser for JavaScriptParser {
    fn language(&self) -> &'static str {
        "javascript"
    }

    fn parse(&self, content: &str, _path: &Path) -> Result<ParsedFile> {
        let lines: Vec<&str> = content.split('\n').collect();

        Ok(ParsedFile {
            language: "javascript".to_string(),
            lines: count_lines(content),
            functions: extract_functions(content, &lines),
            classes: extract_classes(content, &lines),
            variables: extract_variables(content),
            imports: extract_imports(content),
            comments: extract_comments(content, "//", Some(("/*", "*/"))),
        })
    }
}

fn extract_imports(content: &str) -> Vec<Import> {
    let mut imports = Vec::new();

    for re in [&IMPORT_FROM_RE, &REQUIRE_RE] {
        for caps in re.captures_iter(content) {
            let (Some(whole), Some(module)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            imports.push(Import {
                module: module.as_str().to_string(),
                alias: None,
                start_line: line_of_offset(content, whole.start()),
            });
        }
    }

    imports
}

fn extract_functions(content: &str, lines: &[&str]) -> Vec<Function> {
    let mut functions: Vec<Function> = Vec::new();

    for (re, is_method) in [
        (&FUNCTION_RE, false),
        (&METHOD_PROP_RE, true),
        (&ARROW_CONST_RE, false),
    ] {
        for caps in re.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let start_line = line_of_offset(content, whole.start());

            // The same declaration can match more than one pattern.
            if functions
                .iter()
                .any(|f| f.name == name.as_str() && f.start_line == start_line)
            {
                continue;
            }

            let end_line = brace_block_end(lines, start_line - 1) + 1;
            let params = caps
                .get(2)
                .map(|m| split_parameters(m.as_str()))
                .unwrap_or_default();

            functions.push(Function {
                name: name.as_str().to_string(),
                start_line,
                end_line,
                signature: whole.as_str().trim().to_string(),
                parameters: params,
                return_type: None,
                visibility: None,
                is_method,
                class_name: None,
            });
        }
    }

    functions.sort_by_key(|f| f.start_line);
    functions
}

fn extract_classes(content: &str, lines: &[&str]) -> Vec<Class> {
    let mut classes = Vec::new();

    for caps in CLASS_RE.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let start_line = line_of_offset(content, whole.start());
        let end_line = brace_block_end(lines, start_line - 1) + 1;

        classes.push(Class {
            name: name.as_str().to_string(),
            start_line,
            end_line,
            visibility: None,
            super_class: caps.get(2).map(|m| m.as_str().to_string()),
            interfaces: Vec::new(),
        });
    }

    classes
}

fn extract_variables(content: &str) -> Vec<Variable> {
    let mut variables = Vec::new();

    for caps in VAR_RE.captures_iter(content) {
        let (Some(whole), Some(keyword), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let start_line = line_of_offset(content, whole.start());
        variables.push(Variable {
            name: name.as_str().to_string(),
            var_type: None,
            start_line,
            end_line: start_line,
            is_constant: keyword.as_str() == "const",
        });
    }

    variables
}

fn split_parameters(params: &str) -> Vec<String> {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .collect()
}
