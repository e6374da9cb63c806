//! Heuristic parser for Go source.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Class, Function, Import, Variable};
use crate::Result;

use super::helpers::{brace_block_end, count_lines, extract_comments, line_of_offset};
use super::{LanguageParser, ParsedFile};

static SINGLE_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+"([^"]+)""#).expect("static pattern"));
static IMPORT_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"import\s*\(([^)]+)\)").expect("static pattern"));
static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("static pattern"));
static FUNC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"func\s*(\([^)]*\))?\s*(\w+)\s*\(([^)]*)\)[^{\n]*\{").expect("static pattern")
});
static STRUCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"type\s+(\w+)\s+struct\s*\{").expect("static pattern"));
static VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*var\s+(\w+)(?:\s+([\w\[\]*.]+))?").expect("static pattern"));
static CONST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*const\s+(\w+)(?:\s+([\w\[\]*.]+))?\s*=").expect("static pattern"));
static SHORT_VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(\w+)\s*:=").expect("static pattern"));

/// Regex-based extraction for Go: functions and methods, structs as
/// classes, package-level and short variable declarations, imports.
pub struct GoParser;

impl LanguageParser for GoParser {
    fn language(&self) -> &'static str {
        "go"
    }

    fn parse(&self, content: &str, _path: &Path) -> Result<ParsedFile> {
        let lines: Vec<&str> = content.split('\n').collect();

        Ok(ParsedFile {
            language: "go".to_string(),
            lines: count_lines(content),
            functions: extract_functions(content, &lines),
            classes: extract_structs(content, &lines),
            variables: extract_variables(content),
            imports: extract_imports(content),
            comments: extract_comments(content, "//", Some(("/*", "*/"))),
        })
    }
}

fn extract_imports(content: &str) -> Vec<Import> {
    let mut imports = Vec::new();

    for caps in SINGLE_IMPORT_RE.captures_iter(content) {
        let (Some(whole), Some(module)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        imports.push(Import {
            module: module.as_str().to_string(),
            alias: None,
            start_line: line_of_offset(content, whole.start()),
        });
    }

    for caps in IMPORT_BLOCK_RE.captures_iter(content) {
        let Some(block) = caps.get(1) else { continue };
        for inner in QUOTED_RE.captures_iter(block.as_str()) {
            let Some(module) = inner.get(1) else { continue };
            let offset = block.start() + module.start();
            imports.push(Import {
                module: module.as_str().to_string(),
                alias: None,
                start_line: line_of_offset(content, offset),
            });
        }
    }

    imports
}

fn extract_functions(content: &str, lines: &[&str]) -> Vec<Function> {
    let mut functions = Vec::new();

    for caps in FUNC_RE.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let start_line = line_of_offset(content, whole.start());
        let end_line = brace_block_end(lines, start_line - 1) + 1;
        let is_method = caps.get(1).is_some();
        let params = caps
            .get(3)
            .map(|m| split_parameters(m.as_str()))
            .unwrap_or_default();

        functions.push(Function {
            name: name.as_str().to_string(),
            start_line,
            end_line,
            signature: whole.as_str().trim_end_matches('{').trim().to_string(),
            parameters: params,
            return_type: None,
            visibility: Some(go_visibility(name.as_str())),
            is_method,
            class_name: None,
        });
    }

    functions
}

fn extract_structs(content: &str, lines: &[&str]) -> Vec<Class> {
    let mut structs = Vec::new();

    for caps in STRUCT_RE.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let start_line = line_of_offset(content, whole.start());
        let end_line = brace_block_end(lines, start_line - 1) + 1;

        structs.push(Class {
            name: name.as_str().to_string(),
            start_line,
            end_line,
            visibility: Some(go_visibility(name.as_str())),
            super_class: None,
            interfaces: Vec::new(),
        });
    }

    structs
}

fn extract_variables(content: &str) -> Vec<Variable> {
    let mut variables = Vec::new();

    for (re, is_constant) in [(&VAR_RE, false), (&CONST_RE, true), (&SHORT_VAR_RE, false)] {
        for caps in re.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let start_line = line_of_offset(content, whole.start());
            variables.push(Variable {
                name: name.as_str().to_string(),
                var_type: caps.get(2).map(|m| m.as_str().to_string()),
                start_line,
                end_line: start_line,
                is_constant,
            });
        }
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

fn go_visibility(name: &str) -> String {
    if name.chars().next().is_some_and(char::is_uppercase) {
        "public".to_string()
    } else {
        "private".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"package main

import "fmt"

import (
    "os"
    "strings"
)

// Greet says hello.
func Greet(name string) string {
    return fmt.Sprintf("hello %s", name)
}

func (s *Server) handle(w io.Writer) {
    fmt.Fprintln(w, "ok")
}

type Server struct {
    addr string
}

var defaultAddr = ":8080"

const maxRetries = 3
"#;

    fn parse_sample() -> ParsedFile {
        GoParser.parse(SAMPLE, Path::new("main.go")).unwrap()
    }

    #[test]
    fn test_imports() {
        let parsed = parse_sample();
        let modules: Vec<&str> = parsed.imports.iter().map(|i| i.module.as_str()).collect();
        assert!(modules.contains(&"fmt"));
        assert!(modules.contains(&"os"));
        assert!(modules.contains(&"strings"));
    }

    #[test]
    fn test_functions_with_end_lines() {
        let parsed = parse_sample();
        assert_eq!(parsed.functions.len(), 2);

        let greet = &parsed.functions[0];
        assert_eq!(greet.name, "Greet");
        assert!(!greet.is_method);
        assert_eq!(greet.visibility.as_deref(), Some("public"));
        assert!(greet.end_line > greet.start_line);

        let handle = &parsed.functions[1];
        assert_eq!(handle.name, "handle");
        assert!(handle.is_method);
        assert_eq!(handle.visibility.as_deref(), Some("private"));
    }

    #[test]
    fn test_structs_as_classes() {
        let parsed = parse_sample();
        assert_eq!(parsed.classes.len(), 1);
        assert_eq!(parsed.classes[0].name, "Server");
        assert!(parsed.classes[0].end_line > parsed.classes[0].start_line);
    }

    #[test]
    fn test_variables_and_constants() {
        let parsed = parse_sample();
        let defaults: Vec<&Variable> = parsed
            .variables
            .iter()
            .filter(|v| v.name == "defaultAddr")
            .collect();
        assert_eq!(defaults.len(), 1);
        assert!(!defaults[0].is_constant);

        assert!(parsed
            .variables
            .iter()
            .any(|v| v.name == "maxRetries" && v.is_constant));
    }

    #[test]
    fn test_line_count() {
        let parsed = parse_sample();
        assert_eq!(parsed.lines, SAMPLE.split('\n').count());
    }

    #[test]
    fn test_doc_comment_detected() {
        let parsed = parse_sample();
        assert!(parsed
            .comments
            .iter()
            .any(|c| c.text.contains("Greet says hello")));
    }
}
