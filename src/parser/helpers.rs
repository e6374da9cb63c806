//! Shared extraction helpers used by the language parsers.
//!
//! Free functions rather than a base type: parsers compose what they need.

use crate::model::{Comment, CommentKind};

/// Count lines the way the rest of the pipeline indexes them: newline
/// count plus one for non-empty content.
#[must_use]
pub fn count_lines(content: &str) -> usize {
    if content.is_empty() {
        0
    } else {
        content.split('\n').count()
    }
}

/// 1-based line number of a byte offset.
#[must_use]
pub fn line_of_offset(content: &str, offset: usize) -> usize {
    content[..offset.min(content.len())]
        .bytes()
        .filter(|b| *b == b'\n')
        .count()
        + 1
}

/// Extract line and block comments using the given delimiters.
///
/// A line comment whose prefix is doubled (`//` vs `////`... in practice
/// `///`-style doc markers) is classified as a doc comment. Block comments
/// may span lines; an unterminated block runs to end of file unreported.
#[must_use]
pub fn extract_comments(
    content: &str,
    line_prefix: &str,
    block: Option<(&str, &str)>,
) -> Vec<Comment> {
    let mut comments = Vec::new();
    let lines: Vec<&str> = content.split('\n').collect();

    let mut in_block = false;
    let mut block_start_line = 0;

    for (i, line) in lines.iter().enumerate() {
        let line_num = i + 1;
        let trimmed = line.trim();

        if let Some((start_marker, end_marker)) = block {
            if !in_block {
                if let Some(start_idx) = trimmed.find(start_marker) {
                    in_block = true;
                    block_start_line = line_num;
                    // The end marker must come after the start occurrence.
                    let rest = &trimmed[start_idx + start_marker.len()..];
                    if rest.contains(end_marker) {
                        comments.push(Comment {
                            text: block_comment_text(
                                &lines[i..=i],
                                start_marker,
                                end_marker,
                            ),
                            start_line: line_num,
                            end_line: line_num,
                            kind: CommentKind::Block,
                        });
                        in_block = false;
                    }
                    continue;
                }
            } else if trimmed.contains(end_marker) {
                comments.push(Comment {
                    text: block_comment_text(
                        &lines[block_start_line - 1..=i],
                        start_marker,
                        end_marker,
                    ),
                    start_line: block_start_line,
                    end_line: line_num,
                    kind: CommentKind::Block,
                });
                in_block = false;
                continue;
            } else {
                continue;
            }
        }

        if !line_prefix.is_empty() && trimmed.starts_with(line_prefix) {
            let doc_prefix = format!("{line_prefix}{}", &line_prefix[..1]);
            let kind = if trimmed.starts_with(&doc_prefix) {
                CommentKind::Doc
            } else {
                CommentKind::Line
            };
            let text = trimmed
                .trim_start_matches(|c| line_prefix.contains(c))
                .trim()
                .to_string();

            comments.push(Comment {
                text,
                start_line: line_num,
                end_line: line_num,
                kind,
            });
        }
    }

    comments
}

/// Join and clean the text of a block comment: strip the markers and the
/// decorative leading `*` found on continuation lines.
fn block_comment_text(lines: &[&str], start_marker: &str, end_marker: &str) -> String {
    let last = lines.len().saturating_sub(1);
    let mut parts = Vec::new();

    for (i, raw) in lines.iter().enumerate() {
        let mut line = (*raw).to_string();

        if i == 0 {
            if let Some(idx) = line.find(start_marker) {
                line = line[idx + start_marker.len()..].to_string();
            }
        }
        if i == last {
            if let Some(idx) = line.find(end_marker) {
                line.truncate(idx);
            }
        }

        let mut cleaned = line.trim();
        if let Some(rest) = cleaned.strip_prefix('*') {
            cleaned = rest.trim();
        }
        parts.push(cleaned.to_string());
    }

    parts.join(" ").trim().to_string()
}

/// 0-based index of the line closing the brace block opened at `start`.
///
/// Scans forward from `start` counting `{`/`}` pairs; returns the last line
/// when the block never closes. Braces inside strings are counted too; this
/// is a heuristic, not a grammar.
#[must_use]
pub fn brace_block_end(lines: &[&str], start: usize) -> usize {
    let mut depth = 0_i64;
    let mut opened = false;

    for (i, line) in lines.iter().enumerate().skip(start) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return i;
        }
    }

    lines.len().saturating_sub(1)
}

/// 0-based index of the last line in an indentation block (Python-style)
/// opened by the header at `start`.
#[must_use]
pub fn indent_block_end(lines: &[&str], start: usize) -> usize {
    let Some(header) = lines.get(start) else {
        return start;
    };
    let header_indent = indent_width(header);
    let mut last_body = start;

    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indent_width(line) <= header_indent {
            break;
        }
        last_body = i;
    }

    last_body
}

fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("one"), 1);
        assert_eq!(count_lines("one\ntwo"), 2);
        assert_eq!(count_lines("one\ntwo\n"), 3);
    }

    #[test]
    fn test_line_of_offset() {
        let content = "aaa\nbbb\nccc";
        assert_eq!(line_of_offset(content, 0), 1);
        assert_eq!(line_of_offset(content, 4), 2);
        assert_eq!(line_of_offset(content, 8), 3);
    }

    #[test]
    fn test_extract_line_and_doc_comments() {
        let content = "// plain\n/// doc\nlet x = 1;\n";
        let comments = extract_comments(content, "//", None);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].kind, CommentKind::Line);
        assert_eq!(comments[0].text, "plain");
        assert_eq!(comments[1].kind, CommentKind::Doc);
        assert_eq!(comments[1].text, "doc");
    }

    #[test]
    fn test_extract_block_comment_spanning_lines() {
        let content = "/* first\n * second\n */\ncode();\n";
        let comments = extract_comments(content, "", Some(("/*", "*/")));
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].start_line, 1);
        assert_eq!(comments[0].end_line, 3);
        assert_eq!(comments[0].text, "first second");
    }

    #[test]
    fn test_extract_single_line_block_comment() {
        let content = "/* inline */\n";
        let comments = extract_comments(content, "", Some(("/*", "*/")));
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].start_line, 1);
        assert_eq!(comments[0].end_line, 1);
        assert_eq!(comments[0].text, "inline");
    }

    #[test]
    fn test_triple_quote_block() {
        let content = "\"\"\"\nmodule docstring\n\"\"\"\nx = 1\n";
        let comments = extract_comments(content, "#", Some(("\"\"\"", "\"\"\"")));
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].start_line, 1);
        assert_eq!(comments[0].end_line, 3);
        assert!(comments[0].text.contains("module docstring"));
    }

    #[test]
    fn test_brace_block_end() {
        let lines: Vec<&str> = "fn f() {\n    if x {\n        y();\n    }\n}\nfn g() {}"
            .split('\n')
            .collect();
        assert_eq!(brace_block_end(&lines, 0), 4);
        assert_eq!(brace_block_end(&lines, 5), 5);
    }

    #[test]
    fn test_brace_block_never_closes() {
        let lines: Vec<&str> = "fn f() {\n    x();".split('\n').collect();
        assert_eq!(brace_block_end(&lines, 0), 1);
    }

    #[test]
    fn test_indent_block_end() {
        let lines: Vec<&str> = "def f():\n    a = 1\n\n    b = 2\nc = 3"
            .split('\n')
            .collect();
        assert_eq!(indent_block_end(&lines, 0), 3);
    }

    #[test]
    fn test_indent_block_empty_body() {
        let lines: Vec<&str> = "def f():\ng = 2".split('\n').collect();
        assert_eq!(indent_block_end(&lines, 0), 0);
    }
}
