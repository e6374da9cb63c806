//! Generic fallback parser for unrecognized languages.

use std::path::Path;

use crate::model::Comment;
use crate::Result;

use super::helpers::{count_lines, extract_comments};
use super::{LanguageParser, ParsedFile, GENERIC_LANGUAGE};

/// Comment styles the generic parser probes, in order.
const COMMENT_STYLES: &[(&str, Option<(&str, &str)>)] = &[
    ("//", Some(("/*", "*/"))), // C family
    ("#", None),                // shell / Python
    ("--", None),               // SQL
    (";", None),                // Lisp family
];

/// Extracts only comments (across common delimiter styles) and a line
/// count. The floor every other parser stands on: it can never fail.
pub struct GenericParser;

impl LanguageParser for GenericParser {
    fn language(&self) -> &'static str {
        GENERIC_LANGUAGE
    }

    fn parse(&self, content: &str, _path: &Path) -> Result<ParsedFile> {
        let mut comments: Vec<Comment> = Vec::new();
        for (line_prefix, block) in COMMENT_STYLES {
            comments.extend(extract_comments(content, line_prefix, *block));
        }

        Ok(ParsedFile {
            language: GENERIC_LANGUAGE.to_string(),
            lines: count_lines(content),
            comments,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_counts_lines() {
        let parsed = GenericParser
            .parse("one\ntwo\nthree", Path::new("file.xyz"))
            .unwrap();
        assert_eq!(parsed.lines, 3);
        assert!(parsed.functions.is_empty());
        assert!(parsed.classes.is_empty());
    }

    #[test]
    fn test_generic_extracts_mixed_comment_styles() {
        let content = "// c style\n# shell style\n-- sql style\nplain text\n";
        let parsed = GenericParser.parse(content, Path::new("file")).unwrap();
        let texts: Vec<&str> = parsed.comments.iter().map(|c| c.text.as_str()).collect();
        assert!(texts.contains(&"c style"));
        assert!(texts.contains(&"shell style"));
        assert!(texts.contains(&"sql style"));
    }

    #[test]
    fn test_generic_empty_content() {
        let parsed = GenericParser.parse("", Path::new("empty")).unwrap();
        assert_eq!(parsed.lines, 0);
        assert!(parsed.comments.is_empty());
    }
}
