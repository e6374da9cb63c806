//! `.gitmodules` parsing.

use std::path::Path;

use crate::model::Submodule;
use crate::Result;

/// Read submodule declarations from a repository's `.gitmodules` file.
///
/// An absent file yields an empty list, not an error. The format is an
/// INI-like sequence of `[submodule "name"]` headers followed by
/// `path = ...`, `url = ...`, and optional `branch = ...` lines.
///
/// # Errors
///
/// Returns an error only when an existing `.gitmodules` cannot be read.
pub fn read_submodules(repo_path: &Path) -> Result<Vec<Submodule>> {
    let gitmodules = repo_path.join(".gitmodules");
    if !gitmodules.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&gitmodules)?;
    Ok(parse_gitmodules(&content))
}

/// Parse `.gitmodules` content into submodule records.
fn parse_gitmodules(content: &str) -> Vec<Submodule> {
    let mut submodules = Vec::new();
    let mut current: Option<Submodule> = None;

    for line in content.lines() {
        let line = line.trim();

        if line.starts_with("[submodule ") {
            if let Some(sub) = current.take() {
                submodules.push(sub);
            }
            if let Some(name) = header_name(line) {
                current = Some(Submodule {
                    name: name.to_string(),
                    ..Default::default()
                });
            }
        } else if let Some(sub) = current.as_mut() {
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();
                match key {
                    "path" => sub.path = value.to_string(),
                    "url" => sub.url = value.to_string(),
                    "branch" => sub.branch = Some(value.to_string()),
                    _ => {}
                }
            }
        }
    }

    if let Some(sub) = current {
        submodules.push(sub);
    }

    submodules
}

/// Extract the quoted name from a `[submodule "name"]` header.
fn header_name(line: &str) -> Option<&str> {
    let start = line.find('"')?;
    let end = line.rfind('"')?;
    (start < end).then(|| &line[start + 1..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_absent_file_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        let subs = read_submodules(tmp.path()).unwrap();
        assert!(subs.is_empty());
    }

    #[test]
    fn test_parse_single_submodule() {
        let content = r#"[submodule "libfoo"]
    path = vendor/libfoo
    url = https://example.com/libfoo.git
    branch = main
"#;
        let subs = parse_gitmodules(content);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].name, "libfoo");
        assert_eq!(subs[0].path, "vendor/libfoo");
        assert_eq!(subs[0].url, "https://example.com/libfoo.git");
        assert_eq!(subs[0].branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_parse_multiple_submodules() {
        let content = r#"[submodule "one"]
    path = a
    url = https://example.com/a.git
[submodule "two"]
    path = b
    url = https://example.com/b.git
[submodule "three"]
    path = c
    url = https://example.com/c.git
"#;
        let subs = parse_gitmodules(content);
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[0].name, "one");
        assert_eq!(subs[1].name, "two");
        assert_eq!(subs[2].name, "three");
        for sub in &subs {
            assert!(!sub.path.is_empty());
            assert!(!sub.url.is_empty());
            assert!(sub.branch.is_none());
        }
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let content = r#"[submodule "x"]
    path = x
    url = https://example.com/x.git
    shallow = true
"#;
        let subs = parse_gitmodules(content);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].path, "x");
    }

    #[test]
    fn test_read_from_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".gitmodules"),
            "[submodule \"dep\"]\n\tpath = deps/dep\n\turl = git://example.com/dep.git\n",
        )
        .unwrap();

        let subs = read_submodules(tmp.path()).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].name, "dep");
        assert_eq!(subs[0].path, "deps/dep");
    }
}
