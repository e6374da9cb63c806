//! Extension to language lookup.

use std::path::Path;

/// Sentinel language for unmapped extensions.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Known extension/language pairs. Extensions are lowercase, without dots.
const LANGUAGE_TABLE: &[(&str, &str)] = &[
    ("go", "go"),
    ("py", "python"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("java", "java"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("hpp", "cpp"),
    ("rs", "rust"),
    ("rb", "ruby"),
    ("php", "php"),
    ("cs", "csharp"),
    ("kt", "kotlin"),
    ("swift", "swift"),
    ("scala", "scala"),
    ("clj", "clojure"),
    ("hs", "haskell"),
    ("ml", "ocaml"),
    ("sh", "shell"),
    ("bash", "shell"),
    ("zsh", "shell"),
    ("fish", "shell"),
    ("ps1", "powershell"),
    ("sql", "sql"),
    ("r", "r"),
    ("dart", "dart"),
    ("lua", "lua"),
    ("pl", "perl"),
    ("perl", "perl"),
];

/// Determine the programming language of a file from its extension.
///
/// Returns [`UNKNOWN_LANGUAGE`] for unmapped extensions; never fails.
#[must_use]
pub fn file_language(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return UNKNOWN_LANGUAGE;
    };
    let ext = ext.to_lowercase();
    LANGUAGE_TABLE
        .iter()
        .find(|(e, _)| *e == ext)
        .map_or(UNKNOWN_LANGUAGE, |(_, lang)| lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(file_language(Path::new("main.go")), "go");
        assert_eq!(file_language(Path::new("app.py")), "python");
        assert_eq!(file_language(Path::new("index.jsx")), "javascript");
        assert_eq!(file_language(Path::new("Widget.tsx")), "typescript");
        assert_eq!(file_language(Path::new("lib.rs")), "rust");
        assert_eq!(file_language(Path::new("Main.java")), "java");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(file_language(Path::new("MAIN.GO")), "go");
        assert_eq!(file_language(Path::new("script.Sh")), "shell");
    }

    #[test]
    fn test_unknown_extension_is_sentinel() {
        assert_eq!(file_language(Path::new("photo.png")), UNKNOWN_LANGUAGE);
        assert_eq!(file_language(Path::new("Makefile")), UNKNOWN_LANGUAGE);
        assert_eq!(file_language(Path::new("noext")), UNKNOWN_LANGUAGE);
    }
}
