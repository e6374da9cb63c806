//! Configuration settings and validation.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::OnceCell;

use crate::chunker::ChunkerConfig;
use crate::{Error, Result};

/// Default set of indexable extensions (dot-prefixed).
const DEFAULT_EXTENSIONS: &[&str] = &[
    ".go", ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".c", ".h", ".cpp", ".hpp", ".rs",
    ".rb", ".php", ".cs", ".kt", ".swift", ".scala", ".sh", ".sql", ".md", ".yaml", ".yml",
    ".json", ".toml",
];

/// Default exclude patterns applied to file paths and their ancestors.
const DEFAULT_EXCLUDES: &[&str] = &[
    "*/.git", "*/.git/*", "*/node_modules", "*/node_modules/*", "*/target", "*/target/*",
    "*/vendor", "*/vendor/*", "*/__pycache__", "*/__pycache__/*", "*/dist", "*/dist/*",
];

/// Main configuration for the Quarry pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory where remote repositories are cloned and the location
    /// store lives.
    pub repo_dir: PathBuf,

    /// Extensions eligible for indexing, each with a leading dot.
    pub supported_extensions: Vec<String>,

    /// Maximum file size in bytes; larger files are skipped.
    pub max_file_size: u64,

    /// Glob patterns excluding files; matched against the file path and
    /// every ancestor directory.
    pub exclude_patterns: Vec<String>,

    /// Chunking settings.
    pub chunking: ChunkerConfig,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    exclude_set: OnceCell<GlobSet>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("./repos"),
            supported_extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            max_file_size: 1024 * 1024,
            exclude_patterns: DEFAULT_EXCLUDES.iter().map(ToString::to_string).collect(),
            chunking: ChunkerConfig::default(),
            log_level: "info".to_string(),
            exclude_set: OnceCell::new(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory for managed clones and the location store.
    #[must_use]
    pub fn with_repo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = dir.into();
        self
    }

    /// Set the maximum indexable file size in bytes.
    #[must_use]
    pub const fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Set the chunking configuration.
    #[must_use]
    pub fn with_chunking(mut self, chunking: ChunkerConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Set the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(Error::config("max_file_size cannot be 0"));
        }

        if self.supported_extensions.is_empty() {
            return Err(Error::config("supported_extensions cannot be empty"));
        }

        for ext in &self.supported_extensions {
            if !ext.starts_with('.') {
                return Err(Error::config(format!(
                    "extension '{ext}' must start with a dot"
                )));
            }
        }

        for pattern in &self.exclude_patterns {
            Glob::new(pattern)
                .map_err(|e| Error::config(format!("invalid exclude pattern '{pattern}': {e}")))?;
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        self.chunking.validate()?;

        Ok(())
    }

    /// Check if a file's extension is eligible for indexing.
    #[must_use]
    pub fn is_file_supported(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let dotted = format!(".{}", ext.to_lowercase());
        self.supported_extensions.iter().any(|e| *e == dotted)
    }

    /// Check if a path matches an exclude pattern, either itself or through
    /// any ancestor directory.
    #[must_use]
    pub fn should_exclude_file(&self, path: &Path) -> bool {
        let set = self.exclude_set();
        if set.is_match(path) {
            return true;
        }
        path.ancestors().skip(1).any(|dir| set.is_match(dir))
    }

    /// Path of the repository location store.
    #[must_use]
    pub fn location_store_path(&self) -> PathBuf {
        self.repo_dir.join("repositories.json")
    }

    fn exclude_set(&self) -> &GlobSet {
        self.exclude_set.get_or_init(|| {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.exclude_patterns {
                if let Ok(glob) = Glob::new(pattern) {
                    builder.add(glob);
                }
            }
            builder.build().unwrap_or_else(|_| GlobSet::empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_file_size() {
        let config = Config {
            max_file_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_file_size"));
    }

    #[test]
    fn test_validate_extension_without_dot() {
        let config = Config {
            supported_extensions: vec!["rs".to_string()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dot"));
    }

    #[test]
    fn test_validate_bad_exclude_pattern() {
        let config = Config {
            exclude_patterns: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "shouty".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_is_file_supported() {
        let config = Config::default();
        assert!(config.is_file_supported(Path::new("src/main.rs")));
        assert!(config.is_file_supported(Path::new("app.PY")));
        assert!(!config.is_file_supported(Path::new("image.png")));
        assert!(!config.is_file_supported(Path::new("Makefile")));
    }

    #[test]
    fn test_should_exclude_by_ancestor() {
        let config = Config::default();
        assert!(config.should_exclude_file(Path::new("/repo/node_modules/pkg/index.js")));
        assert!(config.should_exclude_file(Path::new("/repo/target/debug/main.rs")));
        assert!(!config.should_exclude_file(Path::new("/repo/src/main.rs")));
    }

    #[test]
    fn test_should_exclude_custom_pattern() {
        let config = Config {
            exclude_patterns: vec!["*.generated.go".to_string()],
            ..Default::default()
        };
        assert!(config.should_exclude_file(Path::new("/repo/api.generated.go")));
        assert!(!config.should_exclude_file(Path::new("/repo/api.go")));
    }

    #[test]
    fn test_location_store_path() {
        let config = Config {
            repo_dir: PathBuf::from("/var/lib/quarry"),
            ..Default::default()
        };
        assert_eq!(
            config.location_store_path(),
            PathBuf::from("/var/lib/quarry/repositories.json")
        );
    }
}
