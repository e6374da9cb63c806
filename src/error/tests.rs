//! Tests for error types.

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("invalid max file size");
        assert_eq!(
            err.to_string(),
            "configuration error: invalid max file size"
        );
    }

    #[test]
    fn test_repository_error_missing_path() {
        let err = RepositoryError::MissingPath {
            path: "/no/such/dir".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "repository path does not exist: /no/such/dir"
        );
    }

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotARepository {
            path: "/tmp/plain".to_string(),
        };
        let err: Error = repo_err.into();
        assert!(matches!(err, Error::Repository(_)));
    }

    #[test]
    fn test_clone_error_display() {
        let err = RepositoryError::Clone {
            url: "https://example.com/repo.git".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to clone 'https://example.com/repo.git': connection refused"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(Error::Cancelled.to_string(), "operation cancelled");
    }

    #[test]
    fn test_unsupported_display() {
        let err = Error::unsupported("re-index without a stored source location");
        assert_eq!(
            err.to_string(),
            "unsupported operation: re-index without a stored source location"
        );
    }

    #[test]
    fn test_parse_error_is_distinct() {
        let err = Error::parse("unbalanced braces");
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(err.to_string(), "parse error: unbalanced braces");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(Error::config("test error"))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::Internal("something went wrong".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Internal"));
        assert!(debug_str.contains("something went wrong"));
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> Result<i32> {
            Err(Error::config("inner error"))
        }

        fn outer() -> Result<i32> {
            let _ = inner()?;
            Ok(0)
        }

        let result = outer();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "configuration error: inner error"
        );
    }
}
