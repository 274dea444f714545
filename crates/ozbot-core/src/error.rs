use thiserror::Error;

/// Top-level error type for OzBot.
///
/// Subsystem crates define their own error types and implement
/// `From<OzbotError>` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OzbotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid procedure {id:?}: {reason}")]
    InvalidProcedure { id: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for OzbotError {
    fn from(err: toml::de::Error) -> Self {
        OzbotError::Config(err.to_string())
    }
}

/// A specialized `Result` type for OzBot operations.
pub type Result<T> = std::result::Result<T, OzbotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OzbotError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_invalid_procedure_display() {
        let err = OzbotError::InvalidProcedure {
            id: "sop-009".into(),
            reason: "title is empty".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid procedure \"sop-009\": title is empty"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OzbotError = io_err.into();
        assert!(matches!(err, OzbotError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = [").unwrap_err();
        let err: OzbotError = toml_err.into();
        assert!(matches!(err, OzbotError::Config(_)));
    }
}
