//! Error types for the surface-sim library.
//!
//! The scoring core only ever surfaces [`SurfaceSimError::UnsupportedLanguage`].
//! Lexing problems and syntax errors are absorbed inside the pipeline (regex
//! fallback and a zero AST score respectively). The remaining variants belong
//! to the orchestration layers: configuration, batch I/O and the external
//! scorer protocol.

use std::io;

use thiserror::Error;

/// Main result type for surface-sim operations.
pub type Result<T> = std::result::Result<T, SurfaceSimError>;

/// Error type for all surface-sim operations.
#[derive(Error, Debug)]
pub enum SurfaceSimError {
    /// A language tag that no registered adapter handles
    #[error("Unsupported language '{language}' (supported: {supported})")]
    UnsupportedLanguage {
        /// Tag as supplied by the caller
        language: String,
        /// Comma separated list of registered tags
        supported: String,
    },

    /// I/O related errors (dataset files, config files)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data format being handled
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Failures of the external (learned) scoring process
    #[error("External scorer error: {message}")]
    External {
        /// Error description
        message: String,
        /// Program that was invoked
        program: Option<String>,
    },
}

impl SurfaceSimError {
    /// Create an unsupported-language error listing the known tags
    pub fn unsupported_language(language: impl Into<String>, supported: &[&str]) -> Self {
        Self::UnsupportedLanguage {
            language: language.into(),
            supported: supported.join(", "),
        }
    }

    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new validation error tied to a record field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new external scorer error
    pub fn external(message: impl Into<String>, program: impl Into<String>) -> Self {
        Self::External {
            message: message.into(),
            program: Some(program.into()),
        }
    }

    /// Prefix the message of an I/O, serialization or external error.
    ///
    /// Configuration, validation and language errors already name their
    /// subject and are returned unchanged.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Io { message, .. }
            | Self::Serialization { message, .. }
            | Self::External { message, .. } => {
                *message = format!("{}: {message}", context.into());
            }
            _ => {}
        }
        self
    }
}

impl From<io::Error> for SurfaceSimError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for SurfaceSimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for SurfaceSimError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SurfaceSimError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_language_message() {
        let err = SurfaceSimError::unsupported_language("cobol", &["python", "java"]);
        let display = err.to_string();
        assert!(display.contains("cobol"));
        assert!(display.contains("python, java"));
    }

    #[test]
    fn test_config_field_error() {
        let err = SurfaceSimError::config_field("must be below x_hi", "regions.x_lo");

        if let SurfaceSimError::Config { message, field } = err {
            assert_eq!(message, "must be below x_hi");
            assert_eq!(field, Some("regions.x_lo".to_string()));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_with_context_leaves_validation_untouched() {
        let err = SurfaceSimError::validation_field("no rows", "threshold_search")
            .with_context("scored.jsonl");
        assert_eq!(err.to_string(), "Validation error: no rows");
    }

    #[test]
    fn test_with_context_prefixes_io_message() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = SurfaceSimError::io("read failed", io_err).with_context("pairs.jsonl");
        assert!(err.to_string().contains("pairs.jsonl: read failed"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let err = SurfaceSimError::from(json_err).with_context("request.jsonl");
        assert!(err.to_string().starts_with("Serialization error: request.jsonl: JSON"));

        if let SurfaceSimError::Serialization { data_type, .. } = err {
            assert_eq!(data_type, Some("JSON".to_string()));
        } else {
            panic!("Expected Serialization error");
        }
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<i32>("invalid: yaml: content").unwrap_err();
        let err: SurfaceSimError = yaml_err.into();
        assert!(matches!(err, SurfaceSimError::Serialization { .. }));
    }

    #[test]
    fn test_result_ext_context() {
        let result: std::result::Result<i32, io::Error> =
            Err(io::Error::new(io::ErrorKind::InvalidInput, "Bad input"));

        let err = result.context("Loading dataset").unwrap_err();
        assert!(matches!(err, SurfaceSimError::Io { .. }));
        assert!(err.to_string().contains("Loading dataset"));
    }
}
