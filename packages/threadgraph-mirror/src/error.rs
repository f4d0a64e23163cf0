//! Error types for threadgraph-mirror

use std::fmt;
use thiserror::Error;

/// Mirror error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Replica already bound to a different origin or schema version
    IncompatibleOrigin,
    /// Non-success response from the source, other than a withdrawn-entity signal
    Transport,
    /// Source response missing required fields or otherwise unparseable
    MalformedResponse,
    /// Malformed caller-supplied input (e.g. a bad base URL)
    Validation,
    /// Local replica database errors
    Database,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::IncompatibleOrigin => "incompatible_origin",
            ErrorKind::Transport => "transport",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::Validation => "validation",
            ErrorKind::Database => "database",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mirror error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct MirrorError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl MirrorError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn incompatible_origin(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IncompatibleOrigin, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }
}

// SQLite error conversions
impl From<rusqlite::Error> for MirrorError {
    fn from(err: rusqlite::Error) -> Self {
        MirrorError::database(format!("SQLite error: {}", err)).with_source(err)
    }
}

// HTTP transport conversions
impl From<reqwest::Error> for MirrorError {
    fn from(err: reqwest::Error) -> Self {
        MirrorError::transport(format!("HTTP error: {}", err)).with_source(err)
    }
}

// Wire-format decode conversions
impl From<serde_json::Error> for MirrorError {
    fn from(err: serde_json::Error) -> Self {
        MirrorError::malformed_response(format!("JSON error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, MirrorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MirrorError::incompatible_origin("bound to https://other.example");
        let msg = format!("{}", err);
        assert_eq!(msg, "[incompatible_origin] bound to https://other.example");
    }

    #[test]
    fn test_transport_error() {
        let err = MirrorError::transport("not OK status 500");
        assert_eq!(err.kind, ErrorKind::Transport);
        assert!(err.source.is_none());
    }

    #[test]
    fn test_from_rusqlite_error() {
        let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
        let err: MirrorError = sqlite_err.into();

        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.message.contains("SQLite error"));
        assert!(err.source.is_some());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json")
            .err()
            .unwrap();
        let err: MirrorError = json_err.into();

        assert_eq!(err.kind, ErrorKind::MalformedResponse);
        assert!(err.source.is_some());
    }

    #[test]
    fn test_result_propagation() {
        fn inner() -> Result<()> {
            Err(MirrorError::validation("bad base url"))
        }

        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
