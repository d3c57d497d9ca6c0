use std::io::Error as IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// Request target did not resolve to a stream path
    #[error("Request error: {0}")]
    Request(String),

    /// Stream absent or subscriber rejected
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// AMF0 or FLV tag write failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("AMF decode error: {0}")]
    AmfDecode(String),

    /// Pull trigger failed
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a request error
    pub fn request(msg: impl Into<String>) -> Self {
        Error::Request(msg.into())
    }

    /// Create a subscription error
    pub fn subscription(msg: impl Into<String>) -> Self {
        Error::Subscription(msg.into())
    }

    /// Create an encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Error::Encoding(msg.into())
    }

    /// Create an AMF decode error
    pub fn amf_decode(msg: impl Into<String>) -> Self {
        Error::AmfDecode(msg.into())
    }

    /// Create an ingestion error
    pub fn ingestion(msg: impl Into<String>) -> Self {
        Error::Ingestion(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Error::Stream(msg.into())
    }

    /// Create a connection closed error
    pub fn connection_closed(msg: impl Into<String>) -> Self {
        Error::ConnectionClosed(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// HTTP status code reported for this error when it ends a request
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Request(_) => 404,
            _ => 500,
        }
    }

    /// Whether the error means the client went away rather than something broke
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::ConnectionClosed(_) => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::request("no stream path in '/'");
        assert_eq!(format!("{}", err), "Request error: no stream path in '/'");

        let err = Error::subscription("Stream 'cam1' not found");
        assert_eq!(format!("{}", err), "Subscription error: Stream 'cam1' not found");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::request("x").status_code(), 404);
        assert_eq!(Error::subscription("x").status_code(), 500);
        assert_eq!(Error::ingestion("x").status_code(), 500);
    }

    #[test]
    fn test_error_conversion() {
        use std::io::{Error as IoError, ErrorKind};

        let io_err = IoError::new(ErrorKind::BrokenPipe, "pipe");
        let err: Error = io_err.into();

        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_disconnect());
        assert!(Error::connection_closed("gone").is_disconnect());
        assert!(!Error::encoding("bad").is_disconnect());
    }
}
