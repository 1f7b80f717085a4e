use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Coarse classification shared by every component boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transient,
    DataShape,
    Persistence,
}

#[derive(Error, Debug)]
pub enum TubenoteError {
    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("{tool} is not installed or not on PATH")]
    ToolMissing { tool: String },

    #[error("Request to {provider} timed out")]
    Timeout { provider: &'static str },

    #[error("Could not reach {provider}: {reason}")]
    Connection {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} rejected the request: {message}")]
    ProviderRejected {
        provider: &'static str,
        message: String,
    },

    #[error("Metadata extraction failed for {url}: {reason}")]
    MetadataFailed { url: String, reason: String },

    #[error("Unexpected payload from {provider}: {reason}")]
    MalformedPayload {
        provider: &'static str,
        reason: String,
    },

    #[error("No videos found for \"{query}\"")]
    NoVideosFound { query: String },

    #[error("Invalid knowledge base filename: {filename}")]
    InvalidFilename { filename: String },

    #[error("Could not write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TubenoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingApiKey { .. } | Self::ToolMissing { .. } => ErrorKind::Configuration,
            Self::Timeout { .. }
            | Self::Connection { .. }
            | Self::Status { .. }
            | Self::ProviderRejected { .. }
            | Self::MetadataFailed { .. } => ErrorKind::Transient,
            Self::MalformedPayload { .. } | Self::NoVideosFound { .. } | Self::JsonError(_) => {
                ErrorKind::DataShape
            }
            Self::InvalidFilename { .. } | Self::WriteFailed { .. } | Self::IoError(_) => {
                ErrorKind::Persistence
            }
        }
    }

    /// Classify a transport-level failure coming back from `provider`.
    ///
    /// The request URL is dropped first; query-string credentials must not
    /// reach error text or logs.
    pub fn from_reqwest(provider: &'static str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            Self::Timeout { provider }
        } else if err.is_decode() {
            Self::MalformedPayload {
                provider,
                reason: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::Status {
                provider,
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            Self::Connection {
                provider,
                reason: err.to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, TubenoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_each_boundary() {
        let missing = TubenoteError::MissingApiKey {
            env_var: "SERPAPI_API_KEY".into(),
        };
        assert_eq!(missing.kind(), ErrorKind::Configuration);

        let timeout = TubenoteError::Timeout { provider: "SerpApi" };
        assert_eq!(timeout.kind(), ErrorKind::Transient);

        let shape = TubenoteError::MalformedPayload {
            provider: "SerpApi",
            reason: "video_results is not a list".into(),
        };
        assert_eq!(shape.kind(), ErrorKind::DataShape);

        let io = TubenoteError::from(std::io::Error::other("disk full"));
        assert_eq!(io.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn missing_key_message_names_variable() {
        let err = TubenoteError::MissingApiKey {
            env_var: "GEMINI_API_KEY".into(),
        };
        assert_eq!(
            err.to_string(),
            "Missing API key: GEMINI_API_KEY environment variable is not set"
        );
    }
}
