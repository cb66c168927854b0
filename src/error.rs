/*!
 * Error handling for BloomAPI client operations
 *
 * Every failure path of a lookup surfaces as a distinct variant: transport
 * problems, unexpected HTTP statuses, bodies that cannot be decoded, and NPI
 * lookups that match nothing.
 */

use std::fmt;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// BloomAPI client result type
pub type Result<T> = std::result::Result<T, BloomError>;

/// Error types with context and suggestions
#[derive(Error, Debug)]
pub enum BloomError {
    /// Connection, timeout, or body read failure
    #[error("Transport error calling {endpoint}: {message}")]
    Transport {
        endpoint: String,
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than 200 OK
    #[error("HTTP status {status} from {endpoint}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Body was not JSON, or did not have the expected shape
    #[error("Malformed response: {message}")]
    MalformedResponse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// An NPI lookup returned no provider
    #[error("No provider found for NPI '{npi}'")]
    ProviderNotFound {
        npi: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Export errors
    #[error("Export error: {message}")]
    Export {
        message: String,
        format: ExportFormat,
    },
}

/// Output format for exported records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    JsonLines,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::JsonLines => write!(f, "JSON Lines"),
            ExportFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl BloomError {
    /// Wrap a reqwest failure for the given endpoint
    pub fn transport(endpoint: &str, source: reqwest::Error) -> Self {
        let message = if source.is_timeout() {
            "request timed out".to_string()
        } else if source.is_connect() {
            "could not connect to server".to_string()
        } else {
            source.to_string()
        };

        Self::Transport {
            endpoint: endpoint.to_string(),
            message,
            source,
        }
    }

    /// Create a malformed response error without an underlying parse error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a malformed response error from a JSON decoding failure
    pub fn invalid_json(source: serde_json::Error) -> Self {
        Self::MalformedResponse {
            message: format!("body is not valid JSON ({})", source),
            source: Some(source),
        }
    }

    pub fn provider_not_found(npi: &str) -> Self {
        Self::ProviderNotFound {
            npi: npi.to_string(),
        }
    }

    /// True when an NPI lookup matched nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProviderNotFound { .. })
    }

    /// HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } => {
                format!("{}\n\nSuggestion: Check your network connection and the configured base URL", self)
            }
            Self::HttpStatus { status: 401 | 403, .. } => {
                format!("{}\n\nSuggestion: Check that your BloomAPI secret key is set and valid", self)
            }
            Self::HttpStatus { body, .. } if !body.trim().is_empty() => {
                format!("{}\n\nResponse body: {}", self, truncate(body, 500))
            }
            Self::ProviderNotFound { .. } => {
                format!("{}\n\nSuggestion: Verify the NPI is a 10-digit number registered with NPPES", self)
            }
            Self::Configuration { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

// Convenience conversions
impl From<std::io::Error> for BloomError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<csv::Error> for BloomError {
    fn from(err: csv::Error) -> Self {
        Self::Export {
            message: err.to_string(),
            format: ExportFormat::Csv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessor() {
        let err = BloomError::HttpStatus {
            endpoint: "/api/npis/1234567890".to_string(),
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_not_found());
        assert_eq!(BloomError::provider_not_found("1").status(), None);
    }

    #[test]
    fn test_user_message_includes_body() {
        let err = BloomError::HttpStatus {
            endpoint: "/api/search/npi".to_string(),
            status: 400,
            body: "{\"error\":\"bad key\"}".to_string(),
        };
        let message = err.user_message();
        assert!(message.starts_with("HTTP status 400 from /api/search/npi"));
        assert!(message.contains("bad key"));
    }

    #[test]
    fn test_unauthorized_suggests_secret() {
        let err = BloomError::HttpStatus {
            endpoint: "/api/search/npi".to_string(),
            status: 401,
            body: String::new(),
        };
        assert!(err.user_message().contains("secret key"));
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(600);
        assert_eq!(truncate(&body, 500).len(), 503);
        assert_eq!(truncate("short", 500), "short");
    }
}
