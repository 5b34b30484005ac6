//! Errors surfaced by `StreamClient` operations.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::models::Snapshot;
use crate::traits::HttpError;

/// Failure of a streaming (or feedback) request.
///
/// Transport failures and cancellations carry whatever had been decoded so
/// the caller can still show the partial answer. Malformed citation data is
/// never an error.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The endpoint answered with a non-success status before streaming.
    #[error("Agent request rejected ({status}): {message}")]
    Request { status: u16, message: String },

    /// The stream broke off mid-flight, or never connected.
    #[error("Stream interrupted: {source}")]
    Transport {
        #[source]
        source: HttpError,
        partial: Snapshot,
    },

    /// The caller abandoned the request.
    #[error("Stream cancelled")]
    Cancelled { partial: Snapshot },

    /// The request body could not be serialized.
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// A non-streaming response body could not be decoded.
    #[error("Invalid response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

impl StreamError {
    /// Transport failure before anything was decoded.
    pub fn transport(source: HttpError) -> Self {
        StreamError::Transport {
            source,
            partial: Snapshot::default(),
        }
    }

    /// Partial answer accumulated before the failure, if any was kept.
    pub fn partial(&self) -> Option<&Snapshot> {
        match self {
            StreamError::Transport { partial, .. } | StreamError::Cancelled { partial } => {
                Some(partial)
            }
            _ => None,
        }
    }

    /// Consume the error, keeping only the partial answer.
    pub fn into_partial(self) -> Option<Snapshot> {
        match self {
            StreamError::Transport { partial, .. } | StreamError::Cancelled { partial } => {
                Some(partial)
            }
            _ => None,
        }
    }

    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this was a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamError::Cancelled { .. })
    }

    /// High-level classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            StreamError::Request { status, .. } => match status {
                401 | 403 => ErrorCategory::Auth,
                429 | 500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            StreamError::Transport { source, .. } => match source {
                HttpError::ServerError { .. } => ErrorCategory::Server,
                _ => ErrorCategory::Network,
            },
            StreamError::Cancelled { .. } => ErrorCategory::User,
            StreamError::Encode(_) | StreamError::Decode { .. } => ErrorCategory::Client,
        }
    }

    /// Whether retrying might help. The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Request { .. } => "E_STREAM_REQUEST",
            StreamError::Transport { .. } => "E_STREAM_TRANSPORT",
            StreamError::Cancelled { .. } => "E_STREAM_CANCELLED",
            StreamError::Encode(_) => "E_STREAM_ENCODE",
            StreamError::Decode { .. } => "E_STREAM_DECODE",
        }
    }

    /// Message suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Request { status: 401, .. } => {
                "Not signed in or session expired. Please log in again.".to_string()
            }
            StreamError::Request { status: 429, .. } => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            StreamError::Request { status, .. } => {
                format!("The agent rejected the request (status {}).", status)
            }
            StreamError::Transport { .. } => {
                "Failed to get a complete response. Please try again.".to_string()
            }
            StreamError::Cancelled { .. } => "Request cancelled.".to_string(),
            StreamError::Encode(_) | StreamError::Decode { .. } => {
                "Unexpected data while talking to the agent.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial_text(text: &str) -> Snapshot {
        Snapshot {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_request_error_display_and_status() {
        let err = StreamError::Request {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Agent request rejected (503): Service Unavailable"
        );
        assert_eq!(err.status(), Some(503));
        assert!(err.partial().is_none());
        assert_eq!(err.category(), ErrorCategory::Server);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_transport_error_keeps_partial() {
        let err = StreamError::Transport {
            source: HttpError::Io("connection reset".to_string()),
            partial: partial_text("Hel"),
        };
        assert_eq!(err.to_string(), "Stream interrupted: IO error: connection reset");
        assert_eq!(err.partial().unwrap().text, "Hel");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.into_partial().unwrap().text, "Hel");
    }

    #[test]
    fn test_transport_error_source_chain() {
        let err = StreamError::transport(HttpError::Timeout("30s".to_string()));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Request timeout: 30s");
        assert!(err.partial().unwrap().is_empty());
    }

    #[test]
    fn test_cancelled_is_not_retryable() {
        let err = StreamError::Cancelled {
            partial: partial_text("so far"),
        };
        assert!(err.is_cancelled());
        assert!(!err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::User);
        assert_eq!(err.error_code(), "E_STREAM_CANCELLED");
    }

    #[test]
    fn test_auth_statuses() {
        for status in [401, 403] {
            let err = StreamError::Request {
                status,
                message: String::new(),
            };
            assert_eq!(err.category(), ErrorCategory::Auth);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_user_messages_are_not_empty() {
        let errors = vec![
            StreamError::Request {
                status: 401,
                message: String::new(),
            },
            StreamError::Request {
                status: 422,
                message: String::new(),
            },
            StreamError::transport(HttpError::Other("x".to_string())),
            StreamError::Cancelled {
                partial: Snapshot::default(),
            },
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
            assert!(err.error_code().starts_with("E_STREAM_"));
        }
    }

    #[test]
    fn test_encode_error_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StreamError = json_err.into();
        assert!(matches!(err, StreamError::Encode(_)));
        assert_eq!(err.category(), ErrorCategory::Client);
    }
}
