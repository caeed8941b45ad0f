use thiserror::Error;

use crate::http::HttpError;

/// Errors produced while aggregating activity.
///
/// Once a first page is in, the paginators absorb page-level variants
/// ([`ActivityError::is_page_level`]) and [`ActivityError::Cancelled`]: the
/// run ends with what it has. Any other variant propagates.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// Network or timeout failure.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Non-2xx status.
    #[error("HTTP {status}: {message}")]
    Protocol { status: u16, message: String },

    /// The operation needs a credential and none is configured.
    #[error("Authentication required")]
    AuthRequired,

    /// Payload could not be decoded into the expected schema.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// A 2xx graph response carried a top-level error list.
    #[error("GraphQL errors: {}", messages.join("; "))]
    GraphErrorList { messages: Vec<String> },

    /// The caller's cancellation token fired.
    #[error("Cancelled")]
    Cancelled,

    /// The subject login is not a valid account name.
    #[error("Invalid subject login: {subject:?}")]
    InvalidSubject { subject: String },

    /// Every attempted source failed and nothing was collected.
    #[error("All data sources failed ({} failures)", failures.len())]
    AllSourcesFailed { failures: Vec<String> },
}

impl ActivityError {
    /// Create a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a protocol (status) error.
    #[inline]
    pub fn protocol(status: u16, message: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            message: message.into(),
        }
    }

    /// Create a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Whether the failure belongs to one page rather than the whole
    /// operation.
    #[inline]
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Protocol { .. }
                | Self::Decode { .. }
                | Self::GraphErrorList { .. }
        )
    }

    /// Whether a paginator that already holds data should stop and keep it.
    #[inline]
    pub fn keeps_partial_results(&self) -> bool {
        self.is_page_level() || matches!(self, Self::Cancelled)
    }
}

impl From<HttpError> for ActivityError {
    fn from(err: HttpError) -> Self {
        ActivityError::transport(err.to_string())
    }
}

impl From<serde_json::Error> for ActivityError {
    fn from(err: serde_json::Error) -> Self {
        ActivityError::decode(err.to_string())
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which is useful for errors
/// that include response bodies or multi-line details.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

/// Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, ActivityError>;
