//! Crate-level error types and the failure-to-message policy.
//!
//! Every network failure the coordinator sees ends up as a [`ClientError`].
//! [`failure_message`] turns one into the single apology entry that replaces
//! the pending placeholder in the transcript.

use thiserror::Error;

/// Base text of the synthesized assistant entry for transport and status failures.
pub const APOLOGY: &str = "Sorry, I encountered an error while processing your request.";

/// Appended when the failure looks like a connectivity problem.
pub const NETWORK_CLAUSE: &str =
    " It looks like there is a network connectivity issue. Please check your connection and try again.";

/// Appended when the failure looks like a timeout.
pub const TIMEOUT_CLAUSE: &str =
    " The request timed out. The server might be busy, so please try again in a moment.";

/// Human-readable bucket for a non-success HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    /// 5xx other than the gateway family.
    Server,
    /// 404.
    NotFound,
    /// 502, 503, 504: the backend could not be reached through the gateway.
    ConnectivityLost,
    Other,
}

impl StatusCategory {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => StatusCategory::NotFound,
            502..=504 => StatusCategory::ConnectivityLost,
            500..=599 => StatusCategory::Server,
            _ => StatusCategory::Other,
        }
    }
}

impl std::fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCategory::Server => write!(f, "Server error"),
            StatusCategory::NotFound => write!(f, "Requested resource not found"),
            StatusCategory::ConnectivityLost => write!(f, "Network connection lost"),
            StatusCategory::Other => write!(f, "Unexpected response"),
        }
    }
}

/// Errors raised by [`crate::client::ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport never produced a response.
    #[error("network error: could not reach {url}: {detail}")]
    Connect { url: String, detail: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The server answered with a non-2xx status.
    #[error("{category} (HTTP {status})")]
    Status { status: u16, category: StatusCategory },

    /// A decoded body carried an explicit `error` field.
    #[error("{0}")]
    Application(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(status: u16) -> Self {
        ClientError::Status {
            status,
            category: StatusCategory::from_status(status),
        }
    }

    pub(crate) fn from_transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout { url: url.to_string() }
        } else {
            ClientError::Connect {
                url: url.to_string(),
                detail: err.to_string(),
            }
        }
    }

    /// Whether the failure reads as a connectivity problem.
    pub fn is_network(&self) -> bool {
        match self {
            ClientError::Connect { .. } => true,
            ClientError::Status { category, .. } => *category == StatusCategory::ConnectivityLost,
            _ => {
                let text = self.to_string().to_lowercase();
                text.contains("network") || text.contains("connection") || text.contains("failed to fetch")
            }
        }
    }

    /// Whether the failure reads as a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            ClientError::Timeout { .. } => true,
            _ => {
                let text = self.to_string().to_lowercase();
                text.contains("timeout") || text.contains("timed out")
            }
        }
    }
}

/// Text of the assistant entry that stands in for a failed answer.
///
/// At most one clause is appended; the network check wins over the timeout
/// check when both match.
pub fn failure_message(err: &ClientError) -> String {
    let mut text = match err {
        ClientError::Application(detail) => format!("Sorry, an error occurred: {detail}"),
        _ => APOLOGY.to_string(),
    };
    if err.is_network() {
        text.push_str(NETWORK_CLAUSE);
    } else if err.is_timeout() {
        text.push_str(TIMEOUT_CLAUSE);
    }
    text
}
