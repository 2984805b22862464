//! Caller-facing error taxonomy for the gateway.
//!
//! Transport-level failures never cross the gateway boundary as-is; the
//! facade folds them into one of these kinds. [`Error::http_status`] gives
//! API handlers the matching status code.

/// Unified error type for everything above the gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The upstream kept throttling after every retry was spent.
    #[error("Rate limited by upstream after {attempts} attempts")]
    RateLimited {
        /// Total transport attempts made, including the first.
        attempts: u32,
    },

    /// The transport exceeded its deadline. Never retried.
    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    /// Any other non-success response or transport failure.
    #[error("Upstream error{}: {message}", status_suffix(.status))]
    Upstream {
        /// HTTP status returned by the upstream, if a response arrived.
        status: Option<u16>,
        /// Human-readable error description.
        message: String,
    },

    /// The caller violated a contract before any network activity.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal invariant broke (e.g. an admission handle was dropped).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::RateLimited { .. } => 429,
            Error::Timeout(_) => 504,
            Error::Upstream { .. } if self.is_not_found() => 404,
            Error::Upstream { .. } => 502,
            Error::Validation(_) => 400,
            Error::Internal(_) => 500,
        }
    }

    /// Whether the upstream reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Upstream { status: Some(404), .. })
    }

    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::RateLimited { .. } => "rate_limited",
            Error::Timeout(_) => "timeout",
            Error::Upstream { .. } if self.is_not_found() => "not_found",
            Error::Upstream { .. } => "upstream_error",
            Error::Validation(_) => "validation_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::Upstream`].
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" [{s}]")).unwrap_or_default()
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
