//! Error types for FleetCheck

/// Result type alias using FleetCheck's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for FleetCheck operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required settings are missing or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// An inventory, detail, or feed request failed
    #[error("fetch error: {context}: {message}")]
    Fetch {
        /// What was being fetched (e.g. `devices`, `device 42 details`)
        context: String,

        /// HTTP status when the server answered
        status: Option<u16>,

        /// Underlying cause
        message: String,
    },

    /// A device field could not be interpreted
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The chat notification could not be delivered
    #[error("delivery error: {message}")]
    Delivery {
        /// HTTP status when the webhook answered
        status: Option<u16>,

        /// Underlying cause
        message: String,
    },

    /// Secret store read or write failed
    #[error("secret store error: {0}")]
    Secret(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a fetch error for a failed transport or an unreadable body
    pub fn fetch(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            context: context.into(),
            status: None,
            message: msg.into(),
        }
    }

    /// Create a fetch error for a non-success HTTP status
    pub fn fetch_status(context: impl Into<String>, status: u16) -> Self {
        Self::Fetch {
            context: context.into(),
            status: Some(status),
            message: format!("server responded with status {}", status),
        }
    }

    /// Create a delivery error
    pub fn delivery(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Delivery {
            status,
            message: msg.into(),
        }
    }

    /// Create a new secret store error
    pub fn secret(msg: impl Into<String>) -> Self {
        Self::Secret(msg.into())
    }

    /// Whether this error came from a fetch
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

/// A field value that could not be parsed.
///
/// Returned by every parsing helper so that callers decide explicitly whether a
/// malformed value counts as compliant or not.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid timestamp {0:?}")]
    Timestamp(String),

    #[error("invalid percentage {0:?}")]
    Percentage(String),

    #[error("invalid version {0:?}")]
    Version(String),
}
