// Error types for mediawiki-fixtures

use thiserror::Error;

/// Result type alias for mediawiki-fixtures operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building browsers or provisioning users
#[derive(Debug, Error)]
pub enum Error {
    /// A factory type binding was declared without a callback
    ///
    /// Factory-type declarations must always supply a callback. Only
    /// instance-level declarations fall back to a no-op.
    #[error("No callback given for factory type binding on {0}")]
    MissingCallback(String),

    /// A binding was declared with an empty or repeated option name list
    #[error("Invalid binding: {0}")]
    InvalidBinding(String),

    /// A configuration value is missing or can't be interpreted
    ///
    /// Raised by binding callbacks that reject a value (e.g. a non-numeric
    /// `browser_timeout`) and by environment lookups of required keys.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The WebDriver remote end refused to create a session
    #[error("Failed to create browser session: {0}")]
    SessionNotCreated(String),

    /// WebDriver protocol error returned by the remote end
    ///
    /// `error` is the W3C error code (e.g. "no such element"),
    /// `message` is the human readable explanation from the driver.
    #[error("WebDriver error '{error}': {message}")]
    WebDriver { error: String, message: String },

    /// Operation attempted on a session that was already closed
    #[error("Session closed: cannot {0} on a closed browser session")]
    SessionClosed(String),

    /// Account provisioning failed
    #[error("Failed to provision user account: {0}")]
    Provisioning(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_callback_message_names_the_binding() {
        let err = Error::MissingCallback("[browser_timeout]".to_string());
        assert!(err.to_string().contains("browser_timeout"));
    }

    #[test]
    fn test_context_wraps_source() {
        let err = Error::InvalidConfig("browser_timeout".to_string()).context("resolving firefox");
        assert_eq!(
            err.to_string(),
            "resolving firefox: Invalid configuration: browser_timeout"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
