use std::error::Error as StdError;

/// Crate-wide result type for intake operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed intake errors shared by the runtime capabilities.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration or host input is invalid.
    #[error("invalid intake input: {message}")]
    InvalidInput { message: String },

    /// The runtime cannot take the event right now.
    #[error("runtime unavailable: {message}")]
    Unavailable { message: String },

    /// Wrapped source error from the embedding host.
    #[error("intake operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            Error::invalid_input("default_format: cdma").to_string(),
            "invalid intake input: default_format: cdma"
        );
        assert_eq!(
            Error::unavailable("host rejected event").to_string(),
            "runtime unavailable: host rejected event"
        );

        let source = std::io::Error::other("pipe closed");
        let err = Error::external("emit callback", source);
        assert_eq!(err.to_string(), "intake operation failed: emit callback: pipe closed");
        assert!(StdError::source(&err).is_some());
    }
}
