use thiserror::Error;

/// Boxed error produced by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Canonical error type for query building, execution and decoding.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A clause references a field the document model does not declare.
    #[error("unknown field `{field}`: check field name")]
    UnknownField {
        /// Base field name after stripping any operator suffix.
        field: String,
    },

    /// A clause value has the wrong shape for its operator.
    #[error("invalid clause for `{field}`: {message}")]
    InvalidClause {
        /// Raw field name as given by the caller.
        field: String,
        /// Human-readable explanation.
        message: String,
    },

    /// A returned document does not conform to the model.
    #[error("document shape error: {0}")]
    Shape(String),

    /// Failure reported by the transport; the original error is kept as source.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The engine response lacks a member the decoder requires.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Creates an `UnknownField` variant.
    #[must_use]
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Creates an `InvalidClause` variant.
    #[must_use]
    pub fn invalid_clause(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidClause {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wraps any transport failure without translating it.
    #[must_use]
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(err))
    }

    /// Creates a `MalformedResponse` variant.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Returns true for errors raised while validating caller input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnknownField { .. } | Self::InvalidClause { .. })
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Shape(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Convenient result alias for osorm operations.
pub type CoreResult<T> = Result<T, CoreError>;
