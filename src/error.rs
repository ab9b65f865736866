use thiserror::Error;

/// Main error type for searchgate operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Syntax error at position {position}: {message} (near '{fragment}')")]
    Syntax {
        position: usize,
        message: String,
        fragment: String,
    },

    #[error("Field [{field}] not found for index [{index}]")]
    InvalidField { field: String, index: String },

    #[error("Invalid value for operator {operator}: {message}")]
    InvalidValue { operator: String, message: String },

    #[error("Index [{0}] not found")]
    IndexNotFound(String),

    #[error("Exceeded the number of fragments: {count} (max: {max})")]
    FragmentLimit { count: usize, max: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type alias for searchgate operations
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Build a syntax error pointing at `position` within `input`
    pub fn syntax(input: &str, position: usize, message: impl Into<String>) -> Self {
        let fragment: String = input.chars().skip(position).take(24).collect();
        GatewayError::Syntax {
            position,
            message: message.into(),
            fragment,
        }
    }

    pub fn invalid_value(operator: impl ToString, message: impl Into<String>) -> Self {
        GatewayError::InvalidValue {
            operator: operator.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, index: impl Into<String>) -> Self {
        GatewayError::InvalidField {
            field: field.into(),
            index: index.into(),
        }
    }

    /// Whether the caller must correct its input. None of these are retriable.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GatewayError::Syntax { .. }
                | GatewayError::InvalidField { .. }
                | GatewayError::InvalidValue { .. }
                | GatewayError::IndexNotFound(_)
                | GatewayError::FragmentLimit { .. }
                | GatewayError::InvalidRequest(_)
        )
    }

    /// Stable tag the transport layer maps onto a status code
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::Syntax { .. } => "syntax_error",
            GatewayError::InvalidField { .. } => "invalid_field",
            GatewayError::InvalidValue { .. } => "invalid_value",
            GatewayError::IndexNotFound(_) => "index_not_found",
            GatewayError::FragmentLimit { .. } => "fragment_limit_exceeded",
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::Config(_) => "config_error",
            GatewayError::Serialization(_) => "serialization_error",
            GatewayError::Io(_) => "io_error",
            GatewayError::Metrics(_) => "metrics_error",
        }
    }
}
