use thiserror::Error;

/// Failure classification for every remote operation.
///
/// The transport behind [`crate::RemoteAccess`] is responsible for its own
/// timeout policy; the core only needs the resulting error to be
/// classifiable into one of these kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Connection refused, timeout, or any other transport failure.
    #[error("server unreachable: {message}")]
    Unreachable { message: String },

    /// Structured error payload from the remote (first reported entry).
    #[error("{message}")]
    Protocol {
        message: String,
        /// Raw stack or payload for a "details" affordance.
        details: Option<String>,
    },

    /// 401-equivalent. Handled globally with a forced re-authentication,
    /// never shown as an ordinary error notice.
    #[error("unauthorized")]
    Unauthorized,

    /// Client-side validation failure raised before dispatch.
    #[error("validation failed: {message}")]
    Validation { message: String },
}

impl ApiError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        ApiError::Unreachable { message: message.into() }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        ApiError::Protocol { message: message.into(), details: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation { message: message.into() }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Operator-facing message text.
    pub fn message(&self) -> String {
        match self {
            ApiError::Unreachable { message } => message.clone(),
            ApiError::Protocol { message, .. } => message.clone(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Validation { message } => message.clone(),
        }
    }

    /// Raw payload for the "details" affordance, when present.
    pub fn details(&self) -> Option<&str> {
        match self {
            ApiError::Protocol { details, .. } => details.as_deref(),
            _ => None,
        }
    }
}
