use actix_web::http::{StatusCode, header::ContentType};
use actix_web::{HttpResponse, ResponseError};

/// Errors surfaced by the HTTP layer. The ledger operations themselves are total.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body was not a JSON object; carries the parser message.
    #[error("{0}")]
    MalformedBody(String),
    /// A required field was missing or had the wrong JSON type.
    #[error("Invalid '{0}' field")]
    InvalidField(&'static str),
    #[error("blockchain state is unavailable")]
    StatePoisoned,
    #[error("mining task failed")]
    Blocking,
    #[error("block rejected: {0}")]
    Rejected(#[from] ChainError),
}

/// Reasons a block mined outside the chain lock cannot be appended.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    #[error("chain tip moved while the block was mined")]
    StaleTip,
    #[error("block hash does not match its content")]
    InvalidHash,
    #[error("block hash does not meet difficulty {0}")]
    InsufficientWork(u32),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedBody(_) | ApiError::InvalidField(_) => StatusCode::BAD_REQUEST,
            ApiError::StatePoisoned | ApiError::Blocking | ApiError::Rejected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ApiError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        log::error!("blockchain mutex poisoned");
        ApiError::StatePoisoned
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(_: actix_web::error::BlockingError) -> Self {
        ApiError::Blocking
    }
}

/// Problems reading settings from the environment at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{key} must be at most {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: u32,
        max: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_name_the_field() {
        let err = ApiError::InvalidField("to");
        assert_eq!(err.to_string(), "Invalid 'to' field");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn poisoned_state_is_a_server_error() {
        assert_eq!(
            ApiError::StatePoisoned.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
