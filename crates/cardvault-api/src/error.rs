use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("External dependency error: {0}")]
    External(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<cardvault_core::Error> for AppError {
    fn from(error: cardvault_core::Error) -> Self {
        match error {
            cardvault_core::Error::Catalog(e) => Self::External(e.to_string()),
            cardvault_core::Error::InvalidInput(message) => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::External(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use cardvault_core::CatalogError;

    use super::*;

    #[test]
    fn core_errors_map_to_http_statuses() {
        let catalog: AppError =
            cardvault_core::Error::Catalog(CatalogError::Decode("bad".to_string())).into();
        assert_eq!(catalog.into_response().status(), StatusCode::BAD_GATEWAY);

        let invalid: AppError = cardvault_core::Error::InvalidInput("quantity".to_string()).into();
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let cancelled: AppError = cardvault_core::Error::Cancelled.into();
        assert_eq!(
            cancelled.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        assert_eq!(
            AppError::conflict("busy").into_response().status(),
            StatusCode::CONFLICT
        );
    }
}
