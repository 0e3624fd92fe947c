//! API error handling.
//!
//! Maps service errors ([`PosError`]) to HTTP responses. Every error leaves
//! the server as `{ "code": ..., "message": ... }` JSON; storage detail is
//! logged here and never sent to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use rms_core::CoreError;
use rms_db::{DbError, PosError};

/// An error ready to leave the HTTP boundary.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    fn internal() -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE",
            "Internal storage error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            code: self.code,
            message: &self.message,
        });
        (self.status, body).into_response()
    }
}

/// Service-to-HTTP error mapping.
///
/// ```text
/// ValidationError        → 400 VALIDATION
/// InsufficientStock      → 400 INSUFFICIENT_STOCK
/// InsufficientPayment    → 400 INSUFFICIENT_PAYMENT
/// AlreadyCompleted       → 400 ALREADY_COMPLETED
/// ProductNotFound        → 404 NOT_FOUND
/// SaleNotFound           → 404 NOT_FOUND
/// DbError::NotFound      → 404 NOT_FOUND
/// DbError::UniqueViolation → 400 DUPLICATE (e.g. barcode already exists)
/// any other DbError      → 500 STORAGE (detail logged, not exposed)
/// ```
impl From<PosError> for ApiError {
    fn from(err: PosError) -> Self {
        match err {
            PosError::Core(core) => match core {
                CoreError::Validation(v) => ApiError::bad_request("VALIDATION", v.to_string()),
                CoreError::InsufficientStock { .. } => {
                    ApiError::bad_request("INSUFFICIENT_STOCK", core.to_string())
                }
                CoreError::InsufficientPayment { .. } => {
                    ApiError::bad_request("INSUFFICIENT_PAYMENT", core.to_string())
                }
                CoreError::AlreadyCompleted(_) => {
                    ApiError::bad_request("ALREADY_COMPLETED", core.to_string())
                }
                CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) => {
                    ApiError::not_found(core.to_string())
                }
            },
            PosError::Db(db) => db.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::UniqueViolation { .. } => {
                ApiError::bad_request("DUPLICATE", err.to_string())
            }
            other => {
                error!(error = %other, "Storage error");
                ApiError::internal()
            }
        }
    }
}

impl From<rms_core::ValidationError> for ApiError {
    fn from(err: rms_core::ValidationError) -> Self {
        ApiError::bad_request("VALIDATION", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_maps_to_400() {
        let err: ApiError = PosError::Core(CoreError::InsufficientStock {
            name: "Cola".to_string(),
            available: 1,
            requested: 2,
        })
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INSUFFICIENT_STOCK");
    }

    #[test]
    fn test_product_not_found_maps_to_404() {
        let err: ApiError = PosError::Core(CoreError::ProductNotFound("p-1".to_string())).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_barcode_maps_to_400() {
        let err: ApiError = DbError::UniqueViolation {
            field: "products.barcode".to_string(),
            value: "8901030865278".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "DUPLICATE");
    }

    #[test]
    fn test_storage_detail_is_hidden() {
        let err: ApiError = DbError::QueryFailed("secret table layout".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("secret"));
    }
}
