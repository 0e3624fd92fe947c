//! # Error Types
//!
//! Domain-specific error types for rms-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rms-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  rms-db errors (separate crate)                                        │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── PosError         - CoreError | DbError for transactional services │
//! │                                                                         │
//! │  HTTP API errors (apps/server)                                         │
//! │  └── ApiError         - What callers see (serialized, with status)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PosError → ApiError → caller      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, receipt number, ...)
//! 3. Errors are enum variants, never String
//! 4. Every error aborts the enclosing transaction; there are no partial commits

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// Any of them raised inside the checkout transaction rolls the whole
/// transaction back.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart line references a product id that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Requested quantity exceeds available stock.
    ///
    /// Carries the product *name* (not id) because this is the message a
    /// cashier sees on the register.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Payment attempted on a sale that is already completed.
    #[error("Sale {0} is already completed")]
    AlreadyCompleted(String),

    /// Cash tendered is below the total due.
    #[error("Insufficient payment: received {received_cents}, required {required_cents}")]
    InsufficientPayment {
        received_cents: i64,
        required_cents: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements. Used for early
/// validation before any row is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Checkout was submitted with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has more lines than allowed.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid mobile number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate barcode).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Basmati Rice 5kg".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Basmati Rice 5kg: available 3, requested 5"
        );

        let err = CoreError::InsufficientPayment {
            received_cents: 1500,
            required_cents: 2000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient payment: received 1500, required 2000"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::EmptyCart.to_string(), "Cart is empty");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::EmptyCart.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
