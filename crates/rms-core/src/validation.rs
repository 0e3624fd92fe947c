//! # Validation Module
//!
//! Input validation for RMS POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (deserialization, type checks)                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation, runs BEFORE any      │
//! │           row is touched (a rejected cart must persist nothing)        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database constraints (NOT NULL, UNIQUE, CHECK, FK)           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::CartLine;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Cart Validation
// =============================================================================

/// Validates a checkout cart before the transaction opens.
///
/// ## Rules
/// - Cart must not be empty
/// - Cart must not exceed [`MAX_CART_LINES`] lines
/// - Every line quantity must be positive and at most [`MAX_LINE_QUANTITY`]
/// - Every line must carry a non-empty product id
///
/// Runs before any database work so a rejected cart never persists a sale
/// row.
pub fn validate_cart(lines: &[CartLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    if lines.len() > MAX_CART_LINES {
        return Err(ValidationError::CartTooLarge {
            max: MAX_CART_LINES,
        });
    }

    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost in cents.
///
/// Zero is allowed (free items); negative is not.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount in basis points (0% to 100%).
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name (1-200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a barcode.
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
/// - Digits, letters and hyphens only
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 100,
        });
    }

    if !barcode.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates the catalog fields of a new or edited product in one pass.
///
/// Called by the product create/update surface before any row is written;
/// the database CHECK constraints are the layer behind it.
pub fn validate_product_fields(
    name: &str,
    barcode: &str,
    price_cents: i64,
    cost_cents: i64,
    discount_bps: u32,
) -> ValidationResult<()> {
    validate_product_name(name)?;
    validate_barcode(barcode)?;
    validate_price_cents(price_cents)?;
    validate_price_cents(cost_cents)?;
    validate_discount_bps(discount_bps)?;
    Ok(())
}

/// Validates a customer mobile number for the loyalty annotation.
///
/// Empty is fine (the annotation is optional); a non-empty value must be
/// at most 15 characters of digits, `+`, spaces or hyphens.
pub fn validate_customer_mobile(mobile: &str) -> ValidationResult<()> {
    let mobile = mobile.trim();

    if mobile.is_empty() {
        return Ok(());
    }

    if mobile.len() > 15 {
        return Err(ValidationError::TooLong {
            field: "customer_mobile".to_string(),
            max: 15,
        });
    }

    if !mobile
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "customer_mobile".to_string(),
            reason: "must contain only digits, '+', spaces, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query. Empty is allowed (returns default results).
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, qty: i64) -> CartLine {
        CartLine {
            product_id: id.to_string(),
            quantity: qty,
        }
    }

    #[test]
    fn test_validate_cart_empty() {
        assert!(matches!(
            validate_cart(&[]),
            Err(ValidationError::EmptyCart)
        ));
    }

    #[test]
    fn test_validate_cart_ok() {
        assert!(validate_cart(&[line("p-1", 2), line("p-1", 1)]).is_ok());
    }

    #[test]
    fn test_validate_cart_bad_quantity() {
        assert!(validate_cart(&[line("p-1", 0)]).is_err());
        assert!(validate_cart(&[line("p-1", -3)]).is_err());
        assert!(validate_cart(&[line("p-1", 1000)]).is_err());
    }

    #[test]
    fn test_validate_cart_blank_product_id() {
        assert!(matches!(
            validate_cart(&[line("  ", 1)]),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_cart_too_large() {
        let lines: Vec<CartLine> = (0..=crate::MAX_CART_LINES)
            .map(|i| line(&format!("p-{i}"), 1))
            .collect();
        assert!(matches!(
            validate_cart(&lines),
            Err(ValidationError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("8901030-865278").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("has space").is_err());
        assert!(validate_barcode(&"9".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_customer_mobile() {
        assert!(validate_customer_mobile("").is_ok());
        assert!(validate_customer_mobile("+91 98765-4321").is_ok());
        assert!(validate_customer_mobile("not a number").is_err());
        assert!(validate_customer_mobile("1234567890123456").is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_discount_bps() {
        assert!(validate_discount_bps(0).is_ok());
        assert!(validate_discount_bps(10000).is_ok());
        assert!(validate_discount_bps(10001).is_err());
    }

    #[test]
    fn test_validate_product_fields() {
        assert!(validate_product_fields("Cola 500ml", "8901030865278", 1000, 700, 500).is_ok());
        assert!(validate_product_fields("", "8901030865278", 1000, 700, 0).is_err());
        assert!(validate_product_fields("Cola", "has space", 1000, 700, 0).is_err());
        assert!(validate_product_fields("Cola", "8901030865278", -1, 700, 0).is_err());
        assert!(validate_product_fields("Cola", "8901030865278", 1000, -1, 0).is_err());
        assert!(validate_product_fields("Cola", "8901030865278", 1000, 700, 10001).is_err());
    }
}
