//! # Validation Module
//!
//! Input validation for Kirana POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: THIS MODULE - field-level business rules                 │
//! │  ├── rejected before any write                                     │
//! │  └── every failure maps to a field-level message                   │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: Database (SQLite)                                        │
//! │  ├── NOT NULL / PRIMARY KEY constraints                            │
//! │  └── guarded UPDATE statements (stock never below zero)            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed validation is a rejection, not an exceptional control path:
//! callers receive a `ValidationError` value and surface it as a message.

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - Must be at most 200 characters
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

/// Validates a product id.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 64 characters (UUIDs and barcodes both fit)
pub fn validate_product_id(product_id: &str) -> ValidationResult<()> {
    let product_id = product_id.trim();

    if product_id.is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    if product_id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "product_id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates the customer name entered at checkout.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "customer name".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a person's name on the profile (letters and spaces, at least
/// two characters).
pub fn validate_person_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.len() < 2 {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: 2,
        });
    }

    if !name.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "must contain only letters and spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a store name (at least two characters).
pub fn validate_store_name(name: &str) -> ValidationResult<()> {
    if name.trim().len() < 2 {
        return Err(ValidationError::TooShort {
            field: "store name".to_string(),
            min: 2,
        });
    }

    Ok(())
}

/// Validates a mobile number (10 digits, starting with 6-9).
pub fn validate_mobile_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();

    let mut chars = number.chars();
    let valid = number.len() == 10
        && matches!(chars.next(), Some('6'..='9'))
        && chars.all(|c| c.is_ascii_digit());

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "mobile number".to_string(),
            reason: "must be 10 digits starting with 6-9".to_string(),
        });
    }

    Ok(())
}

/// Normalizes a GST number for storage (trimmed, uppercase).
pub fn normalize_gst_number(gst: &str) -> String {
    gst.trim().to_uppercase()
}

/// Validates a free-text search query.
///
/// Can be empty (empty query means "list everything"). Returns the trimmed
/// query string.
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
// Numeric Validators
// =============================================================================

/// Validates a unit price in paise.
///
/// ## Rules
/// - Must be strictly positive. A catalog entry with a zero or negative
///   price is rejected before any write.
///
/// ## Example
/// ```rust
/// use kirana_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(4500).is_ok());
/// assert!(validate_price_cents(0).is_err());
/// assert!(validate_price_cents(-500).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock quantity.
///
/// ## Rules
/// - Must not be negative. Zero is valid (out of stock).
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a cart/bill line quantity.
///
/// ## Rules
/// - Must be positive (a zero-quantity line must never become a bill item)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Sugar 1kg").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_product_id() {
        assert!(validate_product_id("8901030865278").is_ok());
        assert!(validate_product_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_product_id("").is_err());
        assert!(validate_product_id(&"x".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(1).is_ok());
        assert!(validate_price_cents(4500).is_ok());
        // Strictly positive: zero and negatives are rejected
        assert!(validate_price_cents(0).is_err());
        assert!(validate_price_cents(-500).is_err());
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(10).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_line_quantity() {
        assert!(validate_line_quantity(1).is_ok());
        assert!(validate_line_quantity(999).is_ok());
        assert!(validate_line_quantity(0).is_err());
        assert!(validate_line_quantity(-2).is_err());
        assert!(validate_line_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_mobile_number() {
        assert!(validate_mobile_number("9876543210").is_ok());
        assert!(validate_mobile_number("6000000000").is_ok());
        assert!(validate_mobile_number("1234567890").is_err()); // starts with 1
        assert!(validate_mobile_number("98765").is_err()); // too short
        assert!(validate_mobile_number("98765432109").is_err()); // too long
        assert!(validate_mobile_number("98765abc10").is_err());
    }

    #[test]
    fn test_validate_person_name() {
        assert!(validate_person_name("Asha Devi").is_ok());
        assert!(validate_person_name("A").is_err());
        assert!(validate_person_name("Asha123").is_err());
    }

    #[test]
    fn test_validate_store_name() {
        assert!(validate_store_name("Asha General Store").is_ok());
        assert!(validate_store_name("A").is_err());
    }

    #[test]
    fn test_normalize_gst_number() {
        assert_eq!(normalize_gst_number(" 27aapfu0939f1zv "), "27AAPFU0939F1ZV");
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  sugar ").unwrap(), "sugar");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"q".repeat(200)).is_err());
    }
}
