//! # Validation Module
//!
//! Input validation for every form the dashboard submits.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request body (serde)                                         │
//! │  └── Shape and type checks during deserialization                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Page handler                                                 │
//! │  └── THIS MODULE: business rules, run before any mutation              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("name", "Ravi Traders").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PriceEntry, PurchaseItem, SalesItem, SupplierTransaction};
use crate::{MAX_AMOUNT, MAX_LINE_ITEMS, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of names (customers, products, suppliers, companies).
pub const MAX_NAME_LEN: usize = 120;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LEN`] characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a mobile number.
///
/// ## Rules
/// - Empty is allowed (mobile is optional)
/// - Otherwise 10 to 15 digits, optionally with a leading `+`
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_mobile;
///
/// assert!(validate_mobile("").is_ok());
/// assert!(validate_mobile("9876543210").is_ok());
/// assert!(validate_mobile("+919876543210").is_ok());
/// assert!(validate_mobile("98765").is_err());
/// ```
pub fn validate_mobile(mobile: &str) -> ValidationResult<()> {
    let mobile = mobile.trim();
    if mobile.is_empty() {
        return Ok(());
    }

    let digits = mobile.strip_prefix('+').unwrap_or(mobile);
    let valid = (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "mobile".to_string(),
            reason: "must be 10 to 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string. Empty means "no filter".
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

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
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

fn within_ceiling(field: &str, amount: Money, min: i64) -> ValidationResult<()> {
    if amount > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max: MAX_AMOUNT.minor(),
        });
    }
    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_AMOUNT`]
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    within_ceiling(field, price, 1)
}

/// Validates an amount that may be zero (paid, damage, advance), up to
/// [`MAX_AMOUNT`].
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    within_ceiling(field, amount, 0)
}

/// Validates a payment received from a customer.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    within_ceiling("payment amount", amount, 1)
}

fn validate_count(field: &str, count: i64) -> ValidationResult<()> {
    if count < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

fn require_items(len: usize) -> ValidationResult<()> {
    if len == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    if len > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        });
    }
    Ok(())
}

/// Validates order or sale line items.
pub fn validate_sales_items(items: &[SalesItem]) -> ValidationResult<()> {
    require_items(items.len())?;
    for item in items {
        validate_quantity(item.quantity)?;
        validate_price("sales price", item.sales_price)?;
    }
    Ok(())
}

/// Validates purchase line items.
pub fn validate_purchase_items(items: &[PurchaseItem]) -> ValidationResult<()> {
    require_items(items.len())?;
    for item in items {
        validate_quantity(item.quantity)?;
        validate_price("purchase price", item.purchase_price)?;
    }
    Ok(())
}

/// Validates a customer price list: positive prices, each product once.
pub fn validate_price_entries(entries: &[PriceEntry]) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        validate_price("sales price", entry.sales_price)?;
        if !seen.insert(entry.product_id) {
            return Err(ValidationError::Duplicate {
                field: "product".to_string(),
                value: entry.product_name.clone(),
            });
        }
    }
    Ok(())
}

/// Validates the user-entered parts of a supplier transaction.
///
/// Opening fields are not checked here; they are seeded from the supplier
/// and may legitimately be negative.
pub fn validate_supplier_transaction(tx: &SupplierTransaction) -> ValidationResult<()> {
    validate_amount("bill amount", tx.bill_amount)?;
    validate_amount("paid", tx.paid)?;
    validate_amount("damage", tx.damage)?;
    validate_count("crate supply", tx.crate_supply)?;
    validate_count("crate return", tx.crate_return)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
