//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Store operation failures                       │
//! │                                                                         │
//! │  server errors (apps/server)                                           │
//! │  └── ApiError         - Notification payload the dashboard shows       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Dashboard              │
//! │                          DbError   ──┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The requested status change is not offered for the current status.
    ///
    /// ## When This Occurs
    /// - Completing an order that was cancelled
    /// - Setting an order to the status it already has
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Line items can only be modified on open orders.
    #[error("Order {order_id} is {status} and can no longer be modified")]
    OrderClosed { order_id: String, status: OrderStatus },

    /// A supplier transaction was prepared against balances that have since
    /// moved.
    ///
    /// ## When This Occurs
    /// ```text
    /// Session A reads supplier: balance 500, crates 20
    /// Session B submits a transaction: balance becomes 800, crates 25
    /// Session A submits with opening 500 / 20
    ///      │
    ///      ▼
    /// StaleOpeningBalance (A would silently overwrite B's effect)
    /// ```
    #[error(
        "Supplier {supplier_id} balances changed (amount {current_amount}, crates {current_crates}); \
         reload before submitting"
    )]
    StaleOpeningBalance {
        supplier_id: i64,
        current_amount: i64,
        current_crates: i64,
    },

    /// Identifier could not be parsed or generated.
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These abort a handler before any mutation happens.
#[derive(Debug, Error)]
pub enum ValidationError {
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

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., mobile number, identifier).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A search or lookup matched nothing.
    #[error("No {entity} matches '{query}'")]
    NoMatch { entity: String, query: String },

    /// Duplicate value (e.g., a product listed twice on one price list).
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
