//! # tally-core: Pure Business Logic for Tally ERP
//!
//! This crate holds every rule of the ERP that does not need I/O: the
//! domain types, the balance ledger, the order state machine, identifier
//! generation, validation and reporting.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard (browser)                          │   │
//! │  │  Purchase  Inventory  Customer  Sales  Billing  Order  Supplier │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    Page Handlers (apps/server)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │ ledger  │ │  order  │ │  ident  │ │ report  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Storage Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Customer, Product, Order, Supplier, ...)
//! - [`money`] - Integer money type
//! - [`ledger`] - Running-balance recomputation
//! - [`order`] - Order status transitions and their inventory effects
//! - [`ident`] - `<prefix><year><month><sequence>` identifiers
//! - [`pricing`] - Per-customer price resolution
//! - [`filter`] - Search and filter predicates used by list views
//! - [`report`] - Sales, receivable, inventory and supplier summaries
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::ledger::apply_customer_payment;
//! use tally_core::{Customer, Money};
//!
//! let mut customer = Customer::new(1, "Ravi Traders");
//! customer.total_sales = Money::from_major(40_100);
//! customer.amount_received = Money::from_major(30_000);
//! customer.recompute_balance();
//!
//! apply_customer_payment(&mut customer, Money::from_major(5_000));
//! assert_eq!(customer.amount_balance, Money::from_major(5_100));
//! ```

pub mod error;
pub mod filter;
pub mod ident;
pub mod ledger;
pub mod money;
pub mod order;
pub mod pricing;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Width of the zero-padded sequence part of generated identifiers.
///
/// `P202404002` → sequence `002`. Sequences above 999 keep growing in width.
pub const ID_SEQUENCE_WIDTH: usize = 3;

/// Stock level at or below which the inventory report flags a product.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Maximum quantity on a single line item.
///
/// Guards against typing 10000 instead of 100 on a purchase or order form.
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Largest price or amount accepted on any form: ₹10 crore, in paise.
///
/// With [`MAX_LINE_QUANTITY`] and [`MAX_LINE_ITEMS`] a bill total stays
/// below 2 × 10^17 paise, far inside `i64`.
pub const MAX_AMOUNT: Money = Money::from_minor(10_000_000_000);

/// Maximum line items on one purchase, order or bill.
pub const MAX_LINE_ITEMS: usize = 200;
