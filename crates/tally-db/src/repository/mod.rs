//! # Repository Module
//!
//! SQLite implementations of [`Store`](crate::store::Store), one per entity.
//!
//! ## Table Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Repository                        Tables                               │
//! │  ─────────────────────────────     ───────────────────────────────────  │
//! │  CustomerRepository                customers                            │
//! │  ProductRepository                 products                             │
//! │  ProductPriceRepository            price_lists + product_prices         │
//! │  PurchaseRepository                purchases + purchase_items           │
//! │  OrderRepository                   orders (items as JSON)               │
//! │  SalesRepository                   sales  (items as JSON)               │
//! │  SupplierRepository                suppliers                            │
//! │  SupplierTransactionRepository     supplier_transactions                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories store what they are given. Balances and stock counters are
//! computed by `tally_core::ledger` before the upsert.

pub mod customer;
pub mod order;
pub mod product;
pub mod product_price;
pub mod purchase;
pub mod sales;
pub mod supplier;
pub mod supplier_transaction;

pub use customer::CustomerRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use product_price::ProductPriceRepository;
pub use purchase::PurchaseRepository;
pub use sales::SalesRepository;
pub use supplier::SupplierRepository;
pub use supplier_transaction::SupplierTransactionRepository;
