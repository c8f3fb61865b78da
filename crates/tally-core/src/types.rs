//! # Domain Types
//!
//! Core domain types used throughout Tally ERP.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │     Product     │   │  ProductPrice   │       │
//! │  │  total_sales    │   │  available_qty  │   │  customer_id    │       │
//! │  │  amount_recvd   │   │  ordered_qty    │   │  entries[]      │       │
//! │  │  amount_balance │   │  actual_qty     │   │  (overrides)    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Purchase     │   │      Order      │   │ SalesTransaction│       │
//! │  │  P202404001     │   │  O202404001     │   │  S202404001     │       │
//! │  │  counterparty   │   │  status         │   │  amount_paid    │       │
//! │  │  items[]        │   │  items[]        │   │  items[]        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────────────────┐            │
//! │  │    Supplier     │◄──│       SupplierTransaction        │            │
//! │  │  balance_amount │   │  opening + bill - paid - damage  │            │
//! │  │  crate_balance  │   │  crates: opening + supply - ret  │            │
//! │  └─────────────────┘   └──────────────────────────────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived Fields
//! Every derived field (`amount_balance`, `actual_quantity`, `balance`,
//! `crate_balance`) has a `recompute*` method. Totals over line items are
//! never stored on the entity; they are methods.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Entity
// =============================================================================

/// A record that lives in a store and is addressed by an identifier.
///
/// `tally-db` implements its `Store<T>` trait for every `T: Entity`.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Identifier type (`i64` for master data, formatted `String` ids for
    /// purchases, orders and sales).
    type Id: Clone + PartialEq + fmt::Display + Send + Sync + 'static;

    /// Human-readable entity name used in errors and logs.
    const NAME: &'static str;

    /// Returns the record's identifier.
    fn id(&self) -> Self::Id;
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with a running receivable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub mobile: String,

    /// Value of everything sold to this customer.
    #[serde(default)]
    pub total_sales: Money,

    /// Payments received so far.
    #[serde(default)]
    pub amount_received: Money,

    /// `total_sales - amount_received`.
    #[serde(default)]
    pub amount_balance: Money,

    /// Carried as stored or imported. No ledger operation computes or
    /// changes it.
    #[serde(default)]
    pub profit: Money,
}

impl Customer {
    /// Creates a customer with zeroed balances.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Customer {
            id,
            name: name.into(),
            address: String::new(),
            mobile: String::new(),
            total_sales: Money::zero(),
            amount_received: Money::zero(),
            amount_balance: Money::zero(),
            profit: Money::zero(),
        }
    }

    /// Restores `amount_balance == total_sales - amount_received`.
    pub fn recompute_balance(&mut self) {
        self.amount_balance = self.total_sales - self.amount_received;
    }
}

impl Entity for Customer {
    type Id = i64;
    const NAME: &'static str = "Customer";

    fn id(&self) -> i64 {
        self.id
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Owning company (brand / manufacturer).
    pub company_name: String,

    pub name: String,

    /// Price used when the customer has no price-list override.
    pub default_sales_price: Money,

    /// Physical stock on hand.
    #[serde(default)]
    pub available_quantity: i64,

    /// Stock committed to open orders.
    #[serde(default)]
    pub ordered_quantity: i64,

    /// `available_quantity - ordered_quantity`.
    #[serde(default)]
    pub actual_quantity: i64,
}

impl Product {
    /// Creates a product with no stock.
    pub fn new(
        id: i64,
        company_name: impl Into<String>,
        name: impl Into<String>,
        default_sales_price: Money,
    ) -> Self {
        Product {
            id,
            company_name: company_name.into(),
            name: name.into(),
            default_sales_price,
            available_quantity: 0,
            ordered_quantity: 0,
            actual_quantity: 0,
        }
    }

    /// Restores `actual_quantity == available_quantity - ordered_quantity`.
    #[inline]
    pub fn recompute_actual(&mut self) {
        self.actual_quantity = self.available_quantity - self.ordered_quantity;
    }
}

impl Entity for Product {
    type Id = i64;
    const NAME: &'static str = "Product";

    fn id(&self) -> i64 {
        self.id
    }
}

// =============================================================================
// Product Price (per-customer price list)
// =============================================================================

/// One override on a customer's price list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceEntry {
    pub product_id: i64,
    pub product_name: String,
    pub sales_price: Money,
}

/// A customer's price list, keyed by customer id.
///
/// Independent of `Product::default_sales_price`; see
/// [`crate::pricing::resolve_sales_price`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPrice {
    pub customer_id: i64,
    pub customer_name: String,
    #[serde(default)]
    pub entries: Vec<PriceEntry>,
}

impl ProductPrice {
    /// Returns the override price for a product, if listed.
    pub fn price_for(&self, product_id: i64) -> Option<Money> {
        self.entries
            .iter()
            .find(|e| e.product_id == product_id)
            .map(|e| e.sales_price)
    }
}

impl Entity for ProductPrice {
    type Id = i64;
    const NAME: &'static str = "ProductPrice";

    fn id(&self) -> i64 {
        self.customer_id
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// Who a purchase was bought from.
///
/// Company purchases come from the inventory page (keyed by the product's
/// company); supplier purchases come from the supplier page and reference a
/// row in `suppliers` when one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum Counterparty {
    Company {
        company_name: String,
    },
    Supplier {
        supplier_id: Option<i64>,
        supplier_name: String,
    },
}

impl Counterparty {
    /// Display name of the counterparty.
    pub fn name(&self) -> &str {
        match self {
            Counterparty::Company { company_name } => company_name,
            Counterparty::Supplier { supplier_name, .. } => supplier_name,
        }
    }
}

/// A purchased line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseItem {
    pub product_id: i64,
    pub product_name: String,
    pub purchase_price: Money,
    pub quantity: i64,
}

impl PurchaseItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.purchase_price.multiply_quantity(self.quantity)
    }
}

/// A stock purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Purchase {
    /// Formatted id, e.g. `P202404001`.
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub counterparty: Counterparty,
    pub items: Vec<PurchaseItem>,
}

impl Purchase {
    /// Sum of line totals.
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(PurchaseItem::line_total).sum()
    }

    /// Sum of purchased quantities.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

impl Entity for Purchase {
    type Id = String;
    const NAME: &'static str = "Purchase";

    fn id(&self) -> String {
        self.id.clone()
    }
}

// =============================================================================
// Sales line items
// =============================================================================

/// A sold or ordered line item. Shared by orders and sales transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesItem {
    pub product_id: i64,
    pub product_name: String,
    pub sales_price: Money,
    pub quantity: i64,
}

impl SalesItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.sales_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of a customer order.
///
/// See [`crate::order`] for the permitted transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OrderStatus {
    /// Placed; stock is committed.
    #[default]
    Pending,
    /// Being prepared.
    Processing,
    /// Delivered; stock has left the warehouse and a sale was recorded.
    Completed,
    /// Abandoned; committed stock was released.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Open orders still hold stock in `ordered_quantity`.
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!(
                    "unknown status '{}', expected pending, processing, completed or cancelled",
                    other
                ),
            }),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    /// Formatted id, e.g. `O202404001`.
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub customer_id: i64,
    pub customer_name: String,
    #[serde(default)]
    pub status: OrderStatus,
    pub items: Vec<SalesItem>,

    /// Prepayment captured before completion.
    #[serde(default)]
    pub advance_amount: Option<Money>,

    /// Sales id assigned when the order completes.
    #[serde(default)]
    pub sales_id: Option<String>,
}

impl Order {
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(SalesItem::line_total).sum()
    }

    /// Amount still owed after the advance.
    pub fn balance_due(&self) -> Money {
        self.total_amount() - self.advance_amount.unwrap_or_default()
    }
}

impl Entity for Order {
    type Id = String;
    const NAME: &'static str = "Order";

    fn id(&self) -> String {
        self.id.clone()
    }
}

// =============================================================================
// Sales Transaction
// =============================================================================

/// A recorded sale (bill).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesTransaction {
    /// Formatted id, e.g. `S202404001`.
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub customer_id: i64,
    pub customer_name: String,
    pub items: Vec<SalesItem>,
    #[serde(default)]
    pub amount_paid: Money,

    /// Order this sale was created from, if any.
    #[serde(default)]
    pub order_id: Option<String>,
}

impl SalesTransaction {
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(SalesItem::line_total).sum()
    }

    pub fn amount_due(&self) -> Money {
        self.total_amount() - self.amount_paid
    }
}

impl Entity for SalesTransaction {
    type Id = String;
    const NAME: &'static str = "Sale";

    fn id(&self) -> String {
        self.id.clone()
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// A supplier with running money and crate balances.
///
/// Balances change only through [`SupplierTransaction`] submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub balance_amount: Money,
    #[serde(default)]
    pub crate_balance: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Supplier {
    pub fn new(id: i64, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Supplier {
            id,
            name: name.into(),
            balance_amount: Money::zero(),
            crate_balance: 0,
            created_at,
        }
    }
}

impl Entity for Supplier {
    type Id = i64;
    const NAME: &'static str = "Supplier";

    fn id(&self) -> i64 {
        self.id
    }
}

// =============================================================================
// Supplier Transaction
// =============================================================================

/// One ledger line against a supplier.
///
/// ```text
/// balance       = opening_amount + bill_amount - paid - damage
/// crate_balance = crate_opening  + crate_supply - crate_return
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SupplierTransaction {
    pub id: i64,
    pub supplier_id: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,

    pub opening_amount: Money,
    #[serde(default)]
    pub bill_amount: Money,
    #[serde(default)]
    pub paid: Money,
    #[serde(default)]
    pub damage: Money,
    #[serde(default)]
    pub balance: Money,

    pub crate_opening: i64,
    #[serde(default)]
    pub crate_supply: i64,
    #[serde(default)]
    pub crate_return: i64,
    #[serde(default)]
    pub crate_balance: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SupplierTransaction {
    /// `opening_amount + bill_amount - paid - damage`.
    #[inline]
    pub fn computed_balance(&self) -> Money {
        self.opening_amount + self.bill_amount - self.paid - self.damage
    }

    /// `crate_opening + crate_supply - crate_return`.
    #[inline]
    pub fn computed_crate_balance(&self) -> i64 {
        self.crate_opening + self.crate_supply - self.crate_return
    }

    /// Net money movement this transaction adds on top of its opening.
    #[inline]
    pub fn amount_delta(&self) -> Money {
        self.bill_amount - self.paid - self.damage
    }

    /// Net crate movement this transaction adds on top of its opening.
    #[inline]
    pub fn crate_delta(&self) -> i64 {
        self.crate_supply - self.crate_return
    }

    /// Fills `balance` and `crate_balance` from the transaction's own fields.
    pub fn recompute(&mut self) {
        self.balance = self.computed_balance();
        self.crate_balance = self.computed_crate_balance();
    }
}

impl Entity for SupplierTransaction {
    type Id = i64;
    const NAME: &'static str = "SupplierTransaction";

    fn id(&self) -> i64 {
        self.id
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 12).unwrap()
    }

    #[test]
    fn test_customer_balance_recompute() {
        let mut c = Customer::new(1, "Ravi Traders");
        c.total_sales = Money::from_major(40_100);
        c.amount_received = Money::from_major(30_000);
        c.recompute_balance();
        assert_eq!(c.amount_balance, Money::from_major(10_100));
    }

    #[test]
    fn test_product_actual_quantity() {
        let mut p = Product::new(1, "Amul", "Butter 500g", Money::from_major(250));
        p.available_quantity = 40;
        p.ordered_quantity = 15;
        p.recompute_actual();
        assert_eq!(p.actual_quantity, 25);
    }

    #[test]
    fn test_purchase_total_is_derived() {
        let purchase = Purchase {
            id: "P202404001".to_string(),
            date: date(),
            counterparty: Counterparty::Company {
                company_name: "Amul".to_string(),
            },
            items: vec![
                PurchaseItem {
                    product_id: 1,
                    product_name: "Butter".to_string(),
                    purchase_price: Money::from_major(200),
                    quantity: 10,
                },
                PurchaseItem {
                    product_id: 2,
                    product_name: "Ghee".to_string(),
                    purchase_price: Money::from_major(500),
                    quantity: 2,
                },
            ],
        };
        assert_eq!(purchase.total_amount(), Money::from_major(3_000));
        assert_eq!(purchase.total_quantity(), 12);
        assert_eq!(purchase.counterparty.name(), "Amul");
    }

    #[test]
    fn test_counterparty_tagged_serialization() {
        let cp = Counterparty::Supplier {
            supplier_id: Some(3),
            supplier_name: "Fresh Farms".to_string(),
        };
        let json = serde_json::to_value(&cp).unwrap();
        assert_eq!(json["kind"], "supplier");
        assert_eq!(json["supplier_id"], 3);
    }

    #[test]
    fn test_order_status_parsing() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!("Completed".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
        assert_eq!("canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_order_balance_due() {
        let order = Order {
            id: "O202404001".to_string(),
            date: date(),
            customer_id: 1,
            customer_name: "Ravi Traders".to_string(),
            status: OrderStatus::Pending,
            items: vec![SalesItem {
                product_id: 1,
                product_name: "Butter".to_string(),
                sales_price: Money::from_major(250),
                quantity: 4,
            }],
            advance_amount: Some(Money::from_major(300)),
            sales_id: None,
        };
        assert_eq!(order.total_amount(), Money::from_major(1_000));
        assert_eq!(order.balance_due(), Money::from_major(700));
    }

    #[test]
    fn test_supplier_transaction_formulas() {
        let mut tx = SupplierTransaction {
            id: 1,
            supplier_id: 1,
            date: date(),
            opening_amount: Money::from_major(1_000),
            bill_amount: Money::from_major(500),
            paid: Money::from_major(700),
            damage: Money::from_major(50),
            balance: Money::zero(),
            crate_opening: 20,
            crate_supply: 10,
            crate_return: 12,
            crate_balance: 0,
            created_at: Utc::now(),
        };
        tx.recompute();
        assert_eq!(tx.balance, Money::from_major(750));
        assert_eq!(tx.crate_balance, 18);
        assert_eq!(tx.amount_delta(), Money::from_major(-250));
        assert_eq!(tx.crate_delta(), -2);
    }

    #[test]
    fn test_price_list_lookup() {
        let list = ProductPrice {
            customer_id: 4,
            customer_name: "Hotel Sagar".to_string(),
            entries: vec![PriceEntry {
                product_id: 9,
                product_name: "Paneer".to_string(),
                sales_price: Money::from_major(310),
            }],
        };
        assert_eq!(list.price_for(9), Some(Money::from_major(310)));
        assert_eq!(list.price_for(10), None);
        assert_eq!(list.id(), 4);
    }
}
