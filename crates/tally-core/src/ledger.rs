//! # Balance Ledger
//!
//! Every running balance in the system is recomputed here and nowhere else.
//!
//! ## Ledger Conventions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who moves which balance                              │
//! │                                                                         │
//! │  Purchase received ──► Product.available_quantity  += qty              │
//! │  Order placed      ──► Product.ordered_quantity    += qty              │
//! │  Order cancelled   ──► Product.ordered_quantity    -= qty (floor 0)    │
//! │  Order completed   ──► Product.ordered_quantity    -= qty (floor 0)    │
//! │                        Product.available_quantity  -= qty (floor 0)    │
//! │                        └─► actual = available - ordered, every time    │
//! │                                                                         │
//! │  Payment received  ──► Customer.amount_received    += amount           │
//! │                        └─► amount_balance = total_sales - received     │
//! │                                                                         │
//! │  Supplier tx       ──► Supplier.balance_amount = tx.balance            │
//! │                        Supplier.crate_balance  = tx.crate_balance      │
//! │                        (snapshot overwrite, see replay for history)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Uniform Entry Point
//! Each balance-carrying entity implements [`Ledger`]: `apply(delta)`
//! returns the entity with the delta folded in and every derived field
//! recomputed. The free functions below are the page-level operations built
//! on top of it.
//!
//! ## No Idempotence
//! Applying the same delta twice applies it twice. Completing an order twice
//! decrements stock twice. Callers decide when an effect is due (see
//! [`crate::order`]).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, Product, Purchase, SalesItem, Supplier, SupplierTransaction};

// =============================================================================
// Ledger Trait
// =============================================================================

/// An entity whose derived balances are maintained by folding deltas.
pub trait Ledger: Sized {
    /// The change being applied.
    type Delta;

    /// Folds `delta` into `self` and recomputes derived fields.
    fn apply_mut(&mut self, delta: &Self::Delta);

    /// Owned form of [`Ledger::apply_mut`].
    fn apply(mut self, delta: &Self::Delta) -> Self {
        self.apply_mut(delta);
        self
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// What an order event does to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InventoryAction {
    /// Commit stock to a new order.
    Order,
    /// Release committed stock.
    Cancel,
    /// Release committed stock and remove it from the shelf.
    Complete,
}

/// A single stock movement on one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDelta {
    /// Goods received from a purchase.
    Receive(i64),
    /// Order-driven movement.
    Order(InventoryAction, i64),
}

impl Ledger for Product {
    type Delta = StockDelta;

    fn apply_mut(&mut self, delta: &StockDelta) {
        match *delta {
            StockDelta::Receive(qty) => {
                self.available_quantity += qty;
            }
            StockDelta::Order(InventoryAction::Order, qty) => {
                self.ordered_quantity += qty;
            }
            StockDelta::Order(InventoryAction::Cancel, qty) => {
                self.ordered_quantity = (self.ordered_quantity - qty).max(0);
            }
            StockDelta::Order(InventoryAction::Complete, qty) => {
                self.ordered_quantity = (self.ordered_quantity - qty).max(0);
                self.available_quantity = (self.available_quantity - qty).max(0);
            }
        }
        self.recompute_actual();
    }
}

/// Which products an inventory fold touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryOutcome {
    /// Product ids that were changed, in first-touch order, without repeats.
    pub touched: Vec<i64>,
    /// Product ids referenced by line items but absent from the list.
    pub missing: Vec<i64>,
}

impl InventoryOutcome {
    fn record(&mut self, product_id: i64, found: bool) {
        let bucket = if found { &mut self.touched } else { &mut self.missing };
        if !bucket.contains(&product_id) {
            bucket.push(product_id);
        }
    }
}

fn fold_stock<I>(products: &mut [Product], moves: I) -> InventoryOutcome
where
    I: IntoIterator<Item = (i64, StockDelta)>,
{
    let mut outcome = InventoryOutcome::default();
    for (product_id, delta) in moves {
        match products.iter_mut().find(|p| p.id == product_id) {
            Some(product) => {
                product.apply_mut(&delta);
                outcome.record(product_id, true);
            }
            None => outcome.record(product_id, false),
        }
    }
    outcome
}

/// Applies an order event to the shared product list in place.
///
/// ## Example
/// ```rust
/// use tally_core::ledger::{apply_order_to_inventory, InventoryAction};
/// use tally_core::{Money, Product, SalesItem};
///
/// let mut products = vec![Product::new(1, "Amul", "Butter", Money::from_major(250))];
/// products[0].available_quantity = 20;
///
/// let items = vec![SalesItem {
///     product_id: 1,
///     product_name: "Butter".into(),
///     sales_price: Money::from_major(250),
///     quantity: 5,
/// }];
///
/// apply_order_to_inventory(&mut products, &items, InventoryAction::Order);
/// assert_eq!(products[0].ordered_quantity, 5);
/// assert_eq!(products[0].actual_quantity, 15);
/// ```
pub fn apply_order_to_inventory(
    products: &mut [Product],
    items: &[SalesItem],
    action: InventoryAction,
) -> InventoryOutcome {
    fold_stock(
        products,
        items
            .iter()
            .map(|item| (item.product_id, StockDelta::Order(action, item.quantity))),
    )
}

/// Adds a purchase's quantities to available stock.
pub fn apply_purchase_to_inventory(products: &mut [Product], purchase: &Purchase) -> InventoryOutcome {
    fold_stock(
        products,
        purchase
            .items
            .iter()
            .map(|item| (item.product_id, StockDelta::Receive(item.quantity))),
    )
}

/// Reverses a purchase previously applied with [`apply_purchase_to_inventory`].
///
/// Used when a purchase is edited or deleted. Available stock floors at zero.
pub fn revert_purchase_from_inventory(
    products: &mut [Product],
    purchase: &Purchase,
) -> InventoryOutcome {
    let mut outcome = InventoryOutcome::default();
    for item in &purchase.items {
        match products.iter_mut().find(|p| p.id == item.product_id) {
            Some(product) => {
                product.available_quantity = (product.available_quantity - item.quantity).max(0);
                product.recompute_actual();
                outcome.record(item.product_id, true);
            }
            None => outcome.record(item.product_id, false),
        }
    }
    outcome
}

// =============================================================================
// Customers
// =============================================================================

/// A change to a customer's receivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerDelta {
    /// Goods sold on account.
    Sale(Money),
    /// Money received.
    Payment(Money),
}

impl Ledger for Customer {
    type Delta = CustomerDelta;

    fn apply_mut(&mut self, delta: &CustomerDelta) {
        match *delta {
            CustomerDelta::Sale(amount) => self.total_sales += amount,
            CustomerDelta::Payment(amount) => self.amount_received += amount,
        }
        self.recompute_balance();
    }
}

/// Records a payment from a customer.
///
/// `total_sales` is untouched: a payment only moves `amount_received`.
pub fn apply_customer_payment(customer: &mut Customer, amount: Money) {
    customer.apply_mut(&CustomerDelta::Payment(amount));
}

/// Accrues a sale to a customer's `total_sales`.
///
/// The sales pages only call this when `ledger.accrue_customer_sales` is
/// enabled.
pub fn apply_customer_sale(customer: &mut Customer, amount: Money) {
    customer.apply_mut(&CustomerDelta::Sale(amount));
}

// =============================================================================
// Suppliers
// =============================================================================

impl Ledger for Supplier {
    type Delta = SupplierTransaction;

    fn apply_mut(&mut self, tx: &SupplierTransaction) {
        self.balance_amount = tx.computed_balance();
        self.crate_balance = tx.computed_crate_balance();
    }
}

/// Computes a transaction's balances and writes them onto its supplier.
///
/// ## Snapshot Semantics
/// The supplier ends up with exactly the transaction's computed balances.
/// Nothing is folded from earlier transactions, so the transaction's opening
/// fields must be seeded from the supplier's current balances (see
/// [`seed_supplier_opening`]).
pub fn apply_supplier_transaction(supplier: &mut Supplier, tx: &mut SupplierTransaction) {
    tx.recompute();
    supplier.apply_mut(tx);
}

/// Resolves the opening fields of a new supplier transaction.
///
/// - Missing values are taken from the supplier's current balances.
/// - Supplied values must equal the current balances, otherwise the caller
///   prepared the transaction against a stale snapshot.
pub fn seed_supplier_opening(
    supplier: &Supplier,
    opening_amount: Option<Money>,
    crate_opening: Option<i64>,
) -> CoreResult<(Money, i64)> {
    let amount = opening_amount.unwrap_or(supplier.balance_amount);
    let crates = crate_opening.unwrap_or(supplier.crate_balance);

    if amount != supplier.balance_amount || crates != supplier.crate_balance {
        return Err(CoreError::StaleOpeningBalance {
            supplier_id: supplier.id,
            current_amount: supplier.balance_amount.minor(),
            current_crates: supplier.crate_balance,
        });
    }

    Ok((amount, crates))
}

/// A transaction whose recorded opening disagrees with its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OpeningMismatch {
    pub transaction_id: i64,
    pub expected_amount: Money,
    pub recorded_amount: Money,
    pub expected_crates: i64,
    pub recorded_crates: i64,
}

/// Balances folded from a supplier's full transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierReplay {
    pub supplier_id: i64,
    pub balance_amount: Money,
    pub crate_balance: i64,
    pub transaction_count: usize,
    pub mismatches: Vec<OpeningMismatch>,
}

/// Folds a supplier's history into balances.
///
/// The first transaction's opening seeds the fold; every later transaction
/// contributes only its delta (`bill - paid - damage`,
/// `supply - return`). Transactions whose recorded opening does not match
/// the running balance are reported, which is how a lost update from a
/// stale snapshot shows up.
pub fn replay_supplier_history(supplier_id: i64, history: &[SupplierTransaction]) -> SupplierReplay {
    let mut ordered: Vec<&SupplierTransaction> = history
        .iter()
        .filter(|tx| tx.supplier_id == supplier_id)
        .collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut balance = Money::zero();
    let mut crates = 0;
    let mut mismatches = Vec::new();

    for (index, tx) in ordered.iter().enumerate() {
        if index == 0 {
            balance = tx.opening_amount;
            crates = tx.crate_opening;
        } else if tx.opening_amount != balance || tx.crate_opening != crates {
            mismatches.push(OpeningMismatch {
                transaction_id: tx.id,
                expected_amount: balance,
                recorded_amount: tx.opening_amount,
                expected_crates: crates,
                recorded_crates: tx.crate_opening,
            });
        }
        balance += tx.amount_delta();
        crates += tx.crate_delta();
    }

    SupplierReplay {
        supplier_id,
        balance_amount: balance,
        crate_balance: crates,
        transaction_count: ordered.len(),
        mismatches,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Counterparty, PurchaseItem};
    use chrono::{NaiveDate, Utc};

    fn product(id: i64, available: i64, ordered: i64) -> Product {
        let mut p = Product::new(id, "Amul", format!("Item {}", id), Money::from_major(100));
        p.available_quantity = available;
        p.ordered_quantity = ordered;
        p.recompute_actual();
        p
    }

    fn line(product_id: i64, quantity: i64) -> SalesItem {
        SalesItem {
            product_id,
            product_name: format!("Item {}", product_id),
            sales_price: Money::from_major(100),
            quantity,
        }
    }

    fn purchase(items: Vec<(i64, i64)>) -> Purchase {
        Purchase {
            id: "P202404001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            counterparty: Counterparty::Company {
                company_name: "Amul".to_string(),
            },
            items: items
                .into_iter()
                .map(|(product_id, quantity)| PurchaseItem {
                    product_id,
                    product_name: format!("Item {}", product_id),
                    purchase_price: Money::from_major(80),
                    quantity,
                })
                .collect(),
        }
    }

    fn supplier_tx(id: i64, day: u32, opening: i64, bill: i64, paid: i64, crates: (i64, i64, i64)) -> SupplierTransaction {
        let mut tx = SupplierTransaction {
            id,
            supplier_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            opening_amount: Money::from_major(opening),
            bill_amount: Money::from_major(bill),
            paid: Money::from_major(paid),
            damage: Money::zero(),
            balance: Money::zero(),
            crate_opening: crates.0,
            crate_supply: crates.1,
            crate_return: crates.2,
            crate_balance: 0,
            created_at: Utc::now(),
        };
        tx.recompute();
        tx
    }

    #[test]
    fn test_purchase_adds_available_quantity() {
        let mut products = vec![product(1, 10, 4), product(2, 0, 0)];
        let outcome = apply_purchase_to_inventory(&mut products, &purchase(vec![(1, 5), (2, 7)]));

        assert_eq!(outcome.touched, vec![1, 2]);
        assert_eq!(products[0].available_quantity, 15);
        assert_eq!(products[0].actual_quantity, 11);
        assert_eq!(products[1].available_quantity, 7);
        assert_eq!(products[1].actual_quantity, 7);
    }

    #[test]
    fn test_order_then_cancel_round_trips() {
        let mut products = vec![product(1, 20, 3)];
        let items = vec![line(1, 5)];

        apply_order_to_inventory(&mut products, &items, InventoryAction::Order);
        assert_eq!(products[0].ordered_quantity, 8);

        apply_order_to_inventory(&mut products, &items, InventoryAction::Cancel);
        assert_eq!(products[0].ordered_quantity, 3);
        assert_eq!(products[0].actual_quantity, 17);
    }

    #[test]
    fn test_cancel_clamps_at_zero() {
        let mut products = vec![product(1, 20, 2)];
        apply_order_to_inventory(&mut products, &[line(1, 5)], InventoryAction::Cancel);
        assert_eq!(products[0].ordered_quantity, 0);
        assert_eq!(products[0].actual_quantity, 20);
    }

    #[test]
    fn test_complete_decrements_both_counters() {
        let mut products = vec![product(1, 20, 5), product(2, 3, 3)];
        let items = vec![line(1, 5), line(2, 4)];

        apply_order_to_inventory(&mut products, &items, InventoryAction::Complete);

        assert_eq!(products[0].available_quantity, 15);
        assert_eq!(products[0].ordered_quantity, 0);
        assert_eq!(products[0].actual_quantity, 15);
        // 3 - 4 floors at zero
        assert_eq!(products[1].available_quantity, 0);
        assert_eq!(products[1].ordered_quantity, 0);
    }

    #[test]
    fn test_complete_twice_double_decrements() {
        let mut products = vec![product(1, 20, 10)];
        let items = vec![line(1, 5)];

        apply_order_to_inventory(&mut products, &items, InventoryAction::Complete);
        apply_order_to_inventory(&mut products, &items, InventoryAction::Complete);

        assert_eq!(products[0].available_quantity, 10);
        assert_eq!(products[0].ordered_quantity, 0);
    }

    #[test]
    fn test_unknown_products_are_reported() {
        let mut products = vec![product(1, 20, 0)];
        let outcome = apply_order_to_inventory(
            &mut products,
            &[line(1, 1), line(99, 1), line(1, 2)],
            InventoryAction::Order,
        );
        assert_eq!(outcome.touched, vec![1]);
        assert_eq!(outcome.missing, vec![99]);
        assert_eq!(products[0].ordered_quantity, 3);
    }

    #[test]
    fn test_revert_purchase() {
        let mut products = vec![product(1, 4, 0)];
        revert_purchase_from_inventory(&mut products, &purchase(vec![(1, 10)]));
        assert_eq!(products[0].available_quantity, 0);
    }

    #[test]
    fn test_customer_payment_scenario() {
        let mut customer = Customer::new(1, "Ravi Traders");
        customer.total_sales = Money::from_major(40_100);
        customer.amount_received = Money::from_major(30_000);
        customer.recompute_balance();
        assert_eq!(customer.amount_balance, Money::from_major(10_100));

        apply_customer_payment(&mut customer, Money::from_major(5_000));

        assert_eq!(customer.amount_received, Money::from_major(35_000));
        assert_eq!(customer.amount_balance, Money::from_major(5_100));
        assert_eq!(customer.total_sales, Money::from_major(40_100));
    }

    #[test]
    fn test_customer_sale_accrual() {
        let customer = Customer::new(1, "Ravi Traders")
            .apply(&CustomerDelta::Sale(Money::from_major(900)))
            .apply(&CustomerDelta::Payment(Money::from_major(400)));
        assert_eq!(customer.total_sales, Money::from_major(900));
        assert_eq!(customer.amount_balance, Money::from_major(500));
    }

    #[test]
    fn test_customer_profit_carried_unchanged() {
        let mut customer = Customer::new(1, "Ravi Traders");
        customer.profit = Money::from_major(1_250);

        let customer = customer
            .apply(&CustomerDelta::Sale(Money::from_major(900)))
            .apply(&CustomerDelta::Payment(Money::from_major(400)));
        assert_eq!(customer.profit, Money::from_major(1_250));
    }

    #[test]
    fn test_supplier_snapshot_overwrite() {
        let mut supplier = Supplier::new(1, "Fresh Farms", Utc::now());
        supplier.balance_amount = Money::from_major(999);

        let mut tx = supplier_tx(1, 1, 1_000, 500, 700, (20, 10, 12));
        tx.damage = Money::from_major(50);
        apply_supplier_transaction(&mut supplier, &mut tx);

        assert_eq!(tx.balance, Money::from_major(750));
        assert_eq!(tx.crate_balance, 18);
        assert_eq!(supplier.balance_amount, tx.balance);
        assert_eq!(supplier.crate_balance, tx.crate_balance);
    }

    #[test]
    fn test_seed_opening_from_supplier() {
        let mut supplier = Supplier::new(1, "Fresh Farms", Utc::now());
        supplier.balance_amount = Money::from_major(500);
        supplier.crate_balance = 20;

        let seeded = seed_supplier_opening(&supplier, None, None).unwrap();
        assert_eq!(seeded, (Money::from_major(500), 20));

        let matching = seed_supplier_opening(&supplier, Some(Money::from_major(500)), Some(20));
        assert!(matching.is_ok());

        let stale = seed_supplier_opening(&supplier, Some(Money::from_major(300)), None);
        assert!(matches!(stale, Err(CoreError::StaleOpeningBalance { .. })));
    }

    #[test]
    fn test_replay_consistent_history() {
        let history = vec![
            supplier_tx(1, 1, 1_000, 500, 700, (20, 10, 12)),
            supplier_tx(2, 2, 800, 200, 0, (18, 5, 0)),
        ];
        let replay = replay_supplier_history(1, &history);
        assert_eq!(replay.balance_amount, Money::from_major(1_000));
        assert_eq!(replay.crate_balance, 23);
        assert_eq!(replay.transaction_count, 2);
        assert!(replay.mismatches.is_empty());
    }

    #[test]
    fn test_replay_detects_stale_opening() {
        // Second and third transactions were both prepared against the
        // balance after the first one.
        let history = vec![
            supplier_tx(1, 1, 0, 1_000, 0, (0, 10, 0)),
            supplier_tx(2, 2, 1_000, 300, 0, (10, 0, 0)),
            supplier_tx(3, 2, 1_000, 0, 400, (10, 0, 2)),
        ];
        let replay = replay_supplier_history(1, &history);

        assert_eq!(replay.balance_amount, Money::from_major(900));
        assert_eq!(replay.crate_balance, 8);
        assert_eq!(replay.mismatches.len(), 1);
        assert_eq!(replay.mismatches[0].transaction_id, 3);
        assert_eq!(replay.mismatches[0].expected_amount, Money::from_major(1_300));
    }
}
