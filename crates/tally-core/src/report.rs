//! # Reports
//!
//! Read-only summaries computed from store snapshots.
//!
//! ```text
//! ┌───────────────────┬──────────────────────────────────────────────────┐
//! │ Report            │ Source                                           │
//! ├───────────────────┼──────────────────────────────────────────────────┤
//! │ sales_summary     │ sales in a date range, grouped by customer and   │
//! │                   │ product                                          │
//! │ receivables       │ customers with a positive amount_balance         │
//! │ inventory_report  │ products, stock value, low-stock flags           │
//! │ supplier_summary  │ suppliers + their transaction history            │
//! │ dashboard_summary │ headline counts and totals for `/`               │
//! └───────────────────┴──────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::ledger::{replay_supplier_history, SupplierReplay};
use crate::money::Money;
use crate::types::{
    Customer, Order, OrderStatus, Product, Purchase, SalesTransaction, Supplier,
    SupplierTransaction,
};

fn in_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerSales {
    pub customer_id: i64,
    pub customer_name: String,
    pub sale_count: usize,
    pub total: Money,
    pub paid: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSales {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
    pub sale_count: usize,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub amount_due: Money,
    /// Sorted by total, largest first.
    pub by_customer: Vec<CustomerSales>,
    /// Sorted by revenue, largest first.
    pub by_product: Vec<ProductSales>,
}

/// Summarises sales dated within `[from, to]` (either bound optional).
pub fn sales_summary(
    sales: &[SalesTransaction],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> SalesSummary {
    let mut customers: BTreeMap<i64, CustomerSales> = BTreeMap::new();
    let mut products: BTreeMap<i64, ProductSales> = BTreeMap::new();
    let mut sale_count = 0;
    let mut total_amount = Money::zero();
    let mut amount_paid = Money::zero();

    for sale in sales.iter().filter(|s| in_range(s.date, from, to)) {
        let total = sale.total_amount();
        sale_count += 1;
        total_amount += total;
        amount_paid += sale.amount_paid;

        let row = customers
            .entry(sale.customer_id)
            .or_insert_with(|| CustomerSales {
                customer_id: sale.customer_id,
                customer_name: sale.customer_name.clone(),
                sale_count: 0,
                total: Money::zero(),
                paid: Money::zero(),
            });
        row.sale_count += 1;
        row.total += total;
        row.paid += sale.amount_paid;

        for item in &sale.items {
            let row = products
                .entry(item.product_id)
                .or_insert_with(|| ProductSales {
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    quantity: 0,
                    revenue: Money::zero(),
                });
            row.quantity += item.quantity;
            row.revenue += item.line_total();
        }
    }

    let mut by_customer: Vec<_> = customers.into_values().collect();
    by_customer.sort_by(|a, b| b.total.cmp(&a.total));
    let mut by_product: Vec<_> = products.into_values().collect();
    by_product.sort_by(|a, b| b.revenue.cmp(&a.revenue));

    SalesSummary {
        from,
        to,
        sale_count,
        total_amount,
        amount_paid,
        amount_due: total_amount - amount_paid,
        by_customer,
        by_product,
    }
}

// =============================================================================
// Receivables
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receivables {
    pub total_sales: Money,
    pub amount_received: Money,
    /// Sum of positive balances only.
    pub outstanding: Money,
    /// Customers owing money, largest balance first.
    pub customers: Vec<Customer>,
}

pub fn receivables(customers: &[Customer]) -> Receivables {
    let mut owing: Vec<Customer> = customers
        .iter()
        .filter(|c| c.amount_balance.is_positive())
        .cloned()
        .collect();
    owing.sort_by(|a, b| b.amount_balance.cmp(&a.amount_balance));

    Receivables {
        total_sales: customers.iter().map(|c| c.total_sales).sum(),
        amount_received: customers.iter().map(|c| c.amount_received).sum(),
        outstanding: customers
            .iter()
            .map(|c| c.amount_balance.clamp_non_negative())
            .sum(),
        customers: owing,
    }
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryRow {
    pub product: Product,
    /// `available_quantity * default_sales_price`.
    pub stock_value: Money,
    pub low_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryReport {
    pub total_available: i64,
    pub total_ordered: i64,
    pub stock_value: Money,
    pub low_stock_count: usize,
    pub rows: Vec<InventoryRow>,
}

/// Flags products whose `actual_quantity` is at or below `threshold`.
pub fn inventory_report(products: &[Product], threshold: i64) -> InventoryReport {
    let rows: Vec<InventoryRow> = products
        .iter()
        .map(|p| InventoryRow {
            product: p.clone(),
            stock_value: p.default_sales_price.multiply_quantity(p.available_quantity),
            low_stock: p.actual_quantity <= threshold,
        })
        .collect();

    InventoryReport {
        total_available: products.iter().map(|p| p.available_quantity).sum(),
        total_ordered: products.iter().map(|p| p.ordered_quantity).sum(),
        stock_value: rows.iter().map(|r| r.stock_value).sum(),
        low_stock_count: rows.iter().filter(|r| r.low_stock).count(),
        rows,
    }
}

// =============================================================================
// Suppliers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierSummary {
    pub supplier_id: i64,
    pub supplier_name: String,
    pub balance_amount: Money,
    pub crate_balance: i64,
    pub transaction_count: usize,
    pub total_billed: Money,
    pub total_paid: Money,
    pub total_damage: Money,
    #[ts(as = "Option<String>")]
    pub last_transaction: Option<NaiveDate>,
    /// True when the stored balances disagree with the replayed history.
    pub drifted: bool,
}

/// One row per supplier with totals over its transactions.
pub fn supplier_summary(
    suppliers: &[Supplier],
    transactions: &[SupplierTransaction],
) -> Vec<SupplierSummary> {
    suppliers
        .iter()
        .map(|s| {
            let history: Vec<&SupplierTransaction> =
                transactions.iter().filter(|t| t.supplier_id == s.id).collect();
            let reconciliation = reconcile_supplier(s, transactions);

            SupplierSummary {
                supplier_id: s.id,
                supplier_name: s.name.clone(),
                balance_amount: s.balance_amount,
                crate_balance: s.crate_balance,
                transaction_count: history.len(),
                total_billed: history.iter().map(|t| t.bill_amount).sum(),
                total_paid: history.iter().map(|t| t.paid).sum(),
                total_damage: history.iter().map(|t| t.damage).sum(),
                last_transaction: history.iter().map(|t| t.date).max(),
                drifted: reconciliation.drifted,
            }
        })
        .collect()
}

/// Stored supplier balances compared with its replayed history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub supplier_id: i64,
    pub stored_amount: Money,
    pub stored_crates: i64,
    pub replay: SupplierReplay,
    /// Stored balances differ from the replay, or an opening was stale.
    pub drifted: bool,
}

/// Replays a supplier's history and compares it with the stored balances.
///
/// A supplier with no transactions is consistent when its balances are zero.
pub fn reconcile_supplier(supplier: &Supplier, transactions: &[SupplierTransaction]) -> Reconciliation {
    let replay = replay_supplier_history(supplier.id, transactions);
    let drifted = replay.balance_amount != supplier.balance_amount
        || replay.crate_balance != supplier.crate_balance
        || !replay.mismatches.is_empty();

    Reconciliation {
        supplier_id: supplier.id,
        stored_amount: supplier.balance_amount,
        stored_crates: supplier.crate_balance,
        replay,
        drifted,
    }
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub customer_count: usize,
    pub product_count: usize,
    pub supplier_count: usize,
    pub open_orders: usize,
    pub completed_orders: usize,
    pub total_sales: Money,
    pub total_purchases: Money,
    pub receivable: Money,
    pub payable: Money,
    pub crates_outstanding: i64,
    pub low_stock_count: usize,
}

/// Everything the dashboard's headline cards need.
pub struct DashboardInput<'a> {
    pub customers: &'a [Customer],
    pub products: &'a [Product],
    pub suppliers: &'a [Supplier],
    pub orders: &'a [Order],
    pub sales: &'a [SalesTransaction],
    pub purchases: &'a [Purchase],
    pub low_stock_threshold: i64,
}

pub fn dashboard_summary(input: &DashboardInput<'_>) -> DashboardSummary {
    DashboardSummary {
        customer_count: input.customers.len(),
        product_count: input.products.len(),
        supplier_count: input.suppliers.len(),
        open_orders: input.orders.iter().filter(|o| o.status.is_open()).count(),
        completed_orders: input
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .count(),
        total_sales: input.sales.iter().map(SalesTransaction::total_amount).sum(),
        total_purchases: input.purchases.iter().map(Purchase::total_amount).sum(),
        receivable: receivables(input.customers).outstanding,
        payable: input.suppliers.iter().map(|s| s.balance_amount).sum(),
        crates_outstanding: input.suppliers.iter().map(|s| s.crate_balance).sum(),
        low_stock_count: input
            .products
            .iter()
            .filter(|p| p.actual_quantity <= input.low_stock_threshold)
            .count(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SalesItem;
    use chrono::Utc;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn sale(id: &str, customer_id: i64, day: u32, qty: i64, paid: i64) -> SalesTransaction {
        SalesTransaction {
            id: id.to_string(),
            date: date(day),
            customer_id,
            customer_name: format!("Customer {}", customer_id),
            items: vec![SalesItem {
                product_id: 1,
                product_name: "Butter".to_string(),
                sales_price: Money::from_major(100),
                quantity: qty,
            }],
            amount_paid: Money::from_major(paid),
            order_id: None,
        }
    }

    #[test]
    fn test_sales_summary_range_and_grouping() {
        let sales = vec![
            sale("S202404001", 1, 2, 3, 300),
            sale("S202404002", 2, 5, 10, 200),
            sale("S202404003", 1, 28, 1, 0),
        ];
        let summary = sales_summary(&sales, Some(date(1)), Some(date(15)));

        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.total_amount, Money::from_major(1_300));
        assert_eq!(summary.amount_paid, Money::from_major(500));
        assert_eq!(summary.amount_due, Money::from_major(800));
        assert_eq!(summary.by_customer[0].customer_id, 2);
        assert_eq!(summary.by_product[0].quantity, 13);
    }

    #[test]
    fn test_receivables_skip_settled_customers() {
        let mut owing = Customer::new(1, "Ravi Traders");
        owing.total_sales = Money::from_major(1_000);
        owing.amount_received = Money::from_major(400);
        owing.recompute_balance();

        let mut overpaid = Customer::new(2, "Hotel Sagar");
        overpaid.amount_received = Money::from_major(50);
        overpaid.recompute_balance();

        let report = receivables(&[owing, overpaid]);
        assert_eq!(report.customers.len(), 1);
        assert_eq!(report.outstanding, Money::from_major(600));
        assert_eq!(report.amount_received, Money::from_major(450));
    }

    #[test]
    fn test_inventory_report_low_stock() {
        let mut butter = Product::new(1, "Amul", "Butter", Money::from_major(250));
        butter.available_quantity = 40;
        butter.recompute_actual();
        let mut ghee = Product::new(2, "Amul", "Ghee", Money::from_major(500));
        ghee.available_quantity = 12;
        ghee.ordered_quantity = 5;
        ghee.recompute_actual();

        let report = inventory_report(&[butter, ghee], 10);
        assert_eq!(report.low_stock_count, 1);
        assert!(report.rows[1].low_stock);
        assert_eq!(report.stock_value, Money::from_major(16_000));
        assert_eq!(report.total_ordered, 5);
    }

    #[test]
    fn test_supplier_summary_and_drift() {
        let mut supplier = Supplier::new(1, "Fresh Farms", Utc::now());
        let mut tx = SupplierTransaction {
            id: 1,
            supplier_id: 1,
            date: date(3),
            opening_amount: Money::zero(),
            bill_amount: Money::from_major(900),
            paid: Money::from_major(400),
            damage: Money::zero(),
            balance: Money::zero(),
            crate_opening: 0,
            crate_supply: 12,
            crate_return: 2,
            crate_balance: 0,
            created_at: Utc::now(),
        };
        crate::ledger::apply_supplier_transaction(&mut supplier, &mut tx);

        let rows = supplier_summary(&[supplier.clone()], &[tx.clone()]);
        assert_eq!(rows[0].total_billed, Money::from_major(900));
        assert_eq!(rows[0].last_transaction, Some(date(3)));
        assert!(!rows[0].drifted);

        supplier.balance_amount = Money::from_major(1);
        assert!(reconcile_supplier(&supplier, &[tx]).drifted);
    }
}
