//! # Demo Dataset
//!
//! A small, internally consistent dataset for the in-memory backend, demos
//! and the `seed` binary.
//!
//! The data is not written by hand: it is produced by replaying business
//! events through `tally_core` (purchases received, orders placed and
//! completed, payments taken, supplier bills entered), so every stock
//! counter and balance agrees with the records that produced it.
//!
//! ```text
//! day  0  purchase from Amul (company)
//! day  2  purchase from Fresh Farms (supplier #1)
//! day  2  Fresh Farms bill + part payment, Valley Cold Chain bill
//! day  5  order for Ravi Traders            → stays pending
//! day  6  order for Hotel Sagar (price list) → completed on day 11
//! day  7  order for Green Leaf Cafe         → cancelled
//! day  9  second Fresh Farms bill
//! day 13  counter bill for Green Leaf Cafe, paid in full
//! ```

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DbResult;
use tally_core::ident::{next_id, next_numeric_id, IdPrefix};
use tally_core::ledger::{
    apply_customer_payment, apply_customer_sale, apply_purchase_to_inventory,
    apply_supplier_transaction, seed_supplier_opening,
};
use tally_core::order::{change_status, place_order};
use tally_core::pricing::{price_bill_lines, BillLine};
use tally_core::{
    CoreResult, Counterparty, Customer, Money, Order, OrderStatus, PriceEntry, Product,
    ProductPrice, Purchase, PurchaseItem, SalesTransaction, Supplier, SupplierTransaction,
};

/// Every record of a dataset, each list in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MockDataset {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub product_prices: Vec<ProductPrice>,
    pub purchases: Vec<Purchase>,
    pub orders: Vec<Order>,
    pub sales: Vec<SalesTransaction>,
    pub suppliers: Vec<Supplier>,
    pub supplier_transactions: Vec<SupplierTransaction>,
}

/// First day of the demo period.
fn default_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap_or_default()
}

impl MockDataset {
    /// The demo dataset, dated April 2024.
    pub fn demo() -> CoreResult<Self> {
        Self::demo_at(default_anchor())
    }

    /// The demo dataset with every date offset from `anchor`.
    pub fn demo_at(anchor: NaiveDate) -> CoreResult<Self> {
        let day = |n: u64| anchor.checked_add_days(Days::new(n)).unwrap_or(anchor);
        let stamp = |n: u64| -> DateTime<Utc> { Utc.from_utc_datetime(&day(n).and_time(NaiveTime::MIN)) };

        let mut data = MockDataset {
            customers: customers(),
            products: products(),
            suppliers: vec![
                Supplier::new(1, "Fresh Farms Logistics", stamp(0)),
                Supplier::new(2, "Valley Cold Chain", stamp(0)),
            ],
            ..Default::default()
        };

        data.product_prices.push(ProductPrice {
            customer_id: 2,
            customer_name: "Hotel Sagar".to_string(),
            entries: vec![
                PriceEntry {
                    product_id: 1,
                    product_name: "Butter 500g".to_string(),
                    sales_price: Money::from_major(240),
                },
                PriceEntry {
                    product_id: 2,
                    product_name: "Paneer 1kg".to_string(),
                    sales_price: Money::from_major(400),
                },
            ],
        });

        // Prior balance carried over for Ravi Traders.
        if let Some(ravi) = data.customers.iter_mut().find(|c| c.id == 1) {
            apply_customer_sale(ravi, Money::from_major(5_000));
            apply_customer_payment(ravi, Money::from_major(3_000));
        }

        // ---------------------------------------------------------------------
        // Purchases
        // ---------------------------------------------------------------------

        data.receive_purchase(
            day(0),
            Counterparty::Company {
                company_name: "Amul".to_string(),
            },
            vec![
                line(1, "Butter 500g", 210, 60),
                line(2, "Paneer 1kg", 360, 30),
                line(3, "Taaza Milk 1L", 55, 200),
            ],
        );
        data.receive_purchase(
            day(2),
            Counterparty::Supplier {
                supplier_id: Some(1),
                supplier_name: "Fresh Farms Logistics".to_string(),
            },
            vec![
                line(4, "Curd 400g", 36, 80),
                line(5, "Ghee 1L", 560, 12),
                line(6, "Cheese Slices", 115, 8),
            ],
        );

        // ---------------------------------------------------------------------
        // Supplier ledger
        // ---------------------------------------------------------------------

        data.enter_supplier_bill(1, day(2), stamp(2), (12_000, 5_000, 200), (20, 0))?;
        data.enter_supplier_bill(2, day(2), stamp(2), (4_500, 4_500, 0), (8, 8))?;
        data.enter_supplier_bill(1, day(9), stamp(9), (8_000, 10_000, 0), (10, 15))?;

        // ---------------------------------------------------------------------
        // Orders
        // ---------------------------------------------------------------------

        data.open_order(
            day(5),
            1,
            &[bill(1, 10), bill(3, 50)],
            Some(Money::from_major(1_000)),
        )?;
        let sagar = data.open_order(
            day(6),
            2,
            &[bill(2, 5), bill(1, 4)],
            Some(Money::from_major(500)),
        )?;
        let cafe = data.open_order(day(7), 3, &[bill(6, 3)], None)?;

        data.move_order(&sagar, OrderStatus::Completed, day(11))?;
        data.move_order(&cafe, OrderStatus::Cancelled, day(8))?;

        // ---------------------------------------------------------------------
        // Counter bill
        // ---------------------------------------------------------------------

        data.counter_bill(day(13), 3, &[bill(4, 10), bill(3, 20)])?;

        Ok(data)
    }

    /// Parses a dataset written by [`MockDataset::to_json`].
    pub fn from_json(json: &str) -> DbResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON, one key per entity list.
    pub fn to_json(&self) -> DbResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn receive_purchase(&mut self, date: NaiveDate, counterparty: Counterparty, items: Vec<PurchaseItem>) {
        let purchase = Purchase {
            id: next_id(IdPrefix::Purchase, date, self.purchases.iter().map(|p| &p.id)),
            date,
            counterparty,
            items,
        };
        apply_purchase_to_inventory(&mut self.products, &purchase);
        self.purchases.push(purchase);
    }

    /// `amounts` is `(bill, paid, damage)` in major units, `crates` is
    /// `(supplied, returned)`.
    fn enter_supplier_bill(
        &mut self,
        supplier_id: i64,
        date: NaiveDate,
        created_at: DateTime<Utc>,
        amounts: (i64, i64, i64),
        crates: (i64, i64),
    ) -> CoreResult<()> {
        let id = next_numeric_id(self.supplier_transactions.iter().map(|t| t.id));
        let Some(supplier) = self.suppliers.iter_mut().find(|s| s.id == supplier_id) else {
            return Ok(());
        };

        let (opening_amount, crate_opening) = seed_supplier_opening(supplier, None, None)?;
        let mut tx = SupplierTransaction {
            id,
            supplier_id,
            date,
            opening_amount,
            bill_amount: Money::from_major(amounts.0),
            paid: Money::from_major(amounts.1),
            damage: Money::from_major(amounts.2),
            balance: Money::zero(),
            crate_opening,
            crate_supply: crates.0,
            crate_return: crates.1,
            crate_balance: 0,
            created_at,
        };
        apply_supplier_transaction(supplier, &mut tx);
        self.supplier_transactions.push(tx);
        Ok(())
    }

    fn open_order(
        &mut self,
        date: NaiveDate,
        customer_id: i64,
        lines: &[BillLine],
        advance_amount: Option<Money>,
    ) -> CoreResult<String> {
        let customer_name = self.customer_name(customer_id);
        let price_list = self.product_prices.iter().find(|p| p.customer_id == customer_id);
        let items = price_bill_lines(lines, &self.products, price_list)?;

        let mut order = Order {
            id: next_id(IdPrefix::Order, date, self.orders.iter().map(|o| &o.id)),
            date,
            customer_id,
            customer_name,
            status: OrderStatus::Pending,
            items,
            advance_amount,
            sales_id: None,
        };
        place_order(&mut order, &mut self.products)?;

        let id = order.id.clone();
        self.orders.push(order);
        Ok(id)
    }

    fn move_order(&mut self, order_id: &str, to: OrderStatus, date: NaiveDate) -> CoreResult<()> {
        let Some(order) = self.orders.iter_mut().find(|o| o.id == order_id) else {
            return Ok(());
        };
        let sales = &self.sales;
        let change = change_status(order, to, &mut self.products, date, || {
            next_id(IdPrefix::Sales, date, sales.iter().map(|s| &s.id))
        })?;

        if let Some(sale) = change.sale {
            self.record_sale(sale);
        }
        Ok(())
    }

    fn counter_bill(&mut self, date: NaiveDate, customer_id: i64, lines: &[BillLine]) -> CoreResult<()> {
        let price_list = self.product_prices.iter().find(|p| p.customer_id == customer_id);
        let items = price_bill_lines(lines, &self.products, price_list)?;
        let total: Money = items.iter().map(|i| i.line_total()).sum();

        let sale = SalesTransaction {
            id: next_id(IdPrefix::Sales, date, self.sales.iter().map(|s| &s.id)),
            date,
            customer_id,
            customer_name: self.customer_name(customer_id),
            items,
            amount_paid: total,
            order_id: None,
        };
        self.record_sale(sale);
        Ok(())
    }

    /// Demo customers carry their sales as receivables.
    fn record_sale(&mut self, sale: SalesTransaction) {
        if let Some(customer) = self.customers.iter_mut().find(|c| c.id == sale.customer_id) {
            apply_customer_sale(customer, sale.total_amount());
            apply_customer_payment(customer, sale.amount_paid);
        }
        self.sales.push(sale);
    }

    fn customer_name(&self, customer_id: i64) -> String {
        self.customers
            .iter()
            .find(|c| c.id == customer_id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }
}

fn customers() -> Vec<Customer> {
    [
        (1, "Ravi Traders", "14 Market Road", "9876543210"),
        (2, "Hotel Sagar", "2 Station Square", "9123456780"),
        (3, "Green Leaf Cafe", "88 Lake View", ""),
    ]
    .into_iter()
    .map(|(id, name, address, mobile)| {
        let mut customer = Customer::new(id, name);
        customer.address = address.to_string();
        customer.mobile = mobile.to_string();
        customer
    })
    .collect()
}

fn products() -> Vec<Product> {
    [
        (1, "Amul", "Butter 500g", 250),
        (2, "Amul", "Paneer 1kg", 420),
        (3, "Amul", "Taaza Milk 1L", 68),
        (4, "Mother Dairy", "Curd 400g", 45),
        (5, "Mother Dairy", "Ghee 1L", 640),
        (6, "Britannia", "Cheese Slices", 140),
    ]
    .into_iter()
    .map(|(id, company, name, price)| Product::new(id, company, name, Money::from_major(price)))
    .collect()
}

fn line(product_id: i64, name: &str, price: i64, quantity: i64) -> PurchaseItem {
    PurchaseItem {
        product_id,
        product_name: name.to_string(),
        purchase_price: Money::from_major(price),
        quantity,
    }
}

fn bill(product_id: i64, quantity: i64) -> BillLine {
    BillLine {
        product_id,
        quantity,
        price_override: None,
    }
}
