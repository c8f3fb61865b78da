//! # Price Resolution
//!
//! A customer's price list overrides a product's default price.
//!
//! ```text
//! resolve_sales_price(product, customer's list)
//!        │
//!        ├── list has an entry for product? ──► entry.sales_price
//!        │
//!        └── otherwise ──────────────────────► product.default_sales_price
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, ProductPrice, SalesItem};
use crate::validation::{validate_price, validate_quantity};

/// Where a resolved price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PriceSource {
    CustomerList,
    Default,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedPrice {
    pub price: Money,
    pub source: PriceSource,
}

/// Returns the customer's override for `product`, or its default price.
pub fn resolve_sales_price(product: &Product, price_list: Option<&ProductPrice>) -> ResolvedPrice {
    match price_list.and_then(|list| list.price_for(product.id)) {
        Some(price) => ResolvedPrice {
            price,
            source: PriceSource::CustomerList,
        },
        None => ResolvedPrice {
            price: product.default_sales_price,
            source: PriceSource::Default,
        },
    }
}

/// One line of a bill as entered on the billing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillLine {
    pub product_id: i64,
    pub quantity: i64,
    /// Price typed by the cashier; skips resolution when present.
    #[serde(default)]
    pub price_override: Option<Money>,
}

/// Prices each bill line and returns sale line items.
///
/// ## Errors
/// - `NotFound` if a product id is unknown
/// - validation errors for non-positive quantities or prices
pub fn price_bill_lines(
    lines: &[BillLine],
    products: &[Product],
    price_list: Option<&ProductPrice>,
) -> CoreResult<Vec<SalesItem>> {
    lines
        .iter()
        .map(|line| -> CoreResult<SalesItem> {
            validate_quantity(line.quantity)?;
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or_else(|| CoreError::not_found("Product", line.product_id))?;

            let price = match line.price_override {
                Some(price) => price,
                None => resolve_sales_price(product, price_list).price,
            };
            validate_price("sales price", price)?;

            Ok(SalesItem {
                product_id: product.id,
                product_name: product.name.clone(),
                sales_price: price,
                quantity: line.quantity,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceEntry;

    fn products() -> Vec<Product> {
        vec![
            Product::new(1, "Amul", "Butter", Money::from_major(250)),
            Product::new(2, "Amul", "Paneer", Money::from_major(320)),
        ]
    }

    fn hotel_list() -> ProductPrice {
        ProductPrice {
            customer_id: 7,
            customer_name: "Hotel Sagar".to_string(),
            entries: vec![PriceEntry {
                product_id: 2,
                product_name: "Paneer".to_string(),
                sales_price: Money::from_major(300),
            }],
        }
    }

    #[test]
    fn test_resolve_prefers_customer_list() {
        let products = products();
        let list = hotel_list();

        let paneer = resolve_sales_price(&products[1], Some(&list));
        assert_eq!(paneer.price, Money::from_major(300));
        assert_eq!(paneer.source, PriceSource::CustomerList);

        let butter = resolve_sales_price(&products[0], Some(&list));
        assert_eq!(butter.price, Money::from_major(250));
        assert_eq!(butter.source, PriceSource::Default);

        assert_eq!(resolve_sales_price(&products[1], None).price, Money::from_major(320));
    }

    #[test]
    fn test_price_bill_lines() {
        let lines = vec![
            BillLine {
                product_id: 1,
                quantity: 2,
                price_override: None,
            },
            BillLine {
                product_id: 2,
                quantity: 1,
                price_override: None,
            },
            BillLine {
                product_id: 1,
                quantity: 1,
                price_override: Some(Money::from_major(240)),
            },
        ];
        let items = price_bill_lines(&lines, &products(), Some(&hotel_list())).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].sales_price, Money::from_major(250));
        assert_eq!(items[1].sales_price, Money::from_major(300));
        assert_eq!(items[2].sales_price, Money::from_major(240));
        assert_eq!(items[1].product_name, "Paneer");
    }

    #[test]
    fn test_price_bill_lines_unknown_product() {
        let lines = vec![BillLine {
            product_id: 42,
            quantity: 1,
            price_override: None,
        }];
        let err = price_bill_lines(&lines, &products(), None).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
