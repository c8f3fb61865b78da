//! # List Filters
//!
//! Search and filter predicates behind every table view.
//!
//! ```text
//! GET /order?q=ravi&from=2024-04-01&to=2024-04-30&status=pending
//!            │        │                 │              │
//!            │        └── date range ───┘              └── status
//!            └── case-insensitive substring over the record's text fields
//! ```
//!
//! Each criterion is optional; a record is kept when it passes all of the
//! criteria that are set and that apply to its kind. A status filter on
//! customers, for example, is ignored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{
    Counterparty, Customer, Order, OrderStatus, Product, ProductPrice, Purchase, SalesTransaction,
    Supplier, SupplierTransaction,
};
use crate::validation::validate_search_query;

// =============================================================================
// Searchable
// =============================================================================

/// A record the list views can search and filter.
pub trait Searchable {
    /// Text fields matched by the free-text search.
    fn search_text(&self) -> Vec<&str>;

    /// Date used by date-range filters.
    fn record_date(&self) -> Option<NaiveDate> {
        None
    }

    /// Status used by status filters.
    fn record_status(&self) -> Option<OrderStatus> {
        None
    }

    /// Customer the record belongs to.
    fn record_customer(&self) -> Option<i64> {
        None
    }

    /// Supplier the record belongs to.
    fn record_supplier(&self) -> Option<i64> {
        None
    }
}

impl Searchable for Customer {
    fn search_text(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.address.as_str(), self.mobile.as_str()]
    }

    fn record_customer(&self) -> Option<i64> {
        Some(self.id)
    }
}

impl Searchable for Product {
    fn search_text(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.company_name.as_str()]
    }
}

impl Searchable for ProductPrice {
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.customer_name.as_str()];
        text.extend(self.entries.iter().map(|e| e.product_name.as_str()));
        text
    }

    fn record_customer(&self) -> Option<i64> {
        Some(self.customer_id)
    }
}

impl Searchable for Purchase {
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.id.as_str(), self.counterparty.name()];
        text.extend(self.items.iter().map(|i| i.product_name.as_str()));
        text
    }

    fn record_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn record_supplier(&self) -> Option<i64> {
        match &self.counterparty {
            Counterparty::Supplier { supplier_id, .. } => *supplier_id,
            Counterparty::Company { .. } => None,
        }
    }
}

impl Searchable for Order {
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.id.as_str(), self.customer_name.as_str()];
        text.extend(self.items.iter().map(|i| i.product_name.as_str()));
        text
    }

    fn record_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn record_status(&self) -> Option<OrderStatus> {
        Some(self.status)
    }

    fn record_customer(&self) -> Option<i64> {
        Some(self.customer_id)
    }
}

impl Searchable for SalesTransaction {
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.id.as_str(), self.customer_name.as_str()];
        text.extend(self.items.iter().map(|i| i.product_name.as_str()));
        text
    }

    fn record_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn record_customer(&self) -> Option<i64> {
        Some(self.customer_id)
    }
}

impl Searchable for Supplier {
    fn search_text(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn record_supplier(&self) -> Option<i64> {
        Some(self.id)
    }
}

impl Searchable for SupplierTransaction {
    fn search_text(&self) -> Vec<&str> {
        Vec::new()
    }

    fn record_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn record_supplier(&self) -> Option<i64> {
        Some(self.supplier_id)
    }
}

// =============================================================================
// List Query
// =============================================================================

/// Filter criteria accepted by list endpoints (as query-string parameters).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Free-text search.
    #[serde(default)]
    pub q: Option<String>,
    /// Inclusive start date.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Inclusive end date.
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub supplier_id: Option<i64>,
}

impl ListQuery {
    /// A query with only a text search.
    pub fn search(q: impl Into<String>) -> Self {
        ListQuery {
            q: Some(q.into()),
            ..Default::default()
        }
    }

    /// Returns true if `record` passes every applicable criterion.
    pub fn matches<T: Searchable>(&self, record: &T) -> bool {
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = q.to_lowercase();
            let hit = record
                .search_text()
                .iter()
                .any(|text| text.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(date) = record.record_date() {
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }

        if let (Some(wanted), Some(status)) = (self.status, record.record_status()) {
            if wanted != status {
                return false;
            }
        }

        if let (Some(wanted), Some(customer)) = (self.customer_id, record.record_customer()) {
            if wanted != customer {
                return false;
            }
        }

        if let (Some(wanted), Some(supplier)) = (self.supplier_id, record.record_supplier()) {
            if wanted != supplier {
                return false;
            }
        }

        true
    }

    /// Keeps the records that match, preserving order.
    pub fn apply<T: Searchable>(&self, records: Vec<T>) -> Result<Vec<T>, ValidationError> {
        if let Some(q) = &self.q {
            validate_search_query(q)?;
        }
        Ok(records.into_iter().filter(|r| self.matches(r)).collect())
    }
}

/// Finds the single record a lookup refers to.
///
/// Exact (case-insensitive) matches on the first text field win; otherwise
/// the first substring match is returned.
///
/// ## Errors
/// [`ValidationError::NoMatch`] when nothing matches, which the pages show
/// as "no matching record found".
pub fn find_match<'a, T: Searchable>(
    records: &'a [T],
    entity: &str,
    query: &str,
) -> Result<&'a T, ValidationError> {
    let query = validate_search_query(query)?;
    let needle = query.to_lowercase();
    let no_match = || ValidationError::NoMatch {
        entity: entity.to_string(),
        query: query.clone(),
    };

    if needle.is_empty() {
        return Err(no_match());
    }

    let exact = records.iter().find(|r| {
        r.search_text()
            .first()
            .is_some_and(|t| t.to_lowercase() == needle)
    });

    exact
        .or_else(|| records.iter().find(|r| ListQuery::search(query.as_str()).matches(*r)))
        .ok_or_else(no_match)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::SalesItem;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn order(id: &str, customer: &str, day: u32, status: OrderStatus) -> Order {
        Order {
            id: id.to_string(),
            date: date(day),
            customer_id: 1,
            customer_name: customer.to_string(),
            status,
            items: vec![SalesItem {
                product_id: 1,
                product_name: "Butter".to_string(),
                sales_price: Money::from_major(250),
                quantity: 1,
            }],
            advance_amount: None,
            sales_id: None,
        }
    }

    #[test]
    fn test_text_search_is_case_insensitive() {
        let customers = vec![Customer::new(1, "Ravi Traders"), Customer::new(2, "Hotel Sagar")];
        let found = ListQuery::search("RAVI").apply(customers).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn test_date_range_and_status() {
        let orders = vec![
            order("O202404001", "Ravi", 2, OrderStatus::Pending),
            order("O202404002", "Ravi", 10, OrderStatus::Completed),
            order("O202404003", "Sagar", 20, OrderStatus::Pending),
        ];

        let query = ListQuery {
            from: Some(date(1)),
            to: Some(date(15)),
            status: Some(OrderStatus::Pending),
            ..Default::default()
        };
        let found = query.apply(orders).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "O202404001");
    }

    #[test]
    fn test_status_filter_ignored_for_customers() {
        let query = ListQuery {
            status: Some(OrderStatus::Cancelled),
            ..Default::default()
        };
        assert!(query.matches(&Customer::new(1, "Ravi Traders")));
    }

    #[test]
    fn test_find_match_prefers_exact() {
        let customers = vec![Customer::new(1, "Ravi Traders Annex"), Customer::new(2, "Ravi Traders")];
        let found = find_match(&customers, "customer", "ravi traders").unwrap();
        assert_eq!(found.id, 2);

        let partial = find_match(&customers, "customer", "annex").unwrap();
        assert_eq!(partial.id, 1);
    }

    #[test]
    fn test_find_match_no_match() {
        let customers = vec![Customer::new(1, "Ravi Traders")];
        let err = find_match(&customers, "customer", "zed").unwrap_err();
        assert_eq!(err.to_string(), "No customer matches 'zed'");
    }
}
