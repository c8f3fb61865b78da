//! # Order Lifecycle
//!
//! Status transitions for customer orders and the stock movement each one
//! triggers.
//!
//! ## State Machine
//! ```text
//!                ┌──────────── reopen ─────────────┐
//!                │                                 │
//!                ▼                                 │
//!  create ──► PENDING ──► PROCESSING ──► COMPLETED ┘
//!  (order)       │  ▲          │          (complete + sale)
//!                │  └─ back ───┤
//!                │             ▼
//!                └────────► CANCELLED ──── reopen ──► PENDING
//!                            (cancel)
//! ```
//!
//! | to         | inventory action | other effect                   |
//! |------------|------------------|--------------------------------|
//! | pending    | none             |                                |
//! | processing | none             |                                |
//! | completed  | `Complete`       | sales id assigned, sale built  |
//! | cancelled  | `Cancel`         |                                |
//!
//! Reopening has no inventory effect. A reopened order that is completed
//! again decrements stock again.

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};
use crate::ledger::{apply_order_to_inventory, InventoryAction, InventoryOutcome};
use crate::types::{Order, OrderStatus, Product, SalesItem, SalesTransaction};
use crate::validation::validate_sales_items;

// =============================================================================
// Transition Table
// =============================================================================

/// Statuses reachable from `from`.
pub fn allowed_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Pending => &[Processing, Completed, Cancelled],
        Processing => &[Pending, Completed, Cancelled],
        Completed => &[Pending],
        Cancelled => &[Pending],
    }
}

/// Returns true if `from -> to` is offered.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// The inventory action a transition into `to` triggers, if any.
pub fn inventory_effect(to: OrderStatus) -> Option<InventoryAction> {
    match to {
        OrderStatus::Completed => Some(InventoryAction::Complete),
        OrderStatus::Cancelled => Some(InventoryAction::Cancel),
        OrderStatus::Pending | OrderStatus::Processing => None,
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Result of a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub inventory: InventoryOutcome,
    /// The sale recorded when the order completed.
    pub sale: Option<SalesTransaction>,
}

/// Places a new order: forces `pending` and commits its stock.
pub fn place_order(order: &mut Order, products: &mut [Product]) -> CoreResult<InventoryOutcome> {
    validate_sales_items(&order.items)?;
    order.status = OrderStatus::Pending;
    order.sales_id = None;
    Ok(apply_order_to_inventory(products, &order.items, InventoryAction::Order))
}

/// Moves an order to `to`, applying the transition's inventory effect.
///
/// On completion `next_sales_id` is called once and the returned id is
/// attached to the order and to the new [`SalesTransaction`], whose
/// `amount_paid` is the order's advance.
///
/// ## Errors
/// [`CoreError::InvalidTransition`] when `to` is not reachable from the
/// current status (including `to == current`). Nothing is mutated.
pub fn change_status<F>(
    order: &mut Order,
    to: OrderStatus,
    products: &mut [Product],
    sale_date: NaiveDate,
    next_sales_id: F,
) -> CoreResult<StatusChange>
where
    F: FnOnce() -> String,
{
    let from = order.status;
    if !can_transition(from, to) {
        return Err(CoreError::InvalidTransition {
            order_id: order.id.clone(),
            from,
            to,
        });
    }

    let inventory = match inventory_effect(to) {
        Some(action) => apply_order_to_inventory(products, &order.items, action),
        None => InventoryOutcome::default(),
    };
    order.status = to;

    let sale = if to == OrderStatus::Completed {
        let sales_id = next_sales_id();
        order.sales_id = Some(sales_id.clone());
        Some(SalesTransaction {
            id: sales_id,
            date: sale_date,
            customer_id: order.customer_id,
            customer_name: order.customer_name.clone(),
            items: order.items.clone(),
            amount_paid: order.advance_amount.unwrap_or_default(),
            order_id: Some(order.id.clone()),
        })
    } else {
        None
    };

    Ok(StatusChange {
        from,
        to,
        inventory,
        sale,
    })
}

/// Replaces an open order's line items.
///
/// The old items are released (`Cancel`) and the new ones committed
/// (`Order`), so the net change to `ordered_quantity` is the difference.
///
/// ## Errors
/// - [`CoreError::OrderClosed`] if the order is completed or cancelled
/// - validation errors for an empty or invalid item list
pub fn modify_order(
    order: &mut Order,
    new_items: Vec<SalesItem>,
    products: &mut [Product],
) -> CoreResult<InventoryOutcome> {
    if !order.status.is_open() {
        return Err(CoreError::OrderClosed {
            order_id: order.id.clone(),
            status: order.status,
        });
    }
    validate_sales_items(&new_items)?;

    let mut outcome = apply_order_to_inventory(products, &order.items, InventoryAction::Cancel);
    let committed = apply_order_to_inventory(products, &new_items, InventoryAction::Order);
    for id in committed.touched {
        if !outcome.touched.contains(&id) {
            outcome.touched.push(id);
        }
    }
    for id in committed.missing {
        if !outcome.missing.contains(&id) {
            outcome.missing.push(id);
        }
    }

    order.items = new_items;
    Ok(outcome)
}

/// Releases stock held by an order that is about to be deleted.
///
/// Only open orders hold stock; closed orders return an empty outcome.
pub fn release_for_delete(order: &Order, products: &mut [Product]) -> InventoryOutcome {
    if order.status.is_open() {
        apply_order_to_inventory(products, &order.items, InventoryAction::Cancel)
    } else {
        InventoryOutcome::default()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
