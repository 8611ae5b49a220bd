//! # Orders
//!
//! Immutable record of a completed purchase. An order, its items and its
//! shipping info are written together in one step by the checkout
//! orchestrator and never mutated afterwards, with one exception: payment
//! method details fetched from the gateway may be attached post-hoc,
//! best-effort.

use crate::cart::{CheckoutLine, UserId};
use crate::error::{ShopError, ShopResult};
use crate::gateway::PaymentCapture;
use crate::money::CartTotals;
use crate::shipping::ShippingInfo;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

/// Orders per listing page
pub const ORDER_PAGE_SIZE: usize = 10;

/// Snapshot of a purchased line at time of purchase. Decouples historical
/// orders from future product price changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<CheckoutLine> for OrderItem {
    fn from(line: CheckoutLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name,
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
            image_url: line.image_url,
        }
    }
}

/// A completed, paid order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,

    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,

    /// Gateway identifiers from the verified callback
    pub intent_id: String,
    pub payment_id: String,
    pub signature: String,
    pub provider: String,
    pub payment_status: String,

    pub items: Vec<OrderItem>,
    pub shipping: ShippingInfo,

    /// Method-specific details (card last4/network/type, UPI handle,
    /// bank, wallet), attached after creation when the fetch succeeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentCapture>,
}

/// One page of a user's order history
#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: u32,
    pub total: usize,
}

/// Everything needed to write an order in one step
#[derive(Debug)]
pub struct NewOrder {
    pub user_id: UserId,
    pub totals: CartTotals,
    pub lines: Vec<CheckoutLine>,
    pub shipping: ShippingInfo,
    pub intent_id: String,
    pub payment_id: String,
    pub signature: String,
    pub provider: String,
}

/// In-memory order store
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: Mutex<Vec<Order>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Order>> {
        self.orders.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create the order aggregate: order, item snapshots and shipping
    /// info together, status `paid`.
    pub fn create(&self, new: NewOrder) -> Order {
        let order = Order {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            created_at: Utc::now(),
            subtotal: new.totals.subtotal,
            tax: new.totals.tax,
            total: new.totals.total,
            intent_id: new.intent_id,
            payment_id: new.payment_id,
            signature: new.signature,
            provider: new.provider,
            payment_status: "paid".to_string(),
            items: new.lines.into_iter().map(OrderItem::from).collect(),
            shipping: new.shipping,
            payment: None,
        };
        self.lock().push(order.clone());
        order
    }

    /// Attach post-hoc payment details. The only permitted mutation of an
    /// order after creation.
    pub fn attach_payment(&self, order_id: Uuid, capture: PaymentCapture) -> ShopResult<()> {
        let mut orders = self.lock();
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| ShopError::Internal(format!("no such order: {order_id}")))?;
        order.payment = Some(capture);
        Ok(())
    }

    pub fn get(&self, order_id: Uuid) -> Option<Order> {
        self.lock().iter().find(|o| o.id == order_id).cloned()
    }

    /// A user's orders, newest first, fixed page size
    pub fn list_for_user(&self, user: UserId, page: u32) -> OrderPage {
        let orders = self.lock();
        let mut mine: Vec<Order> = orders.iter().filter(|o| o.user_id == user).cloned().collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = mine.len();
        let page = page.max(1);
        let start = (page as usize - 1) * ORDER_PAGE_SIZE;
        let orders = mine.into_iter().skip(start).take(ORDER_PAGE_SIZE).collect();

        OrderPage {
            orders,
            page,
            total,
        }
    }

    /// Total order count (diagnostics and tests)
    pub fn count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::PaymentMethod;
    use crate::money;
    use std::str::FromStr;

    fn new_order(user: UserId) -> NewOrder {
        let lines = vec![CheckoutLine {
            product_id: "p1".into(),
            name: "Widget".into(),
            quantity: 2,
            unit_price: Decimal::from_str("10.00").unwrap(),
            line_total: Decimal::from_str("20.00").unwrap(),
            image_url: None,
        }];
        NewOrder {
            user_id: user,
            totals: money::compute_totals(lines.iter().map(|l| (l.unit_price, l.quantity))),
            lines,
            shipping: ShippingInfo::default(),
            intent_id: "order_abc".into(),
            payment_id: "pay_def".into(),
            signature: "sig".into(),
            provider: "razorpay".into(),
        }
    }

    #[test]
    fn test_create_snapshots_lines() {
        let store = OrderStore::new();
        let user = Uuid::new_v4();

        let order = store.create(new_order(user));

        assert_eq!(order.payment_status, "paid");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].unit_price, Decimal::from_str("10.00").unwrap());
        assert_eq!(order.items[0].line_total, Decimal::from_str("20.00").unwrap());
        assert_eq!(order.total, Decimal::from_str("21.60").unwrap());
    }

    #[test]
    fn test_attach_payment_details() {
        let store = OrderStore::new();
        let order = store.create(new_order(Uuid::new_v4()));

        store
            .attach_payment(
                order.id,
                PaymentCapture {
                    payment_id: "pay_def".into(),
                    method: PaymentMethod::Card {
                        last4: "4242".into(),
                        network: "Visa".into(),
                        card_type: "credit".into(),
                    },
                    email: None,
                    contact: None,
                    raw: None,
                },
            )
            .unwrap();

        let stored = store.get(order.id).unwrap();
        assert!(matches!(
            stored.payment.unwrap().method,
            PaymentMethod::Card { .. }
        ));
    }

    #[test]
    fn test_list_newest_first_paginated() {
        let store = OrderStore::new();
        let user = Uuid::new_v4();

        for _ in 0..(ORDER_PAGE_SIZE + 3) {
            store.create(new_order(user));
        }
        // Another user's orders never leak in
        store.create(new_order(Uuid::new_v4()));

        let first = store.list_for_user(user, 1);
        assert_eq!(first.orders.len(), ORDER_PAGE_SIZE);
        assert_eq!(first.total, ORDER_PAGE_SIZE + 3);

        let second = store.list_for_user(user, 2);
        assert_eq!(second.orders.len(), 3);

        for pair in first.orders.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }
}
