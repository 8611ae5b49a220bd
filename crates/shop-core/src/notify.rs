//! # Order Notification Boundary
//!
//! Best-effort order confirmation. The orchestrator calls this after the
//! order is committed; any error is logged there and never surfaces as a
//! checkout failure.

use crate::error::ShopResult;
use crate::order::Order;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Sink for order-confirmation notifications
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Send a confirmation for a completed order. Implementations should
    /// embed product images inline where the order items carry image URLs.
    async fn order_confirmed(&self, order: &Order) -> ShopResult<()>;
}

/// Type alias for a shared notifier
pub type BoxedNotifier = Arc<dyn OrderNotifier>;

/// Notifier that only logs. Used when no SMTP relay is configured.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl OrderNotifier for LoggingNotifier {
    async fn order_confirmed(&self, order: &Order) -> ShopResult<()> {
        info!(
            order_id = %order.id,
            email = %order.shipping.email,
            total = %order.total,
            "order confirmation (no SMTP configured, logging only)"
        );
        Ok(())
    }
}
