//! # Payment Gateway Boundary
//!
//! Trait for payment providers. The orchestrator only ever talks to this
//! boundary; the Razorpay implementation lives in `shop-razorpay`.
//!
//! `create_intent` and `verify_signature` are load-bearing: no order is
//! ever created without a verified signature. The two fetch calls are
//! best-effort reconciliation and must never block an order that has
//! already been committed.

use crate::error::ShopResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A gateway-side reservation of an expected payment amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Gateway-issued intent identifier, correlates the later callback
    pub intent_id: String,
    /// Amount in minor units the gateway will collect
    pub amount_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Method-specific payment details, attached to orders best-effort
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum PaymentMethod {
    Card {
        last4: String,
        network: String,
        card_type: String,
    },
    Upi {
        vpa: String,
    },
    Netbanking {
        bank: String,
    },
    Wallet {
        provider: String,
    },
    Other {
        name: String,
    },
}

/// Full payment details fetched from the gateway after verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCapture {
    pub payment_id: String,
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Raw payment-details blob as returned by the gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

/// Payment provider boundary.
///
/// Implementations must treat `verify_signature` as a pure cryptographic
/// check: no network round trip, constant-time comparison.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a remote payment intent for `amount_minor`. The notes must
    /// carry enough to reconstruct the order if session state is lost
    /// before the callback (user id plus shipping fields).
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        notes: &HashMap<String, String>,
    ) -> ShopResult<PaymentIntent>;

    /// Cryptographic proof the callback was produced by the gateway.
    /// Failure is terminal for the attempt: no retry, no order.
    fn verify_signature(
        &self,
        intent_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> ShopResult<()>;

    /// Fetch the notes echoed back on an intent (recovery channel)
    async fn fetch_intent_notes(&self, intent_id: &str) -> ShopResult<HashMap<String, String>>;

    /// Fetch full payment details for post-hoc order enrichment
    async fn fetch_payment(&self, payment_id: &str) -> ShopResult<PaymentCapture>;

    /// Publishable key id handed to the client to open the payment widget
    fn key_id(&self) -> &str;

    /// Provider name, for logging and order records
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared, dynamically dispatched gateway
pub type BoxedGateway = Arc<dyn PaymentGateway>;
