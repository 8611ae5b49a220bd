//! # Checkout Orchestrator
//!
//! The state machine that turns a mutable cart into an immutable, paid
//! order exactly once:
//!
//! ```text
//! CartReview -> IntentRequested -> AwaitingConfirmation
//!                                      |
//!                         +------------+------------+
//!                         v                         v
//!                Verified -> Fulfilled           Rejected
//! ```
//!
//! The payment callback may arrive twice (browser redirect plus
//! server-to-server notification) and may arrive without a session.
//! Correctness rests on `CartStore::take_for_checkout`: the first
//! successful verification consumes the cart in the same step that
//! produces the order, so a duplicate finds an empty cart and is rejected.

use crate::cart::{CartStore, CartView, UserId};
use crate::error::{ShopError, ShopResult};
use crate::gateway::BoxedGateway;
use crate::money;
use crate::notify::BoxedNotifier;
use crate::order::{NewOrder, OrderStore};
use crate::product::ProductCatalog;
use crate::shipping::{PendingCheckoutState, PendingStore, ShippingForm, ShippingInfo};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// URLs the orchestrator hands back to callers
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Where the gateway posts/redirects the payment confirmation
    pub callback_url: String,
    /// Browser target after a fulfilled order
    pub success_path: String,
    /// Browser target after a rejected payment
    pub error_path: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Self {
            callback_url: format!("{base}/payment/callback"),
            success_path: "/order/success".to_string(),
            error_path: "/order/error".to_string(),
        }
    }
}

/// Payload returned to the client to open the gateway payment widget
#[derive(Debug, Clone, Serialize)]
pub struct StartPaymentResponse {
    pub key_id: String,
    pub intent_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub callback_url: String,
}

/// Fields of a payment confirmation callback, from POST body or query
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
    pub intent_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Outcome of a fulfilled verification
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPayment {
    pub order_id: Uuid,
    pub redirect_to: String,
}

/// The checkout orchestrator. Owns no state of its own; wires the cart,
/// pending and order stores to the gateway and notifier boundaries.
pub struct CheckoutOrchestrator {
    catalog: Arc<ProductCatalog>,
    carts: Arc<CartStore>,
    orders: Arc<OrderStore>,
    pending: Arc<PendingStore>,
    gateway: BoxedGateway,
    notifier: BoxedNotifier,
    urls: CheckoutUrls,
}

impl CheckoutOrchestrator {
    pub fn new(
        catalog: Arc<ProductCatalog>,
        carts: Arc<CartStore>,
        orders: Arc<OrderStore>,
        pending: Arc<PendingStore>,
        gateway: BoxedGateway,
        notifier: BoxedNotifier,
        urls: CheckoutUrls,
    ) -> Self {
        Self {
            catalog,
            carts,
            orders,
            pending,
            gateway,
            notifier,
            urls,
        }
    }

    /// CartReview: current totals from live cart contents. An empty cart
    /// is `InvalidState`; the HTTP layer turns that into a redirect away.
    pub fn review(&self, user: UserId) -> ShopResult<CartView> {
        let view = self.carts.view(user, &self.catalog)?;
        if view.lines.is_empty() {
            return Err(ShopError::InvalidState("cart is empty".to_string()));
        }
        Ok(view)
    }

    /// IntentRequested: validate shipping, recompute totals server-side,
    /// create the gateway intent and stash pending state.
    ///
    /// The shipping fields travel twice: in the pending store (fast path)
    /// and in the intent notes (recovery path for sessionless callbacks).
    #[instrument(skip(self, form), fields(user = %user))]
    pub async fn start_payment(
        &self,
        user: UserId,
        form: &ShippingForm,
    ) -> ShopResult<StartPaymentResponse> {
        let shipping = form.validate()?;

        let view = self.carts.view(user, &self.catalog)?;
        if view.lines.is_empty() {
            return Err(ShopError::InvalidState("cart is empty".to_string()));
        }

        let amount_minor = money::to_minor_units(view.totals.total)?;

        let mut notes = shipping.to_notes();
        notes.insert("user_id".to_string(), user.to_string());

        let intent = self
            .gateway
            .create_intent(amount_minor, money::CURRENCY, &notes)
            .await
            .map_err(|e| match e {
                err @ ShopError::UpstreamUnavailable(_) => err,
                other => ShopError::UpstreamUnavailable(other.to_string()),
            })?;

        info!(
            intent_id = %intent.intent_id,
            amount_minor,
            "payment intent created"
        );

        self.pending.put(
            user,
            PendingCheckoutState {
                intent_id: intent.intent_id.clone(),
                shipping,
                created_at: Utc::now(),
            },
        );

        Ok(StartPaymentResponse {
            key_id: self.gateway.key_id().to_string(),
            intent_id: intent.intent_id,
            amount_minor,
            currency: money::CURRENCY.to_string(),
            callback_url: self.urls.callback_url.clone(),
        })
    }

    /// Verified -> Fulfilled | Rejected.
    ///
    /// Works with or without an authenticated session: netbanking-style
    /// redirects lose the session, in which case the purchaser is
    /// recovered from the intent notes.
    #[instrument(skip(self, callback), fields(intent_id = %callback.intent_id))]
    pub async fn verify_payment(
        &self,
        session_user: Option<UserId>,
        callback: &PaymentCallback,
    ) -> ShopResult<VerifiedPayment> {
        // 1. Signature first. Hard stop; nothing is created on failure.
        self.gateway.verify_signature(
            &callback.intent_id,
            &callback.payment_id,
            &callback.signature,
        )?;

        // 2. Resolve the purchaser: session if present, intent notes
        // otherwise. The notes fetch doubles as the shipping fallback.
        let mut fetched_notes: Option<HashMap<String, String>> = None;
        let user = match session_user {
            Some(user) => user,
            None => {
                let notes = self
                    .gateway
                    .fetch_intent_notes(&callback.intent_id)
                    .await
                    .map_err(|e| {
                        warn!("intent fetch failed while resolving user: {e}");
                        ShopError::UserNotFound
                    })?;
                let user = notes
                    .get("user_id")
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .ok_or(ShopError::UserNotFound)?;
                fetched_notes = Some(notes);
                user
            }
        };

        // 3+4. Consume the cart and write the order aggregate. The drain
        // is the idempotency guard: a replayed callback for an
        // already-fulfilled payment finds an empty cart here.
        let shipping = self.resolve_shipping(user, callback, fetched_notes).await;
        let (lines, totals) = self.carts.take_for_checkout(user, &self.catalog)?;

        let order = self.orders.create(NewOrder {
            user_id: user,
            totals,
            lines,
            shipping,
            intent_id: callback.intent_id.clone(),
            payment_id: callback.payment_id.clone(),
            signature: callback.signature.clone(),
            provider: self.gateway.provider_name().to_string(),
        });

        info!(order_id = %order.id, total = %order.total, "order fulfilled");

        // 5. Best-effort confirmation; never a checkout failure.
        if let Err(e) = self.notifier.order_confirmed(&order).await {
            warn!(order_id = %order.id, "order confirmation failed: {e}");
        }

        // 6. Best-effort enrichment with method-specific details.
        match self.gateway.fetch_payment(&callback.payment_id).await {
            Ok(capture) => {
                if let Err(e) = self.orders.attach_payment(order.id, capture) {
                    warn!(order_id = %order.id, "could not attach payment details: {e}");
                }
            }
            Err(e) => warn!(order_id = %order.id, "payment details fetch failed: {e}"),
        }

        Ok(VerifiedPayment {
            order_id: order.id,
            redirect_to: self.urls.success_path.clone(),
        })
    }

    /// Browser target for a rejected payment
    pub fn error_redirect(&self) -> &str {
        &self.urls.error_path
    }

    /// Name of the configured payment provider
    pub fn provider_name(&self) -> &'static str {
        self.gateway.provider_name()
    }

    /// Shipping resolution, one fallback path for every caller: pending
    /// state when it matches this intent, intent notes otherwise, empty
    /// record as the last resort (the payment is already captured).
    async fn resolve_shipping(
        &self,
        user: UserId,
        callback: &PaymentCallback,
        fetched_notes: Option<HashMap<String, String>>,
    ) -> ShippingInfo {
        if let Some(pending) = self.pending.take(user) {
            if pending.intent_id == callback.intent_id {
                return ShippingInfo::from(pending.shipping);
            }
            warn!(
                pending_intent = %pending.intent_id,
                "pending state belongs to a different intent; using notes fallback"
            );
        }

        let notes = match fetched_notes {
            Some(notes) => Some(notes),
            None => match self.gateway.fetch_intent_notes(&callback.intent_id).await {
                Ok(notes) => Some(notes),
                Err(e) => {
                    warn!("intent notes fetch failed during shipping fallback: {e}");
                    None
                }
            },
        };

        notes
            .map(|n| ShippingInfo::from_notes(&n))
            .unwrap_or_default()
    }
}
