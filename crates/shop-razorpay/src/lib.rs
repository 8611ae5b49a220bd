//! # shop-razorpay
//!
//! Razorpay gateway adapter for shop-cart-rs.
//!
//! Implements `shop_core::PaymentGateway`:
//! - intent creation via `POST /v1/orders` (basic auth, notes carry the
//!   recovery metadata)
//! - callback verification via HMAC-SHA256 over
//!   `"{order_id}|{payment_id}"`, constant-time compare
//! - best-effort order/payment fetches for user recovery and post-hoc
//!   order enrichment
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_razorpay::RazorpayGateway;
//!
//! // RAZORPAY_KEY_ID / RAZORPAY_KEY_SECRET from the environment
//! let gateway = RazorpayGateway::from_env()?;
//!
//! let intent = gateway.create_intent(2160, "INR", &notes).await?;
//! // hand intent.intent_id + gateway.key_id() to the client widget
//! ```

pub mod config;
pub mod gateway;

// Re-exports
pub use config::RazorpayConfig;
pub use gateway::RazorpayGateway;
