//! # shop-core
//!
//! Core types and checkout orchestration for the shop-cart storefront.
//!
//! This crate provides:
//! - `money` — fixed-point pricing engine (subtotal, tax, total)
//! - `ProductCatalog` with filter/sort/pagination
//! - `CartStore` — per-user mutable carts with cached totals
//! - `PaymentGateway` trait, the external payment boundary
//! - `CheckoutOrchestrator` — the cart-to-paid-order state machine
//! - `OrderStore` — immutable order aggregates
//! - `OrderNotifier` — best-effort confirmation boundary
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{CheckoutOrchestrator, CheckoutUrls, ShippingForm};
//!
//! // Client posts the shipping form; totals are recomputed server-side
//! let start = orchestrator.start_payment(user, &form).await?;
//!
//! // Gateway calls back (redirect or server-to-server, session or not)
//! let verified = orchestrator.verify_payment(session_user, &callback).await?;
//! // verified.order_id is paid, the cart is empty
//! ```

pub mod cart;
pub mod checkout;
pub mod error;
pub mod gateway;
pub mod money;
pub mod notify;
pub mod order;
pub mod product;
pub mod shipping;

// Re-exports for convenience
pub use cart::{Cart, CartItem, CartStore, CartView, CheckoutLine, QuantityAction, UserId};
pub use checkout::{
    CheckoutOrchestrator, CheckoutUrls, PaymentCallback, StartPaymentResponse, VerifiedPayment,
};
pub use error::{ShopError, ShopResult};
pub use gateway::{BoxedGateway, PaymentCapture, PaymentGateway, PaymentIntent, PaymentMethod};
pub use money::{compute_totals, to_minor_units, CartTotals, CURRENCY, TAX_RATE};
pub use notify::{BoxedNotifier, LoggingNotifier, OrderNotifier};
pub use order::{NewOrder, Order, OrderItem, OrderPage, OrderStore, ORDER_PAGE_SIZE};
pub use product::{
    Category, Product, ProductCatalog, ProductPage, ProductQuery, ProductSort, SubCategory,
    PRODUCT_PAGE_SIZE,
};
pub use shipping::{
    CleanShipping, PendingCheckoutState, PendingStore, ShippingForm, ShippingInfo, State,
};
