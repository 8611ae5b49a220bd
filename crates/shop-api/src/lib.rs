//! # shop-api
//!
//! HTTP API layer for shop-cart.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for the catalog, carts, checkout and orders
//! - Payment verification endpoints (JSON and browser-redirect channels)
//! - SMTP order confirmations
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/products` | List products |
//! | GET | `/api/v1/products/:id` | Get product |
//! | GET | `/api/v1/cart` | View cart |
//! | POST | `/api/v1/cart/items` | Add product to cart |
//! | POST | `/api/v1/cart/items/:id` | Adjust line quantity |
//! | DELETE | `/api/v1/cart/items/:id` | Remove line |
//! | GET | `/api/v1/checkout` | Cart review |
//! | POST | `/api/v1/payment/start` | Validate shipping, create intent |
//! | POST | `/api/v1/payment/verify` | Verify payment (JSON) |
//! | GET | `/payment/callback` | Verify payment (browser redirect) |
//! | GET | `/api/v1/orders` | Order history |

pub mod auth;
pub mod handlers;
pub mod mailer;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
