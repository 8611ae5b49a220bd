//! # Shop-Cart
//!
//! Storefront checkout and payment reconciliation engine.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export RAZORPAY_KEY_ID=rzp_test_...
//! export RAZORPAY_KEY_SECRET=...
//!
//! # Run the server
//! shop-cart
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.catalog.products.len());
    info!("Payment provider: {}", state.checkout.provider_name());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🛒 Shop-Cart starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Start payment: POST http://{}/api/v1/payment/start", addr);
        info!("🔔 Callback: GET http://{}/payment/callback", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🛒 Shop-Cart 🛒
  ━━━━━━━━━━━━━━━━━━━━━━━
  Storefront checkout engine
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
