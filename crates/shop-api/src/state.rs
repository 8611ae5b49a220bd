//! # Application State
//!
//! Shared state for the axum application: catalog, stores, the checkout
//! orchestrator and its gateway/notifier boundaries.

use crate::mailer::{MailerConfig, SmtpNotifier};
use shop_core::{
    BoxedGateway, BoxedNotifier, CartStore, CheckoutOrchestrator, CheckoutUrls, LoggingNotifier,
    OrderStore, PendingStore, ProductCatalog,
};
use shop_razorpay::RazorpayGateway;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for payment callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Product catalog
    pub catalog: Arc<ProductCatalog>,
    /// Per-user carts
    pub carts: Arc<CartStore>,
    /// Completed orders
    pub orders: Arc<OrderStore>,
    /// Checkout state machine
    pub checkout: Arc<CheckoutOrchestrator>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create the full production state: Razorpay gateway from the
    /// environment, SMTP notifier when configured, catalog from config.
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let catalog = Arc::new(load_catalog()?);

        let gateway: BoxedGateway = Arc::new(
            RazorpayGateway::from_env()
                .map_err(|e| anyhow::anyhow!("Failed to initialize Razorpay: {e}"))?,
        );

        let notifier: BoxedNotifier = match MailerConfig::from_env() {
            Some(mailer_config) => Arc::new(SmtpNotifier::new(mailer_config)?),
            None => {
                tracing::warn!("SMTP not configured; order confirmations will only be logged");
                Arc::new(LoggingNotifier)
            }
        };

        Ok(Self::with_parts(config, catalog, gateway, notifier))
    }

    /// Assemble state from explicit parts (tests inject a mock gateway)
    pub fn with_parts(
        config: AppConfig,
        catalog: Arc<ProductCatalog>,
        gateway: BoxedGateway,
        notifier: BoxedNotifier,
    ) -> Self {
        let carts = Arc::new(CartStore::new());
        let orders = Arc::new(OrderStore::new());
        let pending = Arc::new(PendingStore::new());

        let checkout = Arc::new(CheckoutOrchestrator::new(
            Arc::clone(&catalog),
            Arc::clone(&carts),
            Arc::clone(&orders),
            pending,
            gateway,
            notifier,
            CheckoutUrls::new(&config.base_url),
        ));

        Self {
            catalog,
            carts,
            orders,
            checkout,
            config,
        }
    }
}

/// Load the product catalog from config
fn load_catalog() -> anyhow::Result<ProductCatalog> {
    let config_paths = [
        "config/catalog.toml",
        "../config/catalog.toml",
        "../../config/catalog.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ProductCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {path}: {e}"))?;
            tracing::info!("Loaded {} products from {path}", catalog.products.len());
            return Ok(catalog);
        }
    }

    tracing::warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::new())
}
