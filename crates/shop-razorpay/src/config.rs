//! # Razorpay Configuration
//!
//! Configuration management for the Razorpay integration.
//! All secrets are loaded from environment variables.

use shop_core::ShopError;
use std::env;

/// Razorpay API configuration
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// Key id (rzp_test_... or rzp_live_...), safe to expose to clients
    pub key_id: String,

    /// Key secret, used for API auth and callback signature verification
    pub key_secret: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,
}

impl RazorpayConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `RAZORPAY_KEY_ID`
    /// - `RAZORPAY_KEY_SECRET`
    pub fn from_env() -> Result<Self, ShopError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let key_id = env::var("RAZORPAY_KEY_ID")
            .map_err(|_| ShopError::Configuration("RAZORPAY_KEY_ID not set".to_string()))?;

        let key_secret = env::var("RAZORPAY_KEY_SECRET")
            .map_err(|_| ShopError::Configuration("RAZORPAY_KEY_SECRET not set".to_string()))?;

        if !key_id.starts_with("rzp_test_") && !key_id.starts_with("rzp_live_") {
            return Err(ShopError::Configuration(
                "RAZORPAY_KEY_ID must start with rzp_test_ or rzp_live_".to_string(),
            ));
        }

        if key_secret.is_empty() {
            return Err(ShopError::Configuration(
                "RAZORPAY_KEY_SECRET must not be empty".to_string(),
            ));
        }

        Ok(Self {
            key_id,
            key_secret,
            api_base_url: "https://api.razorpay.com".to_string(),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            api_base_url: "https://api.razorpay.com".to_string(),
        }
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.key_id.starts_with("rzp_test_")
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_modes() {
        let config = RazorpayConfig::new("rzp_test_abc123", "secret");
        assert!(config.is_test_mode());

        let config = RazorpayConfig::new("rzp_live_abc123", "secret");
        assert!(!config.is_test_mode());
    }

    #[test]
    fn test_custom_base_url() {
        let config = RazorpayConfig::new("rzp_test_abc", "secret")
            .with_api_base_url("http://localhost:9090");
        assert_eq!(config.api_base_url, "http://localhost:9090");
    }
}
