//! # Checkout Error Types
//!
//! Typed error handling for the storefront checkout engine.
//! All fallible operations return `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for cart and checkout operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed shipping/profile input, field-level and user-correctable
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// Unauthenticated access to a user-scoped operation, or an attempt
    /// to touch another user's cart
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Empty cart at checkout or verification
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Product not found in catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Cart item not found
    #[error("Cart item not found: {item_id}")]
    ItemNotFound { item_id: String },

    /// Gateway intent-creation or API failure
    #[error("Payment gateway unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Forged or corrupted payment callback. Terminal, no retry.
    #[error("Payment signature verification failed: {0}")]
    SignatureInvalid(String),

    /// Callback with no resolvable purchaser
    #[error("Could not resolve purchasing user")]
    UserNotFound,

    /// Confirmation email failure. Non-fatal, logged only, never
    /// propagated past the orchestrator.
    #[error("Notification failed: {0}")]
    NotificationFailure(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Configuration(_) => 500,
            ShopError::Validation { .. } => 422,
            ShopError::AuthenticationRequired => 401,
            ShopError::InvalidState(_) => 409,
            ShopError::ProductNotFound { .. } => 404,
            ShopError::ItemNotFound { .. } => 404,
            ShopError::UpstreamUnavailable(_) => 502,
            ShopError::SignatureInvalid(_) => 400,
            ShopError::UserNotFound => 400,
            ShopError::NotificationFailure(_) => 500,
            ShopError::Serialization(_) => 500,
            ShopError::Internal(_) => 500,
        }
    }

    /// Message safe to show the end user. Signature and user-resolution
    /// failures surface as a generic payment failure with no internal
    /// detail; everything else is already user-correctable.
    pub fn user_message(&self) -> String {
        match self {
            ShopError::SignatureInvalid(_) | ShopError::UserNotFound => {
                "Payment could not be verified. If you were charged, contact support.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Shorthand for a field-level validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ShopError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for cart and checkout operations
pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ShopError::AuthenticationRequired.status_code(), 401);
        assert_eq!(
            ShopError::validation("shipping_phone_number", "bad").status_code(),
            422
        );
        assert_eq!(ShopError::InvalidState("empty cart".into()).status_code(), 409);
        assert_eq!(ShopError::SignatureInvalid("mismatch".into()).status_code(), 400);
    }

    #[test]
    fn test_user_message_hides_signature_detail() {
        let msg = ShopError::SignatureInvalid("hmac mismatch for order_xyz".into()).user_message();
        assert!(!msg.contains("hmac"));
        assert!(!msg.contains("order_xyz"));

        let msg = ShopError::UserNotFound.user_message();
        assert!(msg.contains("Payment could not be verified"));
    }

    #[test]
    fn test_validation_shorthand() {
        let err = ShopError::validation("shipping_zipcode", "must be 6 digits");
        match err {
            ShopError::Validation { field, message } => {
                assert_eq!(field, "shipping_zipcode");
                assert_eq!(message, "must be 6 digits");
            }
            _ => panic!("expected validation error"),
        }
    }
}
