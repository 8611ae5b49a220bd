//! # Razorpay Gateway
//!
//! `PaymentGateway` implementation over the Razorpay REST API.
//!
//! Intent creation maps to Razorpay orders (`POST /v1/orders`); the notes
//! object carries the recovery metadata. Callback verification is a local
//! HMAC-SHA256 over `"{order_id}|{payment_id}"` keyed with the key secret,
//! compared constant-time against the signature the client relays.

use crate::config::RazorpayConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shop_core::{
    PaymentCapture, PaymentGateway, PaymentIntent, PaymentMethod, ShopError, ShopResult,
};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

/// Razorpay payment gateway
pub struct RazorpayGateway {
    config: RazorpayConfig,
    client: Client,
}

impl RazorpayGateway {
    /// Create a new gateway from config
    pub fn new(config: RazorpayConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ShopError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        Self::new(RazorpayConfig::from_env()?)
    }

    async fn api_error(response: reqwest::Response) -> ShopError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("Razorpay API error: status={status}, body={body}");

        if let Ok(parsed) = serde_json::from_str::<RazorpayErrorResponse>(&body) {
            return ShopError::UpstreamUnavailable(format!(
                "razorpay: {}",
                parsed.error.description
            ));
        }
        ShopError::UpstreamUnavailable(format!("razorpay: HTTP {status}"))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[instrument(skip(self, notes))]
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        notes: &HashMap<String, String>,
    ) -> ShopResult<PaymentIntent> {
        let url = format!("{}/v1/orders", self.config.api_base_url);

        debug!("creating Razorpay order: amount={amount_minor} {currency}");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&CreateOrderRequest {
                amount: amount_minor,
                currency,
                notes,
            })
            .send()
            .await
            .map_err(|e| ShopError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| ShopError::Serialization(format!("Razorpay order response: {e}")))?;

        info!("created Razorpay order: id={}", order.id);

        Ok(PaymentIntent {
            intent_id: order.id,
            amount_minor: order.amount,
            currency: order.currency,
            created_at: order
                .created_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .unwrap_or_else(Utc::now),
        })
    }

    fn verify_signature(
        &self,
        intent_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> ShopResult<()> {
        let message = format!("{intent_id}|{payment_id}");
        let expected = compute_hmac_sha256(&self.config.key_secret, &message);

        if !constant_time_compare(signature, &expected) {
            return Err(ShopError::SignatureInvalid(
                "signature mismatch".to_string(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_intent_notes(&self, intent_id: &str) -> ShopResult<HashMap<String, String>> {
        let url = format!("{}/v1/orders/{intent_id}", self.config.api_base_url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await
            .map_err(|e| ShopError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let order: FetchOrderResponse = response
            .json()
            .await
            .map_err(|e| ShopError::Serialization(format!("Razorpay order fetch: {e}")))?;

        Ok(order.notes.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn fetch_payment(&self, payment_id: &str) -> ShopResult<PaymentCapture> {
        let url = format!("{}/v1/payments/{payment_id}", self.config.api_base_url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await
            .map_err(|e| ShopError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ShopError::Serialization(format!("Razorpay payment fetch: {e}")))?;

        Ok(parse_payment(payment_id, raw))
    }

    fn key_id(&self) -> &str {
        &self.config.key_id
    }

    fn provider_name(&self) -> &'static str {
        "razorpay"
    }
}

/// Map a raw Razorpay payment entity to method-specific details
fn parse_payment(payment_id: &str, raw: serde_json::Value) -> PaymentCapture {
    let str_at = |v: &serde_json::Value, key: &str| {
        v.get(key)
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string()
    };

    let method = match raw.get("method").and_then(|m| m.as_str()).unwrap_or("") {
        "card" => {
            let card = raw.get("card").cloned().unwrap_or_default();
            PaymentMethod::Card {
                last4: str_at(&card, "last4"),
                network: str_at(&card, "network"),
                card_type: str_at(&card, "type"),
            }
        }
        "upi" => PaymentMethod::Upi {
            vpa: str_at(&raw, "vpa"),
        },
        "netbanking" => PaymentMethod::Netbanking {
            bank: str_at(&raw, "bank"),
        },
        "wallet" => PaymentMethod::Wallet {
            provider: str_at(&raw, "wallet"),
        },
        other => PaymentMethod::Other {
            name: other.to_string(),
        },
    };

    PaymentCapture {
        payment_id: payment_id.to_string(),
        method,
        email: raw.get("email").and_then(|v| v.as_str()).map(String::from),
        contact: raw
            .get("contact")
            .and_then(|v| v.as_str())
            .map(String::from),
        raw: Some(raw),
    }
}

// =============================================================================
// Razorpay API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    notes: &'a HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct FetchOrderResponse {
    #[serde(default)]
    notes: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorResponse {
    error: RazorpayError,
}

#[derive(Debug, Deserialize)]
struct RazorpayError {
    #[serde(default)]
    description: String,
}

// =============================================================================
// Callback Signature Verification
// =============================================================================

fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway() -> RazorpayGateway {
        RazorpayGateway::new(RazorpayConfig::new("rzp_test_key", "test_secret")).unwrap()
    }

    #[test]
    fn test_signature_round_trip() {
        let gw = gateway();
        let sig = compute_hmac_sha256("test_secret", "order_abc|pay_def");

        assert!(gw.verify_signature("order_abc", "pay_def", &sig).is_ok());
    }

    #[test]
    fn test_signature_mismatch_rejected() {
        let gw = gateway();
        let sig = compute_hmac_sha256("test_secret", "order_abc|pay_def");

        // Different payment id invalidates the signature
        let err = gw.verify_signature("order_abc", "pay_other", &sig).unwrap_err();
        assert!(matches!(err, ShopError::SignatureInvalid(_)));

        // Forged signature of the right length
        let forged = "0".repeat(sig.len());
        assert!(gw.verify_signature("order_abc", "pay_def", &forged).is_err());
    }

    #[test]
    fn test_hmac_is_hex_sha256() {
        let sig = compute_hmac_sha256("secret", "order|payment");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_parse_card_payment() {
        let capture = parse_payment(
            "pay_1",
            json!({
                "method": "card",
                "card": {"last4": "4242", "network": "Visa", "type": "credit"},
                "email": "asha@example.com",
                "contact": "+919876543210"
            }),
        );

        match capture.method {
            PaymentMethod::Card {
                last4,
                network,
                card_type,
            } => {
                assert_eq!(last4, "4242");
                assert_eq!(network, "Visa");
                assert_eq!(card_type, "credit");
            }
            other => panic!("expected card, got {other:?}"),
        }
        assert_eq!(capture.email.as_deref(), Some("asha@example.com"));
        assert!(capture.raw.is_some());
    }

    #[test]
    fn test_parse_upi_and_unknown_methods() {
        let upi = parse_payment("pay_2", json!({"method": "upi", "vpa": "asha@upi"}));
        assert!(matches!(upi.method, PaymentMethod::Upi { ref vpa } if vpa == "asha@upi"));

        let nb = parse_payment("pay_3", json!({"method": "netbanking", "bank": "HDFC"}));
        assert!(matches!(nb.method, PaymentMethod::Netbanking { ref bank } if bank == "HDFC"));

        let odd = parse_payment("pay_4", json!({"method": "emi"}));
        assert!(matches!(odd.method, PaymentMethod::Other { ref name } if name == "emi"));
    }
}
