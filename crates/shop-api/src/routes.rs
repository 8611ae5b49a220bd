//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Catalog:
///   - GET  /api/v1/products - List products (filter/sort/paginate)
///   - GET  /api/v1/products/{id} - Get product by ID
///
/// - Cart (requires x-user-id):
///   - GET    /api/v1/cart - View cart (recomputes totals)
///   - POST   /api/v1/cart/items - Add product
///   - POST   /api/v1/cart/items/{item_id} - Increase/decrease quantity
///   - DELETE /api/v1/cart/items/{item_id} - Remove line
///
/// - Checkout:
///   - GET  /api/v1/checkout - Cart review
///   - POST /api/v1/payment/start - Validate shipping, create intent
///   - POST /api/v1/payment/verify - Programmatic verification (JSON)
///   - GET  /payment/callback - Browser verification (redirect)
///
/// - Orders:
///   - GET /api/v1/orders - Paginated history, newest first
///
/// - Static pages:
///   - GET /order/success, GET /order/error
pub fn create_router(state: AppState) -> Router {
    // CORS is wide open; the session layer in front scopes origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        .route("/cart", get(handlers::view_cart))
        .route("/cart/items", post(handlers::add_to_cart))
        .route(
            "/cart/items/{item_id}",
            post(handlers::update_cart_item).delete(handlers::remove_cart_item),
        )
        .route("/checkout", get(handlers::checkout_review))
        .route("/payment/start", post(handlers::start_payment))
        .route("/payment/verify", post(handlers::verify_payment))
        .route("/orders", get(handlers::list_orders));

    let order_pages = Router::new()
        .route("/success", get(handlers::order_success))
        .route("/error", get(handlers::order_error));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // Browser callback lives outside /api: the gateway redirects here
        .route("/payment/callback", get(handlers::payment_callback))
        .nest("/order", order_pages)
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shop_core::{
        LoggingNotifier, PaymentCapture, PaymentGateway, PaymentIntent, PaymentMethod, Product,
        ProductCatalog, ShopError, ShopResult,
    };
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::sync::Mutex;
    use tower::ServiceExt;
    use uuid::Uuid;

    const GOOD_SIGNATURE: &str = "valid-signature";

    #[derive(Default)]
    struct MockGateway {
        notes: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_intent(
            &self,
            amount_minor: i64,
            _currency: &str,
            notes: &HashMap<String, String>,
        ) -> ShopResult<PaymentIntent> {
            *self.notes.lock().unwrap() = notes.clone();
            Ok(PaymentIntent {
                intent_id: "order_test_1".to_string(),
                amount_minor,
                currency: "INR".to_string(),
                created_at: Utc::now(),
            })
        }

        fn verify_signature(&self, _i: &str, _p: &str, signature: &str) -> ShopResult<()> {
            if signature == GOOD_SIGNATURE {
                Ok(())
            } else {
                Err(ShopError::SignatureInvalid("mismatch".to_string()))
            }
        }

        async fn fetch_intent_notes(&self, _i: &str) -> ShopResult<HashMap<String, String>> {
            Ok(self.notes.lock().unwrap().clone())
        }

        async fn fetch_payment(&self, payment_id: &str) -> ShopResult<PaymentCapture> {
            Ok(PaymentCapture {
                payment_id: payment_id.to_string(),
                method: PaymentMethod::Upi {
                    vpa: "asha@upi".to_string(),
                },
                email: None,
                contact: None,
                raw: None,
            })
        }

        fn key_id(&self) -> &str {
            "rzp_test_key"
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }

    fn test_app() -> Router {
        let mut catalog = ProductCatalog::new();
        catalog
            .add(Product {
                id: "pA".into(),
                name: "Product A".into(),
                price: Decimal::from_str("10.00").unwrap(),
                quantity_on_hand: 10,
                sub_category_id: "s".into(),
                image_url: None,
            })
            .unwrap();

        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            base_url: "http://localhost:8080".into(),
            environment: "test".into(),
        };

        let state = AppState::with_parts(
            config,
            Arc::new(catalog),
            Arc::new(MockGateway::default()),
            Arc::new(LoggingNotifier),
        );
        create_router(state)
    }

    fn json_request(method: Method, uri: &str, user: Option<Uuid>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_products_listing() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(
                Request::get("/api/v1/products?q=product&sort=name_asc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::get("/api/v1/products/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cart_requires_auth() {
        let app = test_app();
        let response = app
            .oneshot(Request::get("/api/v1/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_checkout_review_empty_cart_conflict() {
        let app = test_app();
        let user = Uuid::new_v4();
        let response = app
            .oneshot(json_request(Method::GET, "/api/v1/checkout", Some(user), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    async fn seed_cart_and_start(app: &Router, user: Uuid) {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/cart/items",
                Some(user),
                r#"{"product_id": "pA"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let shipping = r#"{
            "first_name": "Asha", "last_name": "Rao",
            "email": "asha@example.com", "phone": "9876543210",
            "address": "12 MG Road", "city": "Bengaluru",
            "state": "Karnataka", "zipcode": "560001"
        }"#;
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/payment/start",
                Some(user),
                shipping,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_browser_callback_redirects() {
        let app = test_app();
        let user = Uuid::new_v4();
        seed_cart_and_start(&app, user).await;

        // Sessionless browser callback with gateway param names
        let uri = format!(
            "/payment/callback?razorpay_order_id=order_test_1&razorpay_payment_id=pay_1&razorpay_signature={GOOD_SIGNATURE}"
        );
        let response = app
            .clone()
            .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/order/success");

        // Replay lands on the error page, no second order
        let response = app
            .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/order/error");
    }

    #[tokio::test]
    async fn test_programmatic_verify_bad_signature() {
        let app = test_app();
        let user = Uuid::new_v4();
        seed_cart_and_start(&app, user).await;

        let body = r#"{"intent_id": "order_test_1", "payment_id": "pay_1", "signature": "forged"}"#;
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/payment/verify",
                Some(user),
                body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_start_payment_validation_error() {
        let app = test_app();
        let user = Uuid::new_v4();

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/cart/items",
                Some(user),
                r#"{"product_id": "pA"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bad_shipping = r#"{
            "first_name": "Asha", "last_name": "Rao",
            "email": "asha@example.com", "phone": "12",
            "address": "12 MG Road", "city": "Bengaluru",
            "state": "Karnataka", "zipcode": "560001"
        }"#;
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/payment/start",
                Some(user),
                bad_shipping,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
