//! # Request Handlers
//!
//! Axum request handlers for the storefront API.
//!
//! Payment verification deliberately has two entry points instead of one
//! header-sniffing handler: `verify_payment` answers JSON for programmatic
//! callers, `payment_callback` answers a redirect for the browser channel.
//! Both run the same orchestrator path.

use crate::auth::{AuthUser, MaybeUser};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use shop_core::{
    CartView, PaymentCallback, ProductQuery, QuantityAction, ShippingForm, ShopError,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

// =============================================================================
// Error plumbing
// =============================================================================

/// Error payload returned to API callers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    /// Set for field-level validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Wrapper that turns `ShopError` into an HTTP response
#[derive(Debug)]
pub struct ApiError(pub ShopError);

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.status_code();
        let field = match &self.0 {
            ShopError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.0.user_message(),
            code,
            field,
        };
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Product listing query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    /// Case-insensitive name substring
    pub q: Option<String>,
    pub min_price: Option<rust_decimal::Decimal>,
    pub max_price: Option<rust_decimal::Decimal>,
    #[serde(default)]
    pub sort: shop_core::ProductSort,
    pub page: Option<u32>,
}

impl From<ProductListParams> for ProductQuery {
    fn from(params: ProductListParams) -> Self {
        ProductQuery {
            name_contains: params.q,
            min_price: params.min_price,
            max_price: params.max_price,
            sort: params.sort,
            page: params.page,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub action: QuantityAction,
}

/// Payment confirmation fields, from POST body or query string.
/// Accepts both our field names and the gateway's `razorpay_*` names.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(alias = "razorpay_order_id")]
    pub intent_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

impl From<CallbackParams> for PaymentCallback {
    fn from(params: CallbackParams) -> Self {
        PaymentCallback {
            intent_id: params.intent_id,
            payment_id: params.payment_id,
            signature: params.signature,
        }
    }
}

/// Success payload for the programmatic verification channel
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: &'static str,
    pub order_id: Uuid,
    pub redirect: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "shop-cart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List products with filter/sort/pagination
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> impl IntoResponse {
    let page = state.catalog.search(&params.into());
    Json(page)
}

/// Get single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .catalog
        .get(&product_id)
        .ok_or(ShopError::ProductNotFound {
            product_id: product_id.clone(),
        })?;
    Ok(Json(product.clone()))
}

/// View the cart; totals are recomputed and re-cached on every view
pub async fn view_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(state.carts.view(user, &state.catalog)?))
}

/// Add one unit of a product (increments an existing line)
#[instrument(skip(state), fields(user = %user))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>, ApiError> {
    let product = state
        .catalog
        .get(&request.product_id)
        .ok_or(ShopError::ProductNotFound {
            product_id: request.product_id.clone(),
        })?;

    state.carts.add_item(user, product)?;
    Ok(Json(state.carts.view(user, &state.catalog)?))
}

/// Increment/decrement a cart line (decrement at quantity 1 is a no-op)
pub async fn update_cart_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<CartView>, ApiError> {
    state.carts.adjust_quantity(user, item_id, request.action)?;
    Ok(Json(state.carts.view(user, &state.catalog)?))
}

/// Remove a cart line
pub async fn remove_cart_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<CartView>, ApiError> {
    state.carts.remove_item(user, item_id)?;
    Ok(Json(state.carts.view(user, &state.catalog)?))
}

/// Checkout review: live totals, or 409 for an empty cart
pub async fn checkout_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(state.checkout.review(user)?))
}

/// Start the payment flow: validate shipping, create the gateway intent
#[instrument(skip(state, form), fields(user = %user))]
pub async fn start_payment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(form): Json<ShippingForm>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.checkout.start_payment(user, &form).await?;
    info!(intent_id = %response.intent_id, "payment started");
    Ok(Json(response))
}

/// Programmatic verification channel: JSON in, JSON out
#[instrument(skip(state, params), fields(intent_id = %params.intent_id))]
pub async fn verify_payment(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(params): Json<CallbackParams>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let callback = PaymentCallback::from(params);
    let verified = state.checkout.verify_payment(user, &callback).await?;

    Ok(Json(VerifyResponse {
        status: "ok",
        order_id: verified.order_id,
        redirect: verified.redirect_to,
    }))
}

/// Browser verification channel: query parameters in, redirect out.
/// Netbanking-style redirects may arrive without a session; the
/// orchestrator recovers the user from intent metadata.
#[instrument(skip(state, params), fields(intent_id = %params.intent_id))]
pub async fn payment_callback(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let callback = PaymentCallback::from(params);
    match state.checkout.verify_payment(user, &callback).await {
        Ok(verified) => Redirect::to(&verified.redirect_to),
        Err(e) => {
            error!("payment callback rejected: {e}");
            Redirect::to(state.checkout.error_redirect())
        }
    }
}

/// Paginated order history, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    Json(state.orders.list_for_user(user, params.page.unwrap_or(1)))
}

/// Order success page
pub async fn order_success() -> impl IntoResponse {
    Html(
        r#"
<!DOCTYPE html>
<html>
<head><title>Order Confirmed</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0;">
    <div style="padding: 60px; border-radius: 16px; text-align: center; border: 1px solid #ddd;">
        <div style="font-size: 60px;">&#9989;</div>
        <h1>Order Confirmed</h1>
        <p style="color: #666;">Your payment was verified and your order is on its way.</p>
    </div>
</body>
</html>
"#,
    )
}

/// Order error page
pub async fn order_error() -> impl IntoResponse {
    Html(
        r#"
<!DOCTYPE html>
<html>
<head><title>Payment Failed</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0;">
    <div style="padding: 60px; border-radius: 16px; text-align: center; border: 1px solid #ddd;">
        <div style="font-size: 60px;">&#10060;</div>
        <h1>Payment Failed</h1>
        <p style="color: #666;">Payment could not be verified. If you were charged, contact support.</p>
    </div>
</body>
</html>
"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_carries_field_for_validation() {
        let response = ApiError(ShopError::validation("zipcode", "must be 6 digits"));
        let ShopError::Validation { ref field, .. } = response.0 else {
            panic!("expected validation");
        };
        assert_eq!(field, "zipcode");
        assert_eq!(response.0.status_code(), 422);
    }

    #[test]
    fn test_callback_params_accept_gateway_names() {
        let json = r#"{
            "razorpay_order_id": "order_1",
            "razorpay_payment_id": "pay_1",
            "razorpay_signature": "sig"
        }"#;
        let params: CallbackParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.intent_id, "order_1");

        let json = r#"{"intent_id": "order_2", "payment_id": "pay_2", "signature": "s"}"#;
        let params: CallbackParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.intent_id, "order_2");
    }
}
