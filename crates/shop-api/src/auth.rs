//! # Auth Boundary
//!
//! Session machinery is external to this service: the fronting session
//! layer authenticates the user and forwards the user id in the
//! `x-user-id` header. Two extractors cover the two cases checkout needs:
//! user-scoped routes require a user, the payment callback must also work
//! when the session was lost on redirect.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shop_core::{ShopError, UserId};
use uuid::Uuid;

const USER_HEADER: &str = "x-user-id";

fn user_from_parts(parts: &Parts) -> Option<UserId> {
    parts
        .headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// Authenticated user; rejects with `AuthenticationRequired` when absent
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = crate::handlers::ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts)
            .map(AuthUser)
            .ok_or_else(|| ShopError::AuthenticationRequired.into())
    }
}

/// Possibly-authenticated user; never rejects. Used by the payment
/// verification endpoints, which must accept sessionless callbacks.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<UserId>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(user_from_parts(parts)))
    }
}
