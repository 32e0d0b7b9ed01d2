//! Request identity.
//!
//! Authentication happens upstream. The fronting proxy names the
//! authenticated account in a trusted header; [`identity_middleware`]
//! turns that header into an [`AuthenticatedAccount`] request extension
//! which handlers read through the [`Identity`] extractor.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderName, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use ep_model::AccountId;

/// The account a request was authenticated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedAccount(pub AccountId);

/// Header carrying the authenticated account id.
#[derive(Debug, Clone)]
pub struct IdentityHeader(pub HeaderName);

/// Middleware that reads the identity header into request extensions.
///
/// Requests without the header pass through anonymously. A header that
/// is not an account id is rejected with `401 Unauthorized`.
pub async fn identity_middleware(
    State(header): State<IdentityHeader>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(value) = request.headers().get(&header.0) else {
        return next.run(request).await;
    };

    match value.to_str().ok().and_then(|v| v.parse::<AccountId>().ok()) {
        Some(id) => {
            request.extensions_mut().insert(AuthenticatedAccount(id));
            next.run(request).await
        }
        None => (StatusCode::UNAUTHORIZED, "Invalid identity header").into_response(),
    }
}

/// Extractor yielding the authenticated account id, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub Option<AccountId>);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<AuthenticatedAccount>()
                .map(|auth| auth.0),
        ))
    }
}
