//! Request extractors for the caller's identity.
//!
//! [`Caller`] is the principal established by the identity middleware. Handlers that take a `Caller` reject anonymous
//! requests with a 401. [`CartCaller`] additionally accepts guests carrying an `x-guest-token` header.
use std::{
    future::{ready, Ready},
    ops::Deref,
};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use megacart_engine::db_types::{CartOwner, Principal, Role};

use crate::errors::{AuthError, ServerError};

pub const GUEST_TOKEN_HEADER: &str = "x-guest-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Principal);

impl Deref for Caller {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Caller {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().copied();
        ready(principal.map(Caller).ok_or(ServerError::AuthenticationError(AuthError::MissingPrincipal)))
    }
}

/// Whoever owns the cart being worked on: a signed-in buyer, or a guest identified by their token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartCaller(pub CartOwner);

impl FromRequest for CartCaller {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().copied();
        let result = match principal {
            Some(p) if p.role == Role::Buyer => Ok(CartCaller(CartOwner::Buyer(p.id))),
            Some(p) => Err(ServerError::InsufficientPermissions(format!("{p} cannot hold a shopping cart"))),
            None => guest_token(req).map(|t| CartCaller(CartOwner::Guest(t))),
        };
        ready(result)
    }
}

pub fn guest_token(req: &HttpRequest) -> Result<String, ServerError> {
    req.headers()
        .get(GUEST_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ServerError::AuthenticationError(AuthError::MissingGuestToken))
}
