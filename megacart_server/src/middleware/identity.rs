//! Identity middleware for Actix Web.
//!
//! MegaCart does not authenticate users itself. An upstream identity service sets the `x-principal` header to
//! `{role}:{id}` and signs that exact value with HMAC-SHA256, hex-encoded in `x-principal-signature`.
//!
//! This middleware checks the signature and, if it is valid, stores the [`Principal`] in the request extensions,
//! where the [`crate::auth::Caller`] extractor picks it up. Requests without an `x-principal` header pass through
//! untouched; routes that need a caller reject them when extracting it.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use megacart_engine::db_types::Principal;

use crate::{
    config::IdentityConfig,
    errors::{AuthError, ServerError},
    helpers::{parse_principal, verify_hmac},
};

pub const PRINCIPAL_HEADER: &str = "x-principal";
pub const PRINCIPAL_SIGNATURE_HEADER: &str = "x-principal-signature";

pub struct IdentityMiddlewareFactory {
    config: IdentityConfig,
}

impl IdentityMiddlewareFactory {
    pub fn new(config: IdentityConfig) -> Self {
        IdentityMiddlewareFactory { config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = IdentityMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService { config: self.config.clone(), service: Rc::new(service) }))
    }
}

pub struct IdentityMiddlewareService<S> {
    config: IdentityConfig,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let result = identify(&req, &self.config);
        Box::pin(async move {
            match result {
                Ok(Some(principal)) => {
                    trace!("🔐️ Request made by {principal}");
                    req.extensions_mut().insert(principal);
                    service.call(req).await
                },
                Ok(None) => {
                    trace!("🔐️ Anonymous request");
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Rejecting request to {}. {e}", req.path());
                    Err(ServerError::AuthenticationError(e).into())
                },
            }
        })
    }
}

fn identify(req: &ServiceRequest, config: &IdentityConfig) -> Result<Option<Principal>, AuthError> {
    let Some(value) = req.headers().get(PRINCIPAL_HEADER) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|e| AuthError::PoorlyFormattedPrincipal(format!("Header is not valid text. {e}")))?;
    if config.signature_checks {
        let signature = req
            .headers()
            .get(PRINCIPAL_SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AuthError::ValidationError("No principal signature found.".into()))?;
        if !verify_hmac(config.secret.reveal(), value.as_bytes(), signature) {
            return Err(AuthError::ValidationError("Signature does not match.".into()));
        }
        trace!("🔐️ Principal signature check ✅️");
    } else {
        trace!("🔐️ Principal signature checks are disabled. Trusting the header as is.");
    }
    parse_principal(value).map(Some)
}
