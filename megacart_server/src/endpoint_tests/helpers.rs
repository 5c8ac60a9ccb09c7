use actix_web::{
    http::{Method, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use log::debug;
use megacart_engine::db_types::Principal;
use serde_json::Value;

use crate::{
    auth::GUEST_TOKEN_HEADER,
    config::IdentityConfig,
    helpers::{calculate_hmac, principal_header},
    middleware::{IdentityMiddlewareFactory, PRINCIPAL_HEADER, PRINCIPAL_SIGNATURE_HEADER},
};

// Only ever used to sign principals in these tests
pub const TEST_IDENTITY_SECRET: &str = "endpoint-test-identity-secret";

/// Who is making a test request, and how.
#[derive(Debug, Clone)]
pub enum As {
    Anonymous,
    Signed(Principal),
    Forged(Principal),
    Guest(&'static str),
}

pub fn identity_config() -> IdentityConfig {
    IdentityConfig::new(TEST_IDENTITY_SECRET, true)
}

pub fn sign(principal: &Principal) -> (String, String) {
    let header = principal_header(principal);
    let signature = calculate_hmac(TEST_IDENTITY_SECRET, header.as_bytes());
    (header, signature)
}

pub async fn send(
    method: Method,
    path: &str,
    who: As,
    body: Option<Value>,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::default().method(method).uri(path);
    match who {
        As::Anonymous => {},
        As::Signed(p) => {
            let (header, signature) = sign(&p);
            req = req.insert_header((PRINCIPAL_HEADER, header)).insert_header((PRINCIPAL_SIGNATURE_HEADER, signature));
        },
        As::Forged(p) => {
            let header = principal_header(&p);
            let signature = calculate_hmac("not-the-identity-secret", header.as_bytes());
            req = req.insert_header((PRINCIPAL_HEADER, header)).insert_header((PRINCIPAL_SIGNATURE_HEADER, signature));
        },
        As::Guest(token) => {
            req = req.insert_header((GUEST_TOKEN_HEADER, token));
        },
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    let app = App::new().wrap(IdentityMiddlewareFactory::new(identity_config())).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

pub async fn get_request(path: &str, who: As, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    send(Method::GET, path, who, None, configure).await
}
