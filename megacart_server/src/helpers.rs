use hmac::{Hmac, Mac};
use megacart_engine::db_types::{Principal, Role};
use sha2::Sha256;

use crate::errors::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `data` under `secret`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    // HMAC accepts keys of any length, so this never fails
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::default(),
    };
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a hex-encoded HMAC in constant time.
pub fn verify_hmac(secret: &str, data: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(data);
            mac.verify_slice(&expected).is_ok()
        },
        Err(_) => false,
    }
}

/// Parses an `x-principal` header value of the form `{role}:{id}`, e.g. `vendor:12`.
pub fn parse_principal(value: &str) -> Result<Principal, AuthError> {
    let (role, id) = value
        .trim()
        .split_once(':')
        .ok_or_else(|| AuthError::PoorlyFormattedPrincipal(format!("Expected role:id, got '{value}'")))?;
    let role = role.parse::<Role>().map_err(|e| AuthError::PoorlyFormattedPrincipal(e.to_string()))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|e| AuthError::PoorlyFormattedPrincipal(format!("Invalid principal id '{id}'. {e}")))?;
    Ok(Principal::new(id, role))
}

/// The canonical header value for a principal. This is what the identity service signs.
pub fn principal_header(principal: &Principal) -> String {
    format!("{}:{}", principal.role.to_string().to_lowercase(), principal.id)
}
