//! HMAC-SHA256 payload signing.
//!
//! The signature covers the exact bytes placed in the request body and is
//! sent as `X-Hub-Signature-256: sha256=<hex>`, the scheme receivers of
//! GitHub- and Meta-style webhooks already know how to verify.

use hmac::{Hmac, Mac};
use http::HeaderValue;
use sha2::Sha256;

use super::SignError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Computes the hex-encoded HMAC-SHA256 of `body` keyed with `secret`.
///
/// # Errors
///
/// Returns [`SignError::InvalidKey`] if the key is rejected by the MAC.
///
/// # Example
///
/// ```
/// use wa_relay::webhook::sign;
///
/// let signature = sign(b"what do ya want for nothing?", b"Jefe").unwrap();
/// assert_eq!(
///     signature,
///     "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
/// );
/// ```
pub fn sign(body: &[u8], secret: &[u8]) -> Result<String, SignError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| SignError::InvalidKey(e.to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a signature produced by [`sign`] in constant time.
///
/// Accepts the bare hex digest or the full `sha256=<hex>` header value.
#[must_use]
pub fn verify(body: &[u8], secret: &[u8], signature: &str) -> bool {
    let hex_digest = signature.strip_prefix(SIGNATURE_PREFIX).unwrap_or(signature);
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Builds the `X-Hub-Signature-256` header value for a hex signature.
///
/// # Errors
///
/// Returns [`SignError::InvalidHeader`] if the signature contains bytes
/// that are not allowed in a header.
pub fn header_value(signature: &str) -> Result<HeaderValue, SignError> {
    Ok(HeaderValue::try_from(format!("{SIGNATURE_PREFIX}{signature}"))?)
}
