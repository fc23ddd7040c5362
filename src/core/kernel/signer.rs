use crate::core::errors::EntityError;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::collections::HashMap;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_API_KEY: &str = "X-API-Key";
pub const HEADER_TIMESTAMP: &str = "X-Timestamp";
pub const HEADER_NONCE: &str = "X-Nonce";
pub const HEADER_SIGNATURE: &str = "X-Signature";

/// Result type for signing operations: authentication headers to attach
pub type SignatureResult = Result<HashMap<String, String>, EntityError>;

/// Signer trait for request authentication
///
/// Implementations turn one request envelope into the headers the server
/// verifies. The executor mints `timestamp` and `nonce` fresh for every call
/// and hands them in, so signers stay pure.
pub trait Signer: Send + Sync {
    /// Sign a request and return the authentication headers
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `path` - Request path including any query string
    /// * `timestamp` - Unix seconds as a decimal string
    /// * `nonce` - Unique per-request token
    /// * `body` - Request body, empty string when there is none
    fn sign_request(
        &self,
        method: &str,
        path: &str,
        timestamp: &str,
        nonce: &str,
        body: &str,
    ) -> SignatureResult;
}

/// HMAC-SHA256 signer for the Entity Server
///
/// The signed payload is `method|path|timestamp|nonce|body`; field order and
/// separator are part of the wire contract.
pub struct HmacSigner {
    api_key: Secret<String>,
    hmac_secret: Secret<String>,
}

impl HmacSigner {
    pub fn new(api_key: String, hmac_secret: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            hmac_secret: Secret::new(hmac_secret),
        }
    }

    /// Compute the lowercase-hex signature for one request
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        timestamp: &str,
        nonce: &str,
        body: &str,
    ) -> Result<String, EntityError> {
        let payload = signing_payload(method, path, timestamp, nonce, body);

        let mut mac = HmacSha256::new_from_slice(self.hmac_secret.expose_secret().as_bytes())
            .map_err(|e| EntityError::AuthError(format!("Failed to create HMAC: {}", e)))?;
        mac.update(payload.as_bytes());

        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl Signer for HmacSigner {
    fn sign_request(
        &self,
        method: &str,
        path: &str,
        timestamp: &str,
        nonce: &str,
        body: &str,
    ) -> SignatureResult {
        let signature = self.sign(method, path, timestamp, nonce, body)?;

        let mut headers = HashMap::new();
        headers.insert(
            HEADER_API_KEY.to_string(),
            self.api_key.expose_secret().clone(),
        );
        headers.insert(HEADER_TIMESTAMP.to_string(), timestamp.to_string());
        headers.insert(HEADER_NONCE.to_string(), nonce.to_string());
        headers.insert(HEADER_SIGNATURE.to_string(), signature);

        Ok(headers)
    }
}

#[must_use]
pub fn signing_payload(method: &str, path: &str, timestamp: &str, nonce: &str, body: &str) -> String {
    [method, path, timestamp, nonce, body].join("|")
}
