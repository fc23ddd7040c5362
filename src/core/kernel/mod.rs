/// Entity Server kernel - signing, packet decoding and the request path
///
/// The kernel holds everything between a public entity operation and the
/// wire. It knows nothing about entities or transactions; it only turns
/// `(method, path, body, extra headers)` into response text.
///
/// # Architecture
///
/// ## Authentication
/// - `Signer`: Pluggable authentication interface
/// - `HmacSigner`: HMAC-SHA256 over `method|path|timestamp|nonce|body`
///
/// ## Packet Handling
/// - `PacketCodec`: XChaCha20-Poly1305 packet decryption keyed by `SHA-256(hmac_secret)`
/// - `ResponseBody`: `Plain` / `Encrypted` decision made once per response
///
/// ## Transport
/// - `HttpTransport`: Pluggable send-and-read-all interface
/// - `ReqwestTransport`: reqwest implementation with connect and read timeouts
/// - `RequestExecutor`: The one call path every operation funnels through
///
/// # Usage
/// ```rust,no_run
/// use entity_server_client::core::kernel::*;
/// use reqwest::Method;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RestClientConfig::new("http://localhost:47200".to_string()).with_timeout_ms(5_000);
/// let transport = ReqwestTransport::new(&config)?;
/// let signer = Arc::new(HmacSigner::new("api-key".to_string(), "secret".to_string()));
/// let executor = RequestExecutor::new(
///     config.base_url.clone(),
///     transport,
///     signer,
///     PacketCodec::new("secret", 4),
/// );
///
/// let json = executor
///     .execute(Method::GET, "/v1/entity/account/1", None, &[])
///     .await?;
/// println!("{json}");
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod rest;
pub mod signer;

// Re-export key types for convenience
pub use codec::{PacketCodec, ResponseBody};
pub use rest::{
    HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, RequestExecutor, RestClientConfig,
};
pub use signer::{HmacSigner, SignatureResult, Signer};
