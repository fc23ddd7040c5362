use crate::core::errors::EntityError;
use crate::core::kernel::codec::{PacketCodec, ResponseBody, CONTENT_TYPE_JSON};
use crate::core::kernel::signer::Signer;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_TRANSACTION_ID: &str = "X-Transaction-ID";

/// A fully built, signed request ready for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// `None` when the request carries no body
    pub body: Option<String>,
}

impl HttpRequest {
    /// Look up a header value, ignoring name case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response as read off the wire, before any decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// HTTP transport trait
///
/// Sends one request and reads the whole body back, for success and error
/// statuses alike. Status interpretation belongs to [`RequestExecutor`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, EntityError>;
}

/// Configuration for the REST transport
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API, without a trailing slash
    pub base_url: String,
    /// Connect and total request timeout in milliseconds
    pub timeout_ms: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            timeout_ms: crate::core::config::DEFAULT_TIMEOUT_MS,
            user_agent: format!("entity-server-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the request timeout
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Implementation of `HttpTransport` using reqwest
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &RestClientConfig) -> Result<Self, EntityError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, EntityError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// The single call path every entity operation goes through
///
/// Each call mints a fresh timestamp and nonce, signs, sends, decrypts the
/// body when the server framed it as a packet, and maps statuses >= 400 to
/// [`EntityError::ApiError`]. Bodies are returned as opaque JSON text.
pub struct RequestExecutor<T: HttpTransport> {
    base_url: String,
    transport: T,
    signer: Arc<dyn Signer>,
    codec: PacketCodec,
}

impl<T: HttpTransport> std::fmt::Debug for RequestExecutor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.base_url)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl<T: HttpTransport> RequestExecutor<T> {
    pub fn new(base_url: String, transport: T, signer: Arc<dyn Signer>, codec: PacketCodec) -> Self {
        Self {
            base_url,
            transport,
            signer,
            codec,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sign and send one request, returning the response body as text
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - Path including query string; this exact string is signed
    /// * `body` - JSON body, `None` for none
    /// * `extra_headers` - Additional headers such as `X-Transaction-ID`
    #[instrument(skip(self, body, extra_headers), fields(method = %method, path = %path))]
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&str>,
        extra_headers: &[(&str, &str)],
    ) -> Result<String, EntityError> {
        let body = body.unwrap_or_default();
        let timestamp = unix_timestamp()?.to_string();
        let nonce = Uuid::new_v4().to_string();

        let auth_headers = self
            .signer
            .sign_request(method.as_str(), path, &timestamp, &nonce, body)?;

        let mut headers = Vec::with_capacity(1 + auth_headers.len() + extra_headers.len());
        headers.push((HEADER_CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string()));
        headers.extend(auth_headers);
        headers.extend(
            extra_headers
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string())),
        );

        let request = HttpRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            headers,
            body: (!body.is_empty()).then(|| body.to_string()),
        };

        debug!(has_body = request.body.is_some(), "Dispatching request");
        let response = self.transport.send(request).await?;

        let status = response.status;
        let payload = ResponseBody::classify(response.content_type.as_deref(), response.body);
        debug!(status, encrypted = payload.is_encrypted(), "Received response");

        let text = payload.into_text(&self.codec)?;
        trace!("Response body: {}", text);

        if status >= 400 {
            warn!(status, "Entity server returned an error status");
            return Err(EntityError::ApiError {
                status,
                message: text,
            });
        }

        Ok(text)
    }
}

/// Current unix time in whole seconds
fn unix_timestamp() -> Result<u64, EntityError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| EntityError::AuthError(format!("System time error: {}", e)))
}
