#![allow(dead_code)]

use async_trait::async_trait;
use entity_server_client::core::kernel::{
    codec::{CONTENT_TYPE_JSON, CONTENT_TYPE_OCTET_STREAM},
    HttpRequest, HttpResponse, HttpTransport, PacketCodec,
};
use entity_server_client::{ClientConfig, EntityError, EntityServerBuilder, EntityServerClient};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::VecDeque;
use std::sync::Mutex;

pub const BASE_URL: &str = "http://x";
pub const API_KEY: &str = "k";
pub const HMAC_SECRET: &str = "s";
pub const MAGIC_LEN: usize = 4;

/// In-process transport that records every request and replays queued responses
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<HttpResponse>>,
}

impl RecordingTransport {
    pub fn with_responses(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, EntityError> {
        self.requests.lock().unwrap().push(request);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| json_response(200, r#"{"ok":true}"#)))
    }
}

pub fn json_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        content_type: Some(format!("{}; charset=utf-8", CONTENT_TYPE_JSON)),
        body: body.as_bytes().to_vec(),
    }
}

pub fn encrypted_response(status: u16, plaintext: &str) -> HttpResponse {
    let codec = PacketCodec::new(HMAC_SECRET, MAGIC_LEN);
    let body = codec
        .seal(b"ESV1", &[0x5A; 24], plaintext.as_bytes())
        .unwrap();
    HttpResponse {
        status,
        content_type: Some(CONTENT_TYPE_OCTET_STREAM.to_string()),
        body,
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new(
        BASE_URL.to_string(),
        API_KEY.to_string(),
        HMAC_SECRET.to_string(),
    )
    .with_magic_len(MAGIC_LEN)
}

pub fn client_with(
    responses: impl IntoIterator<Item = HttpResponse>,
) -> EntityServerClient<RecordingTransport> {
    EntityServerBuilder::new(test_config())
        .build_with_transport(RecordingTransport::with_responses(responses))
        .unwrap()
}

/// Client whose transport answers every call with `{"ok":true}`
pub fn default_client() -> EntityServerClient<RecordingTransport> {
    client_with(Vec::<HttpResponse>::new())
}

pub fn expected_signature(method: &str, path: &str, timestamp: &str, nonce: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(HMAC_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}|{}|{}|{}|{}", method, path, timestamp, nonce, body).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Recompute the signature from the request's own headers and compare
pub fn assert_signed(request: &HttpRequest, path: &str) {
    let timestamp = request.header("X-Timestamp").expect("missing X-Timestamp");
    let nonce = request.header("X-Nonce").expect("missing X-Nonce");
    let body = request.body.as_deref().unwrap_or("");
    assert_eq!(
        request.header("X-Signature"),
        Some(
            expected_signature(request.method.as_str(), path, timestamp, nonce, body).as_str()
        ),
        "signature mismatch for {} {}",
        request.method,
        path
    );
}
