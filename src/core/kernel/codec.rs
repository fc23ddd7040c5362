//! Encrypted response packets
//!
//! When the server answers with `application/octet-stream`, the body is a
//! packet framed as:
//!
//! ```text
//! [ magic (magic_len) | nonce (24) | ciphertext || tag (16) ]
//! ```
//!
//! sealed with XChaCha20-Poly1305 under `SHA-256(hmac_secret)` and no
//! associated data. The magic prefix is skipped by offset, never inspected.

use crate::core::errors::EntityError;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const PACKET_KEY_LEN: usize = 32;
pub const PACKET_NONCE_LEN: usize = 24;
pub const PACKET_TAG_LEN: usize = 16;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct PacketKey([u8; PACKET_KEY_LEN]);

impl PacketKey {
    fn derive(hmac_secret: &str) -> Self {
        let digest = Sha256::digest(hmac_secret.as_bytes());
        let mut key = [0u8; PACKET_KEY_LEN];
        key.copy_from_slice(&digest);
        Self(key)
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new((&self.0).into())
    }
}

/// Decoder for encrypted response packets
#[derive(Clone)]
pub struct PacketCodec {
    key: PacketKey,
    magic_len: usize,
}

impl std::fmt::Debug for PacketCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketCodec")
            .field("magic_len", &self.magic_len)
            .finish_non_exhaustive()
    }
}

impl PacketCodec {
    pub fn new(hmac_secret: &str, magic_len: usize) -> Self {
        Self {
            key: PacketKey::derive(hmac_secret),
            magic_len,
        }
    }

    pub const fn magic_len(&self) -> usize {
        self.magic_len
    }

    /// Smallest well-formed packet: magic, nonce and an empty-plaintext tag
    ///
    /// `None` when `magic_len` is so large that no packet can be framed.
    pub const fn min_packet_len(&self) -> Option<usize> {
        self.magic_len.checked_add(PACKET_NONCE_LEN + PACKET_TAG_LEN)
    }

    /// Decrypt a packet into the JSON text it carries
    pub fn decode(&self, raw: &[u8]) -> Result<String, EntityError> {
        let expected = self.min_packet_len().unwrap_or(usize::MAX);
        if raw.len() < expected {
            return Err(EntityError::MalformedPacket {
                expected,
                actual: raw.len(),
            });
        }

        let nonce_end = self.magic_len + PACKET_NONCE_LEN;
        let nonce = XNonce::from_slice(&raw[self.magic_len..nonce_end]);
        let ciphertext = &raw[nonce_end..];

        let plaintext = self
            .key
            .cipher()
            .decrypt(nonce, ciphertext)
            .map_err(EntityError::DecryptionFailed)?;

        Ok(String::from_utf8(plaintext)?)
    }

    /// Frame and encrypt `plaintext` the way the server does
    ///
    /// `magic` must be exactly `magic_len` bytes.
    pub fn seal(
        &self,
        magic: &[u8],
        nonce: &[u8; PACKET_NONCE_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, EntityError> {
        if magic.len() != self.magic_len {
            return Err(EntityError::MalformedPacket {
                expected: self.magic_len,
                actual: magic.len(),
            });
        }

        let ciphertext = self
            .key
            .cipher()
            .encrypt(XNonce::from_slice(nonce), plaintext)
            .map_err(EntityError::EncryptionFailed)?;

        let mut packet = Vec::with_capacity(magic.len() + PACKET_NONCE_LEN + ciphertext.len());
        packet.extend_from_slice(magic);
        packet.extend_from_slice(nonce);
        packet.extend_from_slice(&ciphertext);
        Ok(packet)
    }
}

/// A response body, classified once by its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Plain(String),
    Encrypted(Vec<u8>),
}

impl ResponseBody {
    pub fn classify(content_type: Option<&str>, body: Vec<u8>) -> Self {
        if content_type.is_some_and(is_octet_stream) {
            Self::Encrypted(body)
        } else {
            Self::Plain(String::from_utf8_lossy(&body).into_owned())
        }
    }

    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }

    pub fn into_text(self, codec: &PacketCodec) -> Result<String, EntityError> {
        match self {
            Self::Plain(text) => Ok(text),
            Self::Encrypted(bytes) => codec.decode(&bytes),
        }
    }
}

fn is_octet_stream(content_type: &str) -> bool {
    content_type
        .to_ascii_lowercase()
        .contains(CONTENT_TYPE_OCTET_STREAM)
}
