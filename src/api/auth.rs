//! Request signing: Ed25519 over `timestamp || method || path || body`.

use std::path::PathBuf;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use tracing::error;

use crate::error::AuthError;

pub const TIMESTAMP_HEADER: &str = "RH-Timestamp";
pub const SIGNATURE_HEADER: &str = "RH-Signature";

/// Where the private key comes from. Exactly one source is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// PKCS#8 PEM text.
    Pem(String),
    /// Path to a PKCS#8 PEM file.
    Path(PathBuf),
}

impl KeySource {
    pub fn from_options(pem: Option<String>, path: Option<PathBuf>) -> Result<Self, AuthError> {
        match (pem, path) {
            (Some(pem), None) => Ok(KeySource::Pem(pem)),
            (None, Some(path)) => Ok(KeySource::Path(path)),
            (Some(_), Some(_)) => Err(AuthError::Configuration(
                "provide either a private key or a private key path, not both".to_string(),
            )),
            (None, None) => Err(AuthError::Configuration(
                "either a private key or a private key path must be provided".to_string(),
            )),
        }
    }
}

/// Headers for one request. Built fresh per call; reusing one would allow replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub timestamp: String,
    pub method: String,
    pub path: String,
    pub body: Option<String>,
    pub signature: String,
}

impl SignedHeaders {
    /// The exact string that was signed.
    pub fn message(&self) -> String {
        signing_message(&self.timestamp, &self.method, &self.path, self.body.as_deref())
    }

    pub fn header_pairs(&self) -> [(&'static str, &str); 2] {
        [
            (TIMESTAMP_HEADER, self.timestamp.as_str()),
            (SIGNATURE_HEADER, self.signature.as_str()),
        ]
    }
}

pub fn signing_message(timestamp: &str, method: &str, path: &str, body: Option<&str>) -> String {
    let mut message = format!("{timestamp}{method}{path}");
    if let Some(body) = body {
        message.push_str(body);
    }
    message
}

#[derive(Clone)]
pub struct RequestSigner {
    key: SigningKey,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("verifying_key", &self.key.verifying_key())
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(source: KeySource) -> Result<Self, AuthError> {
        let pem = match source {
            KeySource::Pem(pem) => pem,
            KeySource::Path(path) => std::fs::read_to_string(&path).map_err(|e| {
                error!(path = %path.display(), error = %e, "private key file not readable");
                AuthError::KeyLoad(format!("{}: {e}", path.display()))
            })?,
        };
        let key = SigningKey::from_pkcs8_pem(&pem).map_err(|e| {
            error!(error = %e, "error loading private key");
            AuthError::KeyLoad(e.to_string())
        })?;
        Ok(Self { key })
    }

    pub fn from_sources(pem: Option<String>, path: Option<PathBuf>) -> Result<Self, AuthError> {
        Self::new(KeySource::from_options(pem, path)?)
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Base64 Ed25519 signature of the UTF-8 message.
    pub fn sign(&self, message: &str) -> String {
        STANDARD.encode(self.key.sign(message.as_bytes()).to_bytes())
    }

    pub fn build_headers(&self, method: &str, path: &str, body: Option<&str>) -> SignedHeaders {
        self.build_headers_at(chrono::Utc::now().timestamp(), method, path, body)
    }

    pub fn build_headers_at(
        &self,
        timestamp: i64,
        method: &str,
        path: &str,
        body: Option<&str>,
    ) -> SignedHeaders {
        let timestamp = timestamp.to_string();
        let signature = self.sign(&signing_message(&timestamp, method, path, body));
        SignedHeaders {
            timestamp,
            method: method.to_string(),
            path: path.to_string(),
            body: body.map(str::to_string),
            signature,
        }
    }
}
