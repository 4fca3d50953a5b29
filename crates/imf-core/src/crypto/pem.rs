//! PEM encoding for Ed25519 key files.
//!
//! Format:
//! ```text
//! -----BEGIN IMF ED25519 PRIVATE KEY-----
//! MC4CAQAwBQYDK2VwBCIEIH... (base64, wrapped at 64 chars)
//! -----END IMF ED25519 PRIVATE KEY-----
//! ```
//!
//! The body is the raw key material: 64 bytes (seed plus public half) for
//! private keys, 32 bytes for public keys.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{SigningKey, VerifyingKey};

use crate::error::{CoreError, CoreResult};

pub const PRIVATE_KEY_LABEL: &str = "IMF ED25519 PRIVATE KEY";
pub const PUBLIC_KEY_LABEL: &str = "IMF ED25519 PUBLIC KEY";

/// Length of an Ed25519 private key body (seed || public key).
const PRIVATE_KEY_LEN: usize = 64;
/// Length of an Ed25519 public key body.
const PUBLIC_KEY_LEN: usize = 32;

/// Encode a private key as PEM.
pub fn encode_private_key(key: &SigningKey) -> String {
    pem_encode(PRIVATE_KEY_LABEL, &key.to_keypair_bytes())
}

/// Encode a public key as PEM.
pub fn encode_public_key(key: &VerifyingKey) -> String {
    pem_encode(PUBLIC_KEY_LABEL, key.as_bytes())
}

/// Parse a PEM-encoded private key.
pub fn parse_private_key(data: &str) -> CoreResult<SigningKey> {
    let body = pem_decode(PRIVATE_KEY_LABEL, data)?;
    let bytes: [u8; PRIVATE_KEY_LEN] =
        body.as_slice()
            .try_into()
            .map_err(|_| CoreError::BadKeyLength {
                expected: PRIVATE_KEY_LEN,
                found: body.len(),
            })?;
    SigningKey::from_keypair_bytes(&bytes).map_err(|_| {
        CoreError::InvalidPem("private key body is not a valid Ed25519 keypair".into())
    })
}

/// Parse a PEM-encoded public key.
pub fn parse_public_key(data: &str) -> CoreResult<VerifyingKey> {
    let body = pem_decode(PUBLIC_KEY_LABEL, data)?;
    let bytes: [u8; PUBLIC_KEY_LEN] =
        body.as_slice()
            .try_into()
            .map_err(|_| CoreError::BadKeyLength {
                expected: PUBLIC_KEY_LEN,
                found: body.len(),
            })?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| CoreError::InvalidPem("public key body is not a valid Ed25519 point".into()))
}

fn pem_encode(label: &str, payload: &[u8]) -> String {
    let mut out = String::new();
    out.push_str(&format!("-----BEGIN {label}-----\n"));

    let b64 = BASE64.encode(payload);
    for chunk in b64.as_bytes().chunks(64) {
        // Chunks of an ASCII string are valid UTF-8.
        out.push_str(std::str::from_utf8(chunk).expect("base64 is ASCII"));
        out.push('\n');
    }

    out.push_str(&format!("-----END {label}-----\n"));
    out
}

fn pem_decode(expected_label: &'static str, data: &str) -> CoreResult<Vec<u8>> {
    let lines: Vec<&str> = data.lines().map(str::trim_end).collect();

    let begin_idx = lines
        .iter()
        .position(|l| l.starts_with("-----BEGIN "))
        .ok_or_else(|| CoreError::InvalidPem("missing BEGIN line".into()))?;

    let label = lines[begin_idx]
        .strip_prefix("-----BEGIN ")
        .and_then(|l| l.strip_suffix("-----"))
        .ok_or_else(|| CoreError::InvalidPem("malformed BEGIN line".into()))?;

    if label != expected_label {
        return Err(CoreError::WrongPemType {
            expected: expected_label,
            found: label.to_string(),
        });
    }

    let end_marker = format!("-----END {label}-----");
    let end_idx = lines
        .iter()
        .position(|l| *l == end_marker)
        .ok_or_else(|| CoreError::InvalidPem("missing END line".into()))?;

    let body: String = lines[begin_idx + 1..end_idx]
        .iter()
        .flat_map(|l| l.chars())
        .filter(|c| !c.is_whitespace())
        .collect();

    BASE64
        .decode(&body)
        .map_err(|e| CoreError::InvalidPem(format!("invalid base64 body: {e}")))
}
