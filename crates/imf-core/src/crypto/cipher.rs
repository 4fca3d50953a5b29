//! AES-256-GCM file encryption and passphrase key derivation.
//!
//! Wire format of an encrypted payload:
//! ```text
//! [ nonce (12 bytes) ][ ciphertext + GCM tag (16 bytes) ]
//! ```
//!
//! Keys are derived from passphrases with PBKDF2-HMAC-SHA256 and zeroized
//! when the caller drops them.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{KEY_LEN, NONCE_LEN};
use crate::error::{CoreError, CoreResult};

/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Derive an AES-256 key from a passphrase and salt.
///
/// The iteration count is taken from the caller because readers must honor
/// the count recorded in the manifest rather than a compile-time constant.
pub fn derive_key(passphrase: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, key.as_mut());
    key
}

/// Encrypt `plaintext` with AES-256-GCM under a fresh random nonce.
///
/// Returns `nonce || ciphertext || tag`. The nonce travels with the output,
/// so the caller never manages nonces separately.
pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> CoreResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CoreError::EncryptionFailed)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a payload produced by [`encrypt`].
///
/// Fails with [`CoreError::DecryptionFailed`] when the GCM tag does not
/// authenticate: wrong key or tampered ciphertext. No partial plaintext is
/// ever returned.
pub fn decrypt(key: &[u8; KEY_LEN], data: &[u8]) -> CoreResult<Vec<u8>> {
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(CoreError::DecryptionFailed);
    }

    let (nonce, ciphertext) = data.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key));

    cipher
        .decrypt(GenericArray::from_slice(nonce), ciphertext)
        .map_err(|_| CoreError::DecryptionFailed)
}
