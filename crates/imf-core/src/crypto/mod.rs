//! Cryptographic primitives for immutable containers.
//!
//! Primitive choices:
//! - **Signatures**: Ed25519 (detached, over the manifest's signable bytes)
//! - **Cipher**: AES-256-GCM, fresh 96-bit nonce per call
//! - **KDF**: PBKDF2-HMAC-SHA256, 600,000 iterations
//! - **Hash**: SHA-256
//!
//! All operations are pure except those drawing randomness from `OsRng`.

mod cipher;
mod keys;
mod pem;

pub use cipher::{decrypt, derive_key, encrypt};
pub use keys::{generate_keypair, sign, verify, SigningKeyPair};
pub use pem::{
    encode_private_key, encode_public_key, parse_private_key, parse_public_key,
    PRIVATE_KEY_LABEL, PUBLIC_KEY_LABEL,
};

// The dalek types are the key-material currency of the whole workspace.
pub use ed25519_dalek::{Signature, SigningKey, VerifyingKey};

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Size of the KDF salt in bytes.
pub const SALT_LEN: usize = 32;

/// Size of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Size of the AES-GCM nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// PBKDF2 iteration count recorded in the manifest at seal time.
///
/// Readers must use the count stored in the manifest, not this constant.
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// SHA-256 digest of a byte sequence.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 digest of a byte stream.
pub fn sha256_reader<R: std::io::Read>(reader: &mut R) -> std::io::Result<[u8; 32]> {
    let mut hasher = Sha256::new();
    std::io::copy(reader, &mut hasher)?;
    Ok(hasher.finalize().into())
}

/// Generate a random 32-byte salt for key derivation.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc") from FIPS 180-2.
        let digest = sha256(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_reader_matches_slice() {
        let data = vec![0xA5u8; 100_000];
        let from_slice = sha256(&data);
        let from_reader = sha256_reader(&mut &data[..]).unwrap();
        assert_eq!(from_slice, from_reader);
    }

    #[test]
    fn salts_are_unique() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
