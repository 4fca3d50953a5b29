//! Ed25519 signing via ed25519-dalek

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

/// An Ed25519 signing/verifying key pair.
pub struct SigningKeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

/// Generate a fresh Ed25519 key pair.
pub fn generate_keypair() -> SigningKeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    SigningKeyPair {
        signing_key,
        verifying_key,
    }
}

/// Produce a detached Ed25519 signature over `message`.
pub fn sign(sk: &SigningKey, message: &[u8]) -> Signature {
    sk.sign(message)
}

/// Check a detached signature. Returns a boolean and never panics.
pub fn verify(pk: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
    pk.verify(message, signature).is_ok()
}
