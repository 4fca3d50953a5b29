//! imf-core: crypto primitives and the manifest model for IMF containers.
//!
//! An IMF container is a ZIP-framed archive whose contents can be proven
//! unmodified since sealing. This crate holds the pure parts of that story:
//!
//! | Module     | Responsibility                                          |
//! |------------|---------------------------------------------------------|
//! | `crypto`   | Ed25519 signing, AES-256-GCM, PBKDF2, SHA-256, PEM keys |
//! | `manifest` | Container metadata, lifecycle state machine, signable bytes |
//!
//! Archive framing and the container engine live in `imf-container`.

pub mod crypto;
pub mod error;
pub mod manifest;

pub use error::{CoreError, CoreResult};
pub use manifest::{EncryptionInfo, FileEntry, Manifest, State};
