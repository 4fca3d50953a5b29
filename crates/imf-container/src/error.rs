use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use imf_core::CoreError;

/// Which integrity layer failed a hash comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityLayer {
    /// The decrypted (or stored plaintext) bytes, checked during extraction.
    Plaintext,
    /// The stored ciphertext bytes, checked during verification.
    Ciphertext,
}

impl std::fmt::Display for IntegrityLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityLayer::Plaintext => write!(f, "plaintext"),
            IntegrityLayer::Ciphertext => write!(f, "ciphertext"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("container path must have .imf extension: {}", .0.display())]
    BadExtension(PathBuf),

    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("manifest.json not found in container")]
    MissingManifest,

    #[error("container is not sealed")]
    NotSealed,

    #[error("no public key provided and none embedded in container")]
    NoVerifyKey,

    #[error("signature verification failed: container may have been tampered with")]
    SignatureInvalid,

    #[error("integrity failure: file missing from container: {0}")]
    MissingFile(String),

    #[error("integrity failure for {name}: stored {layer} does not match manifest hash")]
    HashMismatch { name: String, layer: IntegrityLayer },

    #[error("container expired at {}", .0.to_rfc3339())]
    Expired(DateTime<Utc>),

    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContainerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ContainerError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ContainerResult<T> = Result<T, ContainerError>;
