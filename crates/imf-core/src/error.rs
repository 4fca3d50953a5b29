use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("not a PEM block: {0}")]
    InvalidPem(String),

    #[error("wrong PEM label: expected {expected:?}, found {found:?}")]
    WrongPemType {
        expected: &'static str,
        found: String,
    },

    #[error("bad key length: expected {expected} bytes, found {found}")]
    BadKeyLength { expected: usize, found: usize },

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed: wrong key or tampered ciphertext")]
    DecryptionFailed,

    #[error("cannot modify a sealed container")]
    AlreadySealed,

    #[error("cannot seal an empty container")]
    EmptyContainer,

    #[error("duplicate file path: {0}")]
    DuplicatePath(String),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("unsupported manifest version: {found} (max supported: {max})")]
    UnsupportedVersion { found: u32, max: u32 },
}

pub type CoreResult<T> = Result<T, CoreError>;
