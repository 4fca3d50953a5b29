//! imf-container: ZIP framing and the engine for IMF immutable file
//! containers.
//!
//! | Module      | Responsibility                                   |
//! |-------------|--------------------------------------------------|
//! | `archive`   | Reading the ZIP frame, atomic whole-archive rewrite |
//! | `container` | Create / Add / Seal / Verify / Extract / List / Info |
//!
//! ## Example
//!
//! ```rust,no_run
//! use imf_container::{add, create, seal, verify, SealOptions, VerifyOptions};
//! use imf_core::crypto::generate_keypair;
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> Result<(), imf_container::ContainerError> {
//! let path = Path::new("archive.imf");
//! create(path)?;
//! add(path, &[PathBuf::from("report.pdf")])?;
//!
//! let keypair = generate_keypair();
//! seal(path, SealOptions {
//!     signing_key: keypair.signing_key,
//!     embed_public_key: true,
//!     passphrase: Some("hunter2".into()),
//!     expires_at: None,
//! })?;
//!
//! verify(path, &VerifyOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod container;
mod error;

pub use archive::{read_archive, rewrite_archive, ArchiveContents};
pub use archive::{FILES_DIR, MANIFEST_PATH, PUBKEY_PATH, SEALED_MARKER};
pub use container::{
    add, create, extract, get_info, list_files, seal, verify, AddedFile, ExtractOptions, FileInfo,
    Info, SealOptions, VerifyOptions,
};
pub use error::{ContainerError, ContainerResult, IntegrityLayer};
