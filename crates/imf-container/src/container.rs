//! The container engine: Create, Add, Seal, Verify, Extract, ListFiles,
//! GetInfo.
//!
//! A container is created open, accumulates files while open, and is sealed
//! exactly once. Sealing optionally encrypts every file with a
//! passphrase-derived key, optionally embeds the signer's public key,
//! optionally sets an expiration instant, then signs the manifest and writes
//! the `.sealed` marker. Each mutation regenerates the manifest and rewrites
//! the whole archive atomically; a failure at any earlier step leaves the
//! on-disk container unchanged.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use imf_core::crypto;
use imf_core::crypto::{Signature, SigningKey, VerifyingKey};
use imf_core::{CoreError, EncryptionInfo, FileEntry, Manifest, State};

use crate::archive::{
    read_archive, rewrite_archive, ArchiveContents, FILES_DIR, PUBKEY_PATH, SEALED_MARKER,
};
use crate::error::{ContainerError, ContainerResult, IntegrityLayer};

/// Configures the seal operation.
pub struct SealOptions {
    /// The Ed25519 signing key. Always required.
    pub signing_key: SigningKey,
    /// Embed the public key so the container is self-verifying.
    pub embed_public_key: bool,
    /// When non-empty, files are encrypted with a key derived from this.
    pub passphrase: Option<String>,
    /// Optional expiration instant; recorded in the signed manifest.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Configures verification.
#[derive(Default)]
pub struct VerifyOptions {
    /// Overrides the embedded public key when supplied.
    pub public_key: Option<VerifyingKey>,
    pub ignore_expiry: bool,
}

/// Configures extraction.
pub struct ExtractOptions {
    pub output_dir: PathBuf,
    /// Needed for encrypted containers; a missing or wrong passphrase
    /// surfaces as a decryption failure on the first file.
    pub passphrase: Option<String>,
    pub ignore_expiry: bool,
}

/// Container metadata for display.
#[derive(Debug, Clone, Serialize)]
pub struct Info {
    pub state: State,
    pub created_at: DateTime<Utc>,
    pub sealed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
    pub encrypted: bool,
    pub has_public_key: bool,
    pub file_count: usize,
}

/// Per-file metadata for listing.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub original_name: String,
    pub original_size: u64,
    pub sha256: String,
}

/// Outcome of adding one file, reporting any rename performed to avoid a
/// member-name collision.
#[derive(Debug, Clone, Serialize)]
pub struct AddedFile {
    pub original_name: String,
    pub stored_name: String,
}

impl AddedFile {
    pub fn renamed(&self) -> bool {
        self.original_name != self.stored_name
    }
}

/// Create a new empty container at `path`.
///
/// The container starts open, with an empty manifest and no files.
pub fn create(path: &Path) -> ContainerResult<()> {
    if !path.to_string_lossy().ends_with(".imf") {
        return Err(ContainerError::BadExtension(path.to_path_buf()));
    }
    if path.exists() {
        return Err(ContainerError::AlreadyExists(path.to_path_buf()));
    }

    let manifest = Manifest::new();
    rewrite_archive(path, &manifest, &Default::default())?;
    info!(container = %path.display(), "created container");
    Ok(())
}

/// Add files to an open container.
///
/// Each file is read fully into memory, hashed, and stored under
/// `files/<basename>`. A basename that collides with an existing member is
/// renamed `stem_1.ext`, `stem_2.ext`, … until unique; the renames are
/// reported back to the caller.
pub fn add(path: &Path, file_paths: &[PathBuf]) -> ContainerResult<Vec<AddedFile>> {
    let ArchiveContents {
        mut manifest,
        mut members,
    } = read_archive(path)?;

    if manifest.is_sealed() {
        return Err(CoreError::AlreadySealed.into());
    }

    let mut added = Vec::with_capacity(file_paths.len());
    for file_path in file_paths {
        let data = std::fs::read(file_path).map_err(|e| ContainerError::io(file_path, e))?;
        let basename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ContainerError::io(
                    file_path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file name"),
                )
            })?
            .to_string();

        let member_path = unique_member_path(&manifest, &members, &basename);
        let stored_name = member_path
            .strip_prefix(FILES_DIR)
            .unwrap_or(&member_path)
            .to_string();

        let entry = FileEntry {
            path: member_path.clone(),
            original_name: basename.clone(),
            original_size: data.len() as u64,
            sha256: hex::encode(crypto::sha256(&data)),
            encrypted_sha256: String::new(),
        };
        manifest.add_file(entry)?;
        members.insert(member_path, data);

        added.push(AddedFile {
            original_name: basename,
            stored_name,
        });
    }

    rewrite_archive(path, &manifest, &members)?;
    debug!(
        container = %path.display(),
        count = added.len(),
        "added files"
    );
    Ok(added)
}

/// Seal a container, making it permanently immutable.
///
/// The sequence is: encrypt files (when a passphrase is given), record
/// expiry, embed the public key, transition the manifest to sealed, sign the
/// signable bytes, add the `.sealed` marker, and rewrite the archive. The
/// container on disk is either fully sealed or unchanged.
pub fn seal(path: &Path, opts: SealOptions) -> ContainerResult<()> {
    let ArchiveContents {
        mut manifest,
        mut members,
    } = read_archive(path)?;

    if manifest.is_sealed() {
        return Err(CoreError::AlreadySealed.into());
    }
    if manifest.files.is_empty() {
        return Err(CoreError::EmptyContainer.into());
    }

    // Encryption phase. Each file gets a fresh nonce; the ciphertext hash
    // becomes the pre-decryption integrity check, and the member is renamed
    // with an .enc suffix.
    if let Some(passphrase) = opts.passphrase.as_deref().filter(|p| !p.is_empty()) {
        let salt = crypto::generate_salt();
        let key = crypto::derive_key(passphrase, &salt, crypto::PBKDF2_ITERATIONS);

        manifest.encryption = Some(EncryptionInfo {
            algorithm: "AES-256-GCM".to_string(),
            kdf: "PBKDF2-HMAC-SHA256".to_string(),
            salt: BASE64.encode(salt),
            iterations: crypto::PBKDF2_ITERATIONS,
        });

        for entry in &mut manifest.files {
            let plaintext = members
                .remove(&entry.path)
                .ok_or_else(|| ContainerError::MissingFile(entry.path.clone()))?;
            let ciphertext = crypto::encrypt(&key, &plaintext)?;

            entry.encrypted_sha256 = hex::encode(crypto::sha256(&ciphertext));
            entry.path = format!("{}.enc", entry.path);
            members.insert(entry.path.clone(), ciphertext);
        }
    }

    // The expiry participates in the signature, so it cannot be altered
    // without detection.
    if let Some(expires_at) = opts.expires_at {
        manifest.expires_at = Some(expires_at.with_timezone(&Utc));
    }

    // Embedding the public key makes the container self-verifying: stored
    // both in the manifest (base64) and as a PEM member under keyring/.
    if opts.embed_public_key {
        let verifying_key = opts.signing_key.verifying_key();
        manifest.public_key = Some(BASE64.encode(verifying_key.as_bytes()));
        members.insert(
            PUBKEY_PATH.to_string(),
            crypto::encode_public_key(&verifying_key).into_bytes(),
        );
    }

    manifest.seal()?;

    let signable = manifest.signable_bytes()?;
    let signature = crypto::sign(&opts.signing_key, &signable);
    manifest.signature = Some(BASE64.encode(signature.to_bytes()));

    members.insert(SEALED_MARKER.to_string(), b"sealed".to_vec());

    rewrite_archive(path, &manifest, &members)?;
    info!(
        container = %path.display(),
        encrypted = manifest.encryption.is_some(),
        files = manifest.files.len(),
        "sealed container"
    );
    Ok(())
}

/// Verify a sealed container: expiry, manifest signature, and per-file
/// ciphertext hashes.
///
/// The plaintext hash is deliberately not checked here; without the
/// passphrase the plaintext is unavailable. Extraction performs that final
/// check.
pub fn verify(path: &Path, opts: &VerifyOptions) -> ContainerResult<()> {
    let ArchiveContents { manifest, members } = read_archive(path)?;

    if !manifest.is_sealed() {
        return Err(ContainerError::NotSealed);
    }

    if manifest.is_expired() && !opts.ignore_expiry {
        // is_expired() implies expires_at is present.
        return Err(ContainerError::Expired(manifest.expires_at.unwrap_or_default()));
    }

    // Explicit key from the caller wins over the embedded key.
    let verifying_key = match opts.public_key {
        Some(key) => key,
        None => embedded_verifying_key(&manifest)?.ok_or(ContainerError::NoVerifyKey)?,
    };

    let signature = decode_signature(&manifest)?;
    let signable = manifest.signable_bytes()?;
    if !crypto::verify(&verifying_key, &signable, &signature) {
        return Err(ContainerError::SignatureInvalid);
    }

    for entry in &manifest.files {
        let stored = members
            .get(&entry.path)
            .ok_or_else(|| ContainerError::MissingFile(entry.path.clone()))?;

        if !entry.encrypted_sha256.is_empty()
            && hex::encode(crypto::sha256(stored)) != entry.encrypted_sha256
        {
            return Err(ContainerError::HashMismatch {
                name: entry.original_name.clone(),
                layer: IntegrityLayer::Ciphertext,
            });
        }
    }

    debug!(container = %path.display(), "verified container");
    Ok(())
}

/// Extract files into `opts.output_dir`.
///
/// Sealed containers are decrypted as needed and every plaintext is checked
/// against its manifest hash before being written. Open containers are
/// copied out directly, they make no integrity claim.
pub fn extract(path: &Path, opts: &ExtractOptions) -> ContainerResult<()> {
    let ArchiveContents { manifest, members } = read_archive(path)?;

    if !manifest.is_sealed() {
        return extract_open(&manifest, &members, &opts.output_dir);
    }

    if manifest.is_expired() && !opts.ignore_expiry {
        return Err(ContainerError::Expired(manifest.expires_at.unwrap_or_default()));
    }

    // Derive the decryption key from the manifest's recorded salt and
    // iteration count. An absent passphrase derives the same way as a wrong
    // one: the key cannot authenticate, so the first file fails to decrypt.
    let key = match &manifest.encryption {
        Some(enc) => {
            let passphrase = opts.passphrase.as_deref().unwrap_or("");
            let salt = BASE64.decode(&enc.salt).map_err(|e| {
                CoreError::InvalidManifest(format!("encryption salt is not valid base64: {e}"))
            })?;
            Some(crypto::derive_key(passphrase, &salt, enc.iterations))
        }
        None => None,
    };

    std::fs::create_dir_all(&opts.output_dir)
        .map_err(|e| ContainerError::io(&opts.output_dir, e))?;

    for entry in &manifest.files {
        let stored = members
            .get(&entry.path)
            .ok_or_else(|| ContainerError::MissingFile(entry.path.clone()))?;

        let plaintext = match &key {
            Some(key) => crypto::decrypt(key, stored)?,
            None => stored.clone(),
        };

        if hex::encode(crypto::sha256(&plaintext)) != entry.sha256 {
            return Err(ContainerError::HashMismatch {
                name: entry.original_name.clone(),
                layer: IntegrityLayer::Plaintext,
            });
        }

        let out_path = output_path(&opts.output_dir, &entry.original_name)?;
        std::fs::write(&out_path, &plaintext).map_err(|e| ContainerError::io(&out_path, e))?;
    }

    info!(
        container = %path.display(),
        files = manifest.files.len(),
        output = %opts.output_dir.display(),
        "extracted container"
    );
    Ok(())
}

/// Metadata for every file in the container.
pub fn list_files(path: &Path) -> ContainerResult<Vec<FileInfo>> {
    let ArchiveContents { manifest, .. } = read_archive(path)?;
    Ok(manifest
        .files
        .iter()
        .map(|entry| FileInfo {
            original_name: entry.original_name.clone(),
            original_size: entry.original_size,
            sha256: entry.sha256.clone(),
        })
        .collect())
}

/// Container-level metadata, including the computed `expired` flag.
pub fn get_info(path: &Path) -> ContainerResult<Info> {
    let ArchiveContents { manifest, .. } = read_archive(path)?;
    Ok(Info {
        state: manifest.state,
        created_at: manifest.created_at,
        sealed_at: manifest.sealed_at,
        expires_at: manifest.expires_at,
        expired: manifest.is_expired(),
        encrypted: manifest.encryption.is_some(),
        has_public_key: manifest.public_key.is_some(),
        file_count: manifest.files.len(),
    })
}

fn extract_open(
    manifest: &Manifest,
    members: &std::collections::BTreeMap<String, Vec<u8>>,
    output_dir: &Path,
) -> ContainerResult<()> {
    std::fs::create_dir_all(output_dir).map_err(|e| ContainerError::io(output_dir, e))?;

    for entry in &manifest.files {
        let stored = members
            .get(&entry.path)
            .ok_or_else(|| ContainerError::MissingFile(entry.path.clone()))?;
        let out_path = output_path(output_dir, &entry.original_name)?;
        std::fs::write(&out_path, stored).map_err(|e| ContainerError::io(&out_path, e))?;
    }
    Ok(())
}

/// Join an original name onto the output directory, rejecting names that
/// would escape it. `original_name` is a basename at add time, but the
/// manifest of a foreign container is untrusted input.
fn output_path(output_dir: &Path, original_name: &str) -> ContainerResult<PathBuf> {
    if original_name.is_empty()
        || original_name == ".."
        || original_name.contains('/')
        || original_name.contains('\\')
    {
        return Err(
            CoreError::InvalidManifest(format!("unsafe file name: {original_name:?}")).into(),
        );
    }
    Ok(output_dir.join(original_name))
}

/// First free member path for `basename`: `files/<stem>.<ext>`, then
/// `files/<stem>_1.<ext>`, `files/<stem>_2.<ext>`, …
fn unique_member_path(
    manifest: &Manifest,
    members: &std::collections::BTreeMap<String, Vec<u8>>,
    basename: &str,
) -> String {
    let taken = |candidate: &str| {
        members.contains_key(candidate) || manifest.files.iter().any(|f| f.path == candidate)
    };

    let first = format!("{FILES_DIR}{basename}");
    if !taken(&first) {
        return first;
    }

    let (stem, ext) = match basename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{ext}")),
        _ => (basename, String::new()),
    };

    let mut suffix = 1;
    loop {
        let candidate = format!("{FILES_DIR}{stem}_{suffix}{ext}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

fn embedded_verifying_key(manifest: &Manifest) -> ContainerResult<Option<VerifyingKey>> {
    let Some(encoded) = &manifest.public_key else {
        return Ok(None);
    };
    let bytes = BASE64.decode(encoded).map_err(|e| {
        CoreError::InvalidManifest(format!("embedded public key is not valid base64: {e}"))
    })?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CoreError::BadKeyLength {
            expected: 32,
            found: bytes.len(),
        })?;
    let key = VerifyingKey::from_bytes(&bytes).map_err(|_| {
        CoreError::InvalidManifest("embedded public key is not a valid Ed25519 point".into())
    })?;
    Ok(Some(key))
}

fn decode_signature(manifest: &Manifest) -> ContainerResult<Signature> {
    let encoded = manifest
        .signature
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(ContainerError::SignatureInvalid)?;
    let bytes = BASE64
        .decode(encoded)
        .map_err(|_| ContainerError::SignatureInvalid)?;
    Signature::from_slice(&bytes).map_err(|_| ContainerError::SignatureInvalid)
}
