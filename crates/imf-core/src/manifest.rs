//! Container manifest: the signed record of everything inside a container.
//!
//! The manifest is serialized as two-space-indented JSON with fields in
//! declaration order. That exact byte form is canonical: it is what gets
//! stored as `manifest.json`, and (with the signature field set to the empty
//! string) what gets signed. Field order, indentation, base64 padding and
//! RFC 3339 `Z` timestamps all participate in the signature, so the encoding
//! must round-trip byte-identically for a semantically unchanged manifest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Current manifest schema version.
pub const VERSION: u32 = 1;

/// Container lifecycle state.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Open,
    Sealed,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Open => write!(f, "open"),
            State::Sealed => write!(f, "sealed"),
        }
    }
}

/// How the container's files are encrypted at rest.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EncryptionInfo {
    /// Cipher name, e.g. "AES-256-GCM".
    pub algorithm: String,
    /// Key derivation function, e.g. "PBKDF2-HMAC-SHA256".
    pub kdf: String,
    /// Base64 of the 32-byte KDF salt.
    pub salt: String,
    /// KDF iteration count. Readers derive with this value, never a
    /// hard-coded constant.
    pub iterations: u32,
}

/// A single file stored in the container.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    /// Member name inside the archive (e.g. "files/doc.pdf.enc").
    pub path: String,
    /// Basename supplied at add time.
    pub original_name: String,
    /// Plaintext length in bytes.
    pub original_size: u64,
    /// Lowercase hex SHA-256 of the plaintext.
    pub sha256: String,
    /// Lowercase hex SHA-256 of the stored ciphertext; empty when the
    /// container is not encrypted.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub encrypted_sha256: String,
}

/// Top-level container metadata. This is the object that gets signed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    #[serde(default)]
    pub version: u32,
    pub state: State,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sealed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Base64 of the signer's 32-byte verifying key, when embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionInfo>,
    pub files: Vec<FileEntry>,
    /// Base64 of the detached Ed25519 signature; present iff sealed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Manifest {
    /// A fresh manifest in the open state, created now.
    pub fn new() -> Self {
        Self {
            version: VERSION,
            state: State::Open,
            created_at: Utc::now(),
            sealed_at: None,
            expires_at: None,
            public_key: None,
            encryption: None,
            files: Vec::new(),
            signature: None,
        }
    }

    /// Append a file entry. Insertion order is preserved and significant:
    /// it affects serialization and therefore the signature.
    pub fn add_file(&mut self, entry: FileEntry) -> CoreResult<()> {
        if self.is_sealed() {
            return Err(CoreError::AlreadySealed);
        }
        if self.files.iter().any(|f| f.path == entry.path) {
            return Err(CoreError::DuplicatePath(entry.path));
        }
        self.files.push(entry);
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.state == State::Sealed
    }

    /// True when `expires_at` is set and strictly in the past.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(t) => Utc::now() > t,
            None => false,
        }
    }

    /// Transition to the sealed state. Irreversible.
    pub fn seal(&mut self) -> CoreResult<()> {
        if self.is_sealed() {
            return Err(CoreError::AlreadySealed);
        }
        if self.files.is_empty() {
            return Err(CoreError::EmptyContainer);
        }
        self.sealed_at = Some(Utc::now());
        self.state = State::Sealed;
        Ok(())
    }

    /// The exact bytes the detached signature covers: the canonical JSON
    /// form with `signature` rendered as the empty string (present, not
    /// omitted), so every other field is covered verbatim.
    pub fn signable_bytes(&self) -> CoreResult<Vec<u8>> {
        let mut copy = self.clone();
        copy.signature = Some(String::new());
        copy.to_canonical_json()
    }

    /// Canonical serialization: two-space-indented JSON, declaration-order
    /// fields.
    pub fn to_canonical_json(&self) -> CoreResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| CoreError::InvalidManifest(e.to_string()))
    }

    /// Deserialize and validate a manifest read from an archive.
    pub fn from_slice(data: &[u8]) -> CoreResult<Self> {
        let m: Manifest = serde_json::from_slice(data)
            .map_err(|e| CoreError::InvalidManifest(e.to_string()))?;
        if m.version == 0 {
            return Err(CoreError::InvalidManifest("missing version".into()));
        }
        if m.version > VERSION {
            return Err(CoreError::UnsupportedVersion {
                found: m.version,
                max: VERSION,
            });
        }
        Ok(m)
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(path: &str) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            original_name: path.trim_start_matches("files/").to_string(),
            original_size: 4,
            sha256: "00".repeat(32),
            encrypted_sha256: String::new(),
        }
    }

    #[test]
    fn new_manifest_is_open_and_empty() {
        let m = Manifest::new();
        assert_eq!(m.version, VERSION);
        assert_eq!(m.state, State::Open);
        assert!(!m.is_sealed());
        assert!(m.files.is_empty());
        assert!(m.sealed_at.is_none());
        assert!(m.signature.is_none());
    }

    #[test]
    fn duplicate_path_rejected() {
        let mut m = Manifest::new();
        m.add_file(entry("files/a.txt")).unwrap();
        let err = m.add_file(entry("files/a.txt")).unwrap_err();
        assert!(matches!(err, CoreError::DuplicatePath(p) if p == "files/a.txt"));
    }

    #[test]
    fn add_after_seal_rejected() {
        let mut m = Manifest::new();
        m.add_file(entry("files/a.txt")).unwrap();
        m.seal().unwrap();
        assert!(matches!(
            m.add_file(entry("files/b.txt")),
            Err(CoreError::AlreadySealed)
        ));
    }

    #[test]
    fn seal_empty_rejected() {
        let mut m = Manifest::new();
        assert!(matches!(m.seal(), Err(CoreError::EmptyContainer)));
    }

    #[test]
    fn seal_twice_rejected() {
        let mut m = Manifest::new();
        m.add_file(entry("files/a.txt")).unwrap();
        m.seal().unwrap();
        assert!(m.is_sealed());
        assert!(m.sealed_at.is_some());
        assert!(matches!(m.seal(), Err(CoreError::AlreadySealed)));
    }

    #[test]
    fn expiry_logic() {
        let mut m = Manifest::new();
        assert!(!m.is_expired());

        m.expires_at = Some(Utc::now() + Duration::hours(1));
        assert!(!m.is_expired());

        m.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(m.is_expired());
    }

    #[test]
    fn signable_bytes_render_empty_signature() {
        let mut m = Manifest::new();
        m.add_file(entry("files/a.txt")).unwrap();
        m.seal().unwrap();
        m.signature = Some("c2lnbmF0dXJl".to_string());

        let signable = m.signable_bytes().unwrap();
        let text = String::from_utf8(signable).unwrap();
        assert!(text.contains("\"signature\": \"\""));
        assert!(!text.contains("c2lnbmF0dXJl"));
    }

    #[test]
    fn open_manifest_omits_absent_fields() {
        let m = Manifest::new();
        let text = String::from_utf8(m.to_canonical_json().unwrap()).unwrap();
        assert!(!text.contains("sealed_at"));
        assert!(!text.contains("signature"));
        assert!(!text.contains("encryption"));
        assert!(!text.contains("public_key"));
    }

    #[test]
    fn canonical_roundtrip_is_byte_identical() {
        let mut m = Manifest::new();
        m.add_file(entry("files/a.txt")).unwrap();
        m.expires_at = Some(Utc::now() + Duration::days(1));
        m.seal().unwrap();
        m.signature = Some("c2ln".to_string());

        let first = m.to_canonical_json().unwrap();
        let reparsed = Manifest::from_slice(&first).unwrap();
        let second = reparsed.to_canonical_json().unwrap();
        assert_eq!(first, second);
        assert_eq!(m.signable_bytes().unwrap(), reparsed.signable_bytes().unwrap());
    }

    #[test]
    fn two_space_indentation() {
        let m = Manifest::new();
        let text = String::from_utf8(m.to_canonical_json().unwrap()).unwrap();
        assert!(text.starts_with("{\n  \"version\": 1,"));
    }

    #[test]
    fn version_zero_rejected() {
        let err = Manifest::from_slice(br#"{"version":0,"state":"open","created_at":"2026-01-01T00:00:00Z","files":[]}"#)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidManifest(_)));
    }

    #[test]
    fn missing_version_rejected() {
        let err = Manifest::from_slice(
            br#"{"state":"open","created_at":"2026-01-01T00:00:00Z","files":[]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidManifest(_)));
    }

    #[test]
    fn future_version_rejected() {
        let err = Manifest::from_slice(br#"{"version":9,"state":"open","created_at":"2026-01-01T00:00:00Z","files":[]}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedVersion { found: 9, max: 1 }
        ));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            Manifest::from_slice(b"{ not json"),
            Err(CoreError::InvalidManifest(_))
        ));
    }
}
