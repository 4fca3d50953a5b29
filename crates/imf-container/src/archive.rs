//! ZIP framing for containers: read the whole archive into memory, rewrite
//! it atomically.
//!
//! There is no in-place ZIP editing. Every mutation regenerates the manifest
//! and writes a complete new archive to a sibling temporary file, which is
//! renamed over the target only after a successful finish. A crash mid-write
//! leaves the original container untouched.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use imf_core::Manifest;

use crate::error::{ContainerError, ContainerResult};

/// Well-known member names inside every `.imf` archive.
pub const MANIFEST_PATH: &str = "manifest.json";
pub const FILES_DIR: &str = "files/";
pub const SEALED_MARKER: &str = ".sealed";
pub const PUBKEY_PATH: &str = "keyring/public.key";

/// A container loaded fully into memory: the parsed manifest plus every
/// other member's raw bytes, keyed by member name.
pub struct ArchiveContents {
    pub manifest: Manifest,
    pub members: BTreeMap<String, Vec<u8>>,
}

/// Read and parse a container archive.
///
/// Every member is read to the end, which also forces the ZIP CRC-32 check:
/// corrupted member data surfaces here as an I/O error rather than being
/// handed onward.
pub fn read_archive(path: &Path) -> ContainerResult<ArchiveContents> {
    let data = std::fs::read(path).map_err(|e| ContainerError::io(path, e))?;
    let mut zip = ZipArchive::new(Cursor::new(data))?;

    let mut manifest_bytes: Option<Vec<u8>> = None;
    let mut members = BTreeMap::new();

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| ContainerError::io(path, e))?;

        if name == MANIFEST_PATH {
            manifest_bytes = Some(buf);
        } else {
            members.insert(name, buf);
        }
    }

    let manifest_bytes = manifest_bytes.ok_or(ContainerError::MissingManifest)?;
    let manifest = Manifest::from_slice(&manifest_bytes)?;

    Ok(ArchiveContents { manifest, members })
}

/// Rewrite the entire archive at `path`: canonical manifest first, then all
/// members in name order, stored uncompressed so bytes on disk equal the
/// bytes that were hashed. The `.sealed` marker, when present, is written
/// after everything else.
///
/// The new archive is written to a temporary file in the same directory and
/// renamed into place, so the operation is atomic with respect to crashes.
pub fn rewrite_archive(
    path: &Path,
    manifest: &Manifest,
    members: &BTreeMap<String, Vec<u8>>,
) -> ContainerResult<()> {
    let manifest_bytes = manifest.to_canonical_json()?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| ContainerError::io(path, e))?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(tmp);

    writer.start_file(MANIFEST_PATH, options)?;
    writer
        .write_all(&manifest_bytes)
        .map_err(|e| ContainerError::io(path, e))?;

    for (name, data) in members {
        if name == SEALED_MARKER {
            continue;
        }
        writer.start_file(name.as_str(), options)?;
        writer
            .write_all(data)
            .map_err(|e| ContainerError::io(path, e))?;
    }

    if let Some(marker) = members.get(SEALED_MARKER) {
        writer.start_file(SEALED_MARKER, options)?;
        writer
            .write_all(marker)
            .map_err(|e| ContainerError::io(path, e))?;
    }

    let tmp = writer.finish()?;
    tmp.persist(path)
        .map_err(|e| ContainerError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn roundtrip_manifest_and_members() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roundtrip.imf");

        let manifest = Manifest::new();
        let mut members = BTreeMap::new();
        members.insert("files/a.txt".to_string(), b"alpha".to_vec());
        members.insert("files/b.txt".to_string(), b"beta".to_vec());

        rewrite_archive(&path, &manifest, &members).unwrap();
        let loaded = read_archive(&path).unwrap();

        assert_eq!(loaded.manifest, manifest);
        assert_eq!(loaded.members, members);
    }

    #[test]
    fn missing_manifest_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.imf");

        // Hand-build a zip without manifest.json.
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file("files/only.txt", options).unwrap();
        writer.write_all(b"data").unwrap();
        writer.finish().unwrap();

        assert!(matches!(
            read_archive(&path),
            Err(ContainerError::MissingManifest)
        ));
    }

    #[test]
    fn rewrite_replaces_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rewrite.imf");

        let manifest = Manifest::new();
        let mut members = BTreeMap::new();
        members.insert("files/old.txt".to_string(), b"old".to_vec());
        rewrite_archive(&path, &manifest, &members).unwrap();

        members.clear();
        members.insert("files/new.txt".to_string(), b"new".to_vec());
        rewrite_archive(&path, &manifest, &members).unwrap();

        let loaded = read_archive(&path).unwrap();
        assert!(!loaded.members.contains_key("files/old.txt"));
        assert_eq!(loaded.members["files/new.txt"], b"new");
    }

    #[test]
    fn not_a_zip_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.imf");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        assert!(matches!(read_archive(&path), Err(ContainerError::Zip(_))));
    }
}
