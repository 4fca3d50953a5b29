//! End-to-end lifecycle tests: create, add, seal, verify, extract.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use imf_container::{
    add, create, extract, get_info, list_files, seal, verify, ContainerError, ExtractOptions,
    SealOptions, VerifyOptions,
};
use imf_core::crypto::generate_keypair;
use imf_core::{CoreError, State};

fn write_fixtures(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            fs::write(&path, content).unwrap();
            path
        })
        .collect()
}

#[test]
fn full_lifecycle_encrypted() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("test.imf");

    create(&container).unwrap();

    let fixtures = [
        ("hello.txt", "Hello, immutable world!"),
        ("data.csv", "name,value\nalpha,1\nbeta,2\n"),
        ("readme.md", "# IMF Test\nThis is a test file.\n"),
    ];
    let paths = write_fixtures(tmp.path(), &fixtures);

    let added = add(&container, &paths).unwrap();
    assert_eq!(added.len(), 3);
    assert!(added.iter().all(|a| !a.renamed()));

    let listed = list_files(&container).unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].original_name, "hello.txt");
    assert_eq!(listed[0].original_size, "Hello, immutable world!".len() as u64);

    let info = get_info(&container).unwrap();
    assert_eq!(info.state, State::Open);
    assert!(!info.encrypted);

    let keypair = generate_keypair();
    let expires = chrono::Utc::now() + chrono::Duration::hours(24);
    seal(
        &container,
        SealOptions {
            signing_key: keypair.signing_key.clone(),
            embed_public_key: true,
            passphrase: Some("test-passphrase-123".to_string()),
            expires_at: Some(expires),
        },
    )
    .unwrap();

    let info = get_info(&container).unwrap();
    assert_eq!(info.state, State::Sealed);
    assert!(info.sealed_at.is_some());
    assert!(info.encrypted);
    assert!(info.has_public_key);
    assert!(info.expires_at.is_some());
    assert!(!info.expired);
    assert_eq!(info.file_count, 3);

    // Read operations still work on a sealed container.
    let listed = list_files(&container).unwrap();
    assert_eq!(listed.len(), 3);

    // Embedded key.
    verify(&container, &VerifyOptions::default()).unwrap();
    // Explicit key.
    verify(
        &container,
        &VerifyOptions {
            public_key: Some(keypair.verifying_key),
            ignore_expiry: false,
        },
    )
    .unwrap();

    // Immutability after seal.
    let err = add(&container, &paths[..1]).unwrap_err();
    assert!(matches!(err, ContainerError::Core(CoreError::AlreadySealed)));

    let err = seal(
        &container,
        SealOptions {
            signing_key: keypair.signing_key,
            embed_public_key: false,
            passphrase: None,
            expires_at: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContainerError::Core(CoreError::AlreadySealed)));

    // Round-trip with the correct passphrase.
    let out = tmp.path().join("extracted");
    extract(
        &container,
        &ExtractOptions {
            output_dir: out.clone(),
            passphrase: Some("test-passphrase-123".to_string()),
            ignore_expiry: false,
        },
    )
    .unwrap();

    for (name, content) in &fixtures {
        let extracted = fs::read(out.join(name)).unwrap();
        assert_eq!(extracted, content.as_bytes(), "content mismatch for {name}");
    }

    // Wrong passphrase fails before writing any plaintext.
    let bad_out = tmp.path().join("bad-extract");
    let err = extract(
        &container,
        &ExtractOptions {
            output_dir: bad_out.clone(),
            passphrase: Some("wrong-passphrase".to_string()),
            ignore_expiry: false,
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ContainerError::Core(CoreError::DecryptionFailed)
    ));
    let leaked = fs::read_dir(&bad_out)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leaked, 0, "no plaintext may be written on a bad passphrase");
}

#[test]
fn expired_container() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("expired.imf");

    create(&container).unwrap();
    let paths = write_fixtures(tmp.path(), &[("doc.txt", "time-bounded")]);
    add(&container, &paths).unwrap();

    let keypair = generate_keypair();
    seal(
        &container,
        SealOptions {
            signing_key: keypair.signing_key,
            embed_public_key: true,
            passphrase: None,
            expires_at: Some(chrono::Utc::now() - chrono::Duration::hours(1)),
        },
    )
    .unwrap();

    assert!(get_info(&container).unwrap().expired);

    assert!(matches!(
        verify(&container, &VerifyOptions::default()),
        Err(ContainerError::Expired(_))
    ));
    verify(
        &container,
        &VerifyOptions {
            public_key: None,
            ignore_expiry: true,
        },
    )
    .unwrap();

    let out = tmp.path().join("out");
    assert!(matches!(
        extract(
            &container,
            &ExtractOptions {
                output_dir: out.clone(),
                passphrase: None,
                ignore_expiry: false,
            }
        ),
        Err(ContainerError::Expired(_))
    ));
    extract(
        &container,
        &ExtractOptions {
            output_dir: out.clone(),
            passphrase: None,
            ignore_expiry: true,
        },
    )
    .unwrap();
    assert_eq!(fs::read(out.join("doc.txt")).unwrap(), b"time-bounded");
}

#[test]
fn no_encryption_lifecycle() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("noenc.imf");

    create(&container).unwrap();
    let paths = write_fixtures(tmp.path(), &[("plain.txt", "no encryption here")]);
    add(&container, &paths).unwrap();

    let keypair = generate_keypair();
    seal(
        &container,
        SealOptions {
            signing_key: keypair.signing_key,
            embed_public_key: true,
            passphrase: None,
            expires_at: None,
        },
    )
    .unwrap();

    let info = get_info(&container).unwrap();
    assert!(!info.encrypted);
    assert!(info.has_public_key);

    verify(&container, &VerifyOptions::default()).unwrap();

    let out = tmp.path().join("out");
    extract(
        &container,
        &ExtractOptions {
            output_dir: out.clone(),
            passphrase: None,
            ignore_expiry: false,
        },
    )
    .unwrap();
    assert_eq!(fs::read(out.join("plain.txt")).unwrap(), b"no encryption here");
}

#[test]
fn seal_empty_rejected() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("empty.imf");

    create(&container).unwrap();
    let keypair = generate_keypair();
    let err = seal(
        &container,
        SealOptions {
            signing_key: keypair.signing_key,
            embed_public_key: false,
            passphrase: None,
            expires_at: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContainerError::Core(CoreError::EmptyContainer)));
}

#[test]
fn create_duplicate_rejected_without_modification() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("dup.imf");

    create(&container).unwrap();
    let before = fs::read(&container).unwrap();

    let err = create(&container).unwrap_err();
    assert!(matches!(err, ContainerError::AlreadyExists(_)));
    assert_eq!(fs::read(&container).unwrap(), before);
}

#[test]
fn create_requires_imf_extension() {
    let tmp = TempDir::new().unwrap();
    let err = create(&tmp.path().join("archive.zip")).unwrap_err();
    assert!(matches!(err, ContainerError::BadExtension(_)));
}

#[test]
fn add_disambiguates_colliding_basenames() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("collide.imf");
    create(&container).unwrap();

    let dir_a = tmp.path().join("a");
    let dir_b = tmp.path().join("b");
    fs::create_dir_all(&dir_a).unwrap();
    fs::create_dir_all(&dir_b).unwrap();
    fs::write(dir_a.join("doc.pdf"), b"first").unwrap();
    fs::write(dir_b.join("doc.pdf"), b"second").unwrap();

    let added = add(&container, &[dir_a.join("doc.pdf"), dir_b.join("doc.pdf")]).unwrap();
    assert_eq!(added[0].stored_name, "doc.pdf");
    assert!(!added[0].renamed());
    assert_eq!(added[1].stored_name, "doc_1.pdf");
    assert!(added[1].renamed());

    let listed = list_files(&container).unwrap();
    assert_eq!(listed.len(), 2);
}

#[test]
fn open_container_extracts_without_checks() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("open.imf");
    create(&container).unwrap();

    let paths = write_fixtures(tmp.path(), &[("draft.txt", "work in progress")]);
    add(&container, &paths).unwrap();

    let out = tmp.path().join("out");
    extract(
        &container,
        &ExtractOptions {
            output_dir: out.clone(),
            passphrase: None,
            ignore_expiry: false,
        },
    )
    .unwrap();
    assert_eq!(fs::read(out.join("draft.txt")).unwrap(), b"work in progress");
}

#[test]
fn verify_open_container_rejected() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("open.imf");
    create(&container).unwrap();

    assert!(matches!(
        verify(&container, &VerifyOptions::default()),
        Err(ContainerError::NotSealed)
    ));
}

#[test]
fn verify_without_any_key_rejected() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("nokey.imf");
    create(&container).unwrap();

    let paths = write_fixtures(tmp.path(), &[("f.txt", "x")]);
    add(&container, &paths).unwrap();

    let keypair = generate_keypair();
    seal(
        &container,
        SealOptions {
            signing_key: keypair.signing_key,
            embed_public_key: false,
            passphrase: None,
            expires_at: None,
        },
    )
    .unwrap();

    assert!(matches!(
        verify(&container, &VerifyOptions::default()),
        Err(ContainerError::NoVerifyKey)
    ));

    // The explicit key still works.
    verify(
        &container,
        &VerifyOptions {
            public_key: Some(keypair.verifying_key),
            ignore_expiry: false,
        },
    )
    .unwrap();
}

#[test]
fn encrypted_extract_without_passphrase_fails_decryption() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("locked.imf");
    create(&container).unwrap();

    let paths = write_fixtures(tmp.path(), &[("secret.txt", "classified")]);
    add(&container, &paths).unwrap();

    let keypair = generate_keypair();
    seal(
        &container,
        SealOptions {
            signing_key: keypair.signing_key,
            embed_public_key: true,
            passphrase: Some("open sesame".to_string()),
            expires_at: None,
        },
    )
    .unwrap();

    // A missing passphrase is indistinguishable from a wrong one: the
    // first file fails to decrypt.
    let err = extract(
        &container,
        &ExtractOptions {
            output_dir: tmp.path().join("out"),
            passphrase: None,
            ignore_expiry: false,
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ContainerError::Core(CoreError::DecryptionFailed)
    ));
}
