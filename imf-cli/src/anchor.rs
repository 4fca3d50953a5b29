//! Timestamp anchoring via OpenTimestamps.
//!
//! OpenTimestamps calendar servers accept a raw SHA-256 digest over HTTP and
//! return a compact proof that the digest existed at submission time; the
//! proof later upgrades to a full Bitcoin attestation. No accounts or API
//! keys are involved. The engine needs no hook for this: the hash of the
//! whole `.imf` file is the anchor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context as AnyhowContext, Result};
use reqwest::blocking::Client;
use serde::Serialize;

use imf_core::crypto;

/// Calendar servers, tried in order.
const CALENDAR_SERVERS: &[&str] = &[
    "https://a.pool.opentimestamps.org",
    "https://b.pool.opentimestamps.org",
    "https://a.pool.eternitywall.com",
];

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a timestamp submission.
#[derive(Debug, Serialize)]
pub struct AnchorResult {
    /// SHA-256 hex digest of the .imf file.
    pub container_hash: String,
    /// Where the .ots proof was saved.
    pub proof_path: PathBuf,
    /// Calendar server that accepted the submission.
    pub server: String,
}

/// Result of a local proof check.
#[derive(Debug, Serialize)]
pub struct AnchorCheck {
    pub container_hash: String,
    pub proof_path: PathBuf,
    pub proof_size: usize,
}

/// Hash the container file and submit the digest to a calendar server,
/// saving the proof receipt as `<container>.ots`.
pub fn anchor_container(container: &Path) -> Result<AnchorResult> {
    let data = std::fs::read(container)
        .with_context(|| format!("reading {}", container.display()))?;
    let digest = crypto::sha256(&data);

    let client = Client::builder().timeout(SUBMIT_TIMEOUT).build()?;

    let mut proof = None;
    for server in CALENDAR_SERVERS {
        match submit_digest(&client, server, &digest) {
            Ok(bytes) => {
                proof = Some((bytes, server.to_string()));
                break;
            }
            Err(e) => eprintln!("warning: {server}: {e:#}"),
        }
    }
    let Some((proof, server)) = proof else {
        bail!("all timestamp calendar servers failed; check your network connection");
    };

    let proof_path = ots_path(container);
    std::fs::write(&proof_path, &proof)
        .with_context(|| format!("saving proof {}", proof_path.display()))?;

    Ok(AnchorResult {
        container_hash: hex::encode(digest),
        proof_path,
        server,
    })
}

/// Check that the saved `.ots` proof was generated for this exact container:
/// the proof must embed the container's current digest. Full attestation
/// verification is the job of an OpenTimestamps client.
pub fn verify_anchor(container: &Path) -> Result<AnchorCheck> {
    let data = std::fs::read(container)
        .with_context(|| format!("reading {}", container.display()))?;
    let digest = crypto::sha256(&data);

    let proof_path = ots_path(container);
    let proof = std::fs::read(&proof_path)
        .with_context(|| format!("reading proof {}", proof_path.display()))?;

    let embedded = proof.windows(digest.len()).any(|window| window == digest);
    if !embedded {
        bail!(
            "proof {} does not match the container; it may have been modified after anchoring",
            proof_path.display()
        );
    }

    Ok(AnchorCheck {
        container_hash: hex::encode(digest),
        proof_path,
        proof_size: proof.len(),
    })
}

fn ots_path(container: &Path) -> PathBuf {
    let mut name = container.as_os_str().to_os_string();
    name.push(".ots");
    PathBuf::from(name)
}

fn submit_digest(client: &Client, server: &str, digest: &[u8; 32]) -> Result<Vec<u8>> {
    let url = format!("{server}/digest");
    let response = client
        .post(&url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Accept", "application/vnd.opentimestamps.v1")
        .body(digest.to_vec())
        .send()
        .with_context(|| format!("connecting to {server}"))?;

    if !response.status().is_success() {
        bail!("server {server} returned status {}", response.status());
    }

    let proof = response.bytes()?.to_vec();
    if proof.is_empty() {
        bail!("empty proof received from {server}");
    }
    Ok(proof)
}
