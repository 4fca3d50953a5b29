use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context as AnyhowContext, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use dialoguer::Password;
use serde::Serialize;

use imf_container::SealOptions;
use imf_core::crypto;

use super::Context;
use crate::output::{print_info, print_json, print_success};

#[derive(Args)]
pub struct SealArgs {
    /// Container to seal
    pub container: PathBuf,
    /// Path to the Ed25519 private key (PEM)
    #[arg(long)]
    pub key: PathBuf,
    /// Embed the public key so the container is self-verifying
    #[arg(long)]
    pub embed_pubkey: bool,
    /// Encryption passphrase ("none" to skip; prompted when omitted)
    #[arg(long)]
    pub passphrase: Option<String>,
    /// Expiration time, RFC 3339 (e.g. 2027-12-31T23:59:59Z)
    #[arg(long)]
    pub expires: Option<String>,
}

pub fn run(args: SealArgs, ctx: &Context) -> Result<()> {
    let key_pem = fs::read_to_string(&args.key)
        .with_context(|| format!("reading key {}", args.key.display()))?;
    let signing_key = crypto::parse_private_key(&key_pem)
        .with_context(|| format!("parsing key {}", args.key.display()))?;

    // Prompt when no flag was given; "none" or an empty entry skips
    // encryption.
    let passphrase = match args.passphrase {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Encryption passphrase (empty to skip)")
            .allow_empty_password(true)
            .interact()?,
    };
    let passphrase = match passphrase.as_str() {
        "" | "none" => None,
        _ => Some(passphrase),
    };

    let expires_at = args
        .expires
        .as_deref()
        .map(parse_expiry)
        .transpose()?;

    let encrypted = passphrase.is_some();
    imf_container::seal(
        &args.container,
        SealOptions {
            signing_key,
            embed_public_key: args.embed_pubkey,
            passphrase,
            expires_at,
        },
    )
    .with_context(|| format!("sealing {}", args.container.display()))?;

    if ctx.json {
        #[derive(Serialize)]
        struct Output {
            container: PathBuf,
            encrypted: bool,
            public_key_embedded: bool,
            expires_at: Option<DateTime<Utc>>,
        }
        print_json(&Output {
            container: args.container,
            encrypted,
            public_key_embedded: args.embed_pubkey,
            expires_at,
        })
    } else {
        print_success(format!("Sealed {}", args.container.display()));
        if encrypted {
            print_info("Encrypted: yes");
        }
        if args.embed_pubkey {
            print_info("Public key: embedded");
        }
        if let Some(t) = expires_at {
            print_info(format!("Expires: {}", t.to_rfc3339()));
        }
        Ok(())
    }
}

fn parse_expiry(value: &str) -> Result<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(t) => Ok(t.with_timezone(&Utc)),
        Err(e) => bail!("invalid expiration date {value:?}: {e} (expected RFC 3339)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_expiry_accepts_rfc3339() {
        let t = parse_expiry("2027-12-31T23:59:59Z").unwrap();
        assert_eq!(t.to_rfc3339(), "2027-12-31T23:59:59+00:00");
    }

    #[test]
    fn parse_expiry_normalizes_offsets_to_utc() {
        let t = parse_expiry("2027-06-01T12:00:00+02:00").unwrap();
        assert_eq!(t, "2027-06-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn parse_expiry_rejects_garbage() {
        assert!(parse_expiry("next tuesday").is_err());
    }
}
