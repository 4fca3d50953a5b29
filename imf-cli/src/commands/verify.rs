use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context as AnyhowContext, Result};
use clap::Args;
use serde::Serialize;

use imf_container::{ContainerError, VerifyOptions};
use imf_core::crypto;

use super::Context;
use crate::output::{print_json, print_success};

#[derive(Args)]
pub struct VerifyArgs {
    /// Container to verify
    pub container: PathBuf,
    /// Path to an Ed25519 public key (PEM); overrides the embedded key
    #[arg(long)]
    pub key: Option<PathBuf>,
    /// Verify even if the container has expired
    #[arg(long)]
    pub ignore_expiry: bool,
}

pub fn run(args: VerifyArgs, ctx: &Context) -> Result<()> {
    let public_key = match &args.key {
        Some(path) => {
            let pem = fs::read_to_string(path)
                .with_context(|| format!("reading key {}", path.display()))?;
            Some(
                crypto::parse_public_key(&pem)
                    .with_context(|| format!("parsing key {}", path.display()))?,
            )
        }
        None => None,
    };

    let result = imf_container::verify(
        &args.container,
        &VerifyOptions {
            public_key,
            ignore_expiry: args.ignore_expiry,
        },
    );

    match result {
        Ok(()) => {}
        Err(ContainerError::Expired(at)) => {
            bail!(
                "container expired at {} (use --ignore-expiry to override)",
                at.to_rfc3339()
            );
        }
        Err(e) => {
            return Err(e).with_context(|| format!("verifying {}", args.container.display()))
        }
    }

    if ctx.json {
        #[derive(Serialize)]
        struct Output {
            container: PathBuf,
            verified: bool,
        }
        print_json(&Output {
            container: args.container,
            verified: true,
        })
    } else {
        print_success(format!(
            "{} verified: signature and file integrity intact",
            args.container.display()
        ));
        Ok(())
    }
}
