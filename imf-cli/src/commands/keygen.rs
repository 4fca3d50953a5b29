use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context as AnyhowContext, Result};
use clap::Args;
use serde::Serialize;

use imf_core::crypto;

use super::Context;
use crate::output::{print_info, print_json, print_success};

#[derive(Args)]
pub struct KeygenArgs {
    /// Output directory for the key files
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

pub fn run(args: KeygenArgs, ctx: &Context) -> Result<()> {
    let keypair = crypto::generate_keypair();

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating directory {}", args.out.display()))?;

    let private_path = args.out.join("imf_private.pem");
    let public_path = args.out.join("imf_public.pem");

    if private_path.exists() {
        bail!("{} already exists", private_path.display());
    }

    write_private(&private_path, crypto::encode_private_key(&keypair.signing_key))
        .with_context(|| format!("writing {}", private_path.display()))?;
    fs::write(&public_path, crypto::encode_public_key(&keypair.verifying_key))
        .with_context(|| format!("writing {}", public_path.display()))?;

    if ctx.json {
        #[derive(Serialize)]
        struct Output {
            private_key: PathBuf,
            public_key: PathBuf,
        }
        print_json(&Output {
            private_key: private_path,
            public_key: public_path,
        })
    } else {
        print_success("Generated key pair");
        print_info(format!("Private: {} (keep secret!)", private_path.display()));
        print_info(format!("Public:  {}", public_path.display()));
        Ok(())
    }
}

/// Write the private key owner-only on Unix.
#[cfg(unix)]
fn write_private(path: &std::path::Path, pem: String) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(pem.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &std::path::Path, pem: String) -> std::io::Result<()> {
    fs::write(path, pem)
}
