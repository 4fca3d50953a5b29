use std::path::PathBuf;

use anyhow::{bail, Context as AnyhowContext, Result};
use clap::Args;
use dialoguer::Password;
use serde::Serialize;

use imf_container::{ContainerError, ExtractOptions};

use super::Context;
use crate::output::{print_json, print_success};

#[derive(Args)]
pub struct ExtractArgs {
    /// Container to extract
    pub container: PathBuf,
    /// Output directory (a clean directory is recommended)
    #[arg(long, default_value = "extracted")]
    pub out: PathBuf,
    /// Decryption passphrase (prompted when omitted and required)
    #[arg(long)]
    pub passphrase: Option<String>,
    /// Extract even if the container has expired
    #[arg(long)]
    pub ignore_expiry: bool,
}

pub fn run(args: ExtractArgs, ctx: &Context) -> Result<()> {
    let info = imf_container::get_info(&args.container)
        .with_context(|| format!("reading {}", args.container.display()))?;

    let passphrase = match args.passphrase {
        Some(p) => Some(p),
        None if info.encrypted => Some(
            Password::new()
                .with_prompt("Decryption passphrase")
                .interact()?,
        ),
        None => None,
    };

    let result = imf_container::extract(
        &args.container,
        &ExtractOptions {
            output_dir: args.out.clone(),
            passphrase,
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
            return Err(e).with_context(|| format!("extracting {}", args.container.display()))
        }
    }

    if ctx.json {
        #[derive(Serialize)]
        struct Output {
            container: PathBuf,
            output_dir: PathBuf,
            files: usize,
        }
        print_json(&Output {
            container: args.container,
            output_dir: args.out,
            files: info.file_count,
        })
    } else {
        print_success(format!(
            "Extracted {} file(s) to {}",
            info.file_count,
            args.out.display()
        ));
        Ok(())
    }
}
