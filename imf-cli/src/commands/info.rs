use std::path::PathBuf;

use anyhow::{Context as AnyhowContext, Result};
use clap::Args;

use super::Context;
use crate::output::print_json;

#[derive(Args)]
pub struct InfoArgs {
    /// Container to inspect
    pub container: PathBuf,
}

pub fn run(args: InfoArgs, ctx: &Context) -> Result<()> {
    let info = imf_container::get_info(&args.container)
        .with_context(|| format!("reading {}", args.container.display()))?;

    if ctx.json {
        return print_json(&info);
    }

    println!("Container: {}", args.container.display());
    println!("  State:     {}", info.state);
    println!("  Created:   {}", info.created_at.to_rfc3339());
    if let Some(sealed_at) = info.sealed_at {
        println!("  Sealed:    {}", sealed_at.to_rfc3339());
    }
    if let Some(expires_at) = info.expires_at {
        let suffix = if info.expired { " (EXPIRED)" } else { "" };
        println!("  Expires:   {}{suffix}", expires_at.to_rfc3339());
    }
    println!("  Encrypted: {}", info.encrypted);
    println!("  Pub key:   {}", info.has_public_key);
    println!("  Files:     {}", info.file_count);
    Ok(())
}
