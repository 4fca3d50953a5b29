use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::Context;
use crate::anchor;
use crate::output::{print_info, print_json, print_success};

#[derive(Args)]
pub struct AnchorArgs {
    /// Sealed container to anchor
    pub container: PathBuf,
    /// Check an existing .ots proof instead of submitting a new one
    #[arg(long)]
    pub verify: bool,
}

pub fn run(args: AnchorArgs, ctx: &Context) -> Result<()> {
    if args.verify {
        let check = anchor::verify_anchor(&args.container)?;
        if ctx.json {
            return print_json(&check);
        }
        print_success(format!(
            "Proof matches container (hash {})",
            check.container_hash
        ));
        print_info(format!(
            "Proof: {} ({} bytes)",
            check.proof_path.display(),
            check.proof_size
        ));
        return Ok(());
    }

    let result = anchor::anchor_container(&args.container)?;
    if ctx.json {
        return print_json(&result);
    }
    print_success(format!("Anchored {}", args.container.display()));
    print_info(format!("Hash:   {}", result.container_hash));
    print_info(format!("Proof:  {}", result.proof_path.display()));
    print_info(format!("Server: {}", result.server));
    print_info("The proof upgrades to a Bitcoin attestation after the next calendar batch.");
    Ok(())
}
