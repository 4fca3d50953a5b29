use std::path::PathBuf;

use anyhow::{Context as AnyhowContext, Result};
use clap::Args;
use serde::Serialize;

use super::Context;
use crate::output::{print_json, print_success};

#[derive(Args)]
pub struct CreateArgs {
    /// Path of the new container (must end in .imf)
    pub container: PathBuf,
}

pub fn run(args: CreateArgs, ctx: &Context) -> Result<()> {
    imf_container::create(&args.container)
        .with_context(|| format!("creating {}", args.container.display()))?;

    if ctx.json {
        #[derive(Serialize)]
        struct Output {
            container: PathBuf,
            state: &'static str,
        }
        print_json(&Output {
            container: args.container,
            state: "open",
        })
    } else {
        print_success(format!("Created {}", args.container.display()));
        Ok(())
    }
}
