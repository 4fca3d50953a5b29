use std::path::PathBuf;

use anyhow::{bail, Context as AnyhowContext, Result};
use clap::Args;
use serde::Serialize;

use super::Context;
use crate::output::{print_info, print_json, print_success};

#[derive(Args)]
pub struct AddArgs {
    /// Container to add to
    pub container: PathBuf,
    /// Files to add
    pub files: Vec<PathBuf>,
}

pub fn run(args: AddArgs, ctx: &Context) -> Result<()> {
    if args.files.is_empty() {
        bail!("no files supplied");
    }

    let added = imf_container::add(&args.container, &args.files)
        .with_context(|| format!("adding files to {}", args.container.display()))?;

    if ctx.json {
        #[derive(Serialize)]
        struct Output {
            container: PathBuf,
            added: Vec<imf_container::AddedFile>,
        }
        print_json(&Output {
            container: args.container,
            added,
        })
    } else {
        for file in &added {
            if file.renamed() {
                print_info(format!(
                    "renamed to avoid collision: {} -> {}",
                    file.original_name, file.stored_name
                ));
            }
        }
        print_success(format!(
            "Added {} file(s) to {}",
            added.len(),
            args.container.display()
        ));
        Ok(())
    }
}
