use std::path::PathBuf;

use anyhow::{Context as AnyhowContext, Result};
use clap::Args;

use super::Context;
use crate::output::print_json;

#[derive(Args)]
pub struct ListArgs {
    /// Container to list
    pub container: PathBuf,
}

pub fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let files = imf_container::list_files(&args.container)
        .with_context(|| format!("reading {}", args.container.display()))?;

    if ctx.json {
        return print_json(&files);
    }

    if files.is_empty() {
        println!("(no files)");
        return Ok(());
    }

    println!("{:<32} {:>12}  sha256", "name", "size");
    for file in &files {
        println!(
            "{:<32} {:>12}  {}",
            file.original_name, file.original_size, file.sha256
        );
    }
    Ok(())
}
