use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod anchor;
mod commands;
mod output;

#[derive(Parser)]
#[command(name = "imf")]
#[command(about = "Create, seal, and verify immutable file containers")]
#[command(version)]
struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty .imf container
    Create(commands::create::CreateArgs),
    /// Add files to an open container
    Add(commands::add::AddArgs),
    /// Seal a container: sign it and optionally encrypt its files
    Seal(commands::seal::SealArgs),
    /// Verify a sealed container's signature and integrity
    Verify(commands::verify::VerifyArgs),
    /// Extract files from a container
    Extract(commands::extract::ExtractArgs),
    /// List files in a container
    List(commands::list::ListArgs),
    /// Show container metadata
    Info(commands::info::InfoArgs),
    /// Generate an Ed25519 key pair as PEM files
    Keygen(commands::keygen::KeygenArgs),
    /// Anchor a container's hash to a public timestamp service
    Anchor(commands::anchor::AnchorArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let ctx = commands::Context { json: cli.json };

    match cli.command {
        Commands::Create(args) => commands::create::run(args, &ctx),
        Commands::Add(args) => commands::add::run(args, &ctx),
        Commands::Seal(args) => commands::seal::run(args, &ctx),
        Commands::Verify(args) => commands::verify::run(args, &ctx),
        Commands::Extract(args) => commands::extract::run(args, &ctx),
        Commands::List(args) => commands::list::run(args, &ctx),
        Commands::Info(args) => commands::info::run(args, &ctx),
        Commands::Keygen(args) => commands::keygen::run(args, &ctx),
        Commands::Anchor(args) => commands::anchor::run(args, &ctx),
    }
}
