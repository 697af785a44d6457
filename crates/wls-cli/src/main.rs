use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "wls")]
#[command(about = "Wallet allowlist sync: diff, plan and verify guard/module permissions", long_about = None)]
struct Cli {
    /// Repository root (default: walk up from the working directory until
    /// allowlists/chains.yaml is found)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare desired allowlists with on-chain guard/module state. Exit 1 on any difference.
    Diff {
        /// Comma-separated chain slugs (default: all chains)
        #[arg(long)]
        chain: Option<String>,

        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Plan the transactions that apply one tag and write Safe batch files.
    Sync {
        /// Tag slug to apply
        #[arg(long)]
        tag: String,

        /// Comma-separated chain slugs (default: every chain listing the tag)
        #[arg(long)]
        chain: Option<String>,

        /// Output directory for batch files, relative to the repository root
        #[arg(long = "out-dir", default_value = "safe-batches")]
        out_dir: PathBuf,

        /// Print the planned actions instead of writing files
        #[arg(long = "dry-run", default_value_t = false)]
        dry_run: bool,
    },

    /// Check the tag files against a historical snapshot (JSONL).
    Verify {
        /// Snapshot path (default: <root>/tmp/allowlist_snapshot.jsonl)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Replay guard events and print the current guard state as CSV.
    State {
        /// Chain slug
        #[arg(long)]
        chain: String,
    },

    /// Print the allowlist content hash.
    ConfigHash,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Silent if the files do not exist; real deployments inject env vars directly.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    let layout = commands::layout(cli.root.as_deref())?;

    match cli.cmd {
        Commands::Diff { chain, json } => {
            let clean = commands::diff::run(&layout, chain.as_deref(), json).await?;
            if !clean {
                return Ok(ExitCode::from(1));
            }
        }

        Commands::Sync {
            tag,
            chain,
            out_dir,
            dry_run,
        } => {
            commands::sync::run(&layout, &tag, chain.as_deref(), &out_dir, dry_run).await?;
        }

        Commands::Verify { snapshot } => {
            commands::verify::run(&layout, snapshot)?;
        }

        Commands::State { chain } => {
            commands::state::run(&layout, &chain).await?;
        }

        Commands::ConfigHash => {
            let index = commands::load_index(&layout)?;
            println!("config_hash={}", index.content_hash()?);
            println!("tags={}", index.len());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr so stdout stays parseable (`--json`, CSV).
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
