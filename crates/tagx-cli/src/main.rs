use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use tagx_config::{LoggingConfig, TagxConfig};

mod cmd_check;
mod cmd_eval;
mod tracing_init;

#[derive(Parser)]
#[command(name = "tagx", about = "Tag expression tools")]
struct Cli {
    /// Path to tagx.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one expression against a JSON document
    Eval {
        /// Expression source, e.g. "len($)>0&&(user.age)$>=18"
        expr: String,

        /// JSON document bound to `$` (defaults to null)
        #[arg(short, long, conflicts_with = "file")]
        json: Option<String>,

        /// Read the JSON document from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Parse annotations and print their precedence-corrected trees
    Check {
        /// Annotation sources, e.g. "{@:$>0}{msg:'too small'}"
        annotations: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (logging, base_dir) = match &cli.config {
        Some(path) => {
            let path = path
                .canonicalize()
                .map_err(|e| anyhow::anyhow!("config path '{}': {e}", path.display()))?;
            let config = TagxConfig::load(&path)?;
            let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            (config.logging, base_dir)
        }
        None => (LoggingConfig::default(), std::env::current_dir()?),
    };
    let _guard = tracing_init::init_tracing(&logging, &base_dir)?;

    match cli.command {
        Commands::Eval { expr, json, file } => {
            cmd_eval::run(&expr, json, file)?;
        }

        Commands::Check { annotations } => {
            cmd_check::run(&annotations)?;
        }
    }

    Ok(())
}
