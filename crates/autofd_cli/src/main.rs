//! autofd CLI - forward-mode derivatives of scalar functions
//!
//! # Commands
//!
//! - `autofd generate --pkg <path> --fct <name>` - Emit the derivative of one function
//! - `autofd batch --config <file>` - Emit every derivative listed in a config file
//! - `autofd eval --pkg <path> --fct <name> --at <x>` - Evaluate a derivative numerically
//!
//! Generated source goes to stdout (or `--out`); logs go to stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

/// Forward-mode derivative generator for scalar functions
#[derive(Parser)]
#[command(name = "autofd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the derivative of a single function
    Generate {
        /// Root directory of the source tree
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Import path of the module holding the function
        #[arg(long)]
        pkg: String,

        /// Function name, or Type.method
        #[arg(long)]
        fct: String,

        /// Name of the generated derivative (default: deriv_<fct>)
        #[arg(long)]
        der: Option<String>,

        /// Generate the second derivative as well
        #[arg(long)]
        d2: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate every derivative listed in a config file
    Batch {
        /// Path to the batch configuration
        #[arg(short, long, default_value = config::DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Evaluate a derivative at a point with the reference dual algebra
    Eval {
        /// Root directory of the source tree
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Import path of the module holding the function
        #[arg(long)]
        pkg: String,

        /// Function name, or Type.method
        #[arg(long)]
        fct: String,

        /// Point of evaluation
        #[arg(long, allow_negative_numbers = true)]
        at: f64,

        /// Include the second derivative
        #[arg(long)]
        d2: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    debug!("autofd {}", env!("CARGO_PKG_VERSION"));

    let outcome = match cli.command {
        Commands::Generate {
            root,
            pkg,
            fct,
            der,
            d2,
            out,
        } => commands::generate::run(&root, &pkg, &fct, der.as_deref(), d2, out.as_deref()),
        Commands::Batch { config } => commands::batch::run(&config),
        Commands::Eval {
            root,
            pkg,
            fct,
            at,
            d2,
        } => commands::eval::run(&root, &pkg, &fct, at, d2),
    };
    Ok(outcome?)
}
