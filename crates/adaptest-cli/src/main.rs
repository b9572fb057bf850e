//! adaptest CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod store;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "Adaptive English proficiency test engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated test session against a bank
    Simulate {
        /// Path to a .toml bank file, or "builtin" for the demo bank
        #[arg(long, default_value = "builtin")]
        bank: String,

        /// Declared starting level: easy, middle, or hard
        #[arg(long, default_value = "middle")]
        start_level: String,

        /// Latent ability of the simulated test-taker
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        true_theta: f64,

        /// RNG seed for reproducible sessions
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Item cap per session
        #[arg(long, default_value = "40")]
        max_items: u32,

        /// Standard-error stopping threshold
        #[arg(long, default_value = "0.32")]
        se_threshold: f64,

        /// Answered-item target per section
        #[arg(long, default_value = "10")]
        section_target: u32,

        /// Write the final report JSON here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate item bank TOML files
    Validate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Summarize a bank's composition
    Info {
        /// Path to a .toml bank file, or "builtin" for the demo bank
        #[arg(long, default_value = "builtin")]
        bank: String,
    },

    /// Create a starter bank file
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            bank,
            start_level,
            true_theta,
            seed,
            max_items,
            se_threshold,
            section_target,
            output,
        } => commands::simulate::execute(
            bank,
            start_level,
            true_theta,
            seed,
            max_items,
            se_threshold,
            section_target,
            output,
        ),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Info { bank } => commands::info::execute(bank),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
