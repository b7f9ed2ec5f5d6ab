mod cmd;
mod ingest;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "relay",
    about = "Relay test outcomes to Jira: comments, transitions, regression tracking",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "RELAY_CONFIG", default_value = "relay.yaml")]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init,

    /// Validate the config against the registered callbacks
    Validate,

    /// List the registered callback names
    Callbacks,

    /// Report a file of test-outcome records to Jira
    Report {
        /// JSON file of outcome records (array or one object per line)
        results: PathBuf,

        /// Report even when the config sets always_on: false
        #[arg(long)]
        enable: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        // Logs go to stderr; stdout stays parseable under --json.
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init => cmd::init::run(&cli.config),
        Commands::Validate => cmd::validate::run(&cli.config, cli.json),
        Commands::Callbacks => cmd::callbacks::run(cli.json),
        Commands::Report { results, enable } => {
            cmd::report::run(&cli.config, &results, enable, cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
