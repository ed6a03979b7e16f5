use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "mostat", about = "Host identity and plugin discovery for mostat nodes")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the system ID of this host
    Id(commands::id::IdArgs),
    /// List, register and unregister plugins
    Plugins(commands::plugins::PluginsArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Id(args) => commands::id::run(args),
        Commands::Plugins(args) => commands::plugins::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
