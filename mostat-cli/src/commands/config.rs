//! Inspect the layered configuration

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::ConfigLoader;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML, after merging all layers
    Show,
    /// List the config files that are read, in merge order
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_effective(),
        ConfigCommands::Path => list_layers(),
    }
}

fn show_effective() -> Result<()> {
    let config = ConfigLoader::load()?;
    for (layer, path) in ConfigLoader::layers() {
        println!("# {}", layer_line(layer, &path));
    }
    println!();
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn list_layers() -> Result<()> {
    for (layer, path) in ConfigLoader::layers() {
        println!("{}", layer_line(layer, &path));
    }
    Ok(())
}

fn layer_line(layer: &str, path: &Path) -> String {
    let status = if path.exists() { "found" } else { "not found" };
    format!("{:<8} {} ({})", format!("{}:", layer), path.display(), status)
}
