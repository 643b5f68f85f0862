use std::path::PathBuf;

use cao_core::session::RenderMode;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cao", version, about = "Chat with a terminal assistant that knows shells and code")]
pub struct Cli {
    /// Model to use (a key under [models] in config.toml)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Verbose logging and startup diagnostics
    #[arg(short, long)]
    pub debug: bool,

    /// How replies are framed: chat or normal
    #[arg(long, default_value_t = RenderMode::Chat)]
    pub mode: RenderMode,

    /// Persona to start with
    #[arg(short, long)]
    pub persona: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage configured models
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// List configured models
    List,
    /// Add or update a model
    Add {
        name: String,
        #[arg(long)]
        api_base: String,
        #[arg(long)]
        model: String,
        /// Provider name; defaults to NAME
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Remove a model
    Remove { name: String },
    /// Make a model the default
    SetDefault { name: String },
    /// Print the effective config, or write it to FILE
    Export { file: Option<PathBuf> },
    /// Replace the config with FILE
    Import { file: PathBuf },
    /// Print the config file path
    Path,
}
