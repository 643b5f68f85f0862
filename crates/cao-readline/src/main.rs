mod cli;
mod config_cmd;
mod logging;
mod render;
mod repl;
mod spinner;
mod terminal;

use anyhow::{Result, bail};
use cao_core::config::CaoConfig;
use cao_core::persona::{DEFAULT_PERSONA_KEY, PersonaRegistry};
use cao_core::repository::ConfigRepository;
use cao_core::session::SessionConfig;
use cao_infrastructure::TomlConfigRepository;
use clap::Parser;
use colored::Colorize;
use tracing::debug;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let repository = TomlConfigRepository::new()?;
    debug!("Using config file {}", repository.path().display());

    match cli.command {
        Some(Command::Config { action }) => config_cmd::run(action, &repository).await,
        None => {
            let config = repository.load().await?;
            let (registry, session) = session_config(&cli, &config)?;
            if session.debug {
                eprintln!("{}", format!("{:#?}", session.model).bright_black());
            }
            repl::run(registry, session).await
        }
    }
}

/// Resolves the model and persona a session starts with.
fn session_config(cli: &Cli, config: &CaoConfig) -> Result<(PersonaRegistry, SessionConfig)> {
    let model_name = cli
        .model
        .clone()
        .unwrap_or_else(|| config.default_model.clone());
    let model = config
        .model(&model_name)?
        .resolve(&model_name, |var| std::env::var(var).ok())?;

    let registry = PersonaRegistry::with_overrides(config.personas.clone())?;
    let persona = cli.persona.as_deref().unwrap_or(DEFAULT_PERSONA_KEY);
    if !registry.contains(persona) {
        bail!(
            "unknown persona '{persona}'. Available personas: {}",
            registry.keys().join(", ")
        );
    }

    let session = SessionConfig::new(model)
        .with_render_mode(cli.mode)
        .with_initial_persona(persona)
        .with_debug(cli.debug);
    Ok((registry, session))
}
