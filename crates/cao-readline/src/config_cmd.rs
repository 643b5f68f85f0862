//! `cao config` subcommands.

use std::fs;

use anyhow::{Context, Result};
use cao_core::config::{CaoConfig, ModelConfig};
use cao_core::repository::ConfigRepository;
use cao_infrastructure::TomlConfigRepository;
use colored::Colorize;

use crate::cli::ConfigAction;

pub async fn run(action: ConfigAction, repository: &TomlConfigRepository) -> Result<()> {
    match action {
        ConfigAction::List => {
            let config = repository.load().await?;
            print!("{}", format_model_table(&config));
        }
        ConfigAction::Add {
            name,
            api_base,
            model,
            provider,
            api_key,
        } => {
            let mut entry = ModelConfig::new(api_base, model, provider.unwrap_or_else(|| name.clone()));
            entry.api_key = api_key;
            let added = name.clone();
            repository
                .update(move |config| {
                    config.add_model(name, entry);
                    Ok(())
                })
                .await?;
            println!("{}", format!("Saved model '{added}'").bright_green());
        }
        ConfigAction::Remove { name } => {
            let removed = name.clone();
            repository
                .update(move |config| config.remove_model(&name).map(|_| ()))
                .await?;
            println!("{}", format!("Removed model '{removed}'").bright_green());
        }
        ConfigAction::SetDefault { name } => {
            let chosen = name.clone();
            repository
                .update(move |config| config.set_default_model(&name))
                .await?;
            println!("{}", format!("Default model is now '{chosen}'").bright_green());
        }
        ConfigAction::Export { file } => {
            let config = repository.load().await?;
            let text = toml::to_string_pretty(&config)?;
            match file {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("{}", format!("Exported config to {}", path.display()).bright_green());
                }
                None => print!("{text}"),
            }
        }
        ConfigAction::Import { file } => {
            let imported = TomlConfigRepository::read_external(&file)
                .with_context(|| format!("cannot import {}", file.display()))?;
            repository.save(&imported).await?;
            println!("{}", format!("Imported config from {}", file.display()).bright_green());
        }
        ConfigAction::Path => println!("{}", repository.path().display()),
    }
    Ok(())
}

fn format_model_table(config: &CaoConfig) -> String {
    let name_width = config
        .models
        .keys()
        .map(String::len)
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or(4);
    let model_width = config
        .models
        .values()
        .map(|m| m.model.len())
        .chain(std::iter::once("MODEL".len()))
        .max()
        .unwrap_or(5);

    let mut out = format!(
        "  {:<name_width$}  {:<model_width$}  {}\n",
        "NAME", "MODEL", "API BASE"
    );
    for (name, model) in &config.models {
        let marker = if *name == config.default_model { "✓" } else { " " };
        out.push_str(&format!(
            "{marker} {name:<name_width$}  {:<model_width$}  {}\n",
            model.model, model.api_base
        ));
    }
    out
}
