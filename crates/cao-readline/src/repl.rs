//! Interactive session loop.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use cao_core::persona::PersonaRegistry;
use cao_core::session::SessionConfig;
use cao_interaction::session::EXIT_TOKENS;
use cao_interaction::{HttpCompletionClient, InteractionResult, SessionEngine};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, EditMode, Editor, Helper};
use tracing::debug;

use crate::render::PanelRenderer;
use crate::spinner::{self, WaitOutcome};

const PROMPT: &str = "cao 🌿 > ";
const THINKING_LABEL: &str = "Thinking...";

/// rustyline helper: completes slash commands, hints the rest of a partially
/// typed one and highlights slash lines.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new(registry: &PersonaRegistry) -> Self {
        let mut commands: Vec<String> = registry.keys().iter().map(|key| format!("/{key}")).collect();
        commands.extend(
            EXIT_TOKENS
                .iter()
                .filter(|token| token.starts_with('/'))
                .map(|token| token.to_string()),
        );
        Self { commands }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(char::is_whitespace) {
            return Ok((0, Vec::new()));
        }

        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(char::is_whitespace) {
            return None;
        }

        self.commands
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for CliHelper {}

fn editor(registry: &PersonaRegistry) -> Result<Editor<CliHelper, DefaultHistory>> {
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .auto_add_history(false)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(CliHelper::new(registry)));
    Ok(rl)
}

fn print_banner(registry: &PersonaRegistry) {
    println!("{}", "=== cao 🌿 ===".bright_magenta().bold());
    println!("{}", "Personas:".bright_black());
    for persona in registry.iter() {
        let origin = if persona.is_builtin() { "" } else { " (custom)" };
        println!(
            "  {} {}{}",
            format!("/{}", persona.key).bright_cyan(),
            persona.label(),
            origin.bright_black()
        );
    }
    println!(
        "{}",
        "Type /<persona> to switch, /<persona> <message> to switch and ask, or 'exit' to leave."
            .bright_black()
    );
    println!();
}

fn print_goodbye(reason: Option<&str>) {
    match reason {
        Some(reason) => println!("{}", format!("{reason} Goodbye!").bright_green()),
        None => println!("{}", "Goodbye!".bright_green()),
    }
}

/// Runs an interactive session until an exit token, Ctrl-C or Ctrl-D.
pub async fn run(registry: PersonaRegistry, config: SessionConfig) -> Result<()> {
    let client = Arc::new(HttpCompletionClient::new(config.model.clone())?);
    let mut engine = SessionEngine::new(registry, &config.initial_persona, client)?;
    let renderer = PanelRenderer::new(config.render_mode);
    let mut rl = editor(engine.registry())?;

    print_banner(engine.registry());
    renderer.render(engine.greeting(), engine.active_persona()).await?;

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                engine.terminate();
                print_goodbye(Some("Interrupted."));
                break;
            }
            Err(ReadlineError::Eof) => {
                engine.terminate();
                print_goodbye(None);
                break;
            }
            Err(err) => {
                engine.terminate();
                return Err(err.into());
            }
        };

        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }

        match engine.handle_input(&line)? {
            InteractionResult::Terminate => {
                print_goodbye(None);
                break;
            }
            InteractionResult::NoOp => {}
            InteractionResult::PersonaSwitched { persona } => {
                println!("{}", format!("Switched to {}", persona.label()).bright_yellow());
            }
            InteractionResult::UnknownCommand { command } => {
                let available: Vec<String> = engine
                    .registry()
                    .keys()
                    .iter()
                    .map(|key| format!("/{key}"))
                    .collect();
                println!(
                    "{}",
                    format!("Unknown command {command}. Available: {}", available.join(" "))
                        .bright_black()
                );
            }
            InteractionResult::Dispatched => {
                match spinner::wait_for_reply(&mut engine, THINKING_LABEL).await {
                    WaitOutcome::Reply(reply) => {
                        renderer.render(&reply, engine.active_persona()).await?;
                        engine.mark_rendered();
                    }
                    WaitOutcome::Interrupted => {
                        debug!("Interrupted while waiting for a reply");
                        engine.terminate();
                        print_goodbye(Some("Interrupted."));
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
