//! Progress indicator shown while a completion runs.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use cao_interaction::SessionEngine;
use colored::Colorize;
use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

const FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// How often the result slot is checked.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How often the spinner glyph advances.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// How waiting for a reply ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Reply(String),
    Interrupted,
}

/// Frame sequencing, kept apart from drawing.
#[derive(Debug)]
pub struct Spinner {
    frame: usize,
    last_drawn: Option<Instant>,
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            frame: 0,
            last_drawn: None,
        }
    }

    /// Returns the glyph to draw at `now`, or `None` if the current one is
    /// still fresh.
    pub fn advance(&mut self, now: Instant) -> Option<char> {
        let fresh = self
            .last_drawn
            .is_some_and(|last| now.duration_since(last) < FRAME_INTERVAL);
        if fresh {
            return None;
        }
        let glyph = FRAMES[self.frame % FRAMES.len()];
        self.frame += 1;
        self.last_drawn = Some(now);
        Some(glyph)
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls the engine until the reply arrives or Ctrl-C is pressed, animating
/// a spinner on the current line in the meantime.
pub async fn wait_for_reply(engine: &mut SessionEngine, label: &str) -> WaitOutcome {
    let mut spinner = Spinner::new();
    let mut poll = tokio::time::interval(POLL_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break WaitOutcome::Interrupted,
            _ = poll.tick() => {
                if let Some(reply) = engine.poll_reply() {
                    break WaitOutcome::Reply(reply);
                }
                if let Some(glyph) = spinner.advance(Instant::now()) {
                    let _ = draw(glyph, label);
                }
            }
        }
    };

    let _ = clear();
    outcome
}

fn draw(glyph: char, label: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(
        stdout,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(format!("{} {}", glyph.to_string().bright_cyan(), label.bright_black())),
    )?;
    stdout.flush()
}

fn clear() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_is_immediate() {
        let mut spinner = Spinner::new();
        assert_eq!(spinner.advance(Instant::now()), Some('⠋'));
    }

    #[test]
    fn test_frames_advance_at_most_every_interval() {
        let mut spinner = Spinner::new();
        let start = Instant::now();

        assert_eq!(spinner.advance(start), Some('⠋'));
        assert_eq!(spinner.advance(start + Duration::from_millis(10)), None);
        assert_eq!(spinner.advance(start + Duration::from_millis(90)), None);
        assert_eq!(spinner.advance(start + FRAME_INTERVAL), Some('⠙'));
    }

    #[test]
    fn test_frames_wrap_around() {
        let mut spinner = Spinner::new();
        let start = Instant::now();
        let drawn: Vec<char> = (0..12)
            .filter_map(|i| spinner.advance(start + FRAME_INTERVAL * i))
            .collect();

        assert_eq!(drawn.len(), 12);
        assert_eq!(drawn[10], FRAMES[0]);
        assert_eq!(drawn[11], FRAMES[1]);
    }
}
