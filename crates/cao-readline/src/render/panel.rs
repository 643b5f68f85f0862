//! Bordered panel rendering.
//!
//! ```text
//! ╭──────────────╮      ┌──────────────┐
//! │ AI Analysis  │      │ 🌱 Cao       │
//! ├──────────────┤      ├──────────────┤
//! │ wrapped text │      │ wrapped text │
//! ╰──────────────╯      └──────────────┘
//!      normal                 chat
//! ```

use std::io::{self, Write};
use std::time::Duration;

use cao_core::persona::Persona;
use cao_core::session::RenderMode;
use colored::{ColoredString, Colorize};

use super::wrap::{display_width, wrap};
use crate::terminal;

/// Title of panels in normal mode.
pub const NORMAL_TITLE: &str = "AI Analysis";

/// Widest content region, in columns, regardless of terminal size.
pub const MAX_CONTENT_WIDTH: usize = 100;

/// Pause after each revealed character of a chat reply.
pub const REVEAL_DELAY: Duration = Duration::from_millis(5);

struct Glyphs {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
    divider_left: char,
    divider_right: char,
}

const ROUNDED: Glyphs = Glyphs {
    top_left: '╭',
    top_right: '╮',
    bottom_left: '╰',
    bottom_right: '╯',
    horizontal: '─',
    vertical: '│',
    divider_left: '├',
    divider_right: '┤',
};

const SQUARE: Glyphs = Glyphs {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
    divider_left: '├',
    divider_right: '┤',
};

/// Content width for a terminal `terminal_width` columns wide.
pub fn content_width(terminal_width: usize) -> usize {
    terminal_width.saturating_sub(4).clamp(1, MAX_CONTENT_WIDTH)
}

/// Frames `text` under `title`.
///
/// `title` is measured without styling; `styled_title` is what gets printed
/// in the title row. Rows are padded to the content width by display width,
/// so over-wide rows (a single unbreakable word) push the right border out.
pub fn render_panel(
    text: &str,
    mode: RenderMode,
    title: &str,
    styled_title: &str,
    terminal_width: usize,
) -> Vec<String> {
    let glyphs = match mode {
        RenderMode::Normal => &ROUNDED,
        RenderMode::Chat => &SQUARE,
    };
    let width = content_width(terminal_width);
    let rule: String = std::iter::repeat_n(glyphs.horizontal, width + 2).collect();

    let row = |content: &str, content_width: usize| {
        format!(
            "{v} {content}{pad} {v}",
            v = glyphs.vertical,
            pad = " ".repeat(width.saturating_sub(content_width)),
        )
    };

    let mut lines = Vec::new();
    lines.push(format!("{}{rule}{}", glyphs.top_left, glyphs.top_right));
    lines.push(row(styled_title, display_width(title)));
    lines.push(format!("{}{rule}{}", glyphs.divider_left, glyphs.divider_right));
    for line in wrap(text, width) {
        lines.push(row(&line, display_width(&line)));
    }
    lines.push(format!("{}{rule}{}", glyphs.bottom_left, glyphs.bottom_right));
    lines
}

/// Splits a content row into the pieces a chat panel prints one at a time.
///
/// The left border comes first, then one piece per character of the text,
/// then the padding and right border together. Concatenated, the pieces
/// are the row.
pub fn reveal_chunks(row: &str) -> Vec<&str> {
    let head_len = row.char_indices().nth(2).map_or(row.len(), |(i, _)| i);
    let body_end = row
        .char_indices()
        .rev()
        .nth(1)
        .map_or(head_len, |(i, _)| i.max(head_len));
    let text_end = head_len + row[head_len..body_end].trim_end().len();

    let mut chunks = vec![&row[..head_len]];
    let text = &row[head_len..text_end];
    chunks.extend(
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()]),
    );
    chunks.push(&row[text_end..]);
    chunks
}

/// Prints assistant replies in the session's render mode.
#[derive(Debug, Clone, Copy)]
pub struct PanelRenderer {
    mode: RenderMode,
}

impl PanelRenderer {
    pub fn new(mode: RenderMode) -> Self {
        Self { mode }
    }

    /// Writes `text` as a framed panel to stdout.
    ///
    /// Chat panels carry the speaking persona's label and reveal their text
    /// a character at a time; normal panels print at once under a fixed
    /// title.
    pub async fn render(&self, text: &str, persona: &Persona) -> io::Result<()> {
        let (title, styled) = self.title(persona);
        let (columns, _) = terminal::size();
        let lines = render_panel(text, self.mode, &title, &styled.to_string(), columns);

        if self.mode == RenderMode::Normal {
            for line in &lines {
                println!("{line}");
            }
            return Ok(());
        }

        // Frame rows: top, title, divider, then content, then bottom.
        let content_rows = 3..lines.len().saturating_sub(1);
        let mut stdout = io::stdout();
        for (index, line) in lines.iter().enumerate() {
            if !content_rows.contains(&index) {
                writeln!(stdout, "{line}")?;
                continue;
            }
            let chunks = reveal_chunks(line);
            let last = chunks.len() - 1;
            for (position, chunk) in chunks.into_iter().enumerate() {
                write!(stdout, "{chunk}")?;
                stdout.flush()?;
                if position != 0 && position != last {
                    tokio::time::sleep(REVEAL_DELAY).await;
                }
            }
            writeln!(stdout)?;
        }
        stdout.flush()
    }

    fn title(&self, persona: &Persona) -> (String, ColoredString) {
        match self.mode {
            RenderMode::Normal => (NORMAL_TITLE.to_string(), NORMAL_TITLE.bright_cyan().bold()),
            RenderMode::Chat => {
                let label = persona.label();
                let styled = label.bright_green().bold();
                (label, styled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(text: &str, mode: RenderMode, title: &str, columns: usize) -> Vec<String> {
        render_panel(text, mode, title, title, columns)
    }

    #[test]
    fn test_normal_frame_layout() {
        let lines = panel("hello", RenderMode::Normal, NORMAL_TITLE, 24);

        assert_eq!(
            lines,
            vec![
                "╭──────────────────────╮",
                "│ AI Analysis          │",
                "├──────────────────────┤",
                "│ hello                │",
                "╰──────────────────────╯",
            ]
        );
    }

    #[test]
    fn test_chat_frame_uses_square_glyphs() {
        let lines = panel("hi", RenderMode::Chat, "🌱 Cao", 14);

        assert_eq!(lines[0], "┌────────────┐");
        assert_eq!(lines[1], "│ 🌱 Cao     │");
        assert_eq!(lines[3], "│ hi         │");
        assert_eq!(lines[4], "└────────────┘");
    }

    #[test]
    fn test_rows_share_display_width() {
        let text = "线程 panicked at 'index out of bounds'\nsecond line with several words in it";
        let lines = panel(text, RenderMode::Chat, "🎨 Frontend Sensei", 40);

        // title and content rows, skipping the horizontal rules
        let widths: Vec<usize> = lines
            .iter()
            .filter(|l| !l.contains('─'))
            .map(|l| display_width(l))
            .collect();
        assert_eq!(widths.len(), lines.len() - 3);
        assert!(widths.iter().all(|w| *w == widths[0]), "{widths:?}");
    }

    #[test]
    fn test_styled_title_is_padded_by_plain_width() {
        let lines = render_panel("x", RenderMode::Normal, "AI", "\u{1b}[1mAI\u{1b}[0m", 10);
        assert_eq!(lines[1], "│ \u{1b}[1mAI\u{1b}[0m     │");
    }

    #[test]
    fn test_reveal_chunks_rebuild_the_row() {
        let lines = panel("héllo 线程", RenderMode::Chat, "🌱 Cao", 20);
        let row = &lines[3];

        let chunks = reveal_chunks(row);

        assert_eq!(chunks.concat(), *row);
        assert_eq!(chunks[0], "│ ");
        assert_eq!(&chunks[1..9], ["h", "é", "l", "l", "o", " ", "线", "程"]);
        assert_eq!(chunks.len(), "héllo 线程".chars().count() + 2);
        assert!(chunks[9].ends_with(" │"));
        assert!(chunks[9].trim_end_matches('│').trim().is_empty());
    }

    #[test]
    fn test_reveal_chunks_of_blank_row() {
        let lines = panel("", RenderMode::Chat, "🌱 Cao", 12);

        let chunks = reveal_chunks(&lines[3]);

        assert_eq!(chunks, vec!["│ ", "         │"]);
    }

    #[test]
    fn test_reveal_chunks_of_overwide_row() {
        let lines = panel("abcdefghij", RenderMode::Chat, "x", 8);
        let row = lines.iter().find(|l| l.contains("abcd")).unwrap();

        let chunks = reveal_chunks(row);

        assert_eq!(chunks.concat(), *row);
        assert_eq!(chunks.last(), Some(&" │"));
    }

    #[test]
    fn test_content_width_is_capped() {
        assert_eq!(content_width(80), 76);
        assert_eq!(content_width(300), MAX_CONTENT_WIDTH);
        assert_eq!(content_width(3), 1);
    }

    #[test]
    fn test_empty_text_renders_an_empty_row() {
        let lines = panel("", RenderMode::Normal, NORMAL_TITLE, 30);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], format!("│ {} │", " ".repeat(26)));
    }
}
