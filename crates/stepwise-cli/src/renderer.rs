//! Terminal rendering of the markdown produced by the display layer.
//!
//! Rich output goes through termimad; `--no-color` prints the markdown as is.

use anyhow::Result;
use stepwise_core::display::{OperationStatus, Tone};
use termimad::{crossterm::style::Color, MadSkin};

const BLUE: &str = "\x1b[34m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Terminal renderer that can switch between rich and plain text output
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();

        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::DarkGrey);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Render markdown text to the terminal.
    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{markdown}");
            return Ok(());
        }

        for line in markdown.lines() {
            // Headers keep their hashes so ids stay easy to spot
            if line.starts_with('#') {
                println!("{BLUE}{line}{RESET}");
            } else if let Some(note) = line.strip_prefix("> ") {
                println!("{YELLOW}{note}{RESET}");
            } else {
                self.skin.print_inline(line);
                println!();
            }
        }
        Ok(())
    }

    /// Render a one-line status, colored by its tone.
    pub fn status(&self, status: &OperationStatus) -> Result<()> {
        if !self.rich_enabled {
            print!("{status}");
            return Ok(());
        }

        let color = Self::tone_color(status.tone);
        print!("{color}{status}{RESET}");
        Ok(())
    }

    fn tone_color(tone: Tone) -> &'static str {
        match tone {
            Tone::Success => GREEN,
            Tone::Notice => YELLOW,
            Tone::Failure => RED,
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}
