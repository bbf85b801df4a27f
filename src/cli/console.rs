//! User-facing input and output.
//!
//! All prompts and status messages go through the `Console` trait so the menu
//! and its operations can be driven by a scripted console in tests.

use crate::error::{AppError, Result};
use colored::*;
use dialoguer::console::Term;
use dialoguer::{theme::ColorfulTheme, Input};
use std::io::{self, BufRead, IsTerminal, Write};

pub trait Console {
    /// Asks for one line of free text; the answer is trimmed.
    fn prompt(&mut self, message: &str) -> Result<String>;

    fn say(&mut self, message: &str);

    fn success(&mut self, message: &str);

    fn warn(&mut self, message: &str);

    fn error(&mut self, message: &str);

    /// Asks a y/n question. Only `y` (any case) counts as yes.
    fn confirm(&mut self, message: &str) -> Result<bool> {
        let answer = self.prompt(&format!("{message} (y/n)"))?;
        Ok(answer.eq_ignore_ascii_case("y"))
    }
}

/// Console on stdin/stdout.
///
/// Uses `dialoguer` prompts, drawn on stdout, when both stdin and stdout are
/// terminals, and plain line reads otherwise. Redirecting stderr (where logs
/// go) never affects prompting.
pub struct TerminalConsole {
    theme: ColorfulTheme,
    term: Term,
    interactive: bool,
}

impl TerminalConsole {
    pub fn new() -> Self {
        let term = Term::stdout();
        let interactive = use_dialoguer(io::stdin().is_terminal(), term.is_term());
        Self {
            theme: ColorfulTheme::default(),
            term,
            interactive,
        }
    }

    fn read_piped_line(&self, message: &str) -> Result<String> {
        print!("{message}: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(AppError::InputClosed);
        }
        Ok(line)
    }
}

impl Console for TerminalConsole {
    fn prompt(&mut self, message: &str) -> Result<String> {
        let answer = if self.interactive {
            Input::<String>::with_theme(&self.theme)
                .with_prompt(message)
                .allow_empty(true)
                .interact_text_on(&self.term)?
        } else {
            self.read_piped_line(message)?
        };
        Ok(answer.trim().to_string())
    }

    fn say(&mut self, message: &str) {
        println!("{}", message);
    }

    fn success(&mut self, message: &str) {
        println!("{}", message.green());
    }

    fn warn(&mut self, message: &str) {
        println!("{}", message.yellow());
    }

    fn error(&mut self, message: &str) {
        println!("{}", message.red());
    }
}

/// Whether prompts can be drawn with `dialoguer`.
///
/// Both ends must be terminals: keystrokes come from stdin and the prompt is
/// rendered on stdout.
pub(crate) fn use_dialoguer(stdin_is_tty: bool, stdout_is_tty: bool) -> bool {
    stdin_is_tty && stdout_is_tty
}
