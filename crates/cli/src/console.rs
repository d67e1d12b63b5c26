//! Operator console: line input, output, and the per-field access prompt.
//!
//! The console is generic over its reader and writer so sessions can run on
//! stdin/stdout or on in-memory buffers.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use checkpoint_core::{AccessField, AccessSet, Decision};
use thiserror::Error;

/// Error type for prompt operations.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The operator asked to leave, or input ended mid-prompt.
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Whether a line asks to end the session.
#[must_use]
pub fn is_exit_keyword(input: &str) -> bool {
    matches!(input, "exit" | "quit" | "q")
}

/// Whether a line asks for the usage block.
#[must_use]
pub fn is_help_keyword(input: &str) -> bool {
    matches!(input, "h" | "help")
}

/// Interactive console over a line reader and a writer.
#[derive(Debug)]
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Create a console.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one line without its line terminator.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying reader.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Write text without a newline and flush it, for prompts.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn print(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }

    /// Write one line.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn say(&mut self, line: impl Display) -> io::Result<()> {
        writeln!(self.output, "{line}")?;
        self.output.flush()
    }

    /// Ask whether to grant one access field.
    ///
    /// Re-prompts until the answer is a [`Decision`] or an exit keyword.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::Cancelled` on `exit`/`quit`/`q` or end of input,
    /// and `PromptError::Io` if the console cannot be read or written.
    pub fn ask_for_access(&mut self, field: AccessField) -> Result<Decision, PromptError> {
        loop {
            self.print(&format!("Grant {} access? (y/n): ", field.label()))?;
            let Some(answer) = self.read_line()? else {
                return Err(PromptError::Cancelled);
            };
            let answer = answer.trim().to_ascii_lowercase();
            if is_exit_keyword(&answer) {
                return Err(PromptError::Cancelled);
            }
            if let Some(decision) = Decision::from_answer(&answer) {
                return Ok(decision);
            }
            tracing::debug!(%field, answer = %answer, "rejected access answer");
            self.say("Invalid input. Please enter 'y' for yes or 'n' for no.")?;
        }
    }

    /// Ask about every access field in order and apply the answers.
    ///
    /// The set is only modified once all five answers are in, so a
    /// cancellation leaves it untouched.
    ///
    /// # Errors
    ///
    /// See [`Console::ask_for_access`].
    pub fn collect_access(&mut self, access: &mut AccessSet) -> Result<(), PromptError> {
        let mut decisions = Vec::with_capacity(AccessField::ALL.len());
        for field in AccessField::ALL {
            decisions.push((field, self.ask_for_access(field)?));
        }
        for (field, decision) in decisions {
            access.apply(field, decision);
        }
        Ok(())
    }

    /// The underlying writer.
    pub const fn output(&self) -> &W {
        &self.output
    }

    /// Split the console back into its reader and writer.
    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}
