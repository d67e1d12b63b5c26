//! Command tables and the line dispatcher.
//!
//! # Usage
//!
//! ```text
//! admin mode       flag mode        whitelist mode
//! add <email>      see              add
//! delete <email>   set <flag>
//! modify <email>   reset <flag>
//! ```
//!
//! A line is split on whitespace; the first token selects the command from
//! the active [`CommandTable`] and the next token, if the command takes one,
//! is its argument. Anything after that is ignored.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use checkpoint_core::Mode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::console::Console;
use crate::db::Store;
use crate::render;
use crate::services::{AdminService, FlagService, RecordError, WhitelistService};

// =============================================================================
// Commands
// =============================================================================

/// A command in one of the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    AddAdmin,
    DeleteAdmin,
    ModifyAdmin,
    SeeFlags,
    SetFlag,
    ResetFlag,
    ImportWhitelist,
}

impl Command {
    /// Keyword typed by the operator.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AddAdmin | Self::ImportWhitelist => "add",
            Self::DeleteAdmin => "delete",
            Self::ModifyAdmin => "modify",
            Self::SeeFlags => "see",
            Self::SetFlag => "set",
            Self::ResetFlag => "reset",
        }
    }

    /// Name of the required argument, if any.
    #[must_use]
    pub const fn argument(self) -> Option<&'static str> {
        match self {
            Self::AddAdmin | Self::DeleteAdmin | Self::ModifyAdmin => Some("email"),
            Self::SetFlag | Self::ResetFlag => Some("flag"),
            Self::SeeFlags | Self::ImportWhitelist => None,
        }
    }

    /// What the command is doing, for error messages.
    #[must_use]
    pub const fn activity(self) -> &'static str {
        match self {
            Self::AddAdmin => "adding admin",
            Self::DeleteAdmin => "deleting admin",
            Self::ModifyAdmin => "modifying admin",
            Self::SeeFlags => "listing flags",
            Self::SetFlag => "setting flag",
            Self::ResetFlag => "resetting flag",
            Self::ImportWhitelist => "importing whitelist",
        }
    }

    const fn summary(self) -> &'static str {
        match self {
            Self::AddAdmin => "to add an admin",
            Self::DeleteAdmin => "to delete an admin",
            Self::ModifyAdmin => "to modify an admin",
            Self::SeeFlags => "to list every flag",
            Self::SetFlag => "to turn a flag on",
            Self::ResetFlag => "to turn a flag off",
            Self::ImportWhitelist => "to import the whitelist CSV",
        }
    }

    /// The command as typed, e.g. `add <email>`.
    #[must_use]
    pub fn usage(self) -> String {
        match self.argument() {
            Some(argument) => format!("{} <{argument}>", self.name()),
            None => self.name().to_owned(),
        }
    }
}

const ADMIN_COMMANDS: &[Command] = &[Command::AddAdmin, Command::DeleteAdmin, Command::ModifyAdmin];
const FLAG_COMMANDS: &[Command] = &[Command::SeeFlags, Command::SetFlag, Command::ResetFlag];
const WHITELIST_COMMANDS: &[Command] = &[Command::ImportWhitelist];

/// The commands available in one mode. Tables are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTable {
    mode: Mode,
    commands: &'static [Command],
}

impl CommandTable {
    /// The table for a mode.
    #[must_use]
    pub const fn for_mode(mode: Mode) -> Self {
        let commands = match mode {
            Mode::Admin => ADMIN_COMMANDS,
            Mode::Flag => FLAG_COMMANDS,
            Mode::Whitelist => WHITELIST_COMMANDS,
        };
        Self { mode, commands }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Find a command by its exact keyword.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Command> {
        self.commands.iter().copied().find(|c| c.name() == name)
    }

    /// Help block listing the session keywords and every command.
    #[must_use]
    pub fn usage(&self) -> String {
        let mut text = String::from("Available commands:\n");
        text.push_str("  Type 'q' to exit\n");
        text.push_str("  Type 'h' for help\n");
        for command in self.commands {
            text.push_str(&format!("  Type '{}' {}\n", command.usage(), command.summary()));
        }
        text
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Errors from dispatching one line.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("empty command")]
    EmptyCommand,

    #[error("unknown command {0}")]
    UnknownCommand(String),

    #[error("missing {argument} for {command} command")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("{}: {source}", .command.activity())]
    OperationFailed {
        command: Command,
        #[source]
        source: RecordError,
    },

    /// The operator left mid-prompt; the session should end.
    #[error("cancelled by user")]
    Cancelled,

    /// The console could not be written.
    #[error("console output failed: {0}")]
    Output(#[from] io::Error),
}

/// Runs lines against a store, prompting and reporting on a console.
pub struct Interpreter<'a, S: ?Sized, R, W> {
    store: &'a S,
    console: Console<R, W>,
    whitelist_path: PathBuf,
}

impl<'a, S, R, W> Interpreter<'a, S, R, W>
where
    S: Store + ?Sized,
    R: BufRead,
    W: Write,
{
    /// Create an interpreter. `whitelist_path` is the CSV read by the
    /// whitelist `add` command.
    pub fn new(store: &'a S, console: Console<R, W>, whitelist_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            console,
            whitelist_path: whitelist_path.into(),
        }
    }

    pub const fn console_mut(&mut self) -> &mut Console<R, W> {
        &mut self.console
    }

    /// Give back the console.
    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Parse one line and run it against `table`.
    ///
    /// An unknown command prints the table's usage block. Nothing touches
    /// the store until the command and its argument are known.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] describing why the line did not run.
    /// `DispatchError::Cancelled` means the session should end.
    pub async fn dispatch(
        &mut self,
        line: &str,
        table: &CommandTable,
    ) -> Result<(), DispatchError> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Err(DispatchError::EmptyCommand);
        };

        let Some(command) = table.lookup(name) else {
            warn!(mode = %table.mode(), command = name, "unknown command");
            self.console.print(&table.usage())?;
            return Err(DispatchError::UnknownCommand(name.to_owned()));
        };

        let argument = match command.argument() {
            Some(argument) => tokens.next().ok_or(DispatchError::MissingArgument {
                command: command.name(),
                argument,
            })?,
            None => "",
        };

        debug!(?command, argument, "dispatching");
        self.execute(command, argument).await.map_err(|source| match source {
            RecordError::Cancelled => DispatchError::Cancelled,
            source => DispatchError::OperationFailed { command, source },
        })
    }

    async fn execute(&mut self, command: Command, argument: &str) -> Result<(), RecordError> {
        match command {
            Command::AddAdmin => {
                AdminService::new(self.store)
                    .add(argument, &mut self.console)
                    .await?;
                self.console.say("Admin added successfully")?;
            }
            Command::DeleteAdmin => {
                AdminService::new(self.store).delete(argument).await?;
                self.console.say("Admin deleted successfully")?;
            }
            Command::ModifyAdmin => {
                AdminService::new(self.store)
                    .modify(argument, &mut self.console)
                    .await?;
                self.console.say("Admin modified successfully")?;
            }
            Command::SeeFlags => {
                let flags = FlagService::new(self.store).list().await?;
                self.console.print(&render::flags_table(&flags))?;
            }
            Command::SetFlag => {
                FlagService::new(self.store).set(argument).await?;
                self.console.say(format!("Flag {argument} set to true"))?;
            }
            Command::ResetFlag => {
                FlagService::new(self.store).reset(argument).await?;
                self.console.say(format!("Flag {argument} reset to false"))?;
            }
            Command::ImportWhitelist => {
                let summary = WhitelistService::new(self.store)
                    .import(&self.whitelist_path)
                    .await?;
                self.console.say(summary)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, Operation};

    fn interpreter<'a>(
        store: &'a MemoryStore,
        input: &'a str,
    ) -> Interpreter<'a, MemoryStore, &'a [u8], Vec<u8>> {
        Interpreter::new(store, Console::new(input.as_bytes(), Vec::new()), "whitelist.csv")
    }

    fn transcript(interp: Interpreter<'_, MemoryStore, &[u8], Vec<u8>>) -> String {
        String::from_utf8(interp.into_console().into_parts().1).unwrap()
    }

    #[test]
    fn test_tables_are_disjoint_by_mode() {
        let admin = CommandTable::for_mode(Mode::Admin);
        let flag = CommandTable::for_mode(Mode::Flag);
        let whitelist = CommandTable::for_mode(Mode::Whitelist);

        assert_eq!(admin.lookup("add"), Some(Command::AddAdmin));
        assert_eq!(whitelist.lookup("add"), Some(Command::ImportWhitelist));
        assert_eq!(flag.lookup("add"), None);
        assert_eq!(admin.lookup("see"), None);
        assert_eq!(flag.lookup("ADD"), None);
    }

    #[test]
    fn test_usage_lists_every_command() {
        let usage = CommandTable::for_mode(Mode::Flag).usage();
        assert!(usage.contains("'q' to exit"));
        assert!(usage.contains("'h' for help"));
        assert!(usage.contains("'see'"));
        assert!(usage.contains("'set <flag>'"));
        assert!(usage.contains("'reset <flag>'"));
    }

    #[tokio::test]
    async fn test_empty_line() {
        let store = MemoryStore::new();
        let table = CommandTable::for_mode(Mode::Admin);
        let err = interpreter(&store, "").dispatch("   ", &table).await.unwrap_err();
        assert!(matches!(err, DispatchError::EmptyCommand));
    }

    #[tokio::test]
    async fn test_unknown_command_prints_usage_and_skips_store() {
        let store = MemoryStore::new();
        let table = CommandTable::for_mode(Mode::Admin);
        let mut interp = interpreter(&store, "");

        let err = interp.dispatch("grant a@b.com", &table).await.unwrap_err();

        assert!(matches!(err, DispatchError::UnknownCommand(ref c) if c == "grant"));
        assert!(store.operations().is_empty());
        assert!(transcript(interp).starts_with("Available commands:"));
    }

    #[tokio::test]
    async fn test_missing_argument_skips_store() {
        let store = MemoryStore::new();
        let table = CommandTable::for_mode(Mode::Admin);
        let err = interpreter(&store, "").dispatch("delete", &table).await.unwrap_err();

        assert_eq!(err.to_string(), "missing email for delete command");
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn test_extra_arguments_are_ignored() {
        let store = MemoryStore::new();
        store.add_flag("beta", false);
        let table = CommandTable::for_mode(Mode::Flag);

        interpreter(&store, "")
            .dispatch("set beta now please", &table)
            .await
            .unwrap();

        assert_eq!(store.flag("beta"), Some(true));
    }

    #[tokio::test]
    async fn test_operation_failure_names_activity() {
        let store = MemoryStore::new();
        let table = CommandTable::for_mode(Mode::Admin);
        let err = interpreter(&store, "")
            .dispatch("add ghost@b.com", &table)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::OperationFailed {
                command: Command::AddAdmin,
                source: RecordError::UserNotFound,
            }
        ));
        assert_eq!(err.to_string(), "adding admin: user not found");
    }

    #[tokio::test]
    async fn test_prompt_exit_cancels_dispatch() {
        let store = MemoryStore::new();
        let _user = store.add_user("a@b.com", "A");
        let table = CommandTable::for_mode(Mode::Admin);

        let err = interpreter(&store, "q\n")
            .dispatch("add a@b.com", &table)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Cancelled));
        assert!(!store.writes().contains(&Operation::InsertAdmin));
    }

    #[tokio::test]
    async fn test_see_prints_table() {
        let store = MemoryStore::new();
        store.add_flag("checkin", true);
        let table = CommandTable::for_mode(Mode::Flag);
        let mut interp = interpreter(&store, "");

        interp.dispatch("see", &table).await.unwrap();

        let out = transcript(interp);
        assert!(out.contains("| Flag    | Value |"));
        assert!(out.contains("| checkin | true  |"));
    }
}
