//! End-to-end session tests for Checkpoint.
//!
//! Sessions run exactly as `ckpt-cli` runs them (argument decoding, the
//! interpreter, the session loop) but against a [`MemoryStore`] and an
//! in-memory console, so no database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p checkpoint-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let harness = Harness::new();
//! let _user = harness.store.add_user("ada@example.com", "Ada");
//! let outcome = harness.run(&[], "add ada@example.com\ny\nn\nn\ny\nn\nq\n").await;
//! assert_eq!(outcome.exit_code(), 0);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use checkpoint_cli::commands::Interpreter;
use checkpoint_cli::console::Console;
use checkpoint_cli::db::MemoryStore;
use checkpoint_cli::session::{self, Invocation, SessionEnd, SessionError};
use tempfile::TempDir;

/// Name of the whitelist CSV inside the harness directory.
pub const WHITELIST_FILE: &str = "whitelist.csv";

/// A store plus a scratch directory for batch and CSV files.
pub struct Harness {
    pub store: MemoryStore,
    dir: TempDir,
}

/// Result and console transcript of one session.
#[derive(Debug)]
pub struct Outcome {
    pub result: Result<SessionEnd, SessionError>,
    pub output: String,
}

impl Outcome {
    /// Exit status the binary would return.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match &self.result {
            Ok(end) => end.exit_code(),
            Err(e) => e.exit_code(),
        }
    }

    /// Number of output lines that report a failed command.
    #[must_use]
    pub fn error_lines(&self) -> usize {
        self.output
            .lines()
            .filter(|line| line.contains("Error: "))
            .count()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// An empty store and a fresh scratch directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Path of `name` inside the scratch directory.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a file into the scratch directory and return its path as an
    /// argument string.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn write_file(&self, name: &str, contents: &str) -> String {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path.to_string_lossy().into_owned()
    }

    /// Decode `args` and run the session with `input` as the console.
    ///
    /// Usage errors are reported the same way the binary reports them: as a
    /// `SessionError::FatalUsage` with nothing run.
    pub async fn run(&self, args: &[&str], input: &str) -> Outcome {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        let invocation = match Invocation::from_args(&args) {
            Ok(invocation) => invocation,
            Err(e) => {
                return Outcome {
                    result: Err(e.into()),
                    output: String::new(),
                };
            }
        };

        let console = Console::new(input.as_bytes(), Vec::new());
        let mut interpreter = Interpreter::new(&self.store, console, self.path(WHITELIST_FILE));
        let result = session::run(&mut interpreter, &invocation).await;
        let (_, output) = interpreter.into_console().into_parts();

        Outcome {
            result,
            output: String::from_utf8_lossy(&output).into_owned(),
        }
    }
}
