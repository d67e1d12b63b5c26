//! Session runner: argument decoding, the interactive loop and batch files.
//!
//! # Invocation
//!
//! ```bash
//! ckpt-cli                      # interactive, admin commands
//! ckpt-cli flag                 # interactive, flag commands
//! ckpt-cli grant_admin.txt      # batch: "grant <line>" for every line, admin table
//! ckpt-cli flag set.txt         # batch: "set <line>" for every line, flag table
//! ```
//!
//! # Exit status
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | session ended, or a batch run reported errors       |
//! | 1    | configuration error                                 |
//! | 64   | usage error                                         |
//! | 65   | batch run finished without a single error           |
//! | 74   | file, console or database I/O failure               |

use std::ffi::OsStr;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use checkpoint_core::{Mode, ModeError};
use thiserror::Error;
use tracing::{info, warn};

use crate::commands::{CommandTable, DispatchError, Interpreter};
use crate::console::{is_exit_keyword, is_help_keyword};
use crate::db::Store;

pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIG: u8 = 1;
pub const EXIT_USAGE: u8 = 64;
/// Batch run with no errors.
pub const EXIT_BATCH_CLEAN: u8 = 65;
pub const EXIT_IO: u8 = 74;

// =============================================================================
// Batch file names
// =============================================================================

/// Why a batch file name could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchNameError {
    #[error("'{0}' has no usable file name")]
    NoFileName(PathBuf),

    #[error("'{0}' does not end in _admin or _flag")]
    MissingDomain(String),

    #[error("'{0}' is not a batch domain (expected admin or flag)")]
    UnknownDomain(String),

    #[error("file name '{0}' has an empty command prefix")]
    EmptyPrefix(String),

    #[error("file name is for {found} commands but {expected} mode was requested")]
    DomainMismatch { expected: Mode, found: Mode },
}

/// A batch file name decoded into a command prefix and a mode.
///
/// `grant_admin.txt` decodes to prefix `grant` in admin mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    pub prefix: String,
    pub mode: Mode,
}

fn file_stem(path: &Path) -> Result<&str, BatchNameError> {
    path.file_stem()
        .and_then(OsStr::to_str)
        .ok_or_else(|| BatchNameError::NoFileName(path.to_path_buf()))
}

fn batch_domain(domain: &str) -> Option<Mode> {
    domain.parse::<Mode>().ok().filter(|mode| mode.supports_batch())
}

impl BatchFile {
    /// Decode `<prefix>_<domain>.<ext>`.
    ///
    /// # Errors
    ///
    /// Returns a [`BatchNameError`] if the stem lacks a known domain suffix
    /// or the prefix is empty.
    pub fn parse(path: &Path) -> Result<Self, BatchNameError> {
        let stem = file_stem(path)?;
        let (prefix, domain) = stem
            .rsplit_once('_')
            .ok_or_else(|| BatchNameError::MissingDomain(stem.to_owned()))?;
        let mode =
            batch_domain(domain).ok_or_else(|| BatchNameError::UnknownDomain(domain.to_owned()))?;
        if prefix.is_empty() {
            return Err(BatchNameError::EmptyPrefix(stem.to_owned()));
        }
        Ok(Self {
            prefix: prefix.to_owned(),
            mode,
        })
    }

    /// Decode a file name for an explicitly chosen mode.
    ///
    /// A `_admin`/`_flag` suffix must agree with `mode`; without one the
    /// whole stem is the prefix, so `set.txt` in flag mode runs `set <line>`.
    ///
    /// # Errors
    ///
    /// Returns `BatchNameError::DomainMismatch` if the suffix names the other
    /// mode, and `BatchNameError::EmptyPrefix` if no prefix remains.
    pub fn parse_for_mode(path: &Path, mode: Mode) -> Result<Self, BatchNameError> {
        let stem = file_stem(path)?;
        let prefix = match stem.rsplit_once('_') {
            Some((prefix, domain)) => match domain.parse::<Mode>() {
                Ok(found) if found == mode => prefix,
                Ok(found) => {
                    return Err(BatchNameError::DomainMismatch {
                        expected: mode,
                        found,
                    });
                }
                Err(_) => stem,
            },
            None => stem,
        };
        if prefix.is_empty() {
            return Err(BatchNameError::EmptyPrefix(stem.to_owned()));
        }
        Ok(Self {
            prefix: prefix.to_owned(),
            mode,
        })
    }
}

// =============================================================================
// Invocation
// =============================================================================

/// Bad command-line arguments.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("too many arguments provided ({0}, expected at most 2)")]
    TooManyArguments(usize),

    #[error(transparent)]
    UnknownMode(#[from] ModeError),

    #[error("{0} mode has no batch form")]
    NoBatchForm(Mode),

    #[error(transparent)]
    BatchName(#[from] BatchNameError),
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Interactive(Mode),
    Batch { path: PathBuf, file: BatchFile },
}

impl Invocation {
    /// Decode the positional arguments (program name excluded).
    ///
    /// # Errors
    ///
    /// Returns a [`UsageError`] for more than two arguments, an unknown mode
    /// keyword in the two-argument form, or an undecodable batch file name.
    pub fn from_args(args: &[String]) -> Result<Self, UsageError> {
        match args {
            [] => Ok(Self::Interactive(Mode::Admin)),
            [only] => match only.parse::<Mode>() {
                Ok(mode) => Ok(Self::Interactive(mode)),
                Err(_) => {
                    let path = PathBuf::from(only);
                    let file = BatchFile::parse(&path)?;
                    Ok(Self::Batch { path, file })
                }
            },
            [mode, path] => {
                let mode = mode.parse::<Mode>()?;
                if !mode.supports_batch() {
                    return Err(UsageError::NoBatchForm(mode));
                }
                let path = PathBuf::from(path);
                let file = BatchFile::parse_for_mode(&path, mode)?;
                Ok(Self::Batch { path, file })
            }
            _ => Err(UsageError::TooManyArguments(args.len())),
        }
    }

    /// Mode whose command table the session uses.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Interactive(mode) => *mode,
            Self::Batch { file, .. } => file.mode,
        }
    }
}

// =============================================================================
// Session outcome
// =============================================================================

/// A failure that ends the process.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    FatalUsage(#[from] UsageError),

    #[error("could not read file {}: {source}", .path.display())]
    FatalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("console I/O failed: {0}")]
    Console(#[from] io::Error),
}

impl SessionError {
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::FatalUsage(_) => EXIT_USAGE,
            Self::FatalIo { .. } | Self::Console(_) => EXIT_IO,
        }
    }
}

/// How a session that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Interactive session left with an exit keyword or end of input.
    Completed,
    /// The operator left while being prompted.
    Cancelled,
    /// Every batch line ran without error.
    BatchClean,
    BatchWithErrors { errors: usize },
}

impl SessionEnd {
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::BatchClean => EXIT_BATCH_CLEAN,
            Self::Completed | Self::Cancelled | Self::BatchWithErrors { .. } => EXIT_OK,
        }
    }
}

// =============================================================================
// Runners
// =============================================================================

/// Reports one dispatch result. Returns `Ok(None)` to keep going, or the
/// session end when the operator cancelled.
fn report<R: BufRead, W: Write, S: Store + ?Sized>(
    interpreter: &mut Interpreter<'_, S, R, W>,
    result: Result<(), DispatchError>,
) -> Result<Option<SessionEnd>, SessionError> {
    match result {
        Ok(()) => Ok(None),
        Err(DispatchError::Cancelled) => {
            info!("session cancelled from prompt");
            Ok(Some(SessionEnd::Cancelled))
        }
        Err(DispatchError::Output(e)) => Err(SessionError::Console(e)),
        Err(e) => {
            interpreter.console_mut().say(format!("Error: {e}"))?;
            Ok(None)
        }
    }
}

/// Run a decoded invocation to completion.
///
/// # Errors
///
/// See [`run_interactive`] and [`run_batch`].
pub async fn run<S, R, W>(
    interpreter: &mut Interpreter<'_, S, R, W>,
    invocation: &Invocation,
) -> Result<SessionEnd, SessionError>
where
    S: Store + ?Sized,
    R: BufRead,
    W: Write,
{
    match invocation {
        Invocation::Interactive(mode) => run_interactive(interpreter, *mode).await,
        Invocation::Batch { path, file } => run_batch(interpreter, path, file).await,
    }
}

/// Prompt for lines until an exit keyword, end of input, or a cancelled
/// prompt. Per-line errors are printed and the loop continues.
///
/// # Errors
///
/// Returns `SessionError::Console` if the console cannot be read or written.
pub async fn run_interactive<S, R, W>(
    interpreter: &mut Interpreter<'_, S, R, W>,
    mode: Mode,
) -> Result<SessionEnd, SessionError>
where
    S: Store + ?Sized,
    R: BufRead,
    W: Write,
{
    let table = CommandTable::for_mode(mode);
    info!(%mode, "interactive session started");
    let console = interpreter.console_mut();
    console.say("Running in prompt mode")?;
    console.print(&table.usage())?;

    loop {
        let console = interpreter.console_mut();
        console.print("> ")?;
        let Some(line) = console.read_line()? else {
            console.say("")?;
            return Ok(SessionEnd::Completed);
        };

        let input = line.trim();
        if is_exit_keyword(input) {
            return Ok(SessionEnd::Completed);
        }
        if is_help_keyword(input) {
            console.print(&table.usage())?;
            continue;
        }

        let result = interpreter.dispatch(input, &table).await;
        if let Some(end) = report(interpreter, result)? {
            return Ok(end);
        }
    }
}

/// Dispatch `"<prefix> <line>"` for every non-blank line of the file.
///
/// Errors are printed and counted; they never stop the run.
///
/// # Errors
///
/// Returns `SessionError::FatalIo` if the file cannot be read and
/// `SessionError::Console` if the console fails.
pub async fn run_batch<S, R, W>(
    interpreter: &mut Interpreter<'_, S, R, W>,
    path: &Path,
    file: &BatchFile,
) -> Result<SessionEnd, SessionError>
where
    S: Store + ?Sized,
    R: BufRead,
    W: Write,
{
    interpreter
        .console_mut()
        .say(format!("Running file {}", path.display()))?;
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SessionError::FatalIo {
            path: path.to_path_buf(),
            source,
        })?;

    let table = CommandTable::for_mode(file.mode);
    let mut errors = 0;
    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let command = format!("{} {line}", file.prefix);
        let result = interpreter.dispatch(&command, &table).await;
        if result.is_err() {
            errors += 1;
        }
        if let Some(end) = report(interpreter, result)? {
            return Ok(end);
        }
    }

    if errors == 0 {
        info!(path = %path.display(), "batch finished cleanly");
        Ok(SessionEnd::BatchClean)
    } else {
        warn!(path = %path.display(), errors, "batch finished with errors");
        Ok(SessionEnd::BatchWithErrors { errors })
    }
}
