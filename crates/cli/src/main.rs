//! Checkpoint CLI - admin permissions, feature flags and whitelist import.
//!
//! # Usage
//!
//! ```bash
//! # Interactive admin session
//! ckpt-cli
//!
//! # Interactive flag session
//! ckpt-cli flag
//!
//! # Import the whitelist CSV (then type `add`)
//! WHITELIST_CSV=attendees.csv ckpt-cli whitelist
//!
//! # Run "delete <line>" for every line of the file
//! ckpt-cli delete_admin.txt
//! ```
//!
//! # Logging
//!
//! Logs go to stderr. `RUST_LOG` overrides the default filter and
//! `CHECKPOINT_LOG_JSON=1` switches to JSON output.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, Write};
use std::process::ExitCode;

use checkpoint_cli::commands::Interpreter;
use checkpoint_cli::config::CliConfig;
use checkpoint_cli::console::Console;
use checkpoint_cli::db::{self, PgStore};
use checkpoint_cli::session::{self, EXIT_CONFIG, EXIT_IO, EXIT_OK, EXIT_USAGE, Invocation};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
Usage (to run in prompt): ckpt-cli [admin|flag|whitelist]
Usage (to run on text):   ckpt-cli [admin|flag] <prefix>_<admin|flag>.txt";

#[derive(Parser)]
#[command(name = "ckpt-cli")]
#[command(author, version, about = "Checkpoint admin, flag and whitelist tools")]
struct Cli {
    /// Session mode (`admin`, `flag`, `whitelist`) and/or a batch file
    #[arg(value_name = "MODE|FILE")]
    args: Vec<String>,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "checkpoint_cli=warn".into());

    let json = std::env::var("CHECKPOINT_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn fail(message: impl std::fmt::Display, code: u8) -> u8 {
    let _ = writeln!(io::stderr().lock(), "{message}");
    code
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_OK };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    ExitCode::from(run(cli).await)
}

async fn run(cli: Cli) -> u8 {
    // Arguments are checked before touching the environment or the database.
    let invocation = match Invocation::from_args(&cli.args) {
        Ok(invocation) => invocation,
        Err(e) => return fail(format!("Error: {e}\n{USAGE}"), EXIT_USAGE),
    };

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => return fail(format!("Error: {e}"), EXIT_CONFIG),
    };
    tracing::debug!(?config, ?invocation, "starting");

    let pool = match db::create_pool(&config.database_url, config.pool).await {
        Ok(pool) => pool,
        Err(e) => return fail(format!("Could not connect to database: {e}"), EXIT_IO),
    };

    let store = PgStore::new(&pool);
    let mut console = Console::new(io::stdin().lock(), io::stdout().lock());
    if let Err(e) = console.say("Connected to database") {
        return fail(format!("Error: {e}"), EXIT_IO);
    }

    let mut interpreter = Interpreter::new(&store, console, config.whitelist_path);
    let code = match session::run(&mut interpreter, &invocation).await {
        Ok(end) => {
            tracing::info!(?end, "session ended");
            end.exit_code()
        }
        Err(e) => fail(format!("Error: {e}"), e.exit_code()),
    };
    drop(interpreter);

    pool.close().await;
    code
}
