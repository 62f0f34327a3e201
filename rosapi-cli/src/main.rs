//! Command line for the RouterOS API.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod line;
mod render;
mod run;
mod shell;

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rosapi::{DEFAULT_PORT, Session};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "rosapi", version, about = "RouterOS API command line")]
struct Cli {
    /// Log more (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the interactive shell (default).
    Shell(ConnectArgs),

    /// Log in, run one command, print its reply.
    ///
    /// Example: `rosapi run 192.168.88.1 /interface/print where type=ether`
    Run(Box<run::RunArgs>),

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

/// Connection options shared by `run` and `shell`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ConnectArgs {
    /// API port.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seconds to wait on connect and on each read or write (0 = forever).
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

impl Default for ConnectArgs {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: 10,
        }
    }
}

impl ConnectArgs {
    /// Opens a session to `host` with these options.
    pub(crate) fn connect(&self, host: &str) -> Result<Session> {
        let builder = Session::builder(host).port(self.port);
        let builder = if self.timeout == 0 {
            builder.no_timeout()
        } else {
            builder.timeout(Duration::from_secs(self.timeout))
        };
        builder
            .connect()
            .with_context(|| format!("connecting to {host}:{}", self.port))
    }
}

/// Output format for command replies.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Colorized `!status key=value` lines.
    #[default]
    Table,
    /// Machine-readable JSON.
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = cli.dispatch() {
        eprintln!("rosapi: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    fn dispatch(self) -> Result<()> {
        match self.command {
            None => shell::run(ConnectArgs::default()),
            Some(Command::Shell(conn)) => shell::run(conn),
            Some(Command::Run(args)) => args.run(),
            Some(Command::Completion { shell }) => {
                clap_complete::generate(shell, &mut Self::command(), "rosapi", &mut io::stdout());
                Ok(())
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

/// Prints `label` and reads one trimmed line from stdin.
///
/// Returns `None` on end of input.
pub(crate) fn prompt(label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
}

/// Reads a password from the terminal without echoing it.
pub(crate) fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(label).context("reading password")
}
