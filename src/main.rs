use std::error::Error;
use std::io;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use relaunch::command::{CommandBuilder, ServerMode};
use relaunch::env::Environment;
use relaunch::supervisor::{install_interrupt_handler, Supervisor};

/// Environment variable controlling the diagnostic log filter.
const LOG_ENV_VAR: &str = "RELAUNCH_LOG";

/// Launch and supervise a server process.
#[derive(Debug, Parser)]
#[command(name = "relaunch", version, about = "Launch and supervise a server process")]
struct Cli {
    /// Optional leading mode selector (`--domain` for the domain topology)
    /// followed by server tokens, forwarded untouched.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let (mode, tokens) = select_mode(&cli.tokens);
    let status = match run(mode, tokens) {
        Ok(status) => status,
        Err(error) => {
            eprintln!("relaunch: {error}");
            let mut source = error.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            1
        }
    };
    process::exit(status);
}

fn run(mode: ServerMode, tokens: &[String]) -> Result<i32, Box<dyn Error>> {
    let environment = Environment::discover();
    let builder = CommandBuilder::configure(mode, environment, tokens)?;
    let command = builder.build()?;
    let mut supervisor = Supervisor::new(io::stdout());
    install_interrupt_handler(&supervisor.interrupt_state())?;
    let status = supervisor.run(&command)?;
    Ok(status)
}

/// Consume the leading mode selector. An empty token list launches the
/// standalone topology with no server tokens; otherwise the first token
/// selects the topology (`--domain` for domain, anything else standalone)
/// and the remainder are the server tokens.
fn select_mode(tokens: &[String]) -> (ServerMode, &[String]) {
    match tokens.split_first() {
        None => (ServerMode::Standalone, &[]),
        Some((first, rest)) => {
            let mode = if first == "--domain" {
                ServerMode::Domain
            } else {
                ServerMode::Standalone
            };
            (mode, rest)
        }
    }
}
