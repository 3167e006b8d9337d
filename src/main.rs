//! director-snapshot CLI entry point.

use clap::Parser;
use dsnap::cli::commands;
use dsnap::cli::{Cli, Commands};
use dsnap::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    // JSON when asked for, or when stdout is not a terminal
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("warn,dsnap=info"),
            2 => EnvFilter::new("warn,dsnap=debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    match &cli.command {
        Commands::Init { force } => commands::init::execute(cli.db.as_ref(), *force, json),
        Commands::Export(args) => commands::export::execute(args, cli.db.as_ref(), json),
        Commands::Snapshot { command } => {
            commands::snapshot::execute(command, cli.db.as_ref(), json)
        }
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::Version => commands::version::execute(json),
    }
}
