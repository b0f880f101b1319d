//! Autolink CLI - native module autolinking for mobile builds

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use autolink::generator::WriteError;
use autolink::resolver::ResolveFailure;
use autolink::util::diagnostic::emit;
use autolink::util::Shell;
use cli::{Cli, Commands};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "AUTOLINK_LOG";

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.quiet {
            EnvFilter::new("autolink=error")
        } else if cli.verbose {
            EnvFilter::new("autolink=debug")
        } else {
            EnvFilter::new("autolink=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, cli.color));

    // Execute command
    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, &shell),
        Commands::List(args) => commands::list::execute(args, &shell),
        Commands::Completions(args) => commands::completions::execute(args),
    };

    if let Err(e) = result {
        report(&shell, &e);
        std::process::exit(1);
    }
}

/// Print a fatal error, with full diagnostics where the error carries them.
fn report(shell: &Shell, err: &anyhow::Error) {
    let color = shell.use_color();

    if let Some(failure) = err.downcast_ref::<ResolveFailure>() {
        for diagnostic in failure.diagnostics() {
            emit(&diagnostic, color);
            eprintln!();
        }
        shell.error(format!(
            "could not resolve modules due to {} previous error(s)",
            failure.issues.len()
        ));
    } else if let Some(write) = err.downcast_ref::<WriteError>() {
        emit(&write.to_diagnostic(), color);
    } else {
        shell.error(format!("{:#}", err));
    }
}
