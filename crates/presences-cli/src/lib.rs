//! Command-line front end for the attendance report.

pub mod cli_args;

use anyhow::{Context, Result, anyhow};
use cli_args::{Cli, Command, ReportArgs, SecretCommand};
use presences_core::logging::{LoggingDestination, init_logging};
use presences_core::{resolve_credentials_path, run_cli, secret_store};
use rpassword::prompt_password;
use tracing::warn;

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Secret(cmd)) => handle_secret_command(cmd),
        None => run_report(cli.report),
    }
}

fn run_report(args: ReportArgs) -> Result<()> {
    let destination = if args.log_file {
        LoggingDestination::FileAndStderr
    } else {
        LoggingDestination::StderrOnly
    };
    if let Err(err) = init_logging(destination) {
        eprintln!("Warning: logging unavailable: {err}");
    }

    let request = args.to_request().map_err(|err| anyhow!(err))?;
    if request.window.start > request.window.end {
        warn!(
            start = request.window.start,
            end = request.window.end,
            "Start is after end; no event can match"
        );
    }

    let credentials_path = resolve_credentials_path(args.creds.as_deref());
    let summary = run_cli(&credentials_path, &request)?;
    println!(
        "Wrote {} ({} events, {} of {} members)",
        request.output.display(),
        summary.events,
        summary.rows_written,
        summary.members
    );
    Ok(())
}

fn handle_secret_command(command: SecretCommand) -> Result<()> {
    match command {
        SecretCommand::SetPassword { username, password } => {
            let value = match password {
                Some(value) => value,
                None => prompt_password(format!("Password for {username}: "))
                    .context("failed to read password")?,
            };
            secret_store::store_password(&username, &value)?;
            println!("Password for '{username}' saved.");
            Ok(())
        }
        SecretCommand::ClearPassword { username } => {
            secret_store::delete_password(&username)?;
            println!("Cleared saved password for '{username}'.");
            Ok(())
        }
    }
}
