use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use presences_core::{EventWindow, ReportOptions, ReportRequest};

/// Get participation and presence of members over a period.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "presences",
    version,
    long_about = None,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct Cli {
    #[command(flatten)]
    pub report: ReportArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Manage the saved API password (OS keyring plus encrypted file).
    #[command(subcommand)]
    Secret(SecretCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum SecretCommand {
    /// Save the password used for `username` (prompts when --password is omitted).
    SetPassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Remove the saved password for `username`.
    ClearPassword {
        #[arg(long)]
        username: String,
    },
}

/// Arguments for the report run (default command).
#[derive(Debug, Clone, Args, Default)]
pub struct ReportArgs {
    /// Timestamp for start of period (epoch seconds).
    #[arg(value_name = "START", required = true, allow_negative_numbers = true)]
    pub start: Option<i64>,

    /// Timestamp for end of period (epoch seconds).
    #[arg(value_name = "END", required = true, allow_negative_numbers = true)]
    pub end: Option<i64>,

    /// Output file, overwritten if it exists.
    #[arg(value_name = "OUTPUT", required = true, value_hint = ValueHint::FilePath)]
    pub output: Option<String>,

    /// Also show whether the member was registered for each event.
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "no_show_inscriptions")]
    pub show_inscriptions: bool,

    /// Hide the registration columns (default).
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "show_inscriptions")]
    pub no_show_inscriptions: bool,

    /// Keep members that were never registered nor present.
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "no_show_absents")]
    pub show_absents: bool,

    /// Drop members that were never registered nor present (default).
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "show_absents")]
    pub no_show_absents: bool,

    /// Credentials file (defaults to ./creds, then the per-user config directory).
    #[arg(long = "creds", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub creds: Option<String>,

    /// Also write JSON logs to the per-user log file.
    #[arg(long = "log-file", action = ArgAction::SetTrue)]
    pub log_file: bool,
}

impl ReportArgs {
    pub fn options(&self) -> ReportOptions {
        ReportOptions {
            show_inscriptions: self.show_inscriptions && !self.no_show_inscriptions,
            show_absents: self.show_absents && !self.no_show_absents,
        }
    }

    pub fn to_request(&self) -> Result<ReportRequest, String> {
        let start = self.start.ok_or("missing START timestamp")?;
        let end = self.end.ok_or("missing END timestamp")?;
        let output = self
            .output
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or("missing OUTPUT path")?;

        Ok(ReportRequest {
            window: EventWindow::new(start, end),
            output: output.into(),
            options: self.options(),
        })
    }
}
