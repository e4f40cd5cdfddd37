use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use tracing::info;

use crate::aggregate::fetch_participation;
use crate::api::{AttendanceApi, HttpApi, Session, build_client};
use crate::credentials::load_credentials;
use crate::error::Result;
use crate::report::{ReportOptions, render_report, write_report};
use crate::roster::fetch_roster;
use crate::window::{EventWindow, fetch_window};

/// Everything a single report run needs besides API access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub window: EventWindow,
    pub output: PathBuf,
    pub options: ReportOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub events: usize,
    pub members: usize,
    pub rows_written: usize,
}

/// Fetch, aggregate and write the report. The output file is only touched once every
/// fetch has succeeded.
pub fn run_report<A, Tz>(api: &A, request: &ReportRequest, tz: &Tz) -> Result<ReportSummary>
where
    A: AttendanceApi + ?Sized,
    Tz: TimeZone,
{
    let events = fetch_window(api, request.window)?;
    let members = fetch_roster(api)?;
    let matrix = fetch_participation(api, &events)?;

    let rows = render_report(&events, &members, &matrix, request.options, tz);
    write_report(&request.output, &rows)?;

    let summary = ReportSummary {
        events: events.len(),
        members: members.len(),
        rows_written: rows.len().saturating_sub(2),
    };
    info!(
        events = summary.events,
        members = summary.members,
        rows = summary.rows_written,
        "Report complete"
    );
    Ok(summary)
}

/// Load credentials, log in, and run the report against the live API using local dates.
pub fn run_cli(credentials_path: &Path, request: &ReportRequest) -> Result<ReportSummary> {
    let credentials = load_credentials(credentials_path)?;
    let client = build_client()?;
    let session = Session::login(&client, &credentials)?;
    info!(base_url = %session.base_url(), "Authenticated");

    let api = HttpApi::new(client, session);
    run_report(&api, request, &Local)
}
