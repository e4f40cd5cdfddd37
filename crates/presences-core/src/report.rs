//! Comma-joined attendance report.
//!
//! Layout, with `showInscriptions` enabled:
//!
//! ```text
//! ,,Assaig 2025-03-04,,Actuació 2025-03-09,
//! Nom,Type,inscription,presence,inscription,presence
//! Anna Puig,casteller,yes,yes,no,no
//! ```
//!
//! Cells are not quoted; a comma inside a name shifts the columns of that row.

use std::path::Path;

use chrono::{DateTime, TimeZone};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::info;

use crate::aggregate::ParticipationMatrix;
use crate::error::Result;
use crate::model::{Event, Mark, Member};

const NAME_LABEL: &str = "Nom";
const TYPE_LABEL: &str = "Type";
const INSCRIPTION_LABEL: &str = "inscription";
const PRESENCE_LABEL: &str = "presence";
const YES: &str = "yes";
const NO: &str = "no";

/// One report line, cell by cell.
pub type Row = Vec<String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Emit an `inscription` column before each `presence` column.
    pub show_inscriptions: bool,
    /// Keep members that were never registered nor present.
    pub show_absents: bool,
}

/// A rendered cell plus whether it proves the member took part in the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub text: &'static str,
    pub attended: bool,
}

impl Cell {
    const fn new(text: &'static str, attended: bool) -> Self {
        Self { text, attended }
    }

    /// Registration column: the literal value, or `no` when unset.
    pub fn inscription(participation: Mark) -> Self {
        match participation.as_str() {
            Some(text) => Cell::new(text, participation == Mark::Yes),
            None => Cell::new(NO, false),
        }
    }

    /// Presence column. A registered member with no presence recorded counts as present;
    /// an explicit `no` always wins.
    pub fn presence(participation: Mark, presence: Mark) -> Self {
        if let Some(text) = presence.as_str() {
            return Cell::new(text, presence == Mark::Yes);
        }
        if participation == Mark::Yes && presence != Mark::No {
            Cell::new(YES, true)
        } else {
            Cell::new(NO, false)
        }
    }
}

fn event_label<Tz: TimeZone>(event: &Event, tz: &Tz) -> String {
    let date = DateTime::from_timestamp(event.start_date, 0)
        .map(|utc| utc.with_timezone(tz).date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| event.start_date.to_string());
    format!("{} {}", event.name, date)
}

fn header_rows<Tz: TimeZone>(events: &[Event], options: ReportOptions, tz: &Tz) -> [Row; 2] {
    let mut header = vec![String::new(), String::new()];
    let mut subheader = vec![NAME_LABEL.to_string(), TYPE_LABEL.to_string()];

    for event in events {
        header.push(event_label(event, tz));
        if options.show_inscriptions {
            header.push(String::new());
            subheader.push(INSCRIPTION_LABEL.to_string());
        }
        subheader.push(PRESENCE_LABEL.to_string());
    }

    [header, subheader]
}

/// Row for `member`, or `None` when it is suppressed as always absent.
fn member_row(
    member: &Member,
    events: &[Event],
    matrix: &ParticipationMatrix,
    options: ReportOptions,
) -> Option<Row> {
    let mut cells = vec![member.display_name(), member.kind.clone()];
    let mut always_absent = true;

    for event in events {
        let record = matrix.record(&event.uuid, &member.uuid);

        if options.show_inscriptions {
            let cell = Cell::inscription(record.participation);
            always_absent &= !cell.attended;
            cells.push(cell.text.to_string());
        }

        let cell = Cell::presence(record.participation, record.presence);
        always_absent &= !cell.attended;
        cells.push(cell.text.to_string());
    }

    (!always_absent || options.show_absents).then_some(cells)
}

/// Render header, subheader and one row per included member, in roster order.
///
/// Event dates in the header are the calendar date of `start_date` in `tz`.
pub fn render_report<Tz: TimeZone>(
    events: &[Event],
    members: &[Member],
    matrix: &ParticipationMatrix,
    options: ReportOptions,
    tz: &Tz,
) -> Vec<Row> {
    let mut rows: Vec<Row> = header_rows(events, options, tz).into();
    rows.extend(
        members
            .iter()
            .filter_map(|member| member_row(member, events, matrix, options)),
    );
    rows
}

/// Write `rows` to `path`, replacing any existing file. Cells are never quoted and
/// every row ends with `\n`.
pub fn write_report(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_path(path)?;

    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Report written");
    Ok(())
}
