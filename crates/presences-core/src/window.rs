use tracing::{debug, info};

use crate::api::AttendanceApi;
use crate::error::Result;
use crate::model::Event;

pub const PAGE_LIMIT: u32 = 50;
/// Page of events immediately preceding now.
pub const PAGE_BEFORE: i32 = -1;
/// Page of events following now.
pub const PAGE_AFTER: i32 = 1;

/// Caller-supplied time range in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: i64,
    pub end: i64,
}

impl EventWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, event: &Event) -> bool {
        event.overlaps(self.start, self.end)
    }
}

/// Keep events overlapping the window, ordered by start date.
pub fn select_events(events: Vec<Event>, window: EventWindow) -> Vec<Event> {
    let mut selected: Vec<Event> = events
        .into_iter()
        .filter(|event| window.contains(event))
        .collect();
    selected.sort_by_key(|event| event.start_date);
    selected
}

/// Fetch the two fixed event pages around now and select those in `window`.
///
/// Events outside these pages never reach the report.
pub fn fetch_window<A: AttendanceApi + ?Sized>(api: &A, window: EventWindow) -> Result<Vec<Event>> {
    let mut events = api.events_page(PAGE_BEFORE, PAGE_LIMIT)?;
    info!(count = events.len(), "Fetched events before now");
    let after = api.events_page(PAGE_AFTER, PAGE_LIMIT)?;
    info!(count = after.len(), "Fetched events after now");
    events.extend(after);

    for event in &events {
        debug!(
            uuid = %event.uuid,
            name = %event.name,
            start = event.start_date,
            end = event.end_date,
            "Candidate event"
        );
    }

    let selected = select_events(events, window);
    info!(
        selected = selected.len(),
        start = window.start,
        end = window.end,
        "Selected events in window"
    );
    Ok(selected)
}
