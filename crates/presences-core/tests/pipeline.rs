use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use presences_core::{
    AttendanceApi, Error, Event, EventMember, EventWindow, Mark, Member, ReportOptions,
    ReportRequest, Result, run_report,
};
use tempfile::tempdir;

#[derive(Default)]
struct FakeApi {
    pages: HashMap<i32, Vec<Event>>,
    members: Vec<Member>,
    participation: HashMap<String, Vec<EventMember>>,
    fail_members: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeApi {
    fn with_page(mut self, page: i32, events: Vec<Event>) -> Self {
        self.pages.insert(page, events);
        self
    }

    fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    fn with_participation(mut self, event: &str, records: Vec<EventMember>) -> Self {
        self.participation.insert(event.to_string(), records);
        self
    }
}

impl AttendanceApi for FakeApi {
    fn events_page(&self, page: i32, limit: u32) -> Result<Vec<Event>> {
        self.calls
            .borrow_mut()
            .push(format!("events?page={page}&limit={limit}"));
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }

    fn members(&self) -> Result<Vec<Member>> {
        self.calls.borrow_mut().push("members".to_string());
        if self.fail_members {
            return Err(Error::remote("members responded with 500"));
        }
        Ok(self.members.clone())
    }

    fn event_members(&self, event_uuid: &str) -> Result<Vec<EventMember>> {
        self.calls
            .borrow_mut()
            .push(format!("events/{event_uuid}/members"));
        Ok(self
            .participation
            .get(event_uuid)
            .cloned()
            .unwrap_or_default())
    }
}

fn event(uuid: &str, name: &str, start: i64, end: i64) -> Event {
    Event {
        uuid: uuid.to_string(),
        name: name.to_string(),
        start_date: start,
        end_date: end,
    }
}

fn member(uuid: &str, first: &str, last: &str, kind: &str) -> Member {
    Member {
        uuid: uuid.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        kind: kind.to_string(),
    }
}

fn record(uuid: &str, participation: Mark, presence: Mark) -> EventMember {
    EventMember {
        uuid: uuid.to_string(),
        participation,
        presence,
    }
}

fn request(output: &Path, start: i64, end: i64, options: ReportOptions) -> ReportRequest {
    ReportRequest {
        window: EventWindow::new(start, end),
        output: output.to_path_buf(),
        options,
    }
}

fn scenario_api() -> FakeApi {
    FakeApi::default()
        .with_page(-1, vec![event("e1", "Assaig", 1000, 2000)])
        .with_members(vec![
            member("m1", "Anna", "Puig", "casteller"),
            member("m2", "Pere", "Roca", "gralla"),
        ])
        .with_participation("e1", vec![record("m1", Mark::Yes, Mark::Unset)])
}

#[test]
fn single_event_scenario_suppresses_absent_member() {
    let temp = tempdir().expect("tempdir");
    let output = temp.path().join("report.csv");
    let api = scenario_api();

    let summary = run_report(
        &api,
        &request(&output, 500, 2500, ReportOptions::default()),
        &Utc,
    )
    .expect("report");

    let contents = fs::read_to_string(&output).expect("read output");
    assert_eq!(
        contents,
        ",,Assaig 1970-01-01\nNom,Type,presence\nAnna Puig,casteller,yes\n"
    );
    assert_eq!(summary.events, 1);
    assert_eq!(summary.members, 2);
    assert_eq!(summary.rows_written, 1);
}

#[test]
fn single_event_scenario_with_absents_shown() {
    let temp = tempdir().expect("tempdir");
    let output = temp.path().join("report.csv");
    let api = scenario_api();
    let options = ReportOptions {
        show_inscriptions: false,
        show_absents: true,
    };

    run_report(&api, &request(&output, 500, 2500, options), &Utc).expect("report");

    let contents = fs::read_to_string(&output).expect("read output");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            ",,Assaig 1970-01-01",
            "Nom,Type,presence",
            "Anna Puig,casteller,yes",
            "Pere Roca,gralla,no",
        ]
    );
}

#[test]
fn fetches_both_pages_then_roster_then_each_selected_event() {
    let temp = tempdir().expect("tempdir");
    let output = temp.path().join("report.csv");
    let api = FakeApi::default()
        .with_page(-1, vec![event("old", "Vell", 0, 100), event("b", "B", 900, 950)])
        .with_page(1, vec![event("a", "A", 600, 700), event("far", "Lluny", 5000, 6000)])
        .with_members(vec![member("m1", "Anna", "Puig", "casteller")]);

    let summary = run_report(
        &api,
        &request(&output, 500, 1000, ReportOptions::default()),
        &Utc,
    )
    .expect("report");

    assert_eq!(summary.events, 2);
    assert_eq!(
        *api.calls.borrow(),
        vec![
            "events?page=-1&limit=50",
            "events?page=1&limit=50",
            "members",
            "events/a/members",
            "events/b/members",
        ]
    );
}

#[test]
fn row_and_column_counts_follow_options() {
    let temp = tempdir().expect("tempdir");
    let events = vec![
        event("e1", "Assaig", 1_000, 2_000),
        event("e2", "Diada", 90_000, 95_000),
        event("e3", "Assaig", 200_000, 210_000),
    ];
    let api = FakeApi::default()
        .with_page(1, events)
        .with_members(vec![
            member("m1", "Anna", "Puig", "casteller"),
            member("m2", "Pere", "Roca", "gralla"),
            member("m3", "Marta", "Soler", "canalla"),
        ])
        .with_participation("e1", vec![record("m1", Mark::Yes, Mark::Yes)])
        .with_participation(
            "e2",
            vec![
                record("m2", Mark::Unset, Mark::Yes),
                record("m3", Mark::Yes, Mark::No),
            ],
        );

    for (show_inscriptions, cells_per_event) in [(false, 1usize), (true, 2usize)] {
        for show_absents in [false, true] {
            let output = temp
                .path()
                .join(format!("report-{show_inscriptions}-{show_absents}.csv"));
            let options = ReportOptions {
                show_inscriptions,
                show_absents,
            };
            let summary =
                run_report(&api, &request(&output, 0, 1_000_000, options), &Utc).expect("report");

            let contents = fs::read_to_string(&output).expect("read output");
            let lines: Vec<&str> = contents.lines().collect();
            assert_eq!(lines.len(), 2 + summary.rows_written);
            for line in &lines[1..] {
                assert_eq!(line.matches(',').count(), 1 + 3 * cells_per_event);
            }

            // m3 registered for e2 but was marked absent: only the inscription column keeps it.
            let expected_rows = match (show_inscriptions, show_absents) {
                (_, true) => 3,
                (true, false) => 3,
                (false, false) => 2,
            };
            assert_eq!(summary.rows_written, expected_rows);
        }
    }
}

#[test]
fn inscriptions_layout_for_mixed_records() {
    let temp = tempdir().expect("tempdir");
    let output = temp.path().join("report.csv");
    let api = FakeApi::default()
        .with_page(
            1,
            vec![
                event("e2", "Diada", 86_400, 90_000),
                event("e1", "Assaig", 0, 3_600),
            ],
        )
        .with_members(vec![
            member("m1", "Anna", "Puig", "casteller"),
            member("m2", "Pere", "Roca", "gralla"),
        ])
        .with_participation(
            "e1",
            vec![
                record("m1", Mark::Yes, Mark::Unset),
                record("m2", Mark::Unset, Mark::Yes),
            ],
        )
        .with_participation("e2", vec![record("m1", Mark::Yes, Mark::No)]);
    let options = ReportOptions {
        show_inscriptions: true,
        show_absents: false,
    };

    run_report(&api, &request(&output, 0, 100_000, options), &Utc).expect("report");

    let contents = fs::read_to_string(&output).expect("read output");
    assert_eq!(
        contents,
        "\
,,Assaig 1970-01-01,,Diada 1970-01-02,
Nom,Type,inscription,presence,inscription,presence
Anna Puig,casteller,yes,yes,yes,no
Pere Roca,gralla,no,yes,no,no
"
    );
}

#[test]
fn fetch_failure_leaves_existing_output_untouched() {
    let temp = tempdir().expect("tempdir");
    let output = temp.path().join("report.csv");
    fs::write(&output, "previous report\n").expect("seed output");

    let mut api = scenario_api();
    api.fail_members = true;

    let err = run_report(
        &api,
        &request(&output, 500, 2500, ReportOptions::default()),
        &Utc,
    )
    .expect_err("members failure aborts the run");
    assert!(matches!(err, Error::Remote(_)));
    assert_eq!(
        fs::read_to_string(&output).expect("read output"),
        "previous report\n"
    );
    assert!(
        !api.calls.borrow().iter().any(|call| call.ends_with("/members")),
        "no participation fetch after a failed roster fetch"
    );
}

#[test]
fn empty_window_writes_headers_only() {
    let temp = tempdir().expect("tempdir");
    let output = temp.path().join("report.csv");
    let api = scenario_api();

    let summary = run_report(
        &api,
        &request(&output, 3000, 4000, ReportOptions::default()),
        &Utc,
    )
    .expect("report");

    assert_eq!(summary.events, 0);
    assert_eq!(summary.rows_written, 0);
    assert_eq!(
        fs::read_to_string(&output).expect("read output"),
        ",\nNom,Type\n"
    );
}
